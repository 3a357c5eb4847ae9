//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix session so handlers deal with domain values only: the
//! signed-in [`Actor`] (user id plus marketplace role).

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Actor, Error, Role, User, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const ROLE_KEY: &str = "role";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated user's id and role in the session cookie.
    pub fn persist_user(&self, user: &User) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user.id.to_string())
            .and_then(|()| self.0.insert(ROLE_KEY, user.role.as_str()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the signed-in actor, if the cookie carries a valid one.
    pub fn actor(&self) -> Result<Option<Actor>, Error> {
        let read = |key: &str| {
            self.0
                .get::<String>(key)
                .map_err(|error| Error::internal(format!("failed to read session: {error}")))
        };
        let (Some(raw_id), Some(raw_role)) = (read(USER_ID_KEY)?, read(ROLE_KEY)?) else {
            return Ok(None);
        };
        match (raw_id.parse::<UserId>(), raw_role.parse::<Role>()) {
            (Ok(user_id), Ok(role)) => Ok(Some(Actor { user_id, role })),
            _ => {
                warn!("discarding malformed session cookie");
                Ok(None)
            }
        }
    }

    /// Require a signed-in actor or return `401 Unauthorized`.
    pub fn require_actor(&self) -> Result<Actor, Error> {
        self.actor()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Require a signed-in actor holding `role`.
    ///
    /// Missing sessions yield `401`; the wrong role yields `403`.
    pub fn require_role(&self, role: Role) -> Result<Actor, Error> {
        let actor = self.require_actor()?;
        if actor.role == role {
            Ok(actor)
        } else {
            Err(Error::forbidden(format!("{role} role required")))
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
