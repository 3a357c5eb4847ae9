//! Visibility rules for case details and case files.
//!
//! Both checks are pure functions over the case and its accepted quote, so
//! callers load state once and ask the policy.

use super::{Case, CaseStatus, Error, Quote, Role, UserId};

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Outcome of the case-detail visibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseDetailAccess {
    /// The caller may not see the case.
    Denied,
    /// Metadata plus an anonymized description; no files.
    Redacted,
    /// Full description and files.
    Full,
}

fn holds_settled_quote(actor: &Actor, case: &Case, accepted: Option<&Quote>) -> bool {
    case.status == CaseStatus::Engaged
        && accepted.is_some_and(|quote| quote.case_id == case.id && quote.lawyer_id == actor.user_id)
}

/// Decide how much of `case` the actor may see.
///
/// `accepted` is the case's accepted quote, if any.
#[must_use]
pub fn case_detail_access(actor: &Actor, case: &Case, accepted: Option<&Quote>) -> CaseDetailAccess {
    match actor.role {
        Role::Client if case.is_owned_by(&actor.user_id) => CaseDetailAccess::Full,
        Role::Client => CaseDetailAccess::Denied,
        Role::Lawyer if holds_settled_quote(actor, case, accepted) => CaseDetailAccess::Full,
        Role::Lawyer => CaseDetailAccess::Redacted,
    }
}

/// Authorise downloading a file that belongs to `case`.
///
/// Clients must own the case. Lawyers must hold the accepted quote on an
/// engaged case.
pub fn authorize_file_download(
    actor: &Actor,
    case: &Case,
    accepted: Option<&Quote>,
) -> Result<(), Error> {
    match actor.role {
        Role::Client if case.is_owned_by(&actor.user_id) => Ok(()),
        Role::Client => Err(Error::forbidden(
            "you can only access files for your own cases",
        )),
        Role::Lawyer if holds_settled_quote(actor, case, accepted) => Ok(()),
        Role::Lawyer => Err(Error::forbidden(
            "files are available only to the engaged lawyer",
        )),
    }
}
