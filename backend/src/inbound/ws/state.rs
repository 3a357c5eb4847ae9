//! Shared WebSocket adapter state.
//!
//! Connections subscribe to the notification feed port and never publish,
//! so the adapter can be driven by any hub implementation in tests.

use std::sync::Arc;

use url::{Origin, Url};

use crate::domain::ports::NotificationFeed;

/// Origins permitted to open WebSocket connections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginAllowList {
    origins: Vec<Origin>,
}

impl OriginAllowList {
    /// Parse configured origins such as `https://app.example.com`.
    ///
    /// Blank entries are skipped; any other unparsable entry is an error.
    pub fn parse<I, S>(entries: I) -> Result<Self, url::ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut origins = Vec::new();
        for entry in entries {
            let trimmed = entry.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            origins.push(Url::parse(trimmed)?.origin());
        }
        Ok(Self { origins })
    }

    /// True when `origin` matches a configured scheme, host and port.
    pub fn allows(&self, origin: &Url) -> bool {
        let candidate = origin.origin();
        candidate.is_tuple() && self.origins.contains(&candidate)
    }
}

/// Dependency bundle for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    pub feed: Arc<dyn NotificationFeed>,
    pub allowed_origins: Arc<OriginAllowList>,
}

impl WsState {
    /// Construct state from a feed and an origin allow-list.
    pub fn new(feed: Arc<dyn NotificationFeed>, allowed_origins: OriginAllowList) -> Self {
        Self {
            feed,
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}
