//! Everything `create_server` needs besides the health state.

use std::net::SocketAddr;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;
use docket::inbound::http::session_config::SessionSettings;
use docket::outbound::persistence::DbPool;

use super::settings::DocketSettings;

/// Server inputs gathered by `main` before the adapter graph is built.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) settings: DocketSettings,
    pub(crate) db_pool: Option<DbPool>,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Without a pool the in-memory store backs every repository port.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr, settings: DocketSettings) -> Self {
        Self {
            session,
            bind_addr,
            settings,
            db_pool: None,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Switch every repository port to the Diesel adapters over `pool`.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
