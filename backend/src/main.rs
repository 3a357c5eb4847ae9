//! Backend entry-point: loads settings, prepares storage and runs the HTTP server.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use docket::inbound::http::health::HealthState;
use docket::inbound::http::session_config::{BuildMode, session_settings_from_env};
use docket::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
#[cfg(feature = "metrics")]
use server::prometheus_middleware;
use server::{DocketSettings, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = DocketSettings::load_from_iter(std::env::args_os())
        .map_err(|error| eyre!("failed to load settings: {error}"))?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    let bind_addr = settings.bind_addr().wrap_err("invalid bind address")?;

    let db_pool = match settings.pool_config() {
        Some(pool_config) => Some(connect(pool_config).await?),
        None => {
            warn!("no database configured; using the in-memory store");
            None
        }
    };

    let config = ServerConfig::new(session, bind_addr, settings);
    let config = match db_pool {
        Some(pool) => config.with_db_pool(pool),
        None => config,
    };
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(prometheus_middleware());

    let health_state = web::Data::new(HealthState::new());
    let server =
        create_server(health_state.clone(), config).wrap_err("failed to start server")?;
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested; failing health probes while draining");
            health_state.mark_draining();
        }
    });
    info!(%bind_addr, "docket listening");
    server.await.wrap_err("server terminated")
}

async fn connect(config: PoolConfig) -> Result<DbPool> {
    let migration_url = config.database_url().to_owned();
    let applied = tokio::task::spawn_blocking(move || run_migrations(&migration_url))
        .await
        .wrap_err("migration task panicked")?
        .wrap_err("failed to apply migrations")?;
    info!(applied, "database migrations applied");
    DbPool::new(config)
        .await
        .wrap_err("failed to connect to the database")
}
