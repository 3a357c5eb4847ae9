//! Service settings loaded via OrthoConfig from CLI arguments, `DOCKET_*`
//! environment variables and configuration files.

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};

use docket::domain::SettlementConfig;
use docket::outbound::persistence::PoolConfig;
use docket::outbound::stripe::DEFAULT_STRIPE_API_BASE;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_CURRENCY: &str = "sgd";
const DEFAULT_STORAGE_ROOT: &str = "./storage";
const DEFAULT_STORAGE_PUBLIC_URL: &str = "http://localhost:8080/files/raw";

/// Runtime settings for the docket service.
///
/// Every value is optional; accessors apply the defaults so an empty
/// environment starts a self-contained development server backed by the
/// in-memory store and the fixture payment gateway.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DOCKET")]
pub struct DocketSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; absent selects the in-memory store.
    pub database_url: Option<String>,
    /// Upper bound on pooled PostgreSQL connections.
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
    /// Client application base URL used for payment redirects.
    pub frontend_url: Option<String>,
    /// Stripe secret key; absent selects the fixture gateway.
    pub stripe_secret_key: Option<String>,
    /// Stripe API origin, overridable for tests.
    pub stripe_api_base: Option<String>,
    /// Webhook signing secret; absent rejects every webhook.
    pub stripe_webhook_secret: Option<String>,
    /// Lower-case ISO 4217 currency for payable links.
    pub currency: Option<String>,
    /// Directory holding uploaded case files.
    pub storage_root: Option<PathBuf>,
    /// Public base URL for signed file links.
    pub storage_public_url: Option<String>,
    /// HMAC secret for signed file links; random per process when absent.
    pub storage_signing_secret: Option<String>,
    /// WebSocket origins, as a list or one comma-separated string.
    #[serde(default, deserialize_with = "origin_list")]
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OriginList {
    Joined(String),
    Split(Vec<String>),
}

/// The env layer splits `a,b` into a sequence but leaves `a` a string.
fn origin_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(
        Option::<OriginList>::deserialize(deserializer)?.map(|origins| match origins {
            OriginList::Joined(raw) => raw.split(',').map(str::to_owned).collect(),
            OriginList::Split(list) => list,
        }),
    )
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|raw| raw.trim()).filter(|raw| !raw.is_empty())
}

impl DocketSettings {
    /// Parsed bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        non_blank(self.bind_addr.as_ref())
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
    }

    pub fn database_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_ref())
    }

    /// Pool settings when a database is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        Some(PoolConfig::new(self.database_url()?).with_max_size(self.db_max_connections))
    }

    pub fn stripe_secret_key(&self) -> Option<&str> {
        non_blank(self.stripe_secret_key.as_ref())
    }

    pub fn stripe_api_base(&self) -> &str {
        non_blank(self.stripe_api_base.as_ref()).unwrap_or(DEFAULT_STRIPE_API_BASE)
    }

    pub fn stripe_webhook_secret(&self) -> Option<&str> {
        non_blank(self.stripe_webhook_secret.as_ref())
    }

    pub fn storage_root(&self) -> PathBuf {
        self.storage_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT))
    }

    pub fn storage_public_url(&self) -> &str {
        non_blank(self.storage_public_url.as_ref()).unwrap_or(DEFAULT_STORAGE_PUBLIC_URL)
    }

    pub fn storage_signing_secret(&self) -> Option<&str> {
        non_blank(self.storage_signing_secret.as_ref())
    }

    /// WebSocket origins with blanks dropped; the frontend URL when none remain.
    pub fn allowed_origins(&self) -> Vec<String> {
        let origins: Vec<String> = self
            .allowed_origins
            .iter()
            .flatten()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();
        if origins.is_empty() {
            vec![DEFAULT_FRONTEND_URL.to_owned()]
        } else {
            origins
        }
    }

    /// Currency and redirect base for payable links.
    pub fn settlement(&self) -> SettlementConfig {
        SettlementConfig {
            currency: non_blank(self.currency.as_ref())
                .unwrap_or(DEFAULT_CURRENCY)
                .to_ascii_lowercase(),
            frontend_url: non_blank(self.frontend_url.as_ref())
                .unwrap_or(DEFAULT_FRONTEND_URL)
                .trim_end_matches('/')
                .to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 12] = [
        "DOCKET_BIND_ADDR",
        "DOCKET_DATABASE_URL",
        "DOCKET_DB_MAX_CONNECTIONS",
        "DOCKET_FRONTEND_URL",
        "DOCKET_STRIPE_SECRET_KEY",
        "DOCKET_STRIPE_API_BASE",
        "DOCKET_STRIPE_WEBHOOK_SECRET",
        "DOCKET_CURRENCY",
        "DOCKET_STORAGE_ROOT",
        "DOCKET_STORAGE_PUBLIC_URL",
        "DOCKET_STORAGE_SIGNING_SECRET",
        "DOCKET_ALLOWED_ORIGINS",
    ];

    fn load_from_empty_args() -> DocketSettings {
        DocketSettings::load_from_iter([OsString::from("docket")]).expect("config should load")
    }

    fn cleared_except(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_are_used_when_missing() {
        let _guard = lock_env(cleared_except(&[]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default parses"),
            "0.0.0.0:8080".parse().expect("socket address")
        );
        assert!(settings.database_url().is_none());
        assert!(settings.pool_config().is_none());
        assert!(settings.stripe_secret_key().is_none());
        assert!(settings.stripe_webhook_secret().is_none());
        assert_eq!(settings.stripe_api_base(), DEFAULT_STRIPE_API_BASE);
        assert_eq!(settings.storage_root(), PathBuf::from("./storage"));
        assert_eq!(settings.allowed_origins(), vec!["http://localhost:3000"]);
        assert_eq!(settings.settlement(), SettlementConfig::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_except(&[
            ("DOCKET_BIND_ADDR", "127.0.0.1:9000"),
            ("DOCKET_DATABASE_URL", "postgres://localhost/docket"),
            ("DOCKET_DB_MAX_CONNECTIONS", "4"),
            ("DOCKET_FRONTEND_URL", "https://app.docket.example/"),
            ("DOCKET_CURRENCY", "USD"),
            ("DOCKET_STRIPE_SECRET_KEY", "sk_test_123"),
            (
                "DOCKET_ALLOWED_ORIGINS",
                "https://app.docket.example, http://localhost:5173,",
            ),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("override parses"),
            "127.0.0.1:9000".parse().expect("socket address")
        );
        assert_eq!(settings.database_url(), Some("postgres://localhost/docket"));
        let pool = settings.pool_config().expect("pool configured");
        assert_eq!(pool.database_url(), "postgres://localhost/docket");
        assert_eq!(pool.max_size(), 4);
        assert_eq!(settings.stripe_secret_key(), Some("sk_test_123"));
        assert_eq!(
            settings.allowed_origins(),
            vec!["https://app.docket.example", "http://localhost:5173"]
        );
        let settlement = settings.settlement();
        assert_eq!(settlement.currency, "usd");
        assert_eq!(settlement.frontend_url, "https://app.docket.example");
    }

    #[rstest]
    fn blank_values_fall_back_to_defaults() {
        let _guard = lock_env(cleared_except(&[
            ("DOCKET_DATABASE_URL", "  "),
            ("DOCKET_STRIPE_WEBHOOK_SECRET", ""),
        ]));

        let settings = load_from_empty_args();
        assert!(settings.database_url().is_none());
        assert!(settings.stripe_webhook_secret().is_none());
    }

    #[rstest]
    fn single_origin_loads_without_a_comma() {
        let _guard = lock_env(cleared_except(&[(
            "DOCKET_ALLOWED_ORIGINS",
            "https://app.docket.example",
        )]));

        assert_eq!(
            load_from_empty_args().allowed_origins(),
            vec!["https://app.docket.example"]
        );
    }

    #[rstest]
    fn pool_size_defaults_when_unset() {
        let _guard = lock_env(cleared_except(&[(
            "DOCKET_DATABASE_URL",
            "postgres://localhost/docket",
        )]));

        let settings = load_from_empty_args();
        assert_eq!(settings.db_max_connections, 10);
        assert_eq!(settings.pool_config().expect("pool configured").max_size(), 10);
    }

    #[rstest]
    fn malformed_bind_address_is_reported() {
        let _guard = lock_env(cleared_except(&[("DOCKET_BIND_ADDR", "not-an-addr")]));
        assert!(load_from_empty_args().bind_addr().is_err());
    }
}
