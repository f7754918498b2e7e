use appkit::color_eyre::eyre::Context;
use db::setup_db_pool;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub base_url: Url,
}

impl AppConfig {
    #[instrument(name = "AppConfig::from_env")]
    pub fn from_env() -> appkit::Result<Self> {
        let base_url = std::env::var("APP_BASE_URL")
            .wrap_err("Missing APP_BASE_URL, needed for app launch")?;
        let base_url = Url::parse(&base_url).wrap_err("Invalid APP_BASE_URL not parsable")?;
        Ok(Self { base_url })
    }

    /// Absolute URL for `path`, with an optional query string.
    pub fn app_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = self.base_url.clone();

        url.set_path(path);
        url.set_query(query);

        url.into()
    }
}

#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub package_version: &'static str,
}

impl VersionInfo {
    #[instrument(name = "VersionInfo::from_env")]
    pub(crate) fn from_env() -> Self {
        Self {
            package_version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AppState {
    pub app: AppConfig,
    pub versions: VersionInfo,
    pub db: PgPool,
}

impl AppState {
    #[instrument(name = "AppState::from_env", err)]
    pub async fn from_env() -> appkit::Result<Self> {
        let app_state = AppState {
            app: AppConfig::from_env()?,
            versions: VersionInfo::from_env(),
            db: setup_db_pool().await?,
        };

        Ok(app_state)
    }
}

impl appkit::app_state::AppState for AppState {
    fn version(&self) -> &str {
        self.versions.package_version
    }

    fn db(&self) -> &sqlx::PgPool {
        &self.db
    }
}
