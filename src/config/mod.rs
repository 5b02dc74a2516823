use anyhow::Error;
use confique::Config;
use std::{
    net::IpAddr,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

pub const DEFAULT_SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Config)]
pub struct TiltedConfig {
    #[config(env = "TILTED_PORT", default = 8080)]
    pub port: u16,
    #[config(env = "TILTED_ENDPOINT", default = "127.0.0.1")]
    pub endpoint: IpAddr,

    #[config(env = "TILTED_HTTP_BODY_LIMIT", default = "1mb")]
    pub http_body_limit: String,

    #[config(env = "TILTED_HTTP_SERVER_TIMEOUT_SECONDS", default = 30)]
    pub http_server_timeout_seconds: u64,

    #[config(
        env = "TILTED_STORAGE_CONNECTION_STRING",
        default = "sqlite://tilted.db"
    )]
    pub storage_connection_string: String,

    /// Lookback of a readings query without `hours`.
    #[config(env = "TILTED_DEFAULT_WINDOW_HOURS", default = 24)]
    pub default_window_hours: u32,

    #[config(env = "TILTED_MAX_WINDOW_HOURS", default = 8760)]
    pub max_window_hours: u32,

    /// Directory of the web frontend, served for every unknown route.
    #[config(env = "TILTED_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    #[config(env = "TILTED_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

impl TiltedConfig {
    pub fn load() -> Result<TiltedConfig, Error> {
        Self::load_from(DEFAULT_SETTINGS_FILE)
    }

    /// Environment variables take precedence over the settings file,
    /// which may be missing.
    pub fn load_from(settings_file: impl AsRef<Path>) -> Result<TiltedConfig, Error> {
        let c = TiltedConfig::builder()
            .env()
            .file(settings_file.as_ref())
            .load()?;

        if c.default_window_hours > c.max_window_hours {
            anyhow::bail!(
                "Default window ({}h) exceeds the maximum window ({}h)",
                c.default_window_hours,
                c.max_window_hours
            );
        }

        Ok(c)
    }

    pub fn parse_http_body_limit(&self) -> Result<usize, Error> {
        let size = byte_unit::Byte::parse_str(self.http_body_limit.clone(), true)?.as_u64();
        if size > 128 * 1024 * 1024 * 1024 {
            anyhow::bail!("Body size is too big: > 128GB");
        }
        Ok(size as usize)
    }
}

static TILTED_CONFIG: OnceLock<Arc<TiltedConfig>> = OnceLock::new();

pub fn load_configuration(settings_file: impl AsRef<Path>) -> Result<Arc<TiltedConfig>, Error> {
    if let Some(config) = TILTED_CONFIG.get() {
        return Ok(config.clone());
    }

    let config = TiltedConfig::load_from(settings_file)?;
    Ok(TILTED_CONFIG.get_or_init(|| Arc::new(config)).clone())
}
