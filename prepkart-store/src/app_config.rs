use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub gateway: GatewayConfig,
    pub session: SessionConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Publishable key for the hosted checkout widget.
    pub key_id: String,
    pub merchant_name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub theme_color: Option<String>,
    /// How long a checkout attempt waits on the widget before failing.
    #[serde(default = "default_checkout_timeout")]
    pub checkout_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Path of the local session file.
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub upload_base_url: String,
    pub default_image: String,
}

fn default_api_timeout() -> u64 {
    30
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_checkout_timeout() -> u64 {
    600
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file that shouldn't be checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of PREPKART)
            // E.g. `PREPKART_API__BASE_URL=...` would set `api.base_url`
            .add_source(config::Environment::with_prefix("PREPKART").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
