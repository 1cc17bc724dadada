use std::str::FromStr;

use serde::Deserialize;
use serde_with::serde_as;
use strum::{Display, EnumString};

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub search: SearchDefaults,
    pub rate_limit: RateLimitSettings,
    pub courier: CourierSettings,
}

#[serde_as]
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub port: u16,
    pub host: String,
    pub app_url: String,
    pub allowed_origin_suffix: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub uri: String,
    pub database_name: String,
}

/// Discovery defaults. Handlers never hardcode these, they are threaded
/// through the parameter layer so every list endpoint clamps the same way.
#[derive(Deserialize, Clone, Copy, Debug)]
pub struct SearchDefaults {
    pub default_radius_m: f64,
    pub max_radius_m: f64,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

#[derive(Deserialize, Clone, Copy, Debug)]
pub struct RateLimitSettings {
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CourierSettings {
    pub base_url: String,
    pub api_key: String,
    pub enabled: bool,
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .expect("Failed to parse APP_ENVIRONMENT");
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(
            config_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("VIORA")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Display, Debug, EnumString)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
