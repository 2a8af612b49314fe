pub mod app_config;
pub mod config;
pub mod model;
pub mod scraper_config;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use model::{ModelError, Priority, Signal, SignalType};
pub use scraper_config::{merge_configs, EffectiveConfig, ScraperConfig, KNOWN_SOURCES};
