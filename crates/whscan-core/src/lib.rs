pub mod app_config;
pub mod config;
pub mod identifier;
pub mod records;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::load_app_config;
pub use identifier::Identifier;
pub use records::{Classification, FetchResult, PageDetails, PriceCode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
