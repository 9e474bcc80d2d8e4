use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_ENUMERATE_URL_TEMPLATE: &str = "https://app.warehouserunner.com/store/xxx-{id}";
pub const DEFAULT_MARKDOWN_URL_TEMPLATE: &str = "https://www.costco.com/.product.{id}.html";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// A `.env` file in the working directory, if present, is loaded first;
/// variables already set in the process take precedence over it.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let template = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        if raw.contains("{id}") {
            Ok(raw)
        } else {
            Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "template must contain an {id} placeholder".to_string(),
            })
        }
    };

    let bind_addr = parse_addr("WHSCAN_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("WHSCAN_LOG_LEVEL", "info");
    let warehouses_path = PathBuf::from(or_default(
        "WHSCAN_WAREHOUSES_PATH",
        "./data/warehouses.json",
    ));
    let data_dir = PathBuf::from(or_default("WHSCAN_DATA_DIR", "./data"));

    let enumerate_url_template = template(
        "WHSCAN_ENUMERATE_URL_TEMPLATE",
        DEFAULT_ENUMERATE_URL_TEMPLATE,
    )?;
    let markdown_url_template =
        template("WHSCAN_MARKDOWN_URL_TEMPLATE", DEFAULT_MARKDOWN_URL_TEMPLATE)?;

    let request_timeout_secs = parse_u64("WHSCAN_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("WHSCAN_USER_AGENT", DEFAULT_USER_AGENT);
    let session_cookie = lookup("WHSCAN_SESSION_COOKIE")
        .ok()
        .filter(|v| !v.trim().is_empty());

    let concurrency = parse_usize("WHSCAN_CONCURRENCY", "100")?.max(1);
    let batch_delay_ms = parse_u64("WHSCAN_BATCH_DELAY_MS", "1500")?;
    let batch_jitter_ms = parse_u64("WHSCAN_BATCH_JITTER_MS", "0")?;
    let checkpoint_every = parse_usize("WHSCAN_CHECKPOINT_EVERY", "50")?.max(1);
    let shutdown_grace_secs = parse_u64("WHSCAN_SHUTDOWN_GRACE_SECS", "5")?;
    let max_retries = parse_u32("WHSCAN_MAX_RETRIES", "0")?;
    let retry_backoff_base_ms = parse_u64("WHSCAN_RETRY_BACKOFF_BASE_MS", "500")?;
    let valid_body_min_bytes = parse_usize("WHSCAN_VALID_BODY_MIN_BYTES", "20001")?;

    Ok(AppConfig {
        bind_addr,
        log_level,
        warehouses_path,
        data_dir,
        enumerate_url_template,
        markdown_url_template,
        request_timeout_secs,
        user_agent,
        session_cookie,
        concurrency,
        batch_delay_ms,
        batch_jitter_ms,
        checkpoint_every,
        shutdown_grace_secs,
        max_retries,
        retry_backoff_base_ms,
        valid_body_min_bytes,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
