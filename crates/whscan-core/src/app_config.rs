use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub warehouses_path: PathBuf,
    pub data_dir: PathBuf,
    /// URL template for warehouse-number enumeration; `{id}` is substituted.
    pub enumerate_url_template: String,
    /// URL template for product markdown detection; `{id}` is substituted.
    pub markdown_url_template: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Raw `Cookie` header value sent with every request, if set.
    pub session_cookie: Option<String>,
    pub concurrency: usize,
    pub batch_delay_ms: u64,
    pub batch_jitter_ms: u64,
    /// Save the checkpoint every `checkpoint_every` processed identifiers.
    pub checkpoint_every: usize,
    pub shutdown_grace_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Minimum body length (inclusive) for an enumeration page to count as valid.
    pub valid_body_min_bytes: usize,
}

impl AppConfig {
    /// Default checkpoint path for a scan kind, e.g. `data/enumerate.checkpoint.json`.
    #[must_use]
    pub fn default_checkpoint_path(&self, kind: &str) -> PathBuf {
        self.data_dir.join(format!("{kind}.checkpoint.json"))
    }

    /// Default results path for a scan kind, e.g. `data/enumerate.results.json`.
    #[must_use]
    pub fn default_output_path(&self, kind: &str) -> PathBuf {
        self.data_dir.join(format!("{kind}.results.json"))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("warehouses_path", &self.warehouses_path)
            .field("data_dir", &self.data_dir)
            .field("enumerate_url_template", &self.enumerate_url_template)
            .field("markdown_url_template", &self.markdown_url_template)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[redacted]"),
            )
            .field("concurrency", &self.concurrency)
            .field("batch_delay_ms", &self.batch_delay_ms)
            .field("batch_jitter_ms", &self.batch_jitter_ms)
            .field("checkpoint_every", &self.checkpoint_every)
            .field("shutdown_grace_secs", &self.shutdown_grace_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("valid_body_min_bytes", &self.valid_body_min_bytes)
            .finish()
    }
}
