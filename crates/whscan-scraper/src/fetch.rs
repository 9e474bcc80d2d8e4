//! One GET per identifier against a fixed URL template.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use whscan_core::{AppConfig, Identifier};

use crate::error::{FetchError, ScraperError};
use crate::template::UrlTemplate;

/// Status and body of a fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: u16,
    /// Length of the raw body in bytes (before any lossy UTF-8 decoding).
    pub body_length: usize,
    pub body: String,
}

impl FetchedPage {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            status,
            body_length: body.len(),
            body,
        }
    }
}

/// Source of pages for the worker pool.
///
/// Implementations must not retry internally and must not touch shared scan
/// state; retry policy and bookkeeping belong to the pool.
pub trait Fetcher: Send + Sync {
    /// The URL that [`Fetcher::fetch`] requests for `identifier`.
    fn url_for(&self, identifier: &Identifier) -> String;

    fn fetch(
        &self,
        identifier: &Identifier,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct FetcherOptions {
    pub template: UrlTemplate,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub session_cookie: Option<String>,
}

impl FetcherOptions {
    /// Fetcher settings from the shared config, for the given template.
    #[must_use]
    pub fn from_config(config: &AppConfig, template: UrlTemplate) -> Self {
        Self {
            template,
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            session_cookie: config.session_cookie.clone(),
        }
    }
}

/// `reqwest`-backed fetcher. One instance owns the session (headers and
/// cookie jar) for a whole run and is shared by every worker.
pub struct HttpFetcher {
    client: Client,
    template: UrlTemplate,
}

impl HttpFetcher {
    /// Creates the shared HTTP session.
    ///
    /// Redirects are not followed: the enumeration target answers unknown
    /// identifiers with a redirect or a fixed-size page, and the classifier
    /// needs to see that response as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidHeader`] for an unusable cookie value
    /// and [`ScraperError::Http`] if the client cannot be constructed.
    pub fn new(options: FetcherOptions) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        if let Some(cookie) = &options.session_cookie {
            let value =
                HeaderValue::from_str(cookie).map_err(|e| ScraperError::InvalidHeader {
                    name: "cookie".to_owned(),
                    reason: e.to_string(),
                })?;
            headers.insert(reqwest::header::COOKIE, value);
        }

        let timeout = Duration::from_secs(options.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(options.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            template: options.template,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn url_for(&self, identifier: &Identifier) -> String {
        self.template.render(identifier)
    }

    async fn fetch(&self, identifier: &Identifier) -> Result<FetchedPage, FetchError> {
        let url = self.url_for(identifier);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited { retry_after_secs });
        }

        let bytes = response.bytes().await?;
        let body_length = bytes.len();
        let body = String::from_utf8_lossy(&bytes).into_owned();

        tracing::debug!(
            %identifier,
            status = status.as_u16(),
            body_length,
            "fetched page"
        );

        Ok(FetchedPage {
            status: status.as_u16(),
            body_length,
            body,
        })
    }
}
