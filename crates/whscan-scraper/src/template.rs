//! URL templates with a single `{id}` placeholder.

use whscan_core::Identifier;

use crate::error::ScraperError;

const PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Validates `template` up front so a bad value fails at startup, not on
    /// the first request.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidTemplate`] when the placeholder is
    /// missing or the rendered URL is not an absolute `http(s)` URL.
    pub fn parse(template: &str) -> Result<Self, ScraperError> {
        let invalid = |reason: String| ScraperError::InvalidTemplate {
            template: template.to_owned(),
            reason,
        };

        if !template.contains(PLACEHOLDER) {
            return Err(invalid(format!("missing {PLACEHOLDER} placeholder")));
        }

        let probe = template.replace(PLACEHOLDER, "1");
        let url = reqwest::Url::parse(&probe).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme \"{}\"", url.scheme())));
        }

        Ok(Self(template.to_owned()))
    }

    #[must_use]
    pub fn render(&self, identifier: &Identifier) -> String {
        self.0.replace(PLACEHOLDER, identifier.as_str())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_identifier_into_path() {
        let t = UrlTemplate::parse("https://example.com/store/xxx-{id}").unwrap();
        assert_eq!(
            t.render(&Identifier::from(428u32)),
            "https://example.com/store/xxx-428"
        );
    }

    #[test]
    fn rejects_missing_placeholder() {
        let err = UrlTemplate::parse("https://example.com/store").unwrap_err();
        assert!(matches!(err, ScraperError::InvalidTemplate { .. }));
    }

    #[test]
    fn rejects_relative_and_non_http_urls() {
        assert!(UrlTemplate::parse("/store/{id}").is_err());
        assert!(UrlTemplate::parse("ftp://example.com/{id}").is_err());
    }
}
