//! HTTP client initialization.
//!
//! This module builds the `reqwest::Client` shared by every call to the
//! analysis backend.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::ClientBuilder;
use url::Url;

use crate::config::ClientConfig;
use crate::error_handling::InitializationError;

/// Initializes the HTTP client for the analysis backend.
///
/// Creates a `reqwest::Client` configured with:
/// - Timeout from the configuration (30s by default)
/// - JSON `Accept` and `Content-Type` default headers
/// - A crate-specific User-Agent
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_client(config: &ClientConfig) -> Result<Arc<reqwest::Client>, InitializationError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = ClientBuilder::new()
        .timeout(config.request_timeout)
        .connect_timeout(config.request_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .default_headers(headers)
        .build()?;
    Ok(Arc::new(client))
}

/// Parses and checks the configured backend base URL.
///
/// The result always ends with `/` so endpoint paths can be joined onto it
/// without dropping the version prefix.
///
/// # Errors
///
/// Returns `InitializationError::InvalidBaseUrl` when the URL does not parse
/// or does not use http/https.
pub fn parse_base_url(config: &ClientConfig) -> Result<Url, InitializationError> {
    let raw = config.base_url();
    let invalid = |reason: String| InitializationError::InvalidBaseUrl {
        url: raw.clone(),
        reason,
    };

    let mut url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("unsupported scheme '{}'", scheme))),
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client_with_defaults() {
        assert!(init_client(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_parse_base_url_appends_trailing_slash() {
        let url = parse_base_url(&ClientConfig::default()).expect("default is valid");
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/");
        assert_eq!(
            url.join("seo-reports/5").expect("joinable").as_str(),
            "http://localhost:8000/api/v1/seo-reports/5"
        );
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let config = ClientConfig {
            api_url: "not a url".into(),
            ..Default::default()
        };
        assert!(matches!(
            parse_base_url(&config),
            Err(InitializationError::InvalidBaseUrl { .. })
        ));

        let config = ClientConfig {
            api_url: "ftp://files.example.com".into(),
            ..Default::default()
        };
        assert!(parse_base_url(&config).is_err());
    }
}
