//! Purpose: Retrieve token text from the location embedded in a Pix payload.
//! Exports: `TokenSource`, `HttpTokenSource`, `FetchOptions`.
//! Role: The only network-facing piece; decoders stay pure and take its output.
//! Invariants: Target URL is `<scheme>://<extracted string>`; scheme is http or https.
//! Invariants: Non-2xx responses map to `ErrorKind` by status; bodies are trimmed.
//! Notes: No retries; a single request bounded by `FetchOptions::timeout`.
#![allow(clippy::result_large_err)]

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::core::error::{Error, ErrorKind};

type ApiResult<T> = Result<T, Error>;

pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of token text for a payload location (scheme-less URL as found in the payload).
pub trait TokenSource {
    fn fetch_token(&self, target: &str) -> ApiResult<String>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchOptions {
    pub scheme: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("pixpeek/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchOptions {
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Clone)]
pub struct HttpTokenSource {
    options: FetchOptions,
    agent: ureq::Agent,
}

impl HttpTokenSource {
    pub fn new() -> Self {
        Self::with_options(FetchOptions::default())
    }

    pub fn with_options(options: FetchOptions) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(options.timeout)
            .user_agent(&options.user_agent)
            .build();
        Self { options, agent }
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn target_url(&self, target: &str) -> ApiResult<Url> {
        target_url(&self.options.scheme, target)
    }
}

impl Default for HttpTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for HttpTokenSource {
    fn fetch_token(&self, target: &str) -> ApiResult<String> {
        let url = self.target_url(target)?;
        debug!(%url, "fetching token");
        let response = self
            .agent
            .get(url.as_str())
            .set("Accept", "application/jwt, text/plain, */*")
            .call();

        match response {
            Ok(resp) => {
                debug!(status = resp.status(), "token response");
                read_body(resp)
            }
            Err(ureq::Error::Status(code, _)) => Err(Error::new(error_kind_from_status(code))
                .with_message(format!("HTTP {code}"))
                .with_hint(format!("The payload location {url} rejected the request."))),
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

fn target_url(scheme: &str, target: &str) -> ApiResult<Url> {
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("unsupported fetch scheme {scheme:?}"))
            .with_hint("Use http or https."));
    }
    let target = target.trim();
    if target.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("payload location is empty"));
    }
    Url::parse(&format!("{scheme}://{target}")).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("payload location is not a valid url")
            .with_source(err)
    })
}

fn read_body(response: ureq::Response) -> ApiResult<String> {
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    Ok(body.trim().to_string())
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 => ErrorKind::Usage,
        401 | 403 => ErrorKind::Permission,
        404 | 410 => ErrorKind::NotFound,
        500..=599 => ErrorKind::Internal,
        _ => ErrorKind::Io,
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, FetchOptions, HttpTokenSource, error_kind_from_status, target_url};
    use std::time::Duration;

    #[test]
    fn target_url_prefixes_scheme() {
        let url = target_url("https", "pix.example.com/qr/v2/abc").expect("url");
        assert_eq!(url.as_str(), "https://pix.example.com/qr/v2/abc");
    }

    #[test]
    fn target_url_rejects_unknown_scheme() {
        let err = target_url("ftp", "pix.example.com").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn target_url_rejects_empty_and_invalid_targets() {
        let err = target_url("https", "  ").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = target_url("https", "[::1").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn status_mapping_is_stable() {
        assert_eq!(error_kind_from_status(400), ErrorKind::Usage);
        assert_eq!(error_kind_from_status(403), ErrorKind::Permission);
        assert_eq!(error_kind_from_status(404), ErrorKind::NotFound);
        assert_eq!(error_kind_from_status(503), ErrorKind::Internal);
        assert_eq!(error_kind_from_status(418), ErrorKind::Io);
    }

    #[test]
    fn options_builders_apply() {
        let options = FetchOptions::default()
            .with_scheme("http")
            .with_timeout(Duration::from_millis(250));
        let source = HttpTokenSource::with_options(options.clone());
        assert_eq!(source.options(), &options);
        assert!(source.options().user_agent.starts_with("pixpeek/"));
        assert_eq!(
            source.target_url("127.0.0.1:9/x").expect("url").as_str(),
            "http://127.0.0.1:9/x"
        );
    }
}
