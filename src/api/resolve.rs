//! Purpose: Compose payload extraction, token fetch, and token decoding end to end.
//! Exports: `locate_url`, `fetch_token_text`, `resolve_payload`, `Resolution`.
//! Role: Turns "no result" signals from the pure decoders into explicit errors.
//! Invariants: Empty payload is `Usage`; no payload URL is `NotFound`.
//! Invariants: Token text without three segments is `MalformedToken` at this layer.
#![allow(clippy::result_large_err)]

use serde::Serialize;
use tracing::debug;

use super::fetch::TokenSource;
use crate::core::error::{Error, ErrorKind};
use crate::core::pix::{MERCHANT_ACCOUNT_TAGS, PixUrlMatch, find_pix_url};
use crate::core::token::{TokenRecord, decode_token};

type ApiResult<T> = Result<T, Error>;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resolution {
    /// Merchant account template tag that carried the URL.
    pub tag: String,
    pub url: String,
    pub token: TokenRecord,
}

/// Find the payload URL, treating absence as an error. Surrounding whitespace is ignored.
pub fn locate_url(payload: &str) -> ApiResult<PixUrlMatch> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("payload is empty")
            .with_hint("Pass the Pix copy-and-paste string as an argument or on stdin."));
    }
    find_pix_url(Some(payload)).ok_or_else(|| {
        Error::new(ErrorKind::NotFound)
            .with_message("no payload url found")
            .with_hint(format!(
                "Expected sub-tag 25 inside a template tag {}..={}; static Pix codes carry no url.",
                MERCHANT_ACCOUNT_TAGS.start(),
                MERCHANT_ACCOUNT_TAGS.end()
            ))
    })
}

pub fn fetch_token_text(
    payload: &str,
    source: &dyn TokenSource,
) -> ApiResult<(PixUrlMatch, String)> {
    let found = locate_url(payload)?;
    debug!(tag = %found.tag, url = %found.url, "payload url located");
    let text = source.fetch_token(&found.url)?;
    Ok((found, text))
}

pub fn resolve_payload(payload: &str, source: &dyn TokenSource) -> ApiResult<Resolution> {
    let (found, text) = fetch_token_text(payload, source)?;
    let token = decode_token(&text)?.ok_or_else(|| {
        Error::new(ErrorKind::MalformedToken)
            .with_message("fetched token does not have three dot-separated segments")
            .with_tag(found.tag.clone())
    })?;
    Ok(Resolution {
        tag: found.tag,
        url: found.url,
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::{TokenSource, fetch_token_text, locate_url, resolve_payload};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::tlv::encode_field;
    use crate::core::token::encode_segment;
    use serde_json::json;
    use std::cell::RefCell;

    struct FixedSource {
        body: Result<String, ErrorKind>,
        requested: RefCell<Vec<String>>,
    }

    impl FixedSource {
        fn ok(body: impl Into<String>) -> Self {
            Self {
                body: Ok(body.into()),
                requested: RefCell::new(Vec::new()),
            }
        }

        fn failing(kind: ErrorKind) -> Self {
            Self {
                body: Err(kind),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl TokenSource for FixedSource {
        fn fetch_token(&self, target: &str) -> Result<String, Error> {
            self.requested.borrow_mut().push(target.to_string());
            self.body
                .clone()
                .map_err(|kind| Error::new(kind).with_message("HTTP 404"))
        }
    }

    fn payload_with_url(url: &str) -> String {
        let template = encode_field("25", url).expect("encode");
        format!(
            "{}{}{}",
            encode_field("00", "01").expect("encode"),
            encode_field("26", &template).expect("encode"),
            encode_field("53", "986").expect("encode"),
        )
    }

    #[test]
    fn locate_rejects_empty_payload() {
        let err = locate_url("  \n").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn locate_reports_missing_url() {
        let err = locate_url("000201").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.hint().unwrap_or_default().contains("26..=51"));
    }

    #[test]
    fn resolve_fetches_and_decodes() {
        let token = format!(
            "{}.{}.sig",
            encode_segment(&json!({"alg": "PS256"})),
            encode_segment(&json!({"valor": {"original": "10.00"}}))
        );
        let source = FixedSource::ok(token);
        let payload = payload_with_url("pix.example.com/cob/1");

        let resolution = resolve_payload(&format!(" {payload}\n"), &source).expect("resolve");
        assert_eq!(resolution.tag, "26");
        assert_eq!(resolution.url, "pix.example.com/cob/1");
        assert_eq!(resolution.token.payload["valor"]["original"], "10.00");
        assert_eq!(resolution.token.signature, "sig");
        assert_eq!(
            source.requested.borrow().as_slice(),
            ["pix.example.com/cob/1".to_string()]
        );
    }

    #[test]
    fn resolve_rejects_token_without_three_segments() {
        let source = FixedSource::ok("<html>not a token</html>");
        let err = resolve_payload(&payload_with_url("pix.example.com/x"), &source)
            .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::MalformedToken);
    }

    #[test]
    fn resolve_propagates_fetch_errors() {
        let source = FixedSource::failing(ErrorKind::NotFound);
        let err = resolve_payload(&payload_with_url("pix.example.com/x"), &source)
            .expect_err("err");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), Some("HTTP 404"));
    }

    #[test]
    fn missing_url_never_fetches() {
        let source = FixedSource::ok("a.b.c");
        let err = fetch_token_text("000201", &source).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(source.requested.borrow().is_empty());
    }
}
