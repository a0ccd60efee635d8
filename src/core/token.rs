//! Purpose: Decode three-part `header.payload.signature` tokens into JSON values.
//! Exports: `decode_token`, `encode_segment`, `TokenRecord`.
//! Role: Pure decoder for the token text served behind a Pix payload URL.
//! Invariants: A segment count other than 3 is `Ok(None)`, never an error.
//! Invariants: Base64 or JSON failures in the first two segments are `MalformedToken`.
//! Invariants: The signature is passed through verbatim and never verified.
use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::Serialize;
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::json::parse;

// Matches browser `atob`: padding optional and stray trailing bits tolerated.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TokenRecord {
    pub header: Value,
    pub payload: Value,
    pub signature: String,
}

#[derive(Clone, Copy, Debug)]
enum Segment {
    Header,
    Payload,
}

impl Segment {
    fn label(self) -> &'static str {
        match self {
            Segment::Header => "header",
            Segment::Payload => "payload",
        }
    }
}

pub fn decode_token(token: &str) -> Result<Option<TokenRecord>, Error> {
    let parts: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = parts.as_slice() else {
        return Ok(None);
    };

    Ok(Some(TokenRecord {
        header: decode_segment(header, Segment::Header)?,
        payload: decode_segment(payload, Segment::Payload)?,
        signature: (*signature).to_string(),
    }))
}

/// Encode a JSON value as an unpadded base64url token segment.
pub fn encode_segment(value: &Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string())
}

fn decode_segment(segment: &str, which: Segment) -> Result<Value, Error> {
    let standard: String = segment
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let bytes = SEGMENT_ENGINE.decode(standard.as_bytes()).map_err(|err| {
        Error::new(ErrorKind::MalformedToken)
            .with_message(format!("token {} is not valid base64", which.label()))
            .with_source(err)
    })?;

    parse::from_slice(&bytes).map_err(|err| {
        let context = format!("token.{}", which.label());
        Error::new(ErrorKind::MalformedToken)
            .with_message(format!("token {} is not valid json", which.label()))
            .with_hint(parse::hint_for_error(&err, &context))
            .with_source(err)
    })
}
