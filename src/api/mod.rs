//! Purpose: Define the stable public Rust API boundary for pixpeek.
//! Exports: Decoders, their result types, the fetch collaborator, and the resolver.
//! Role: Public, additive-only surface used by the CLI and library callers.
//! Invariants: Decoders re-exported here are pure; only `fetch` touches the network.

mod fetch;
mod resolve;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::pix::{
    MERCHANT_ACCOUNT_TAGS, PAYLOAD_URL_SUBTAG, PixUrlMatch, candidate_tags, find_pix_url, pix_url,
};
pub use crate::core::tlv::{
    Framing, TlvField, TlvFields, TlvMap, decode_tlv, decode_tlv_strict, encode_field, fields,
};
pub use crate::core::token::{TokenRecord, decode_token, encode_segment};
pub use fetch::{DEFAULT_SCHEME, DEFAULT_TIMEOUT, FetchOptions, HttpTokenSource, TokenSource};
pub use resolve::{Resolution, fetch_token_text, locate_url, resolve_payload};
