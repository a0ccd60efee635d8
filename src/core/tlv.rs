//! Purpose: Decode EMV-style `<tag><len><value>` text records (Pix copy-and-paste payloads).
//! Exports: `decode_tlv`, `decode_tlv_strict`, `fields`, `encode_field`, `TlvField`, `TlvMap`.
//! Role: Flat, single-level decoder; nested templates are decoded by callers.
//! Invariants: Tags are 2 characters and lengths 2 decimal digits; sizes count characters.
//! Invariants: Duplicate tags resolve last-write-wins in `TlvMap`.
//! Invariants: Lenient decoding never fails; short values are truncated to what remains.
use std::collections::HashMap;

use crate::core::error::{Error, ErrorKind};

pub const TAG_LEN: usize = 2;
pub const LENGTH_LEN: usize = 2;
pub const HEADER_LEN: usize = TAG_LEN + LENGTH_LEN;
pub const MAX_VALUE_LEN: usize = 99;

pub type TlvMap = HashMap<String, String>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Framing {
    /// Header and the full declared value were present.
    Complete,
    /// Declared length ran past the end of the input.
    Truncated,
    /// Length field missing or not numeric; decoding stops after this field.
    BadLength,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TlvField {
    pub tag: String,
    /// Declared length, `None` when the length field did not parse.
    pub length: Option<usize>,
    pub value: String,
    /// Character offset of the tag within the decoded input.
    pub offset: usize,
    pub framing: Framing,
}

impl TlvField {
    pub fn is_complete(&self) -> bool {
        self.framing == Framing::Complete
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Truncation {
    Lenient,
    Strict,
}

/// Iterator over the records of a TLV string, in input order.
#[derive(Clone, Debug)]
pub struct TlvFields<'a> {
    rest: &'a str,
    offset: usize,
    done: bool,
}

pub fn fields(input: &str) -> TlvFields<'_> {
    TlvFields {
        rest: input,
        offset: 0,
        done: false,
    }
}

impl Iterator for TlvFields<'_> {
    type Item = TlvField;

    fn next(&mut self) -> Option<TlvField> {
        if self.done || self.rest.is_empty() {
            return None;
        }
        let offset = self.offset;
        let (tag, after_tag) = split_chars(self.rest, TAG_LEN);
        let (length_text, after_length) = split_chars(after_tag, LENGTH_LEN);

        let Some(length) = parse_length(length_text) else {
            self.done = true;
            self.rest = "";
            return Some(TlvField {
                tag: tag.to_string(),
                length: None,
                value: String::new(),
                offset,
                framing: Framing::BadLength,
            });
        };

        let (value, rest, truncated) = take_value(after_length, length);
        self.rest = rest;
        self.offset += HEADER_LEN + length;
        Some(TlvField {
            tag: tag.to_string(),
            length: Some(length),
            value: value.to_string(),
            offset,
            framing: if truncated {
                Framing::Truncated
            } else {
                Framing::Complete
            },
        })
    }
}

/// Decode a flat TLV string into a tag to value mapping.
///
/// Short trailing values are kept as-is and an unparseable length ends decoding, so this
/// never fails. Use [`decode_tlv_strict`] to reject those inputs instead.
pub fn decode_tlv(input: &str) -> TlvMap {
    // Lenient decoding cannot fail.
    decode_with(input, Truncation::Lenient).unwrap_or_default()
}

/// Like [`decode_tlv`], but fails with `TruncatedTlv` on any record that is not fully framed.
pub fn decode_tlv_strict(input: &str) -> Result<TlvMap, Error> {
    decode_with(input, Truncation::Strict)
}

fn decode_with(input: &str, policy: Truncation) -> Result<TlvMap, Error> {
    let mut map = TlvMap::new();
    for field in fields(input) {
        if policy == Truncation::Strict {
            check_framing(&field)?;
        }
        map.insert(field.tag, field.value);
    }
    Ok(map)
}

fn check_framing(field: &TlvField) -> Result<(), Error> {
    let message = match field.framing {
        Framing::Complete => return Ok(()),
        Framing::Truncated => "declared length exceeds remaining input",
        Framing::BadLength => "length field is missing or not numeric",
    };
    Err(Error::new(ErrorKind::TruncatedTlv)
        .with_message(message)
        .with_tag(field.tag.clone())
        .with_offset(field.offset))
}

/// Build one `tag + zero-padded length + value` record.
pub fn encode_field(tag: &str, value: &str) -> Result<String, Error> {
    if tag.len() != TAG_LEN || !tag.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("tag must be two decimal digits")
            .with_tag(tag));
    }
    let length = value.chars().count();
    if length > MAX_VALUE_LEN {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!(
                "value has {length} characters (max {MAX_VALUE_LEN})"
            ))
            .with_tag(tag));
    }
    Ok(format!("{tag}{length:02}{value}"))
}

// Reads the numeric prefix of the length field; leading zeros are fine.
fn parse_length(text: &str) -> Option<usize> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }
    text[..end].parse().ok()
}

// Single place where short values are tolerated; the flag lets strict callers reject them.
fn take_value(input: &str, length: usize) -> (&str, &str, bool) {
    let (value, rest) = split_chars(input, length);
    let truncated = rest.is_empty() && value.chars().count() < length;
    (value, rest, truncated)
}

fn split_chars(input: &str, count: usize) -> (&str, &str) {
    let idx = input
        .char_indices()
        .nth(count)
        .map(|(idx, _)| idx)
        .unwrap_or(input.len());
    input.split_at(idx)
}
