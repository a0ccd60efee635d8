//! Purpose: Locate the dynamic-payload URL inside a Pix copy-and-paste string.
//! Exports: `pix_url`, `find_pix_url`, `candidate_tags`, `PixUrlMatch`, scan constants.
//! Role: Walks merchant-account templates (tags 26..=51) and reads sub-tag 25.
//! Invariants: Tags are scanned in ascending order; the first sub-tag 25 wins.
//! Invariants: Empty values are treated as absent at both levels.
//! Notes: The returned string is not validated as a URL; fetch callers own that.
use std::ops::RangeInclusive;

use crate::core::tlv::decode_tlv;

/// Merchant Account Information template tags reserved by the EMV QR layout.
pub const MERCHANT_ACCOUNT_TAGS: RangeInclusive<u8> = 26..=51;

/// Sub-tag carrying the payload location inside a merchant account template.
pub const PAYLOAD_URL_SUBTAG: &str = "25";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PixUrlMatch {
    /// Template tag the URL was found under.
    pub tag: String,
    pub url: String,
}

/// Candidate template tags as zero-padded two-digit strings, in scan order.
pub fn candidate_tags() -> impl Iterator<Item = String> {
    MERCHANT_ACCOUNT_TAGS.map(|tag| format!("{tag:02}"))
}

pub fn pix_url(payload: Option<&str>) -> Option<String> {
    find_pix_url(payload).map(|found| found.url)
}

pub fn find_pix_url(payload: Option<&str>) -> Option<PixUrlMatch> {
    let payload = payload.filter(|payload| !payload.is_empty())?;
    let root = decode_tlv(payload);

    for tag in candidate_tags() {
        let Some(template) = root.get(&tag).filter(|value| !value.is_empty()) else {
            continue;
        };
        let nested = decode_tlv(template);
        if let Some(url) = nested
            .get(PAYLOAD_URL_SUBTAG)
            .filter(|value| !value.is_empty())
        {
            return Some(PixUrlMatch {
                tag,
                url: url.clone(),
            });
        }
    }
    None
}
