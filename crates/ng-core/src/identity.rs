//! Identity extraction
//!
//! Classifies hrefs and locations into channel handles or category slugs.
//! Both extractors are pure and never fail: anything that does not look like
//! a channel or category page is simply not an identity.

use crate::types::{CategorySlug, ChannelHandle};
use crate::url::{extract_path, percent_decode_strict};

const CHANNEL_MIN_LEN: usize = 3;
const CHANNEL_MAX_LEN: usize = 25;

const CATEGORY_PREFIX: &str = "/directory/category/";

/// Top-level site paths that look like channel names but are not.
pub const RESERVED_PATHS: &[&str] = &[
    "directory",
    "search",
    "settings",
    "subscriptions",
    "wallet",
    "inventory",
    "drops",
    "following",
    "videos",
    "clips",
    "collections",
    "schedule",
    "squad",
];

#[inline]
fn is_handle_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Extract a channel handle from an href or location.
///
/// Matches `/<name>` or `/<name>/...` where `<name>` is 3-25 characters of
/// `[A-Za-z0-9_]` and not a reserved site path.
pub fn extract_channel(href: &str) -> Option<ChannelHandle> {
    let path = extract_path(href);
    let rest = path.strip_prefix('/')?;
    let segment = match rest.find('/') {
        Some(end) => &rest[..end],
        None => rest,
    };

    if !(CHANNEL_MIN_LEN..=CHANNEL_MAX_LEN).contains(&segment.len()) {
        return None;
    }
    if !segment.bytes().all(is_handle_byte) {
        return None;
    }

    let name = segment.to_ascii_lowercase();
    if RESERVED_PATHS.contains(&name.as_str()) {
        return None;
    }

    Some(ChannelHandle::new_unchecked(name))
}

/// Extract a category slug from `/directory/category/<slug>`.
///
/// The slug is percent-decoded and lowercased. Malformed escapes reject the
/// whole path.
pub fn extract_category(href: &str) -> Option<CategorySlug> {
    let path = extract_path(href);
    let rest = path.strip_prefix(CATEGORY_PREFIX)?;
    let raw = match rest.find('/') {
        Some(end) => &rest[..end],
        None => rest,
    };
    if raw.is_empty() {
        return None;
    }

    let decoded = percent_decode_strict(raw)?;
    if decoded.is_empty() {
        return None;
    }

    Some(CategorySlug::new_unchecked(decoded.to_lowercase()))
}
