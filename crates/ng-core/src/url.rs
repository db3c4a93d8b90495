//! Path utilities for link classification
//!
//! These functions work directly on string slices; hrefs read from the page
//! are usually relative (`/name`) but absolute URLs are accepted as well.

use percent_encoding::percent_decode_str;

// =============================================================================
// Scheme
// =============================================================================

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let bytes = url.as_bytes();

    let colon_pos = bytes.iter().position(|&b| b == b':')?;

    // A '/' before the colon means the colon belongs to the path
    if bytes[..colon_pos].contains(&b'/') {
        return None;
    }

    if bytes.len() > colon_pos + 2
        && bytes[colon_pos + 1] == b'/'
        && bytes[colon_pos + 2] == b'/'
    {
        return Some(colon_pos + 3);
    }

    None
}

// =============================================================================
// Path Extraction
// =============================================================================

/// Extract the path portion of an absolute URL or a relative href.
///
/// Query and fragment are dropped. An absolute URL without a path yields "/".
#[inline]
pub fn extract_path(href: &str) -> &str {
    let rest = match get_scheme_end(href) {
        Some(scheme_end) => {
            let after_scheme = &href[scheme_end..];
            match after_scheme.find(['/', '?', '#']) {
                Some(pos) if after_scheme.as_bytes()[pos] == b'/' => &after_scheme[pos..],
                _ => return "/",
            }
        }
        None => href,
    };

    match rest.find(['?', '#']) {
        Some(end) => &rest[..end],
        None => rest,
    }
}

// =============================================================================
// Percent Decoding
// =============================================================================

/// Percent-decode a path segment, rejecting malformed input.
///
/// A '%' not followed by two hex digits, or bytes that do not form valid UTF-8
/// after decoding, yield `None` rather than a lossy result.
pub fn percent_decode_strict(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let well_formed = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !well_formed {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
