//! Fast URL parsing utilities for the hot path
//!
//! These functions avoid allocations and work directly on string slices.
//! Anything that does not look like `scheme://host...` is rejected, and the
//! matcher treats a rejected URL as "not blocked".

use std::borrow::Cow;

// =============================================================================
// Scheme
// =============================================================================

/// Get the position after "://".
///
/// The scheme must start with a letter and contain only letters, digits,
/// `+`, `-` or `.`.
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let bytes = url.as_bytes();

    let colon_pos = bytes.iter().position(|&b| b == b':')?;
    if colon_pos == 0 || !bytes[0].is_ascii_alphabetic() {
        return None;
    }
    if !bytes[..colon_pos]
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
    {
        return None;
    }

    if bytes.len() > colon_pos + 2 && bytes[colon_pos + 1] == b'/' && bytes[colon_pos + 2] == b'/' {
        return Some(colon_pos + 3);
    }

    None
}

// =============================================================================
// Host
// =============================================================================

/// Get the start and end positions of the hostname in a URL.
///
/// Userinfo and port are skipped; IPv6 literals keep their brackets.
#[inline]
pub fn get_host_position(url: &str) -> Option<(usize, usize)> {
    let scheme_end = get_scheme_end(url)?;
    let bytes = url.as_bytes();

    // Authority ends at the first '/', '?' or '#'
    let authority_end = bytes[scheme_end..]
        .iter()
        .position(|&b| b == b'/' || b == b'?' || b == b'#')
        .map_or(bytes.len(), |i| scheme_end + i);

    // Skip userinfo (last '@' inside the authority)
    let host_start = bytes[scheme_end..authority_end]
        .iter()
        .rposition(|&b| b == b'@')
        .map_or(scheme_end, |i| scheme_end + i + 1);

    let host_end = if bytes.get(host_start) == Some(&b'[') {
        let close = bytes[host_start..authority_end].iter().position(|&b| b == b']')?;
        host_start + close + 1
    } else {
        bytes[host_start..authority_end]
            .iter()
            .position(|&b| b == b':')
            .map_or(authority_end, |i| host_start + i)
    };

    Some((host_start, host_end))
}

/// Extract the hostname, without port or userinfo.
///
/// Returns `None` for URLs without an authority, an empty host, or a host
/// containing whitespace or control characters. A trailing root dot is dropped.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (host_start, host_end) = get_host_position(url)?;
    let host = url[host_start..host_end].trim_end_matches('.');

    if host.is_empty() {
        return None;
    }
    if host
        .bytes()
        .any(|b| b.is_ascii_whitespace() || b.is_ascii_control() || matches!(b, b'<' | b'>' | b'\\' | b'%' | b'"'))
    {
        return None;
    }

    Some(host)
}

/// ASCII-lowercase without allocating when the input is already lowercase.
#[inline]
pub fn to_lower(text: &str) -> Cow<'_, str> {
    if text.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(text.to_ascii_lowercase())
    } else {
        Cow::Borrowed(text)
    }
}
