//! Route keys.
//!
//! A route key is what a request is matched against: an exact hostname,
//! a single-segment path prefix (`/api`) or the wildcard sentinel `any`.

/// Wildcard route key, consulted when neither host nor prefix match.
pub const WILDCARD_KEY: &str = "any";

/// Classification of a normalized route key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Host,
    PathPrefix,
    Wildcard,
}

/// Normalize a key for storage and lookup.
///
/// Hostnames are case-insensitive and lowercased. Path prefixes are left as-is.
pub fn normalize(key: &str) -> String {
    if key.starts_with('/') {
        key.to_string()
    } else {
        key.to_ascii_lowercase()
    }
}

/// Classify an already-normalized key.
pub fn kind(key: &str) -> RouteKind {
    if key.starts_with('/') {
        RouteKind::PathPrefix
    } else if key == WILDCARD_KEY {
        RouteKind::Wildcard
    } else {
        RouteKind::Host
    }
}

/// Returns true if the key carries a path separator where none is allowed.
///
/// Only the leading `/` of a prefix key is permitted; the prefix tier looks up
/// a single path segment, so `/api/v1` or `a/b` can never match.
pub fn has_path_separator(key: &str) -> bool {
    let rest = key.strip_prefix('/').unwrap_or(key);
    rest.contains('/') || rest.contains('\\')
}

/// Derive the prefix-tier key from a raw request target.
///
/// Takes the text between the first and second `/` and prepends `/`,
/// without parsing the target further.
pub fn prefix_key(request_target: &str) -> Option<String> {
    let mut segments = request_target.split('/');
    segments.next()?;
    segments.next().map(|segment| format!("/{}", segment))
}
