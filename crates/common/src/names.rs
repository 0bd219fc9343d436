use uuid::Uuid;

/// Friendly name used when a bucket is requested without one
pub const DEFAULT_FRIENDLY_NAME: &str = "bucket";

/// Longest friendly prefix we keep, so generated names stay
///  within the backend's 63 character bucket name limit
pub const MAX_FRIENDLY_NAME_LEN: usize = 27;

/// Length of the generated `-<32 hex>` suffix
pub const SUFFIX_LEN: usize = 33;

/// Strip separators from an externally supplied identifier
///  (instance or binding GUID) to get a backend safe name.
pub fn normalize_id(id: &str) -> String {
    id.replace('-', "")
}

/// Cut a requested friendly name down to `MAX_FRIENDLY_NAME_LEN` characters.
pub fn clamp_friendly_name(name: &str) -> &str {
    match name.char_indices().nth(MAX_FRIENDLY_NAME_LEN) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}

/// Generate a globally unique bucket name for a friendly name.
///
/// The suffix is a v4 uuid rendered as 32 lowercase hex digits. We
///  never check the backend for collisions.
pub fn to_full_name(friendly_name: &str) -> String {
    let friendly_name = if friendly_name.is_empty() {
        DEFAULT_FRIENDLY_NAME
    } else {
        friendly_name
    };

    format!("{}-{}", friendly_name, Uuid::new_v4().simple())
}

/// Recover the friendly name from a generated bucket name.
///
/// Only names produced by [`to_full_name`] should be fed back in. Names
///  too short to carry a suffix (e.g. bare 32 hex digit names from early
///  provisions) are returned unchanged.
pub fn to_friendly_name(full_name: &str) -> &str {
    full_name
        .len()
        .checked_sub(SUFFIX_LEN)
        .and_then(|end| full_name.get(..end))
        .unwrap_or(full_name)
}

/// Whether a name carries a generated `-<32 lowercase hex>` suffix
pub fn has_generated_suffix(full_name: &str) -> bool {
    let Some(start) = full_name.len().checked_sub(SUFFIX_LEN) else {
        return false;
    };
    let Some(suffix) = full_name.get(start..) else {
        return false;
    };

    suffix.starts_with('-')
        && suffix[1..]
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
