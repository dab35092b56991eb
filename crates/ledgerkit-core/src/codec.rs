//! Composite key codec.
//!
//! A composite key packs a namespace and an ordered tuple of string segments
//! into one sortable key:
//!
//! ```text
//! \u{0} namespace \u{0} segment-1 \u{0} segment-2 \u{0} ...
//! ```
//!
//! Because every component is terminated by the separator, all keys sharing
//! a namespace and a leading run of segments are contiguous in key order,
//! which is what makes partial-key prefix scans possible. The leading
//! separator also keeps composite keys apart from simple keys.

use crate::error::CodecError;

/// Separator between key components; also marks a key as composite.
pub const SEPARATOR: char = '\u{0}';

/// Largest scalar value; closes the range of a partial-key scan.
pub const MAX_RUNE: char = '\u{10FFFF}';

/// Whether `key` belongs to the composite keyspace.
pub fn is_composite(key: &str) -> bool {
    key.starts_with(SEPARATOR)
}

/// Encode `namespace` and `segments` into a composite key.
pub fn encode<S: AsRef<str>>(namespace: &str, segments: &[S]) -> Result<String, CodecError> {
    validate_component(namespace)?;
    let mut key = String::with_capacity(
        2 + namespace.len() + segments.iter().map(|s| s.as_ref().len() + 1).sum::<usize>(),
    );
    key.push(SEPARATOR);
    key.push_str(namespace);
    key.push(SEPARATOR);
    for segment in segments {
        let segment = segment.as_ref();
        validate_component(segment)?;
        key.push_str(segment);
        key.push(SEPARATOR);
    }
    Ok(key)
}

/// Split a composite key back into its namespace and segments.
pub fn decode(key: &str) -> Result<(String, Vec<String>), CodecError> {
    let malformed = |reason: &str| CodecError::MalformedKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let inner = key
        .strip_prefix(SEPARATOR)
        .ok_or_else(|| malformed("missing leading separator"))?
        .strip_suffix(SEPARATOR)
        .ok_or_else(|| malformed("missing trailing separator"))?;

    let mut components = inner.split(SEPARATOR);
    // `split` always yields at least one item, even for an empty string.
    let namespace = components.next().unwrap_or_default().to_string();
    let segments = components.map(str::to_string).collect();
    Ok((namespace, segments))
}

/// Half-open key range covering every composite key that extends the
/// given namespace and leading segments.
pub fn prefix_range<S: AsRef<str>>(
    namespace: &str,
    segments: &[S],
) -> Result<(String, String), CodecError> {
    let start = encode(namespace, segments)?;
    let mut end = start.clone();
    end.push(MAX_RUNE);
    Ok((start, end))
}

fn validate_component(component: &str) -> Result<(), CodecError> {
    if let Some(bad) = component.chars().find(|c| *c == SEPARATOR || *c == MAX_RUNE) {
        return Err(CodecError::InvalidSegment {
            segment: component.to_string(),
            reason: format!("contains reserved character U+{:04X}", bad as u32),
        });
    }
    Ok(())
}
