//! Identity hashes for search queries.
//!
//! The hash keys cached result sets, so it must be stable across runs and
//! platforms. It is not a security primitive.

/// Upper bound (exclusive) of query hashes.
pub const QUERY_HASH_RANGE: u64 = 1 << 32;

/// 31-multiplier rolling hash over the UTF-16 code units of the lowercased
/// text, folded to `[0, range)`.
pub fn hash_text(text: &str, range: u64) -> u64 {
    let hash = text
        .to_lowercase()
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit))
        });
    u64::from(hash.unsigned_abs()) % range.max(1)
}

pub fn query_hash_from_string(query: &str) -> u32 {
    // hash_text never exceeds QUERY_HASH_RANGE here
    hash_text(query, QUERY_HASH_RANGE) as u32
}

/// Hash of a query together with the fields that change its result set.
/// Empty fields are left out before joining with `_`.
pub fn query_hash(
    query: &str,
    policy_id: Option<&str>,
    sort_by: Option<&str>,
    sort_order: Option<&str>,
) -> u32 {
    let text = [Some(query), policy_id, sort_order, sort_by]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    query_hash_from_string(&text)
}
