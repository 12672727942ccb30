//! Byte-key encoding.
//!
//! The store only iterates keys in bytewise order, so every key is encoded
//! such that byte order equals logical order:
//! - IDs are 8-byte big-endian integers
//! - a task's slice collection is `group ++ "-" ++ task`
//! - slice keys are RFC 3339 UTC timestamps with whole seconds

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Separator between the two IDs of a composite key.
const COMPOSITE_SEPARATOR: &[u8] = b"-";

/// Encodes an ID as 8 big-endian bytes.
pub fn encode_id(id: i64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Decodes an 8-byte big-endian ID.
pub fn decode_id(bytes: &[u8]) -> Option<i64> {
    bytes.try_into().ok().map(i64::from_be_bytes)
}

/// Key of the slice collection for a task.
pub fn slice_bucket_key(group_id: i64, task_id: i64) -> Vec<u8> {
    [
        encode_id(group_id).as_slice(),
        COMPOSITE_SEPARATOR,
        encode_id(task_id).as_slice(),
    ]
    .concat()
}

/// Drops sub-second precision so a timestamp survives a key round trip.
pub fn truncate_time(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(0)
}

/// Encodes a timestamp as a sortable key, e.g. `2024-01-15T10:30:00Z`.
pub fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Decodes a timestamp key or value.
pub fn decode_time(bytes: &[u8]) -> Option<DateTime<Utc>> {
    let text = std::str::from_utf8(bytes).ok()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
