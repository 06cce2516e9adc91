//! Wire-side timestamp representation and normalization.
//!
//! The remote store returns timestamps in two shapes depending on how a
//! document was written: the store-native object form (`{ seconds, nanos }`)
//! for server-stamped fields, and a plain ISO-8601 string for fields written
//! as strings by older clients. [`RemoteTimestamp`] models both; everything
//! past the gateway boundary only ever sees the normalized
//! `Option<DateTime<Utc>>`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A timestamp as it appears in a remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteTimestamp {
    /// Store-native form: seconds + nanoseconds since the Unix epoch.
    Native { seconds: i64, nanos: u32 },
    /// ISO-8601 string form.
    Iso(String),
}

impl RemoteTimestamp {
    /// Build the store-native form from a UTC instant.
    pub fn from_utc(instant: DateTime<Utc>) -> Self {
        RemoteTimestamp::Native {
            seconds: instant.timestamp(),
            nanos: instant.timestamp_subsec_nanos(),
        }
    }

    /// Normalize to a UTC instant. Unparseable values become `None`.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            RemoteTimestamp::Native { seconds, nanos } => {
                DateTime::from_timestamp(*seconds, *nanos)
            }
            RemoteTimestamp::Iso(raw) => parse_iso(raw),
        }
    }
}

/// Normalize an optional wire timestamp. Absent and unparseable both map to
/// `None`; the caller cannot tell the two apart, matching the read path of
/// the store it fronts.
pub fn normalize(value: Option<&RemoteTimestamp>) -> Option<DateTime<Utc>> {
    value.and_then(RemoteTimestamp::to_utc)
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Tolerate strings without an offset, assuming UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_native_form_normalizes() {
        let ts = RemoteTimestamp::Native {
            seconds: 1_700_000_000,
            nanos: 500_000_000,
        };
        let expected = Utc.timestamp_opt(1_700_000_000, 500_000_000).unwrap();
        assert_eq!(ts.to_utc(), Some(expected));
    }

    #[test]
    fn test_iso_form_normalizes() {
        let ts = RemoteTimestamp::Iso("2024-03-01T12:30:00Z".to_string());
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(ts.to_utc(), Some(expected));
    }

    #[test]
    fn test_iso_without_offset_assumes_utc() {
        let ts = RemoteTimestamp::Iso("2024-03-01T12:30:00.250".to_string());
        assert!(ts.to_utc().is_some());
    }

    #[test]
    fn test_garbage_iso_is_none() {
        let ts = RemoteTimestamp::Iso("not a date".to_string());
        assert_eq!(ts.to_utc(), None);
    }

    #[test]
    fn test_absent_is_none() {
        assert_eq!(normalize(None), None);
    }

    #[test]
    fn test_untagged_decode_both_forms() {
        let native: RemoteTimestamp =
            serde_json::from_str(r#"{"seconds": 1700000000, "nanos": 0}"#).unwrap();
        assert!(matches!(native, RemoteTimestamp::Native { .. }));

        let iso: RemoteTimestamp = serde_json::from_str(r#""2024-03-01T12:30:00Z""#).unwrap();
        assert!(matches!(iso, RemoteTimestamp::Iso(_)));
    }

    #[test]
    fn test_native_round_trip_from_utc() {
        let instant = Utc.with_ymd_and_hms(2025, 6, 15, 8, 0, 0).unwrap();
        assert_eq!(RemoteTimestamp::from_utc(instant).to_utc(), Some(instant));
    }
}
