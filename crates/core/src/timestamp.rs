//! Canonical timestamp value type.
//!
//! Every instant that crosses a persistence boundary is encoded as a single
//! fixed-width UTC string (`YYYY-MM-DDTHH:MM:SS.mmmZ`). Range filters in the
//! document store compare these strings lexically, so the encoding must keep
//! lexical order equal to chronological order. Malformed strings are rejected
//! at the serde boundary, before anything reaches the store.

use core::str::FromStr;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Canonical wire encoding: fixed-width, millisecond precision, UTC.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// An absolute instant, canonically encoded at every serde boundary.
///
/// Construction truncates to millisecond precision so that a value always
/// round-trips through its canonical string unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(instant: DateTime<Utc>) -> Self {
        // Truncate to ms; sub-ms precision would break canonical round-trips.
        let millis = instant.timestamp_millis();
        Self(
            Utc.timestamp_millis_opt(millis)
                .single()
                .unwrap_or_else(|| instant.with_timezone(&Utc)),
        )
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// Parse an RFC 3339 string, normalizing to the canonical encoding.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let parsed = DateTime::parse_from_rfc3339(s)
            .map_err(|e| DomainError::invalid_timestamp(format!("{s:?}: {e}")))?;
        Ok(Self::new(parsed.with_timezone(&Utc)))
    }

    /// The canonical string form used for persistence and range filters.
    pub fn canonical(&self) -> String {
        self.0.format(CANONICAL_FORMAT).to_string()
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn signed_duration_since(&self, other: Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }
}

impl core::ops::Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp::new(self.0 + rhs)
    }
}

impl core::ops::Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Timestamp {
        Timestamp::new(self.0 - rhs)
    }
}

impl core::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for Timestamp {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn canonical_is_fixed_width_utc() {
        let ts = Timestamp::parse("2024-01-01T10:00:00Z").unwrap();
        assert_eq!(ts.canonical(), "2024-01-01T10:00:00.000Z");

        let ts = Timestamp::parse("2024-06-05T04:09:03.120+02:00").unwrap();
        assert_eq!(ts.canonical(), "2024-06-05T02:09:03.120Z");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(Timestamp::parse("2024-01-01").is_err());
        assert!(Timestamp::parse("01/01/2024 10:00").is_err());
        assert!(Timestamp::parse("not a timestamp").is_err());
    }

    #[test]
    fn serde_round_trips_through_canonical_string() {
        let ts = Timestamp::parse("2024-03-01T09:15:00Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-03-01T09:15:00.000Z\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn deserialize_rejects_malformed_string() {
        let result: Result<Timestamp, _> = serde_json::from_str("\"yesterday\"");
        assert!(result.is_err());
    }

    proptest! {
        // The invariant range filters depend on: lexical order of the
        // canonical encoding equals chronological order.
        #[test]
        fn lexical_order_matches_chronological_order(
            a in 0i64..4_102_444_800_000,
            b in 0i64..4_102_444_800_000,
        ) {
            let ta = Timestamp::new(Utc.timestamp_millis_opt(a).unwrap());
            let tb = Timestamp::new(Utc.timestamp_millis_opt(b).unwrap());
            prop_assert_eq!(ta.canonical().cmp(&tb.canonical()), ta.cmp(&tb));
        }

        #[test]
        fn canonical_round_trips(millis in 0i64..4_102_444_800_000) {
            let ts = Timestamp::new(Utc.timestamp_millis_opt(millis).unwrap());
            prop_assert_eq!(Timestamp::parse(&ts.canonical()).unwrap(), ts);
        }
    }
}
