//! Start-time resolution.
//!
//! Given a posting's variant-specific scheduling fields, produce the single
//! absolute instant the posting becomes eligible for activation, or absence
//! when no start is determinable. Pure functions; `now` is an input so the
//! "start immediately" rule stays deterministic under test.

use chrono::{NaiveDate, TimeZone, Utc};

use gigboard_core::Timestamp;

use crate::posting::{AuctionStart, ClockTime, JobKind};

/// Resolve the effective start instant for a posting.
///
/// Rules per variant:
/// - Contract: `applications_open_time`, else absent.
/// - Challenge: its start instant, else absent.
/// - Bounty: requires both a start date and a time of day; combined with
///   seconds zeroed. Either missing → absent.
/// - Auction: a full instant is used directly; a bare date combines with a
///   separate time of day like Bounty; no start field at all means "start
///   immediately" (`now`, eligible on the next tick); a bare date without a
///   time of day is absent.
pub fn resolve_start(kind: &JobKind, now: Timestamp) -> Option<Timestamp> {
    match kind {
        JobKind::Contract {
            applications_open_time,
        } => *applications_open_time,
        JobKind::Challenge { start } => *start,
        JobKind::Bounty {
            start_date,
            start_time,
        } => match (start_date, start_time) {
            (Some(date), Some(time)) => Some(combine(*date, *time)),
            _ => None,
        },
        JobKind::Auction { start, start_time } => match (start, start_time) {
            (Some(AuctionStart::Instant(ts)), _) => Some(*ts),
            (Some(AuctionStart::Date(date)), Some(time)) => Some(combine(*date, *time)),
            (None, _) => Some(now),
            (Some(AuctionStart::Date(_)), None) => None,
        },
    }
}

/// Combine a date with a time of day in UTC.
///
/// `ClockTime` carries no seconds, so the result is always zeroed below the
/// minute.
fn combine(date: NaiveDate, time: ClockTime) -> Timestamp {
    Timestamp::new(Utc.from_utc_datetime(&date.and_time(time.as_naive())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn now() -> Timestamp {
        ts("2024-01-10T00:00:00Z")
    }

    #[test]
    fn contract_uses_applications_open_time() {
        let kind = JobKind::Contract {
            applications_open_time: Some(ts("2024-01-05T08:00:00Z")),
        };
        assert_eq!(resolve_start(&kind, now()), Some(ts("2024-01-05T08:00:00Z")));

        let kind = JobKind::Contract {
            applications_open_time: None,
        };
        assert_eq!(resolve_start(&kind, now()), None);
    }

    #[test]
    fn challenge_uses_its_start_instant() {
        let kind = JobKind::Challenge {
            start: Some(ts("2024-04-01T00:00:00Z")),
        };
        assert_eq!(resolve_start(&kind, now()), Some(ts("2024-04-01T00:00:00Z")));

        let kind = JobKind::Challenge { start: None };
        assert_eq!(resolve_start(&kind, now()), None);
    }

    #[test]
    fn bounty_combines_date_and_time_of_day() {
        let kind = JobKind::Bounty {
            start_date: Some(date("2024-03-01")),
            start_time: Some(ClockTime::parse("09:15").unwrap()),
        };
        assert_eq!(resolve_start(&kind, now()), Some(ts("2024-03-01T09:15:00Z")));
    }

    #[test]
    fn bounty_with_either_field_missing_is_absent() {
        let date_only = JobKind::Bounty {
            start_date: Some(date("2024-03-01")),
            start_time: None,
        };
        assert_eq!(resolve_start(&date_only, now()), None);

        let time_only = JobKind::Bounty {
            start_date: None,
            start_time: Some(ClockTime::parse("09:15").unwrap()),
        };
        assert_eq!(resolve_start(&time_only, now()), None);
    }

    #[test]
    fn auction_full_instant_is_used_directly() {
        let kind = JobKind::Auction {
            start: Some(AuctionStart::Instant(ts("2024-01-01T10:00:00Z"))),
            start_time: None,
        };
        assert_eq!(resolve_start(&kind, now()), Some(ts("2024-01-01T10:00:00Z")));
    }

    #[test]
    fn auction_date_plus_time_of_day_combines() {
        let kind = JobKind::Auction {
            start: Some(AuctionStart::Date(date("2024-01-01"))),
            start_time: Some(ClockTime::parse("14:30").unwrap()),
        };
        assert_eq!(resolve_start(&kind, now()), Some(ts("2024-01-01T14:30:00Z")));
    }

    #[test]
    fn auction_without_start_field_starts_immediately() {
        let kind = JobKind::Auction {
            start: None,
            start_time: None,
        };
        assert_eq!(resolve_start(&kind, now()), Some(now()));
    }

    #[test]
    fn auction_bare_date_without_time_of_day_is_absent() {
        let kind = JobKind::Auction {
            start: Some(AuctionStart::Date(date("2024-01-01"))),
            start_time: None,
        };
        assert_eq!(resolve_start(&kind, now()), None);
    }

    #[test]
    fn combined_start_zeroes_seconds() {
        let kind = JobKind::Bounty {
            start_date: Some(date("2024-03-01")),
            start_time: Some(ClockTime::parse("23:59").unwrap()),
        };
        let resolved = resolve_start(&kind, now()).unwrap();
        assert_eq!(resolved.canonical(), "2024-03-01T23:59:00.000Z");
    }

    mod properties {
        use super::*;
        use chrono::Timelike;
        use proptest::prelude::*;

        proptest! {
            // Combination preserves date, hour, and minute, and never leaks
            // seconds or sub-seconds into the resolved start.
            #[test]
            fn bounty_combination_is_exact_to_the_minute(
                hour in 0u32..24,
                minute in 0u32..60,
                offset_days in 0i64..365,
            ) {
                let start_date = date("2024-01-01") + chrono::Duration::days(offset_days);
                let kind = JobKind::Bounty {
                    start_date: Some(start_date),
                    start_time: Some(ClockTime::new(hour, minute).unwrap()),
                };

                let resolved = resolve_start(&kind, now()).unwrap().instant();
                prop_assert_eq!(resolved.date_naive(), start_date);
                prop_assert_eq!(resolved.hour(), hour);
                prop_assert_eq!(resolved.minute(), minute);
                prop_assert_eq!(resolved.second(), 0);
                prop_assert_eq!(resolved.timestamp_subsec_millis(), 0);
            }
        }
    }
}
