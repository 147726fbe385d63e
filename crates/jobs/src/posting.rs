use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use gigboard_core::{DomainError, JobId, Timestamp, UserId};

/// The four engagement variants offered by the marketplace.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobVariant {
    Contract,
    Bounty,
    Auction,
    Challenge,
}

impl JobVariant {
    /// Human-readable name used in notification templating.
    pub fn display_name(&self) -> &'static str {
        match self {
            JobVariant::Contract => "Contract",
            JobVariant::Bounty => "Bounty",
            JobVariant::Auction => "Auction",
            JobVariant::Challenge => "Challenge",
        }
    }
}

/// A time of day with minute precision, encoded as `HH:MM`.
///
/// Seconds are always zero by construction; combining a `ClockTime` with a
/// date therefore zeroes seconds and sub-seconds, as the lifecycle rules
/// require.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, DomainError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| DomainError::validation(format!("invalid clock time {hour:02}:{minute:02}")))
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        NaiveTime::parse_from_str(s, "%H:%M")
            .map(Self)
            .map_err(|e| DomainError::validation(format!("invalid clock time {s:?}: {e}")))
    }

    pub fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl core::fmt::Display for ClockTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClockTime::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// An auction's raw start field: either a full instant or a bare date that
/// still needs a separate time of day.
///
/// Discriminated at parse time by the presence of the date-time separator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuctionStart {
    Instant(Timestamp),
    Date(NaiveDate),
}

impl Serialize for AuctionStart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AuctionStart::Instant(ts) => serializer.serialize_str(&ts.canonical()),
            AuctionStart::Date(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for AuctionStart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.contains('T') {
            Timestamp::parse(&s)
                .map(AuctionStart::Instant)
                .map_err(serde::de::Error::custom)
        } else {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(AuctionStart::Date)
                .map_err(serde::de::Error::custom)
        }
    }
}

/// Variant-specific scheduling fields: a closed tagged union.
///
/// Every time-related field lives on its variant; the raw optionality of the
/// source documents is preserved so the resolver can reproduce the exact
/// absence rules. Unknown fields are rejected rather than silently carried
/// forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum JobKind {
    Contract {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        applications_open_time: Option<Timestamp>,
    },
    Bounty {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_date: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_time: Option<ClockTime>,
    },
    Auction {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<AuctionStart>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_time: Option<ClockTime>,
    },
    Challenge {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<Timestamp>,
    },
}

impl JobKind {
    pub fn variant(&self) -> JobVariant {
        match self {
            JobKind::Contract { .. } => JobVariant::Contract,
            JobKind::Bounty { .. } => JobVariant::Bounty,
            JobKind::Auction { .. } => JobVariant::Auction,
            JobKind::Challenge { .. } => JobVariant::Challenge,
        }
    }
}

/// Lifecycle status of a live job.
///
/// `EndingSoon` is a sub-state of active: it flags an imminent deadline but
/// does not block the deadline-based terminal transition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    EndingSoon,
    BountyClosed,
    AuctionEnded,
    ChallengeClosed,
    Expired,
}

impl JobStatus {
    /// Wire-level tag, as persisted (matches the serde encoding).
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::EndingSoon => "ending_soon",
            JobStatus::BountyClosed => "bounty_closed",
            JobStatus::AuctionEnded => "auction_ended",
            JobStatus::ChallengeClosed => "challenge_closed",
            JobStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::BountyClosed
                | JobStatus::AuctionEnded
                | JobStatus::ChallengeClosed
                | JobStatus::Expired
        )
    }

    /// Satisfies the "active" query predicate (open for participation).
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// The variant-correct terminal status for deadline expiry.
    pub fn terminal_for(variant: JobVariant) -> JobStatus {
        match variant {
            JobVariant::Bounty => JobStatus::BountyClosed,
            JobVariant::Auction => JobStatus::AuctionEnded,
            JobVariant::Challenge => JobStatus::ChallengeClosed,
            JobVariant::Contract => JobStatus::Expired,
        }
    }
}

/// A posting accepted but not yet visible, pending its resolved start time.
///
/// Lives in the staged collection; its storage id doubles as the `JobId`
/// carried into the live document on activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagedJob {
    pub title: String,
    pub created_by: UserId,
    pub kind: JobKind,
    pub deadline: Timestamp,
    pub created_at: Timestamp,
    pub last_updated: Timestamp,
}

/// A posting in the live collection: open for participation or terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActiveJob {
    pub job_id: JobId,
    pub original_staged_job_id: JobId,
    pub title: String,
    pub created_by: UserId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub deadline: Timestamp,
    pub created_at: Timestamp,
    pub activated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicants: Option<Vec<UserId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_count: Option<u32>,
    pub last_updated: Timestamp,
}

impl ActiveJob {
    /// Total, typed activation transform: staged → live.
    ///
    /// Carries every staged field forward and stamps the activation audit
    /// fields. The staged storage id becomes both `job_id` and
    /// `original_staged_job_id` of the live document.
    pub fn from_staged(staged: StagedJob, staged_id: JobId, now: Timestamp) -> Self {
        Self {
            job_id: staged_id,
            original_staged_job_id: staged_id,
            title: staged.title,
            created_by: staged.created_by,
            kind: staged.kind,
            status: JobStatus::Active,
            deadline: staged.deadline,
            created_at: staged.created_at,
            activated_at: now,
            expired_at: None,
            applicants: None,
            application_count: None,
            last_updated: now,
        }
    }

    pub fn is_past_deadline(&self, now: Timestamp) -> bool {
        self.deadline <= now
    }

    /// The ending-soon test: strictly in the future, within a 24-hour horizon.
    pub fn is_ending_soon(&self, now: Timestamp) -> bool {
        let remaining = self.deadline.signed_duration_since(now);
        remaining > Duration::zero() && remaining <= Duration::hours(24)
    }

    pub fn terminal_status(&self) -> JobStatus {
        JobStatus::terminal_for(self.kind.variant())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_staged(kind: JobKind) -> StagedJob {
        let now = Timestamp::parse("2024-01-01T00:00:00Z").unwrap();
        StagedJob {
            title: "Build a parser".to_string(),
            created_by: UserId::new(),
            kind,
            deadline: Timestamp::parse("2024-02-01T00:00:00Z").unwrap(),
            created_at: now,
            last_updated: now,
        }
    }

    #[test]
    fn terminal_status_is_variant_correct() {
        assert_eq!(JobStatus::terminal_for(JobVariant::Bounty), JobStatus::BountyClosed);
        assert_eq!(JobStatus::terminal_for(JobVariant::Auction), JobStatus::AuctionEnded);
        assert_eq!(
            JobStatus::terminal_for(JobVariant::Challenge),
            JobStatus::ChallengeClosed
        );
        assert_eq!(JobStatus::terminal_for(JobVariant::Contract), JobStatus::Expired);
    }

    #[test]
    fn ending_soon_is_a_sub_state_of_open() {
        assert!(JobStatus::EndingSoon.is_open());
        assert!(JobStatus::Active.is_open());
        assert!(!JobStatus::Expired.is_open());
        assert!(!JobStatus::AuctionEnded.is_open());
    }

    #[test]
    fn activation_transform_carries_fields_and_stamps_audit() {
        let staged = sample_staged(JobKind::Challenge { start: None });
        let staged_id = JobId::new();
        let now = Timestamp::parse("2024-01-15T12:00:00Z").unwrap();

        let live = ActiveJob::from_staged(staged.clone(), staged_id, now);

        assert_eq!(live.job_id, staged_id);
        assert_eq!(live.original_staged_job_id, staged_id);
        assert_eq!(live.title, staged.title);
        assert_eq!(live.created_by, staged.created_by);
        assert_eq!(live.deadline, staged.deadline);
        assert_eq!(live.created_at, staged.created_at);
        assert_eq!(live.status, JobStatus::Active);
        assert_eq!(live.activated_at, now);
        assert_eq!(live.last_updated, now);
        assert!(live.expired_at.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected_not_forwarded() {
        let doc = json!({
            "title": "x",
            "created_by": "018f0a3e-0000-7000-8000-000000000001",
            "kind": { "bounty": { "start_date": "2024-03-01" } },
            "deadline": "2024-02-01T00:00:00.000Z",
            "created_at": "2024-01-01T00:00:00.000Z",
            "last_updated": "2024-01-01T00:00:00.000Z",
            "legacy_field": true,
        });
        assert!(serde_json::from_value::<StagedJob>(doc).is_err());
    }

    #[test]
    fn unrecognized_variant_tag_fails_decode() {
        let doc = json!({
            "title": "x",
            "created_by": "018f0a3e-0000-7000-8000-000000000001",
            "kind": { "raffle": {} },
            "deadline": "2024-02-01T00:00:00.000Z",
            "created_at": "2024-01-01T00:00:00.000Z",
            "last_updated": "2024-01-01T00:00:00.000Z",
        });
        assert!(serde_json::from_value::<StagedJob>(doc).is_err());
    }

    #[test]
    fn auction_start_discriminates_on_separator() {
        let full: AuctionStart = serde_json::from_value(json!("2024-01-01T10:00:00Z")).unwrap();
        assert!(matches!(full, AuctionStart::Instant(_)));

        let date: AuctionStart = serde_json::from_value(json!("2024-01-01")).unwrap();
        assert!(matches!(date, AuctionStart::Date(_)));

        assert!(serde_json::from_value::<AuctionStart>(json!("soon")).is_err());
    }

    #[test]
    fn clock_time_round_trips_and_validates() {
        let t = ClockTime::parse("14:30").unwrap();
        assert_eq!(t.to_string(), "14:30");
        assert!(ClockTime::parse("25:00").is_err());
        assert!(ClockTime::new(14, 30).is_ok());
        assert!(ClockTime::new(14, 60).is_err());
    }
}
