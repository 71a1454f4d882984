//! Date-bucketed grouping of sessions for history views

use super::types::ChatSession;
use chrono::{DateTime, Local, Utc};

/// How long ago a session was last written, in calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecencyBucket {
    Today,
    Yesterday,
    PreviousSevenDays,
    PreviousThirtyDays,
    Older,
}

impl RecencyBucket {
    /// Bucket for a session updated at `updated_at`, seen from `now`.
    ///
    /// Days are counted on the local calendar, so a session written late last
    /// night is "Yesterday" even if it was only an hour ago.
    pub fn for_timestamp(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let today = now.with_timezone(&Local).date_naive();
        let day = updated_at.with_timezone(&Local).date_naive();
        let days = (today - day).num_days();

        match days {
            i64::MIN..=0 => RecencyBucket::Today,
            1 => RecencyBucket::Yesterday,
            2..=7 => RecencyBucket::PreviousSevenDays,
            8..=30 => RecencyBucket::PreviousThirtyDays,
            _ => RecencyBucket::Older,
        }
    }

    /// Heading shown above the bucket
    pub fn label(&self) -> &'static str {
        match self {
            RecencyBucket::Today => "Today",
            RecencyBucket::Yesterday => "Yesterday",
            RecencyBucket::PreviousSevenDays => "Previous 7 Days",
            RecencyBucket::PreviousThirtyDays => "Previous 30 Days",
            RecencyBucket::Older => "Older",
        }
    }
}

impl std::fmt::Display for RecencyBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Group sessions into recency buckets, newest bucket first.
///
/// Sessions keep their relative order inside a bucket and empty buckets are
/// omitted.
pub fn group_by_recency(
    sessions: &[ChatSession],
    now: DateTime<Utc>,
) -> Vec<(RecencyBucket, Vec<&ChatSession>)> {
    let mut groups: Vec<(RecencyBucket, Vec<&ChatSession>)> = Vec::new();

    for session in sessions {
        let bucket = RecencyBucket::for_timestamp(session.updated_at, now);
        match groups.iter_mut().find(|(b, _)| *b == bucket) {
            Some((_, members)) => members.push(session),
            None => groups.push((bucket, vec![session])),
        }
    }

    groups.sort_by_key(|(bucket, _)| *bucket);
    groups
}
