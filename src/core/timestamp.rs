//! Offset-aware commit timestamps with second precision

use chrono::{DateTime, FixedOffset, TimeZone};
use std::fmt;

/// A commit instant as git records it: epoch seconds plus the committer's
/// UTC offset in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    epoch_seconds: i64,
    offset_seconds: i32,
}

impl Timestamp {
    /// Build a timestamp, returning None when the offset is not a valid
    /// timezone offset (strictly less than 24 hours either way) or the
    /// instant is outside the representable range
    pub fn new(epoch_seconds: i64, offset_seconds: i32) -> Option<Self> {
        let ts = Self {
            epoch_seconds,
            offset_seconds,
        };
        ts.to_datetime().map(|_| ts)
    }

    /// Parse git's raw `"<epoch> <+hhmm>"` representation
    pub fn parse_git(raw: &str) -> Option<Self> {
        let mut parts = raw.split_whitespace();
        let epoch_seconds: i64 = parts.next()?.parse().ok()?;
        let tz = parts.next()?;
        if parts.next().is_some() || tz.len() != 5 || !tz.is_ascii() {
            return None;
        }

        let sign = match &tz[..1] {
            "+" => 1,
            "-" => -1,
            _ => return None,
        };
        if !tz[1..].bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hours: i32 = tz[1..3].parse().ok()?;
        let minutes: i32 = tz[3..5].parse().ok()?;
        if minutes >= 60 {
            return None;
        }
        Self::new(epoch_seconds, sign * (hours * 3600 + minutes * 60))
    }

    pub fn epoch_seconds(&self) -> i64 {
        self.epoch_seconds
    }

    pub fn offset_seconds(&self) -> i32 {
        self.offset_seconds
    }

    /// The instant in its original timezone
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.offset_seconds)?;
        offset.timestamp_opt(self.epoch_seconds, 0).single()
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self {
            epoch_seconds: dt.timestamp(),
            offset_seconds: dt.offset().local_minus_utc(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{} {:+}s", self.epoch_seconds, self.offset_seconds),
        }
    }
}
