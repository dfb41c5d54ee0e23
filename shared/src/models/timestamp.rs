//! Creation timestamp as stored upstream
//!
//! Older records carry a native document timestamp, newer tooling writes
//! epoch millis or ISO-like strings. Everything is reduced to epoch millis
//! once, at ingestion.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Timestamp in any of the representations found in stored orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Native document timestamp
    Native {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: u32,
    },
    /// Unix millis
    Millis(i64),
    /// RFC 3339 / ISO-like text, local time when no offset is given
    Text(String),
}

/// Naive datetime layouts accepted for offset-less text timestamps
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

impl RawTimestamp {
    /// Build from unix millis
    ///
    /// Total for every `i64`: the remainder is below 1000, so the
    /// nanosecond part always fits.
    pub fn from_millis(millis: i64) -> Self {
        Self::Native {
            seconds: millis.div_euclid(1000),
            nanoseconds: (millis.rem_euclid(1000) as u32) * 1_000_000,
        }
    }

    /// Convert to unix millis
    ///
    /// `None` when the text form cannot be parsed or the value does not fit.
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            RawTimestamp::Native {
                seconds,
                nanoseconds,
            } => seconds
                .checked_mul(1000)?
                .checked_add(i64::from(*nanoseconds / 1_000_000)),
            RawTimestamp::Millis(millis) => Some(*millis),
            RawTimestamp::Text(text) => parse_text_millis(text),
        }
    }
}

fn parse_text_millis(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return local_millis(naive);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return local_millis(date.and_hms_opt(0, 0, 0)?);
    }

    match text.parse::<i64>() {
        Ok(millis) => Some(millis),
        Err(_) => {
            tracing::debug!(value = %text, "Unparseable createdAt text");
            None
        }
    }
}

/// Local wall-clock time → unix millis (DST gap falls back to UTC)
fn local_millis(naive: NaiveDateTime) -> Option<i64> {
    Some(
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp_millis())
            .unwrap_or_else(|| naive.and_utc().timestamp_millis()),
    )
}
