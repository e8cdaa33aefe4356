//! Second-precision UTC timestamps stored as fixed-width ISO-8601 text.
//!
//! Every timestamp is rendered as `YYYY-MM-DDTHH:MM:SSZ`. The fixed width
//! makes lexicographic comparison in SQL agree with chronological order,
//! which the expiry purge relies on.

use std::fmt;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

const ISO8601_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

/// A UTC instant truncated to whole seconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// The current time.
    pub fn now() -> Self {
        Self::from_datetime(OffsetDateTime::now_utc())
    }

    /// Convert any offset datetime, normalizing to UTC and dropping sub-second precision.
    pub fn from_datetime(dt: OffsetDateTime) -> Self {
        let utc = dt.to_offset(UtcOffset::UTC);
        Self(utc.replace_nanosecond(0).unwrap_or(utc))
    }

    /// Build from a unix timestamp in seconds.
    pub fn from_unix(secs: i64) -> crate::Result<Self> {
        OffsetDateTime::from_unix_timestamp(secs)
            .map(Self)
            .map_err(|e| crate::Error::InvalidTimestamp(e.to_string()))
    }

    /// Parse the stored representation.
    ///
    /// RFC 3339 values with offsets or fractional seconds are accepted as well
    /// and normalized.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if let Ok(dt) = PrimitiveDateTime::parse(s, ISO8601_FORMAT) {
            return Ok(Self(dt.assume_utc()));
        }
        OffsetDateTime::parse(s, &Rfc3339)
            .map(Self::from_datetime)
            .map_err(|e| crate::Error::InvalidTimestamp(format!("'{s}': {e}")))
    }

    /// The underlying datetime.
    pub fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }

    /// Subtract a duration, returning `None` on overflow.
    pub fn checked_sub(self, duration: Duration) -> Option<Self> {
        self.0.checked_sub(duration).map(Self)
    }

    /// Add a duration, returning `None` on overflow.
    pub fn checked_add(self, duration: Duration) -> Option<Self> {
        self.0.checked_add(duration).map(Self)
    }

    /// Render in the stored ISO-8601 form.
    pub fn to_iso8601(&self) -> String {
        // Years outside 0..=9999 are the only way formatting can fail.
        self.0
            .format(ISO8601_FORMAT)
            .unwrap_or_else(|_| self.0.unix_timestamp().to_string())
    }

    /// Human readable date, e.g. "2 Jan 2006".
    pub fn to_display_date(&self) -> String {
        format!("{} {} {}", self.0.day(), month_abbrev(self.0.month()), self.0.year())
    }
}

fn month_abbrev(month: time::Month) -> &'static str {
    use time::Month::*;
    match month {
        January => "Jan",
        February => "Feb",
        March => "Mar",
        April => "Apr",
        May => "May",
        June => "Jun",
        July => "Jul",
        August => "Aug",
        September => "Sep",
        October => "Oct",
        November => "Nov",
        December => "Dec",
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.to_iso8601())
    }
}

impl FromStr for Timestamp {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(dt: OffsetDateTime) -> Self {
        Self::from_datetime(dt)
    }
}
