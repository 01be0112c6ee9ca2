// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2022 Adam Lock

//! Contains the implementation of `DateTime`.

use std::{
    cmp::Ordering,
    fmt,
    io::{Read, Write},
    ops::{Add, Sub},
    str::FromStr,
};

use chrono::{Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{
    builtin_kind::BuiltInKind,
    encoding::*,
    error::{EncodingError, EncodingResult},
};

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_TICK: i64 = 100;
const TICKS_PER_SECOND: i64 = NANOS_PER_SECOND / NANOS_PER_TICK;

/// Seconds between the unix epoch and Jan 1 1601 00:00:00
const EPOCH_UNIX_SECONDS: i64 = -11_644_473_600;
/// Seconds between the unix epoch and Dec 31 9999 23:59:59
const ENDTIMES_UNIX_SECONDS: i64 = 253_402_300_799;

/// The text written for the null date time, i.e. the minimum value
pub const MIN_DATE_TIME_TEXT: &str = "0001-01-01T00:00:00Z";
/// The text written for the endtimes date time, i.e. the maximum value
pub const MAX_DATE_TIME_TEXT: &str = "9999-12-31T23:59:59Z";

pub type DateTimeUtc = chrono::DateTime<Utc>;

/// A date/time value. This is a wrapper around the chrono type with extra functionality
/// for obtaining ticks in OPC UA measurements, endtimes, epoch etc.
///
/// The value is always held in UTC. Every conversion from a zoned or a naive time converts it
/// to UTC, and values outside of the OPC UA range are clamped to the null (epoch) or the
/// endtimes sentinel.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct DateTime {
    date_time: DateTimeUtc,
}

impl Serialize for DateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let ticks = self.checked_ticks();
        ticks.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D>(deserializer: D) -> Result<DateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ticks = i64::deserialize(deserializer)?;
        Ok(DateTime::from(ticks))
    }
}

/// DateTime encoded as 64-bit signed int
impl BinaryEncoder<DateTime> for DateTime {
    fn byte_len(&self) -> usize {
        8
    }

    fn encode<S: Write>(&self, stream: &mut S) -> EncodingResult<usize> {
        write_i64(stream, self.checked_ticks())
    }

    fn decode<S: Read>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        Ok(DateTime::from(read_i64(stream)?))
    }
}

impl Default for DateTime {
    fn default() -> Self {
        DateTime::epoch()
    }
}

impl Add<Duration> for DateTime {
    type Output = Self;

    fn add(self, duration: Duration) -> Self {
        DateTime::from(self.date_time + duration)
    }
}

impl Sub<DateTime> for DateTime {
    type Output = Duration;

    fn sub(self, other: Self) -> Duration {
        self.date_time - other.date_time
    }
}

impl Sub<Duration> for DateTime {
    type Output = Self;

    fn sub(self, duration: Duration) -> Self {
        DateTime::from(self.date_time - duration)
    }
}

impl PartialOrd for DateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.date_time.cmp(&other.date_time))
    }
}

// From ymd_hms
impl From<(u16, u16, u16, u16, u16, u16)> for DateTime {
    fn from(dt: (u16, u16, u16, u16, u16, u16)) -> Self {
        let (year, month, day, hour, minute, second) = dt;
        DateTime::from((year, month, day, hour, minute, second, 0))
    }
}

// From ymd_hms_nano. Panics on an out of range component, the same as the chrono constructors.
impl From<(u16, u16, u16, u16, u16, u16, u32)> for DateTime {
    fn from(dt: (u16, u16, u16, u16, u16, u16, u32)) -> Self {
        let (year, month, day, hour, minute, second, nanos) = dt;
        let naive = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
            .and_then(|d| d.and_hms_nano_opt(hour as u32, minute as u32, second as u32, nanos))
            .unwrap_or_else(|| panic!("Invalid date time {:?}", dt));
        DateTime::from(naive)
    }
}

/// Any zoned time is converted to UTC.
impl<Tz: TimeZone> From<chrono::DateTime<Tz>> for DateTime {
    fn from(date_time: chrono::DateTime<Tz>) -> Self {
        let date_time = date_time.with_timezone(&Utc);
        if date_time < Self::epoch_chrono() {
            DateTime {
                date_time: Self::epoch_chrono(),
            }
        } else if date_time >= Self::endtimes_chrono() {
            DateTime {
                date_time: Self::endtimes_chrono(),
            }
        } else {
            // OPC UA date time is 100ns granular so the value supplied is truncated to match
            let nanos = (date_time.nanosecond() / NANOS_PER_TICK as u32) * NANOS_PER_TICK as u32;
            let date_time = date_time.with_nanosecond(nanos).unwrap_or(date_time);
            DateTime { date_time }
        }
    }
}

/// A time without a zone is taken to be UTC.
impl From<NaiveDateTime> for DateTime {
    fn from(date_time: NaiveDateTime) -> Self {
        DateTime::from(Utc.from_utc_datetime(&date_time))
    }
}

impl From<i64> for DateTime {
    fn from(value: i64) -> Self {
        if value <= 0 {
            Self::epoch()
        } else if value == i64::MAX || value >= Self::endtimes_ticks() {
            // Max signifies end times
            Self::endtimes()
        } else {
            let secs = value / TICKS_PER_SECOND;
            let nanos = (value - secs * TICKS_PER_SECOND) * NANOS_PER_TICK;
            let duration = Duration::seconds(secs) + Duration::nanoseconds(nanos);
            Self::from(Self::epoch_chrono() + duration)
        }
    }
}

impl Into<i64> for DateTime {
    fn into(self) -> i64 {
        self.checked_ticks()
    }
}

impl Into<DateTimeUtc> for DateTime {
    fn into(self) -> DateTimeUtc {
        self.as_chrono()
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}

impl FromStr for DateTime {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateTime::parse_iso8601(s)
    }
}

impl DateTime {
    /// Constructs from the current time
    pub fn now() -> DateTime {
        DateTime::from(Utc::now())
    }

    /// Creates a null date time (i.e. the epoch)
    pub fn null() -> DateTime {
        // The epoch is 0, so effectively null
        DateTime::epoch()
    }

    /// Tests if the date time is null (i.e. equal to epoch)
    pub fn is_null(&self) -> bool {
        self.ticks() == 0i64
    }

    /// Tests if the date time is the endtimes sentinel
    pub fn is_endtimes(&self) -> bool {
        self.date_time >= Self::endtimes_chrono()
    }

    /// Constructs a date time for the epoch
    pub fn epoch() -> DateTime {
        DateTime {
            date_time: Self::epoch_chrono(),
        }
    }

    /// Constructs a date time for the endtimes
    pub fn endtimes() -> DateTime {
        DateTime {
            date_time: Self::endtimes_chrono(),
        }
    }

    /// Returns the maximum tick value, corresponding to the end of time
    pub fn endtimes_ticks() -> i64 {
        (ENDTIMES_UNIX_SECONDS - EPOCH_UNIX_SECONDS) * TICKS_PER_SECOND
    }

    /// Constructs from a year, month, day
    pub fn ymd(year: u16, month: u16, day: u16) -> DateTime {
        DateTime::ymd_hms(year, month, day, 0, 0, 0)
    }

    /// Constructs from a year, month, day, hour, minute, second
    pub fn ymd_hms(
        year: u16,
        month: u16,
        day: u16,
        hour: u16,
        minute: u16,
        second: u16,
    ) -> DateTime {
        DateTime::from((year, month, day, hour, minute, second))
    }

    /// Constructs from a year, month, day, hour, minute, second, nanosecond
    pub fn ymd_hms_nano(
        year: u16,
        month: u16,
        day: u16,
        hour: u16,
        minute: u16,
        second: u16,
        nanos: u32,
    ) -> DateTime {
        DateTime::from((year, month, day, hour, minute, second, nanos))
    }

    /// Returns the time in ticks, of 100 nanosecond intervals
    pub fn ticks(&self) -> i64 {
        Self::duration_to_ticks(self.date_time.signed_duration_since(Self::epoch_chrono()))
    }

    /// To checked ticks. Function returns 0 or MAX_INT64
    /// if date exceeds valid OPC UA range
    pub fn checked_ticks(&self) -> i64 {
        let ticks = self.ticks();
        if ticks < 0 {
            0
        } else if ticks >= Self::endtimes_ticks() {
            i64::MAX
        } else {
            ticks
        }
    }

    /// Time as chrono
    pub fn as_chrono(&self) -> DateTimeUtc {
        self.date_time
    }

    /// Formats the time as ISO 8601 in UTC with a trailing `Z` and up to 7 fractional digits.
    /// The null and endtimes sentinels are written as the minimum and maximum date time text.
    pub fn to_iso8601(&self) -> String {
        if self.is_null() {
            MIN_DATE_TIME_TEXT.to_string()
        } else if self.is_endtimes() {
            MAX_DATE_TIME_TEXT.to_string()
        } else {
            let mut text = self.date_time.format("%Y-%m-%dT%H:%M:%S").to_string();
            let fraction = self.date_time.nanosecond() as i64 / NANOS_PER_TICK;
            if fraction > 0 {
                let digits = format!("{:07}", fraction);
                text.push('.');
                text.push_str(digits.trim_end_matches('0'));
            }
            text.push('Z');
            text
        }
    }

    /// Parses an ISO 8601 time. A time with an offset is converted to UTC, a time without one
    /// is taken to be UTC already.
    pub fn parse_iso8601(s: &str) -> EncodingResult<DateTime> {
        if let Ok(date_time) = chrono::DateTime::parse_from_rfc3339(s) {
            Ok(DateTime::from(date_time))
        } else if let Ok(date_time) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(DateTime::from(date_time))
        } else {
            error!("Cannot parse date {}", s);
            Err(EncodingError::type_mismatch(BuiltInKind::DateTime, s))
        }
    }

    /// The OPC UA epoch - Jan 1 1601 00:00:00
    fn epoch_chrono() -> DateTimeUtc {
        Utc.timestamp_opt(EPOCH_UNIX_SECONDS, 0)
            .single()
            .unwrap_or_default()
    }

    /// The OPC UA endtimes - Dec 31 9999 23:59:59 i.e. the date after which dates are returned as MAX_INT64 ticks
    fn endtimes_chrono() -> DateTimeUtc {
        Utc.timestamp_opt(ENDTIMES_UNIX_SECONDS, 0)
            .single()
            .unwrap_or_default()
    }

    /// Turns a duration to ticks
    fn duration_to_ticks(duration: Duration) -> i64 {
        // We can't directly ask for nanos because it will exceed i64,
        // so we have to subtract the total seconds before asking for the nano portion
        let seconds_part = Duration::seconds(duration.num_seconds());
        let seconds = seconds_part.num_seconds();
        let nanos = (duration - seconds_part).num_nanoseconds().unwrap_or(0);
        // Put it back together in ticks
        seconds * TICKS_PER_SECOND + nanos / NANOS_PER_TICK
    }
}
