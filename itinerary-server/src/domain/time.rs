//! Time handling for timetable pages.
//!
//! The timetable source reports every event as a bare "HH:MM" string. The
//! calendar date is only given once per page, together with the time of day
//! the query was issued for. This module turns those fragments into absolute
//! timestamps in the source's time zone, inferring when an itinerary has
//! rolled over midnight.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use super::FormatError;

/// Time zone the timetable source reports all times in.
pub const REFERENCE_ZONE: Tz = chrono_tz::Europe::Berlin;

/// An absolute point in time, expressed in [`REFERENCE_ZONE`].
pub type Timestamp = DateTime<Tz>;

/// Parse an "HH:MM" time of day.
///
/// # Examples
///
/// ```
/// use itinerary_server::domain::parse_hhmm;
///
/// assert!(parse_hhmm("00:00").is_ok());
/// assert!(parse_hhmm("23:59").is_ok());
///
/// assert!(parse_hhmm("1430").is_err());
/// assert!(parse_hhmm("14:3").is_err());
/// assert!(parse_hhmm("25:00").is_err());
/// ```
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, FormatError> {
    let err = |reason| FormatError::new("time of day", s, reason);

    // Must be exactly 5 characters: HH:MM
    if s.len() != 5 {
        return Err(err("expected HH:MM format"));
    }

    let bytes = s.as_bytes();

    if bytes[2] != b':' {
        return Err(err("expected colon at position 2"));
    }

    let hour = parse_two_digits(&bytes[0..2]).ok_or_else(|| err("invalid hour digits"))?;
    if hour > 23 {
        return Err(err("hour must be 0-23"));
    }

    let minute = parse_two_digits(&bytes[3..5]).ok_or_else(|| err("invalid minute digits"))?;
    if minute > 59 {
        return Err(err("minute must be 0-59"));
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| err("invalid time"))
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// Parse a date as printed by the source.
///
/// Detail pages use `DD.MM.YY`, the connection list header uses `DD.MM.YYYY`.
pub fn parse_source_date(s: &str) -> Result<NaiveDate, FormatError> {
    let format = match s.len() {
        8 => "%d.%m.%y",
        10 => "%d.%m.%Y",
        _ => return Err(FormatError::new("date", s, "expected DD.MM.YY or DD.MM.YYYY")),
    };
    NaiveDate::parse_from_str(s, format)
        .map_err(|_| FormatError::new("date", s, "not a valid calendar date"))
}

/// Attach the reference zone to a local date and time.
///
/// Local times inside a daylight-saving gap do not exist and are rejected.
/// Times inside the autumn fold resolve to the earlier instant.
pub fn localize(local: NaiveDateTime) -> Result<Timestamp, FormatError> {
    REFERENCE_ZONE
        .from_local_datetime(&local)
        .earliest()
        .ok_or_else(|| {
            FormatError::new(
                "local time",
                local.to_string(),
                "does not exist in the reference time zone",
            )
        })
}

/// Resolves bare times of day against a page's date and query time.
///
/// The source never prints a date next to an individual time. Any time that
/// is strictly earlier in the day than the time the query was issued for is
/// taken to fall on the following calendar day.
///
/// # Examples
///
/// ```
/// use itinerary_server::domain::TimeResolver;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2017, 12, 20).unwrap();
/// let resolver = TimeResolver::new(date, "14:30").unwrap();
///
/// let later = resolver.resolve("15:00").unwrap();
/// assert_eq!(later.date_naive(), date);
///
/// // Earlier than the query time: next day
/// let rolled = resolver.resolve("14:00").unwrap();
/// assert_eq!(rolled.date_naive(), date.succ_opt().unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeResolver {
    date: NaiveDate,
    reference: NaiveTime,
}

impl TimeResolver {
    /// Create a resolver for a page dated `date`, queried at `reference` ("HH:MM").
    pub fn new(date: NaiveDate, reference: &str) -> Result<Self, FormatError> {
        Ok(Self {
            date,
            reference: parse_hhmm(reference)?,
        })
    }

    /// Returns the page date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the query time of day.
    pub fn reference(&self) -> NaiveTime {
        self.reference
    }

    /// Resolve an "HH:MM" string into an absolute timestamp.
    pub fn resolve(&self, time_of_day: &str) -> Result<Timestamp, FormatError> {
        let time = parse_hhmm(time_of_day)?;

        // Equal to the reference is still the same day
        let date = if time < self.reference {
            self.date
                .succ_opt()
                .ok_or_else(|| FormatError::new("date", self.date.to_string(), "date overflow"))?
        } else {
            self.date
        };

        localize(date.and_time(time))
    }
}

/// Resolve a single time of day against a date and reference time.
///
/// Convenience wrapper around [`TimeResolver`].
pub fn resolve(
    date: NaiveDate,
    time_of_day: &str,
    reference_time_of_day: &str,
) -> Result<Timestamp, FormatError> {
    TimeResolver::new(date, reference_time_of_day)?.resolve(time_of_day)
}

/// Render a timestamp's date the way the source expects it in a query (`DD.MM.YY`).
pub fn format_query_date(timestamp: &Timestamp) -> String {
    timestamp.format("%d.%m.%y").to_string()
}

/// Render a timestamp's time of day as `HH:MM`.
pub fn format_hhmm(timestamp: &Timestamp) -> String {
    timestamp.format("%H:%M").to_string()
}

/// Render a duration as `H:MM`.
///
/// Negative durations are rendered with a leading minus sign.
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    let sign = if minutes < 0 { "-" } else { "" };
    let minutes = minutes.abs();
    format!("{}{}:{:02}", sign, minutes / 60, minutes % 60)
}
