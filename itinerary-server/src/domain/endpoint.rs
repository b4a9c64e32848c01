//! Departure and arrival events.

use chrono::Duration;

use super::{Station, Timestamp};

/// A departure or arrival event at a station.
///
/// Carries the scheduled time, the platform if the source reports one, and
/// the actual time. Without live information the actual time equals the
/// scheduled time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    station: Station,
    time: Timestamp,
    track: Option<String>,
    actual_time: Timestamp,
}

impl Endpoint {
    /// Create an endpoint with no delay information.
    pub fn new(station: Station, time: Timestamp, track: Option<String>) -> Self {
        Self {
            station,
            time,
            track,
            actual_time: time,
        }
    }

    /// Build an endpoint from raw fields.
    ///
    /// `actual_time` defaults to `time` when absent.
    pub fn from_fields(
        station_name: impl Into<String>,
        time: Timestamp,
        track: Option<String>,
        actual_time: Option<Timestamp>,
    ) -> Self {
        Self {
            station: Station::new(station_name),
            time,
            track,
            actual_time: actual_time.unwrap_or(time),
        }
    }

    /// Replace the actual time.
    pub fn with_actual_time(mut self, actual_time: Timestamp) -> Self {
        self.actual_time = actual_time;
        self
    }

    /// Returns the station.
    pub fn station(&self) -> &Station {
        &self.station
    }

    /// Returns the scheduled time.
    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// Returns the platform label, if known.
    pub fn track(&self) -> Option<&str> {
        self.track.as_deref()
    }

    /// Returns the actual (possibly delayed) time.
    pub fn actual_time(&self) -> Timestamp {
        self.actual_time
    }

    /// Returns `actual_time - time`.
    ///
    /// Zero or positive in practice, but an early actual time yields a
    /// negative duration rather than an error.
    pub fn delay(&self) -> Duration {
        self.actual_time - self.time
    }

    /// Returns true if the actual time differs from the scheduled time.
    pub fn is_delayed(&self) -> bool {
        self.actual_time != self.time
    }
}

/// Raw fields for an [`Endpoint`], as produced by the connection builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFields {
    /// Station display name
    pub station: String,
    /// Scheduled time
    pub time: Timestamp,
    /// Platform label
    pub track: Option<String>,
    /// Actual time, if the source reported one
    pub actual_time: Option<Timestamp>,
}

impl EndpointFields {
    /// Fields for an endpoint without track or delay information.
    pub fn new(station: impl Into<String>, time: Timestamp) -> Self {
        Self {
            station: station.into(),
            time,
            track: None,
            actual_time: None,
        }
    }

    /// Set the platform label.
    pub fn with_track(mut self, track: impl Into<String>) -> Self {
        self.track = Some(track.into());
        self
    }

    /// Set the actual time.
    pub fn with_actual_time(mut self, actual_time: Timestamp) -> Self {
        self.actual_time = Some(actual_time);
        self
    }
}

impl From<EndpointFields> for Endpoint {
    fn from(fields: EndpointFields) -> Self {
        Endpoint::from_fields(fields.station, fields.time, fields.track, fields.actual_time)
    }
}
