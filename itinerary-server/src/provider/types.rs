//! Raw timetable page records.
//!
//! These types hold exactly what the extraction pulls off a page: strings,
//! not yet validated. The builder in `convert` turns them into domain types.

use crate::domain::Timestamp;

/// Parameters for a connection list request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionQuery {
    /// Origin station name as entered
    pub origin: String,
    /// Destination station name as entered
    pub destination: String,
    /// Earliest departure
    pub departure: Timestamp,
    /// Only return connections without changes
    pub direct_only: bool,
}

impl ConnectionQuery {
    /// Create a query that allows changes.
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, departure: Timestamp) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure,
            direct_only: false,
        }
    }

    /// Restrict the search to direct connections.
    pub fn with_direct_only(mut self, direct_only: bool) -> Self {
        self.direct_only = direct_only;
        self
    }
}

/// A connection list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConnectionList {
    /// Date printed in the page header (`DD.MM.YYYY`)
    pub date: String,
    /// Time of day the query was issued for (`HH:MM`)
    pub reference_time: String,
    /// Origin name as resolved by the source
    pub origin: String,
    /// Destination name as resolved by the source
    pub destination: String,
    /// One entry per listed connection
    pub rows: Vec<RawConnectionRow>,
}

/// One row of a connection list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConnectionRow {
    /// Detail page link
    pub handle: String,
    /// Scheduled departure (`HH:MM`)
    pub departure_time: String,
    /// Scheduled arrival (`HH:MM`)
    pub arrival_time: String,
    /// Reported departure time, if the source printed one
    pub departure_actual: Option<String>,
    /// Reported arrival time, if the source printed one
    pub arrival_actual: Option<String>,
    /// Number of changes, as printed
    pub transfers: String,
    /// Product codes
    pub products: Vec<String>,
    /// The source marked the connection as cancelled
    pub cancelled: bool,
}

/// A connection detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawConnectionDetail {
    /// Date from the query summary (`DD.MM.YY`)
    pub date: String,
    /// Time of day from the query summary (`HH:MM`)
    pub reference_time: String,
    /// Legs in travel order
    pub legs: Vec<RawLeg>,
}

/// One leg of a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLeg {
    pub departure: RawEndpoint,
    pub arrival: RawEndpoint,
    /// Train token as printed (e.g. "ICE 293")
    pub train: String,
}

/// A departure or arrival block of a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEndpoint {
    pub station: String,
    /// Scheduled time (`HH:MM`)
    pub time: String,
    /// Platform number
    pub track: Option<String>,
    /// Delayed time (`HH:MM`), if printed
    pub actual_time: Option<String>,
}
