//! Data transfer objects for web requests and responses.
//!
//! Timestamps travel as RFC 3339 strings. Itineraries travel in full,
//! including the original plan once reconciled, so the server keeps no
//! state between requests.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ConnectionSummary, DomainError, Endpoint, EndpointFields, FormatError, Itinerary,
    ItineraryState, Leg, LegFields, REFERENCE_ZONE, Timestamp, localize,
};

/// Query string of `GET /connections`.
#[derive(Debug, Deserialize)]
pub struct ConnectionsParams {
    /// Origin station name
    pub from: String,

    /// Destination station name
    pub to: String,

    /// Earliest departure as `YYYY-MM-DDTHH:MM` local time (defaults to now)
    pub departure: Option<String>,

    /// Only direct connections
    #[serde(default)]
    pub direct: bool,
}

/// Query string of `GET /connections/detail`.
#[derive(Debug, Deserialize)]
pub struct DetailParams {
    /// Handle from a connection list
    pub handle: String,
}

/// A departure or arrival event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDto {
    /// Station name
    pub station: String,

    /// Scheduled time (RFC 3339)
    pub time: String,

    /// Platform
    #[serde(default)]
    pub track: Option<String>,

    /// Actual time (RFC 3339), if it differs from the scheduled time
    #[serde(default)]
    pub actual_time: Option<String>,
}

impl EndpointDto {
    pub fn from_endpoint(endpoint: &Endpoint) -> Self {
        Self {
            station: endpoint.station().name().to_string(),
            time: endpoint.time().to_rfc3339(),
            track: endpoint.track().map(String::from),
            actual_time: endpoint
                .is_delayed()
                .then(|| endpoint.actual_time().to_rfc3339()),
        }
    }

    fn to_fields(&self) -> Result<EndpointFields, FormatError> {
        let mut fields = EndpointFields::new(self.station.as_str(), parse_timestamp(&self.time)?);
        if let Some(track) = &self.track {
            fields = fields.with_track(track.as_str());
        }
        if let Some(actual) = &self.actual_time {
            fields = fields.with_actual_time(parse_timestamp(actual)?);
        }
        Ok(fields)
    }
}

/// One train of an itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegDto {
    pub departure: EndpointDto,
    pub arrival: EndpointDto,
    /// Train designator (e.g. "ICE 293")
    pub train: String,
}

impl LegDto {
    pub fn from_leg(leg: &Leg) -> Self {
        Self {
            departure: EndpointDto::from_endpoint(leg.departure()),
            arrival: EndpointDto::from_endpoint(leg.arrival()),
            train: leg.train().to_string(),
        }
    }

    fn to_leg(&self) -> Result<Leg, FormatError> {
        Leg::from_fields(LegFields {
            departure: self.departure.to_fields()?,
            arrival: self.arrival.to_fields()?,
            train: self.train.clone(),
        })
    }
}

/// An itinerary as exchanged with callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryDto {
    /// Current legs
    pub legs: Vec<LegDto>,

    /// The first plan, present once the itinerary has been reconciled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_legs: Option<Vec<LegDto>>,
}

impl ItineraryDto {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        Self {
            legs: itinerary.legs().iter().map(LegDto::from_leg).collect(),
            original_legs: itinerary
                .original_snapshot()
                .map(|legs| legs.iter().map(LegDto::from_leg).collect()),
        }
    }

    /// Rebuild the domain itinerary.
    pub fn to_itinerary(&self) -> Result<Itinerary, DomainError> {
        let legs = to_legs(&self.legs)?;
        let original_legs = self.original_legs.as_deref().map(to_legs).transpose()?;
        Itinerary::restore(legs, original_legs)
    }
}

fn to_legs(legs: &[LegDto]) -> Result<Vec<Leg>, FormatError> {
    legs.iter().map(LegDto::to_leg).collect()
}

/// An itinerary with its derived properties.
#[derive(Debug, Serialize)]
pub struct ItineraryResponse {
    /// The itinerary, to be sent back on later requests
    pub itinerary: ItineraryDto,

    /// One-line summary
    pub summary: String,

    /// "pristine" or "reconciled"
    pub state: &'static str,

    /// Number of changes
    pub transfers: usize,

    /// Stations where the traveler changes trains
    pub transition_stations: Vec<String>,

    /// Delay at the destination against the original plan
    pub delay_minutes: i64,
}

impl ItineraryResponse {
    pub fn from_itinerary(itinerary: &Itinerary) -> Self {
        Self {
            itinerary: ItineraryDto::from_itinerary(itinerary),
            summary: itinerary.to_string(),
            state: match itinerary.state() {
                ItineraryState::Pristine => "pristine",
                ItineraryState::Reconciled => "reconciled",
            },
            transfers: itinerary.transfers(),
            transition_stations: itinerary
                .transition_stations()
                .into_iter()
                .map(|station| station.name().to_string())
                .collect(),
            delay_minutes: itinerary.delay_at_destination().num_minutes(),
        }
    }
}

/// A connection in a list.
#[derive(Debug, Serialize)]
pub struct ConnectionResult {
    /// Handle for `GET /connections/detail`
    pub handle: String,

    /// One-line summary
    pub summary: String,

    pub departure: EndpointDto,
    pub arrival: EndpointDto,
    pub transfers: u32,
    pub products: Vec<String>,
    pub cancelled: bool,

    /// Reported delay at the destination
    pub delay_minutes: i64,
}

impl ConnectionResult {
    pub fn from_summary(summary: &ConnectionSummary) -> Self {
        Self {
            handle: summary.handle.to_string(),
            summary: summary.to_string(),
            departure: EndpointDto::from_endpoint(&summary.origin),
            arrival: EndpointDto::from_endpoint(&summary.destination),
            transfers: summary.transfers,
            products: summary.products.iter().cloned().collect(),
            cancelled: summary.cancelled,
            delay_minutes: summary.delay_at_destination().num_minutes(),
        }
    }
}

/// Response of `GET /connections`.
#[derive(Debug, Serialize)]
pub struct ConnectionsResponse {
    pub connections: Vec<ConnectionResult>,
}

/// Request body of `POST /itinerary/alternatives`.
#[derive(Debug, Deserialize)]
pub struct AlternativesRequest {
    pub itinerary: ItineraryDto,

    /// Station where the connection was missed
    pub missed_at: String,
}

/// Response of `POST /itinerary/alternatives`.
#[derive(Debug, Serialize)]
pub struct AlternativesResponse {
    pub origin: String,
    pub destination: String,

    /// Earliest departure searched from (RFC 3339)
    pub earliest_departure: String,

    pub connections: Vec<ConnectionResult>,
}

/// Request body of `POST /itinerary/replan`.
#[derive(Debug, Deserialize)]
pub struct ReplanRequest {
    pub itinerary: ItineraryDto,

    /// Station where the connection was missed
    pub missed_at: String,

    /// Connection to use; the next available one if absent
    pub handle: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Parse an RFC 3339 timestamp into the reference zone.
pub fn parse_timestamp(s: &str) -> Result<Timestamp, FormatError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&REFERENCE_ZONE))
        .map_err(|_| FormatError::new("timestamp", s, "expected RFC 3339"))
}

/// Parse the `departure` query parameter, defaulting to the current minute.
pub fn parse_departure(departure: Option<&str>) -> Result<Timestamp, FormatError> {
    match departure {
        Some(s) => {
            let local = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
                .map_err(|_| FormatError::new("departure", s, "expected YYYY-MM-DDTHH:MM"))?;
            localize(local)
        }
        None => {
            let now = Utc::now().with_timezone(&REFERENCE_ZONE);
            Ok(now
                .with_second(0)
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(now))
        }
    }
}
