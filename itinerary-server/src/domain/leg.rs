//! Train leg type.
//!
//! A `Leg` is a single scheduled train movement between two stations:
//! where the traveler boards, where they alight, and which train carries them.

use chrono::Duration;

use super::{Endpoint, EndpointFields, FormatError, Station, Train};

/// A leg of an itinerary (one train).
///
/// Legs are value objects: built once from provider data and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    departure: Endpoint,
    arrival: Endpoint,
    train: Train,
}

impl Leg {
    /// Construct a leg from already-built parts.
    pub fn new(departure: Endpoint, arrival: Endpoint, train: Train) -> Self {
        Self {
            departure,
            arrival,
            train,
        }
    }

    /// Build a leg from raw fields.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the train token does not parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use itinerary_server::domain::{EndpointFields, Leg, LegFields, REFERENCE_ZONE};
    /// use chrono::TimeZone;
    ///
    /// let dep = REFERENCE_ZONE.with_ymd_and_hms(2017, 12, 9, 14, 57, 0).unwrap();
    /// let arr = REFERENCE_ZONE.with_ymd_and_hms(2017, 12, 9, 17, 5, 0).unwrap();
    ///
    /// let leg = Leg::from_fields(LegFields {
    ///     departure: EndpointFields::new("Frankfurt Hbf", dep).with_track("6"),
    ///     arrival: EndpointFields::new("Freiburg Hbf", arr).with_track("4"),
    ///     train: "ICE 293".into(),
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(leg.departure().station().name(), "Frankfurt Hbf");
    /// assert_eq!(leg.train().to_string(), "ICE 293");
    /// ```
    pub fn from_fields(fields: LegFields) -> Result<Self, FormatError> {
        let train = Train::from_raw(&fields.train)?;
        Ok(Self {
            departure: fields.departure.into(),
            arrival: fields.arrival.into(),
            train,
        })
    }

    /// Returns the departure event.
    pub fn departure(&self) -> &Endpoint {
        &self.departure
    }

    /// Returns the arrival event.
    pub fn arrival(&self) -> &Endpoint {
        &self.arrival
    }

    /// Returns the train.
    pub fn train(&self) -> &Train {
        &self.train
    }

    /// Returns the boarding station.
    pub fn departure_station(&self) -> &Station {
        self.departure.station()
    }

    /// Returns the alighting station.
    pub fn arrival_station(&self) -> &Station {
        self.arrival.station()
    }

    /// Returns the scheduled travel time.
    pub fn duration(&self) -> Duration {
        self.arrival.time() - self.departure.time()
    }
}

/// Raw fields for a [`Leg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegFields {
    /// Departure event fields
    pub departure: EndpointFields,
    /// Arrival event fields
    pub arrival: EndpointFields,
    /// Raw train designator token (e.g. "ICE 293")
    pub train: String,
}
