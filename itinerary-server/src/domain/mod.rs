//! Domain types for the itinerary planner.
//!
//! This module contains the core model: stations, trains, departure and
//! arrival events, legs, and itineraries, plus the time handling needed to
//! turn the timetable source's bare "HH:MM" strings into absolute
//! timestamps. All types enforce their invariants at construction time, so
//! code that receives these types can trust their validity.

mod endpoint;
mod error;
mod itinerary;
mod leg;
mod station;
mod summary;
mod time;
mod train;

pub use endpoint::{Endpoint, EndpointFields};
pub use error::{DomainError, FormatError};
pub use itinerary::{Itinerary, ItineraryState, MISSED_CONNECTION_BUFFER, ReplanQuery};
pub use leg::{Leg, LegFields};
pub use station::Station;
pub use summary::{ConnectionSummary, DetailHandle};
pub use time::{
    REFERENCE_ZONE, TimeResolver, Timestamp, format_duration, format_hhmm, format_query_date,
    localize, parse_hhmm, parse_source_date, resolve,
};
pub use train::Train;
