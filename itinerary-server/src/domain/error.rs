//! Domain error types.
//!
//! These errors represent validation failures and contract violations
//! in the domain layer. They are distinct from transport errors.

use super::Station;

/// Error returned when a raw field cannot be parsed into the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field} {value:?}: {reason}")]
pub struct FormatError {
    field: &'static str,
    value: String,
    reason: &'static str,
}

impl FormatError {
    pub(crate) fn new(field: &'static str, value: impl Into<String>, reason: &'static str) -> Self {
        Self {
            field,
            value: value.into(),
            reason,
        }
    }

    /// Name of the field that failed to parse.
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// The offending raw value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Domain-level errors for construction and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A raw field could not be parsed
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Itinerary built from zero legs
    #[error("itinerary must have at least one leg")]
    EmptySequence,

    /// Station is not one of the itinerary's transition stations
    #[error("station {0} is not a transition station of this itinerary")]
    StationNotOnRoute(Station),
}
