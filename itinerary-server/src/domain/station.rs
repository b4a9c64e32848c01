//! Station type.

use std::fmt;

/// A station, identified solely by its display name.
///
/// The timetable source only ever reports names, so two stations are equal
/// exactly when their names are byte-for-byte identical. No case folding or
/// whitespace normalization takes place.
///
/// # Examples
///
/// ```
/// use itinerary_server::domain::Station;
///
/// let a = Station::new("Freiburg Hbf");
/// assert_eq!(a, Station::new("Freiburg Hbf"));
/// assert_ne!(a, Station::new("Freiburg"));
/// assert_ne!(a, Station::new("freiburg hbf"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Station {
    name: String,
}

impl Station {
    /// Create a station from its display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Station({})", self.name)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
