//! Connection list entries.
//!
//! A connection list only carries the end points of each candidate plus a
//! handle for fetching the full leg-by-leg detail.

use std::collections::BTreeSet;
use std::fmt;

use chrono::Duration;

use super::time::{format_duration, format_hhmm};
use super::Endpoint;

/// Opaque reference to a connection's detail page.
///
/// Only valid for the source that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetailHandle(String);

impl DetailHandle {
    /// Wrap a raw handle.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw handle.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DetailHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry in a connection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSummary {
    /// Handle for [`fetch_detail`](crate::provider::TimetableProvider::fetch_detail)
    pub handle: DetailHandle,
    /// Departure from the queried origin
    pub origin: Endpoint,
    /// Arrival at the queried destination
    pub destination: Endpoint,
    /// Number of changes
    pub transfers: u32,
    /// Product codes of the trains involved
    pub products: BTreeSet<String>,
    /// The source flagged this connection as cancelled
    pub cancelled: bool,
}

impl ConnectionSummary {
    /// Scheduled door-to-door time.
    pub fn duration(&self) -> Duration {
        self.destination.time() - self.origin.time()
    }

    /// Reported delay at the destination.
    pub fn delay_at_destination(&self) -> Duration {
        self.destination.delay()
    }
}

impl fmt::Display for ConnectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary_line(
            f,
            &self.origin,
            &self.destination,
            self.transfers as usize,
            self.products.iter().map(String::as_str),
        )?;
        if self.cancelled {
            write!(f, " [cancelled]")?;
        }
        Ok(())
    }
}

/// Shared one-line rendering for summaries and itineraries.
///
/// `products` must already be sorted.
pub(super) fn write_summary_line<'a>(
    f: &mut fmt::Formatter<'_>,
    origin: &Endpoint,
    destination: &Endpoint,
    transfers: usize,
    products: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    let products: Vec<&str> = products.collect();
    write!(
        f,
        "{} {} -> {} {} (transfers: {}, duration: {}, products: {})",
        format_hhmm(&origin.time()),
        origin.station(),
        format_hhmm(&destination.time()),
        destination.station(),
        transfers,
        format_duration(destination.time() - origin.time()),
        products.join(", "),
    )
}
