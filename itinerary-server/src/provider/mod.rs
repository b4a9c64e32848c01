//! Timetable provider.
//!
//! The source of connection data is the rail operator's mobile timetable,
//! an HTML page format. This module fetches those pages, extracts their
//! fields as raw strings, and converts the raw records into domain types.
//!
//! Key characteristics of the source:
//! - Times are bare "HH:MM" strings in German local time; the date appears
//!   once per page
//! - Connections are referenced by detail page links, which only the source
//!   can interpret
//! - Ambiguous station names are answered with a selection form instead of
//!   results

mod client;
mod convert;
mod disambiguation;
mod error;
mod extract;
mod fixture;
mod types;

use std::future::Future;

use crate::domain::DetailHandle;

pub use client::{MobilePageClient, ProviderConfig};
pub use convert::{ConversionError, convert_connection_detail, convert_connection_list};
pub use disambiguation::{
    DisambiguationForm, DisambiguationPolicy, FirstCandidate, SelectOption, StationChoice,
};
pub use error::ProviderError;
pub use extract::{
    AMBIGUOUS_MARKER, extract_connection_detail, extract_connection_list,
    extract_disambiguation_form, is_ambiguous,
};
pub use fixture::{FixtureProvider, LIST_PAGE};
pub use types::{
    ConnectionQuery, RawConnectionDetail, RawConnectionList, RawConnectionRow, RawEndpoint, RawLeg,
};

/// A source of connection lists and connection details.
///
/// Callers await each request before issuing the next; implementations do
/// not retry.
pub trait TimetableProvider: Send + Sync {
    /// Fetch the connection list for a query.
    fn list_connections(
        &self,
        query: &ConnectionQuery,
    ) -> impl Future<Output = Result<RawConnectionList, ProviderError>> + Send;

    /// Fetch the leg-by-leg detail behind a list entry.
    fn fetch_detail(
        &self,
        handle: &DetailHandle,
    ) -> impl Future<Output = Result<RawConnectionDetail, ProviderError>> + Send;
}

/// The provider selected at startup.
#[derive(Debug, Clone)]
pub enum Source {
    /// Live mobile timetable pages
    Live(MobilePageClient),
    /// Saved pages from a directory
    Fixtures(FixtureProvider),
}

impl TimetableProvider for Source {
    async fn list_connections(
        &self,
        query: &ConnectionQuery,
    ) -> Result<RawConnectionList, ProviderError> {
        match self {
            Source::Live(client) => client.list_connections(query).await,
            Source::Fixtures(fixtures) => fixtures.list_connections(query).await,
        }
    }

    async fn fetch_detail(&self, handle: &DetailHandle) -> Result<RawConnectionDetail, ProviderError> {
        match self {
            Source::Live(client) => client.fetch_detail(handle).await,
            Source::Fixtures(fixtures) => fixtures.fetch_detail(handle).await,
        }
    }
}
