//! Timetable provider error types.

/// Errors from fetching or reading timetable pages.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("source unavailable: {0}")]
    Http(#[from] reqwest::Error),

    /// The source answered with a non-success status
    #[error("source unavailable: status {status} from {url}")]
    Status { status: u16, url: String },

    /// A structural marker the extraction relies on is missing
    #[error("source format changed: {marker} not found")]
    FormatChanged { marker: &'static str },

    /// The station names were still ambiguous after resubmitting the form
    #[error("station names still ambiguous after disambiguation ({origin} -> {destination})")]
    StillAmbiguous { origin: String, destination: String },

    /// A detail handle points outside the configured source
    #[error("detail handle {handle} does not belong to the timetable source")]
    ForeignHandle { handle: String },

    /// The configured source URL does not parse
    #[error("invalid source URL {url}")]
    InvalidUrl { url: String },

    /// Fixture directory or file problem
    #[error("fixture error: {message}")]
    Fixture { message: String },
}

impl ProviderError {
    /// Returns true if the source could not be reached or refused the request.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ProviderError::Http(_) | ProviderError::Status { .. } | ProviderError::Fixture { .. }
        )
    }

    pub(crate) fn format_changed(marker: &'static str) -> Self {
        ProviderError::FormatChanged { marker }
    }
}
