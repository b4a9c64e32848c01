//! Mobile timetable page HTTP client.
//!
//! Queries the rail operator's mobile timetable pages and extracts raw
//! connection records from the returned markup.

use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, warn};

use crate::domain::{DetailHandle, format_hhmm, format_query_date};

use super::disambiguation::{DisambiguationPolicy, FirstCandidate};
use super::error::ProviderError;
use super::extract::{
    extract_connection_detail, extract_connection_list, extract_disambiguation_form, is_ambiguous,
};
use super::types::{ConnectionQuery, RawConnectionDetail, RawConnectionList};
use super::TimetableProvider;

/// Default query URL of the mobile timetable.
const DEFAULT_BASE_URL: &str = "http://mobile.bahn.de/bin/mobil/query.exe/dox";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent.
const DEFAULT_USER_AGENT: &str = concat!("itinerary-server/", env!("CARGO_PKG_VERSION"));

/// Configuration for the mobile page client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Query URL (defaults to the production mobile timetable)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP client for the mobile timetable pages.
#[derive(Debug, Clone)]
pub struct MobilePageClient {
    http: reqwest::Client,
    base_url: Url,
    policy: Arc<dyn DisambiguationPolicy>,
}

impl MobilePageClient {
    /// Create a client that resolves ambiguous stations to the first candidate.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        Self::with_policy(config, FirstCandidate)
    }

    /// Create a client with a custom disambiguation policy.
    pub fn with_policy(
        config: ProviderConfig,
        policy: impl DisambiguationPolicy + 'static,
    ) -> Result<Self, ProviderError> {
        let base_url = Url::parse(&config.base_url).map_err(|_| ProviderError::InvalidUrl {
            url: config.base_url.clone(),
        })?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            policy: Arc::new(policy),
        })
    }

    /// Query parameters for a connection list request.
    fn list_params(query: &ConnectionQuery) -> [(&'static str, String); 6] {
        [
            ("S", query.origin.clone()),
            ("Z", query.destination.clone()),
            ("date", format_query_date(&query.departure)),
            ("time", format_hhmm(&query.departure)),
            ("start", "1".to_string()),
            (
                "REQ0JourneyProduct_opt0",
                if query.direct_only { "1" } else { "0" }.to_string(),
            ),
        ]
    }

    /// Resolve a detail handle against the base URL.
    ///
    /// Handles may be absolute or relative, but must point at the configured
    /// scheme, host and port.
    fn detail_url(&self, handle: &DetailHandle) -> Result<Url, ProviderError> {
        let foreign = || ProviderError::ForeignHandle {
            handle: handle.to_string(),
        };

        let url = self.base_url.join(handle.as_str()).map_err(|_| foreign())?;
        let same_origin = url.scheme() == self.base_url.scheme()
            && url.host_str() == self.base_url.host_str()
            && url.port_or_known_default() == self.base_url.port_or_known_default();

        if !same_origin {
            warn!(handle = %handle, "refusing detail handle outside the timetable source");
            return Err(foreign());
        }
        Ok(url)
    }

    /// Post the disambiguation form on `html` back to the source.
    async fn resubmit(&self, page_url: &Url, html: &str) -> Result<(Url, String), ProviderError> {
        let form = extract_disambiguation_form(html)?;
        let submission = form.resolve(self.policy.as_ref())?;

        let url = page_url
            .join(&form.action)
            .map_err(|_| ProviderError::format_changed("disambiguation form action"))?;

        debug!(url = %url, "resubmitting disambiguation form");
        let response = self.http.post(url).form(&submission).send().await?;
        read_page(response).await
    }
}

/// Check the status and read the body of a page response.
async fn read_page(response: reqwest::Response) -> Result<(Url, String), ProviderError> {
    let status = response.status();
    let url = response.url().clone();

    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    Ok((url, body))
}

impl TimetableProvider for MobilePageClient {
    async fn list_connections(
        &self,
        query: &ConnectionQuery,
    ) -> Result<RawConnectionList, ProviderError> {
        debug!(
            origin = %query.origin,
            destination = %query.destination,
            departure = %query.departure,
            direct_only = query.direct_only,
            "requesting connection list"
        );

        let response = self
            .http
            .get(self.base_url.clone())
            .query(&Self::list_params(query))
            .send()
            .await?;
        let (url, mut html) = read_page(response).await?;

        if is_ambiguous(&html) {
            (_, html) = self.resubmit(&url, &html).await?;
            if is_ambiguous(&html) {
                warn!(origin = %query.origin, destination = %query.destination, "station names still ambiguous");
                return Err(ProviderError::StillAmbiguous {
                    origin: query.origin.clone(),
                    destination: query.destination.clone(),
                });
            }
        }

        extract_connection_list(&html, &format_hhmm(&query.departure))
    }

    async fn fetch_detail(&self, handle: &DetailHandle) -> Result<RawConnectionDetail, ProviderError> {
        debug!(handle = %handle, "requesting connection detail");

        let url = self.detail_url(handle)?;
        let response = self.http.get(url).send().await?;
        let (_, html) = read_page(response).await?;

        extract_connection_detail(&html)
    }
}
