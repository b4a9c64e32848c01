//! Missed-connection replanning.
//!
//! Packages the round trip a traveler goes through after missing a
//! connection: work out where and when to search from, list the
//! alternatives, fetch the chosen one, and splice it into the itinerary.
//! Every provider request is awaited before the next one is issued.

mod config;

use tracing::{debug, info};

use crate::domain::{
    ConnectionSummary, DetailHandle, DomainError, Itinerary, ReplanQuery, Station, Timestamp,
    format_duration,
};
use crate::provider::{
    ConnectionQuery, ConversionError, ProviderError, TimetableProvider, convert_connection_detail,
    convert_connection_list,
};

pub use config::ReplanConfig;

/// Error from replanning.
#[derive(Debug, thiserror::Error)]
pub enum ReplanError {
    /// The itinerary rejected the request
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The timetable source failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The timetable pages did not convert
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// No usable connection was listed
    #[error("no alternative connection from {origin} to {destination} after {earliest_departure}")]
    NoAlternative {
        origin: Station,
        destination: Station,
        earliest_departure: Timestamp,
    },
}

impl From<&ReplanQuery> for ConnectionQuery {
    fn from(query: &ReplanQuery) -> Self {
        ConnectionQuery::new(
            query.origin.name(),
            query.destination.name(),
            query.earliest_departure,
        )
    }
}

/// Replans itineraries against a timetable provider.
pub struct Replanner<'a, P> {
    provider: &'a P,
    config: &'a ReplanConfig,
}

impl<'a, P: TimetableProvider> Replanner<'a, P> {
    /// Create a new replanner.
    pub fn new(provider: &'a P, config: &'a ReplanConfig) -> Self {
        Self { provider, config }
    }

    /// Work out the search after missing the connection at `missed_at`.
    pub fn query_after_missed(
        &self,
        itinerary: &Itinerary,
        missed_at: &Station,
    ) -> Result<ReplanQuery, ReplanError> {
        Ok(itinerary.plan_after_missed_with_buffer(missed_at, self.config.buffer())?)
    }

    /// List the connections available after missing the connection at `missed_at`.
    pub async fn search_after_missed(
        &self,
        itinerary: &Itinerary,
        missed_at: &Station,
    ) -> Result<Vec<ConnectionSummary>, ReplanError> {
        let query = self.query_after_missed(itinerary, missed_at)?;
        debug!(
            origin = %query.origin,
            destination = %query.destination,
            earliest_departure = %query.earliest_departure,
            "searching for alternatives"
        );

        let list = self
            .provider
            .list_connections(&ConnectionQuery::from(&query))
            .await?;
        Ok(convert_connection_list(&list)?)
    }

    /// Fetch the full itinerary behind a list entry.
    pub async fn fetch_itinerary(&self, handle: &DetailHandle) -> Result<Itinerary, ReplanError> {
        let detail = self.provider.fetch_detail(handle).await?;
        Ok(convert_connection_detail(&detail)?)
    }

    /// Replace everything after `missed_at` with the connection behind `handle`.
    ///
    /// The station is checked before anything is fetched. On any error the
    /// itinerary is left as it was.
    pub async fn replan(
        &self,
        itinerary: &mut Itinerary,
        missed_at: &Station,
        handle: &DetailHandle,
    ) -> Result<(), ReplanError> {
        itinerary.transition_index(missed_at)?;

        let replacement = self.fetch_itinerary(handle).await?;
        itinerary.reconcile(missed_at, replacement)?;

        info!(
            missed_at = %missed_at,
            legs = itinerary.leg_count(),
            delay = %format_duration(itinerary.delay_at_destination()),
            "itinerary reconciled"
        );
        Ok(())
    }

    /// Replan with the earliest listed connection.
    ///
    /// Cancelled connections are passed over unless the configuration says
    /// otherwise. Returns the connection that was used.
    pub async fn replan_with_next(
        &self,
        itinerary: &mut Itinerary,
        missed_at: &Station,
    ) -> Result<ConnectionSummary, ReplanError> {
        let candidates = self.search_after_missed(itinerary, missed_at).await?;

        let next = candidates
            .into_iter()
            .filter(|candidate| !(self.config.skip_cancelled && candidate.cancelled))
            .min_by_key(|candidate| candidate.origin.time());

        let Some(next) = next else {
            let query = self.query_after_missed(itinerary, missed_at)?;
            return Err(ReplanError::NoAlternative {
                origin: query.origin,
                destination: query.destination,
                earliest_departure: query.earliest_departure,
            });
        };

        self.replan(itinerary, missed_at, &next.handle).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{ItineraryState, REFERENCE_ZONE};
    use crate::provider::{
        RawConnectionDetail, RawConnectionList, RawConnectionRow, RawEndpoint, RawLeg,
    };
    use chrono::{Duration, TimeZone};

    /// In-memory provider that records every request.
    #[derive(Default)]
    struct ScriptedProvider {
        rows: Vec<RawConnectionRow>,
        details: HashMap<String, RawConnectionDetail>,
        queries: Mutex<Vec<ConnectionQuery>>,
        fetched: Mutex<Vec<DetailHandle>>,
    }

    impl TimetableProvider for ScriptedProvider {
        async fn list_connections(
            &self,
            query: &ConnectionQuery,
        ) -> Result<RawConnectionList, ProviderError> {
            self.queries.lock().unwrap().push(query.clone());
            Ok(RawConnectionList {
                date: "09.12.2017".into(),
                reference_time: "14:46".into(),
                origin: query.origin.clone(),
                destination: query.destination.clone(),
                rows: self.rows.clone(),
            })
        }

        async fn fetch_detail(
            &self,
            handle: &DetailHandle,
        ) -> Result<RawConnectionDetail, ProviderError> {
            self.fetched.lock().unwrap().push(handle.clone());
            self.details
                .get(handle.as_str())
                .cloned()
                .ok_or_else(|| ProviderError::Status {
                    status: 404,
                    url: handle.to_string(),
                })
        }
    }

    fn at(h: u32, m: u32) -> Timestamp {
        REFERENCE_ZONE.with_ymd_and_hms(2017, 12, 9, h, m, 0).unwrap()
    }

    fn endpoint(station: &str, time: &str, track: &str) -> RawEndpoint {
        RawEndpoint {
            station: station.into(),
            time: time.into(),
            track: Some(track.into()),
            actual_time: None,
        }
    }

    fn leg(from: (&str, &str), to: (&str, &str), train: &str) -> RawLeg {
        RawLeg {
            departure: endpoint(from.0, from.1, "8"),
            arrival: endpoint(to.0, to.1, "1"),
            train: train.into(),
        }
    }

    fn detail(reference: &str, legs: Vec<RawLeg>) -> RawConnectionDetail {
        RawConnectionDetail {
            date: "09.12.17".into(),
            reference_time: reference.into(),
            legs,
        }
    }

    fn row(handle: &str, dep: &str, arr: &str, cancelled: bool) -> RawConnectionRow {
        RawConnectionRow {
            handle: handle.into(),
            departure_time: dep.into(),
            arrival_time: arr.into(),
            departure_actual: None,
            arrival_actual: None,
            transfers: "1".into(),
            products: vec!["RE".into()],
            cancelled,
        }
    }

    /// Köln -> Frankfurt -> Freiburg -> Hinterzarten, 4 minutes late.
    fn original() -> Itinerary {
        let mut raw = detail(
            "13:00",
            vec![
                leg(("Köln Hbf", "13:11"), ("Frankfurt Hbf", "14:22"), "ICE 293"),
                leg(("Frankfurt Hbf", "14:45"), ("Freiburg Hbf", "16:45"), "ICE 293"),
                leg(("Freiburg Hbf", "17:10"), ("Hinterzarten", "17:55"), "RE 123"),
            ],
        );
        raw.legs[2].arrival.actual_time = Some("17:59".into());
        convert_connection_detail(&raw).unwrap()
    }

    fn provider() -> ScriptedProvider {
        let mut details = HashMap::new();
        details.insert(
            "re-236".to_string(),
            detail(
                "14:46",
                vec![
                    leg(("Frankfurt Hbf", "15:45"), ("Freiburg Hbf", "17:45"), "RE 236"),
                    leg(("Freiburg Hbf", "18:22"), ("Hinterzarten", "18:58"), "RE 236"),
                ],
            ),
        );
        details.insert(
            "re-238".to_string(),
            detail(
                "18:23",
                vec![leg(("Freiburg Hbf", "19:22"), ("Hinterzarten", "19:56"), "RE 238")],
            ),
        );

        ScriptedProvider {
            rows: vec![
                row("ice-cancelled", "15:12", "18:30", true),
                row("re-236", "15:45", "18:58", false),
            ],
            details,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn search_uses_missed_departure_plus_buffer() {
        let provider = provider();
        let config = ReplanConfig::default();
        let replanner = Replanner::new(&provider, &config);

        let candidates = replanner
            .search_after_missed(&original(), &Station::new("Frankfurt Hbf"))
            .await
            .unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].handle.as_str(), "re-236");
        assert_eq!(candidates[1].origin.station().name(), "Frankfurt Hbf");

        let queries = provider.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].origin, "Frankfurt Hbf");
        assert_eq!(queries[0].destination, "Hinterzarten");
        assert_eq!(queries[0].departure, at(14, 46));
        assert!(!queries[0].direct_only);
    }

    #[tokio::test]
    async fn search_with_custom_buffer() {
        let provider = provider();
        let config = ReplanConfig::default().with_buffer_mins(10);
        let replanner = Replanner::new(&provider, &config);

        replanner
            .search_after_missed(&original(), &Station::new("Freiburg Hbf"))
            .await
            .unwrap();

        assert_eq!(provider.queries.lock().unwrap()[0].departure, at(17, 20));
    }

    #[tokio::test]
    async fn replan_splices_replacement() {
        let provider = provider();
        let config = ReplanConfig::default();
        let replanner = Replanner::new(&provider, &config);
        let mut itinerary = original();

        replanner
            .replan(
                &mut itinerary,
                &Station::new("Frankfurt Hbf"),
                &DetailHandle::new("re-236"),
            )
            .await
            .unwrap();

        assert_eq!(itinerary.state(), ItineraryState::Reconciled);
        assert_eq!(itinerary.leg_count(), 3);
        assert_eq!(itinerary.legs()[1].train().to_string(), "RE 236");
        assert_eq!(itinerary.delay_at_destination(), Duration::minutes(63));
    }

    #[tokio::test]
    async fn replan_twice_measures_against_first_plan() {
        let provider = provider();
        let config = ReplanConfig::default();
        let replanner = Replanner::new(&provider, &config);
        let mut itinerary = original();
        let first_plan = itinerary.legs().to_vec();

        replanner
            .replan(
                &mut itinerary,
                &Station::new("Frankfurt Hbf"),
                &DetailHandle::new("re-236"),
            )
            .await
            .unwrap();
        replanner
            .replan(
                &mut itinerary,
                &Station::new("Freiburg Hbf"),
                &DetailHandle::new("re-238"),
            )
            .await
            .unwrap();

        assert_eq!(itinerary.original_legs(), &first_plan[..]);
        assert_eq!(itinerary.delay_at_destination(), Duration::minutes(121));
    }

    #[tokio::test]
    async fn replan_checks_station_before_fetching() {
        let provider = provider();
        let config = ReplanConfig::default();
        let replanner = Replanner::new(&provider, &config);
        let mut itinerary = original();
        let before = itinerary.clone();

        let err = replanner
            .replan(
                &mut itinerary,
                &Station::new("Mannheim Hbf"),
                &DetailHandle::new("re-236"),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReplanError::Domain(DomainError::StationNotOnRoute(_))
        ));
        assert!(provider.fetched.lock().unwrap().is_empty());
        assert_eq!(itinerary, before);
    }

    #[tokio::test]
    async fn provider_failure_leaves_itinerary_unchanged() {
        let provider = provider();
        let config = ReplanConfig::default();
        let replanner = Replanner::new(&provider, &config);
        let mut itinerary = original();
        let before = itinerary.clone();

        let err = replanner
            .replan(
                &mut itinerary,
                &Station::new("Frankfurt Hbf"),
                &DetailHandle::new("expired"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ReplanError::Provider(_)));
        assert_eq!(itinerary, before);
    }

    #[tokio::test]
    async fn replan_with_next_skips_cancelled() {
        let provider = provider();
        let config = ReplanConfig::default();
        let replanner = Replanner::new(&provider, &config);
        let mut itinerary = original();

        let used = replanner
            .replan_with_next(&mut itinerary, &Station::new("Frankfurt Hbf"))
            .await
            .unwrap();

        assert_eq!(used.handle.as_str(), "re-236");
        assert_eq!(
            *provider.fetched.lock().unwrap(),
            vec![DetailHandle::new("re-236")]
        );
        assert_eq!(itinerary.delay_at_destination(), Duration::minutes(63));
    }

    #[tokio::test]
    async fn replan_with_next_without_candidates() {
        let provider = ScriptedProvider::default();
        let config = ReplanConfig::default();
        let replanner = Replanner::new(&provider, &config);
        let mut itinerary = original();
        let before = itinerary.clone();

        let err = replanner
            .replan_with_next(&mut itinerary, &Station::new("Freiburg Hbf"))
            .await
            .unwrap_err();

        match err {
            ReplanError::NoAlternative {
                origin,
                destination,
                earliest_departure,
            } => {
                assert_eq!(origin, Station::new("Freiburg Hbf"));
                assert_eq!(destination, Station::new("Hinterzarten"));
                assert_eq!(earliest_departure, at(17, 11));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(itinerary, before);
    }

    #[tokio::test]
    async fn only_cancelled_candidates_is_no_alternative() {
        let provider = ScriptedProvider {
            rows: vec![row("ice-cancelled", "15:12", "18:30", true)],
            ..Default::default()
        };
        let config = ReplanConfig::default();
        let replanner = Replanner::new(&provider, &config);

        let err = replanner
            .replan_with_next(&mut original(), &Station::new("Frankfurt Hbf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReplanError::NoAlternative { .. }));
    }
}
