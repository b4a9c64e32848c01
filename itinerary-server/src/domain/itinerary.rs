//! Itinerary type and missed-connection reconciliation.
//!
//! An `Itinerary` is one continuous trip made of one or more legs. When a
//! traveler misses a connection, a replacement fragment is spliced in from
//! the station where the connection was missed. The first splice freezes a
//! copy of the original legs so that the delay at the destination is always
//! measured against the very first plan.

use std::collections::BTreeSet;
use std::fmt;

use chrono::Duration;

use super::summary::write_summary_line;
use super::{DomainError, Endpoint, Leg, LegFields, Station, Timestamp};

/// Safety margin added to the missed departure before searching again, so the
/// search does not offer the connection that was just missed.
pub const MISSED_CONNECTION_BUFFER: Duration = Duration::minutes(1);

/// Lifecycle state of an itinerary with respect to reconciliation.
///
/// The transition is one-way: once reconciled, an itinerary never returns
/// to `Pristine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItineraryState {
    /// No reconciliation has been applied
    Pristine,
    /// One or more replacement fragments have been spliced in
    Reconciled,
}

/// Snapshot of the first plan, once there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Revision {
    Pristine,
    Reconciled { original_legs: Vec<Leg> },
}

/// Parameters for the replacement search after a missed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplanQuery {
    /// Station where the connection was missed
    pub origin: Station,
    /// Final destination of the itinerary
    pub destination: Station,
    /// Earliest departure to search from
    pub earliest_departure: Timestamp,
}

/// A complete trip from origin to destination.
///
/// # Invariants
///
/// - At least one leg
/// - `original_legs` is captured on the first reconciliation and never
///   changes afterwards
///
/// All other properties (origin, destination, transition stations,
/// transfers, delay) are derived from the current legs on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    legs: Vec<Leg>,
    revision: Revision,
}

impl Itinerary {
    /// Construct an itinerary from its legs.
    ///
    /// # Errors
    ///
    /// Returns `Err(DomainError::EmptySequence)` if `legs` is empty.
    pub fn from_legs(legs: Vec<Leg>) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptySequence);
        }

        Ok(Itinerary {
            legs,
            revision: Revision::Pristine,
        })
    }

    /// Construct an itinerary from raw leg fields.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the list is empty or any train token fails to parse.
    pub fn from_fields(fields: Vec<LegFields>) -> Result<Self, DomainError> {
        let legs = fields
            .into_iter()
            .map(Leg::from_fields)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_legs(legs)
    }

    /// Rebuild an itinerary that a caller is handing back, in the state it was in.
    ///
    /// `original_legs` is `None` for a pristine itinerary.
    ///
    /// # Errors
    ///
    /// Returns `Err(DomainError::EmptySequence)` if either leg list is empty.
    pub fn restore(legs: Vec<Leg>, original_legs: Option<Vec<Leg>>) -> Result<Self, DomainError> {
        let mut itinerary = Self::from_legs(legs)?;
        if let Some(original_legs) = original_legs {
            if original_legs.is_empty() {
                return Err(DomainError::EmptySequence);
            }
            itinerary.revision = Revision::Reconciled { original_legs };
        }
        Ok(itinerary)
    }

    /// Returns the current legs in order.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Returns the legs as they stood before the first reconciliation.
    ///
    /// For a pristine itinerary this is the current legs.
    pub fn original_legs(&self) -> &[Leg] {
        match &self.revision {
            Revision::Pristine => &self.legs,
            Revision::Reconciled { original_legs } => original_legs,
        }
    }

    /// Returns the captured snapshot, if a reconciliation has happened.
    pub fn original_snapshot(&self) -> Option<&[Leg]> {
        match &self.revision {
            Revision::Pristine => None,
            Revision::Reconciled { original_legs } => Some(original_legs),
        }
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> ItineraryState {
        match self.revision {
            Revision::Pristine => ItineraryState::Pristine,
            Revision::Reconciled { .. } => ItineraryState::Reconciled,
        }
    }

    /// Returns the number of legs.
    pub fn leg_count(&self) -> usize {
        self.legs.len()
    }

    /// Returns the departure event of the first leg.
    pub fn origin(&self) -> &Endpoint {
        // Non-empty by construction
        self.legs[0].departure()
    }

    /// Returns the arrival event of the last leg.
    pub fn destination(&self) -> &Endpoint {
        // Non-empty by construction
        self.legs[self.legs.len() - 1].arrival()
    }

    /// Returns the stations where the traveler changes trains, in order.
    ///
    /// These are the departure stations of every leg but the first.
    pub fn transition_stations(&self) -> Vec<&Station> {
        self.legs
            .iter()
            .skip(1)
            .map(|leg| leg.departure_station())
            .collect()
    }

    /// Returns the number of changes (legs - 1).
    pub fn transfers(&self) -> usize {
        self.legs.len() - 1
    }

    /// Returns true if this is a direct connection.
    pub fn is_direct(&self) -> bool {
        self.legs.len() == 1
    }

    /// Returns the scheduled duration from origin to destination.
    pub fn duration(&self) -> Duration {
        self.destination().time() - self.origin().time()
    }

    /// Returns the product codes of all legs, sorted.
    pub fn products(&self) -> BTreeSet<&str> {
        self.legs
            .iter()
            .map(|leg| leg.train().kind())
            .filter(|kind| !kind.is_empty())
            .collect()
    }

    /// Returns the delay at the destination relative to the original plan.
    ///
    /// Actual arrival of the current last leg minus the scheduled arrival of
    /// the original last leg. This accumulates across any number of
    /// reconciliations.
    pub fn delay_at_destination(&self) -> Duration {
        let original = self.original_legs();
        // Non-empty by construction
        let planned = original[original.len() - 1].arrival().time();
        self.destination().actual_time() - planned
    }

    /// Position of `station` in [`transition_stations`](Self::transition_stations).
    ///
    /// When the itinerary passes a station more than once, the first
    /// occurrence wins.
    pub fn transition_index(&self, station: &Station) -> Result<usize, DomainError> {
        self.legs
            .iter()
            .skip(1)
            .position(|leg| leg.departure_station() == station)
            .ok_or_else(|| DomainError::StationNotOnRoute(station.clone()))
    }

    /// Splice a replacement fragment in after a missed connection.
    ///
    /// Keeps every leg up to and including the one arriving at `missed_at`,
    /// then appends all of `replacement`'s legs. The first call captures the
    /// current legs as the original plan.
    ///
    /// # Errors
    ///
    /// Returns `Err(DomainError::StationNotOnRoute)` if `missed_at` is not a
    /// transition station. The itinerary is left untouched in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use itinerary_server::domain::{
    ///     EndpointFields, Itinerary, ItineraryState, LegFields, REFERENCE_ZONE, Station,
    /// };
    /// use chrono::TimeZone;
    ///
    /// let at = |h, m| REFERENCE_ZONE.with_ymd_and_hms(2017, 12, 9, h, m, 0).unwrap();
    /// let leg = |from: &str, dep, to: &str, arr, train: &str| LegFields {
    ///     departure: EndpointFields::new(from, dep),
    ///     arrival: EndpointFields::new(to, arr),
    ///     train: train.into(),
    /// };
    ///
    /// let mut itinerary = Itinerary::from_fields(vec![
    ///     leg("Frankfurt Hbf", at(14, 45), "Freiburg Hbf", at(16, 45), "ICE 293"),
    ///     leg("Freiburg Hbf", at(17, 10), "Hinterzarten", at(17, 55), "RE 123"),
    /// ])
    /// .unwrap();
    ///
    /// let replacement = Itinerary::from_fields(vec![
    ///     leg("Freiburg Hbf", at(18, 22), "Hinterzarten", at(18, 58), "RE 236"),
    /// ])
    /// .unwrap();
    ///
    /// itinerary.reconcile(&Station::new("Freiburg Hbf"), replacement).unwrap();
    ///
    /// assert_eq!(itinerary.state(), ItineraryState::Reconciled);
    /// assert_eq!(itinerary.delay_at_destination().num_minutes(), 63);
    /// ```
    pub fn reconcile(
        &mut self,
        missed_at: &Station,
        replacement: Itinerary,
    ) -> Result<(), DomainError> {
        // Check before touching anything: all-or-nothing
        let index = self.transition_index(missed_at)?;

        if let Revision::Pristine = self.revision {
            self.revision = Revision::Reconciled {
                original_legs: self.legs.clone(),
            };
        }

        self.legs.truncate(index + 1);
        self.legs.extend(replacement.legs);
        Ok(())
    }

    /// Work out the search parameters after missing the connection at `missed_at`.
    ///
    /// The earliest departure is the scheduled departure of the leg leaving
    /// `missed_at`, plus [`MISSED_CONNECTION_BUFFER`].
    pub fn plan_after_missed(&self, missed_at: &Station) -> Result<ReplanQuery, DomainError> {
        self.plan_after_missed_with_buffer(missed_at, MISSED_CONNECTION_BUFFER)
    }

    /// Like [`plan_after_missed`](Self::plan_after_missed) with a custom buffer.
    pub fn plan_after_missed_with_buffer(
        &self,
        missed_at: &Station,
        buffer: Duration,
    ) -> Result<ReplanQuery, DomainError> {
        let index = self.transition_index(missed_at)?;
        let missed_leg = &self.legs[index + 1];

        Ok(ReplanQuery {
            origin: missed_at.clone(),
            destination: self.destination().station().clone(),
            earliest_departure: missed_leg.departure().time() + buffer,
        })
    }
}

impl fmt::Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_summary_line(
            f,
            self.origin(),
            self.destination(),
            self.transfers(),
            self.products().into_iter(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EndpointFields, REFERENCE_ZONE};
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> Timestamp {
        REFERENCE_ZONE.with_ymd_and_hms(2017, 12, 9, h, m, 0).unwrap()
    }

    fn leg(
        from: &str,
        dep: Timestamp,
        to: &str,
        arr: Timestamp,
        actual_arr: Option<Timestamp>,
        train: &str,
    ) -> LegFields {
        let mut arrival = EndpointFields::new(to, arr);
        arrival.actual_time = actual_arr;
        LegFields {
            departure: EndpointFields::new(from, dep),
            arrival,
            train: train.into(),
        }
    }

    /// Köln -> Frankfurt -> Freiburg -> Hinterzarten, 4 minutes late at the end.
    fn complete_itinerary() -> Itinerary {
        Itinerary::from_fields(vec![
            leg("Köln Hbf", at(13, 11), "Frankfurt Hbf", at(14, 22), None, "ICE 293"),
            leg("Frankfurt Hbf", at(14, 45), "Freiburg Hbf", at(16, 45), None, "ICE 293"),
            leg(
                "Freiburg Hbf",
                at(17, 10),
                "Hinterzarten",
                at(17, 55),
                Some(at(17, 59)),
                "RE 123",
            ),
        ])
        .unwrap()
    }

    /// Frankfurt -> Freiburg -> Hinterzarten, one hour after the original plan.
    fn replacement_from_frankfurt() -> Itinerary {
        Itinerary::from_fields(vec![
            leg("Frankfurt Hbf", at(15, 45), "Freiburg Hbf", at(17, 45), None, "RE 236"),
            leg("Freiburg Hbf", at(18, 22), "Hinterzarten", at(18, 58), None, "RE 236"),
        ])
        .unwrap()
    }

    /// Freiburg -> Hinterzarten, two hours after the original plan.
    fn replacement_from_freiburg() -> Itinerary {
        Itinerary::from_fields(vec![leg(
            "Freiburg Hbf",
            at(19, 22),
            "Hinterzarten",
            at(19, 56),
            None,
            "RE 238",
        )])
        .unwrap()
    }

    fn station(name: &str) -> Station {
        Station::new(name)
    }

    #[test]
    fn empty_legs_rejected() {
        assert!(matches!(
            Itinerary::from_legs(vec![]),
            Err(DomainError::EmptySequence)
        ));
        assert!(matches!(
            Itinerary::from_fields(vec![]),
            Err(DomainError::EmptySequence)
        ));
    }

    #[test]
    fn bad_train_token_rejected() {
        let result = Itinerary::from_fields(vec![leg(
            "Köln Hbf",
            at(13, 11),
            "Frankfurt Hbf",
            at(14, 22),
            None,
            "ICE/293",
        )]);
        assert!(matches!(result, Err(DomainError::Format(_))));
    }

    #[test]
    fn origin_and_destination() {
        let itinerary = complete_itinerary();
        assert_eq!(itinerary.origin().station().name(), "Köln Hbf");
        assert_eq!(itinerary.destination().station().name(), "Hinterzarten");
    }

    #[test]
    fn transition_stations() {
        let itinerary = complete_itinerary();
        assert_eq!(
            itinerary.transition_stations(),
            vec![&station("Frankfurt Hbf"), &station("Freiburg Hbf")]
        );
    }

    #[test]
    fn number_of_transfers() {
        let itinerary = complete_itinerary();
        assert_eq!(itinerary.transfers(), 2);
        assert!(!itinerary.is_direct());

        let direct = replacement_from_freiburg();
        assert_eq!(direct.transfers(), 0);
        assert!(direct.is_direct());
        assert!(direct.transition_stations().is_empty());
    }

    #[test]
    fn pristine_delay_is_final_leg_delay() {
        let itinerary = complete_itinerary();
        assert_eq!(itinerary.state(), ItineraryState::Pristine);
        assert!(itinerary.original_snapshot().is_none());
        assert_eq!(itinerary.original_legs(), itinerary.legs());
        assert_eq!(itinerary.delay_at_destination(), Duration::minutes(4));
    }

    #[test]
    fn reconcile_keeps_prefix_and_appends_replacement() {
        let mut itinerary = complete_itinerary();
        let original = itinerary.legs().to_vec();
        let replacement = replacement_from_frankfurt();
        let replacement_legs = replacement.legs().to_vec();

        itinerary
            .reconcile(&station("Frankfurt Hbf"), replacement)
            .unwrap();

        assert_eq!(itinerary.leg_count(), 3);
        assert_eq!(&itinerary.legs()[..1], &original[..1]);
        assert_eq!(&itinerary.legs()[1..], &replacement_legs[..]);
    }

    #[test]
    fn reconcile_captures_original_legs() {
        let mut itinerary = complete_itinerary();
        let original = itinerary.legs().to_vec();

        itinerary
            .reconcile(&station("Frankfurt Hbf"), replacement_from_frankfurt())
            .unwrap();

        assert_eq!(itinerary.state(), ItineraryState::Reconciled);
        assert_eq!(itinerary.original_legs(), &original[..]);
        assert_eq!(itinerary.original_snapshot(), Some(&original[..]));
    }

    #[test]
    fn delay_after_reconcile_measured_against_original_plan() {
        let mut itinerary = complete_itinerary();
        itinerary
            .reconcile(&station("Frankfurt Hbf"), replacement_from_frankfurt())
            .unwrap();

        // 18:58 actual vs 17:55 planned
        assert_eq!(itinerary.delay_at_destination(), Duration::minutes(63));
    }

    #[test]
    fn reconcile_twice_keeps_first_snapshot() {
        let mut itinerary = complete_itinerary();
        let original = itinerary.legs().to_vec();
        let first = replacement_from_frankfurt();
        let first_legs = first.legs().to_vec();
        let second = replacement_from_freiburg();
        let second_legs = second.legs().to_vec();

        itinerary.reconcile(&station("Frankfurt Hbf"), first).unwrap();
        let transition = itinerary.transition_stations()[1].clone();
        itinerary.reconcile(&transition, second).unwrap();

        let expected = vec![
            original[0].clone(),
            first_legs[0].clone(),
            second_legs[0].clone(),
        ];
        assert_eq!(itinerary.legs(), &expected[..]);
        assert_eq!(itinerary.original_legs(), &original[..]);

        // 19:56 actual vs 17:55 planned
        assert_eq!(itinerary.delay_at_destination(), Duration::minutes(121));
    }

    #[test]
    fn reconcile_at_unknown_station_leaves_legs_unchanged() {
        let mut itinerary = complete_itinerary();
        let before = itinerary.clone();

        let result = itinerary.reconcile(&station("Mannheim Hbf"), replacement_from_frankfurt());

        assert_eq!(
            result,
            Err(DomainError::StationNotOnRoute(station("Mannheim Hbf")))
        );
        assert_eq!(itinerary, before);
        assert_eq!(itinerary.state(), ItineraryState::Pristine);
    }

    #[test]
    fn origin_is_not_a_transition_station() {
        let mut itinerary = complete_itinerary();
        let result = itinerary.reconcile(&station("Köln Hbf"), replacement_from_frankfurt());
        assert!(matches!(result, Err(DomainError::StationNotOnRoute(_))));
        assert_eq!(itinerary.leg_count(), 3);
    }

    #[test]
    fn revisited_station_uses_first_occurrence() {
        // A -> B -> C -> B -> D
        let mut itinerary = Itinerary::from_fields(vec![
            leg("A", at(8, 0), "B", at(8, 30), None, "RB 1"),
            leg("B", at(8, 40), "C", at(9, 0), None, "RB 2"),
            leg("C", at(9, 10), "B", at(9, 30), None, "RB 3"),
            leg("B", at(9, 40), "D", at(10, 0), None, "RB 4"),
        ])
        .unwrap();
        assert_eq!(itinerary.transition_index(&station("B")).unwrap(), 0);

        let replacement =
            Itinerary::from_fields(vec![leg("B", at(9, 0), "D", at(9, 50), None, "RE 5")])
                .unwrap();
        itinerary.reconcile(&station("B"), replacement).unwrap();

        assert_eq!(itinerary.leg_count(), 2);
        assert_eq!(itinerary.legs()[1].train().to_string(), "RE 5");
    }

    #[test]
    fn plan_after_missed() {
        let itinerary = complete_itinerary();
        let query = itinerary.plan_after_missed(&station("Frankfurt Hbf")).unwrap();

        assert_eq!(query.origin, station("Frankfurt Hbf"));
        assert_eq!(query.destination, station("Hinterzarten"));
        assert_eq!(query.earliest_departure, at(14, 46));
        assert!(query.earliest_departure > itinerary.legs()[1].departure().time());
    }

    #[test]
    fn plan_after_missed_with_custom_buffer() {
        let itinerary = complete_itinerary();
        let query = itinerary
            .plan_after_missed_with_buffer(&station("Freiburg Hbf"), Duration::minutes(5))
            .unwrap();
        assert_eq!(query.earliest_departure, at(17, 15));
    }

    #[test]
    fn plan_after_missed_does_not_mutate() {
        let itinerary = complete_itinerary();
        let before = itinerary.clone();
        let _ = itinerary.plan_after_missed(&station("Freiburg Hbf")).unwrap();
        assert_eq!(itinerary, before);
    }

    #[test]
    fn plan_after_missed_at_unknown_station() {
        let itinerary = complete_itinerary();
        assert!(matches!(
            itinerary.plan_after_missed(&station("Basel SBB")),
            Err(DomainError::StationNotOnRoute(_))
        ));
    }

    #[test]
    fn restore_pristine_and_reconciled() {
        let itinerary = complete_itinerary();
        let legs = itinerary.legs().to_vec();

        let restored = Itinerary::restore(legs.clone(), None).unwrap();
        assert_eq!(restored, itinerary);

        let mut reconciled = itinerary.clone();
        reconciled
            .reconcile(&station("Frankfurt Hbf"), replacement_from_frankfurt())
            .unwrap();
        let restored = Itinerary::restore(
            reconciled.legs().to_vec(),
            reconciled.original_snapshot().map(<[Leg]>::to_vec),
        )
        .unwrap();
        assert_eq!(restored, reconciled);
        assert_eq!(restored.delay_at_destination(), Duration::minutes(63));
    }

    #[test]
    fn restore_rejects_empty_snapshot() {
        let legs = complete_itinerary().legs().to_vec();
        assert!(matches!(
            Itinerary::restore(legs, Some(vec![])),
            Err(DomainError::EmptySequence)
        ));
    }

    #[test]
    fn duration_and_products() {
        let itinerary = complete_itinerary();
        assert_eq!(itinerary.duration(), Duration::minutes(284));
        assert_eq!(
            itinerary.products().into_iter().collect::<Vec<_>>(),
            vec!["ICE", "RE"]
        );
    }

    #[test]
    fn display_summary_line() {
        let itinerary = complete_itinerary();
        assert_eq!(
            itinerary.to_string(),
            "13:11 Köln Hbf -> 17:55 Hinterzarten (transfers: 2, duration: 4:44, products: ICE, RE)"
        );
    }
}
