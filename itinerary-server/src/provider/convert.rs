//! Conversion from raw page records to domain types.
//!
//! Every bare "HH:MM" is resolved against the page's date and query time,
//! so an itinerary that runs past midnight lands on the right calendar day.
//! Any field that fails to parse fails the whole conversion.

use std::collections::BTreeSet;

use crate::domain::{
    ConnectionSummary, DetailHandle, DomainError, Endpoint, EndpointFields, FormatError,
    Itinerary, LegFields, Station, TimeResolver, parse_source_date,
};

use super::types::{RawConnectionDetail, RawConnectionList, RawConnectionRow, RawEndpoint};

/// Error during raw record to domain conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// A page-level field (date, query time) failed to parse
    #[error("page {0}")]
    Page(FormatError),

    /// A field of a list row failed to parse
    #[error("connection {row}: {source}")]
    Row { row: usize, source: FormatError },

    /// A field of a detail leg failed to parse
    #[error("leg {leg} at {station}: {source}")]
    Leg {
        leg: usize,
        station: String,
        source: FormatError,
    },

    /// The records did not form a valid itinerary
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Convert a connection list page.
pub fn convert_connection_list(
    list: &RawConnectionList,
) -> Result<Vec<ConnectionSummary>, ConversionError> {
    let resolver = page_resolver(&list.date, &list.reference_time)?;
    let origin = Station::new(list.origin.as_str());
    let destination = Station::new(list.destination.as_str());

    list.rows
        .iter()
        .enumerate()
        .map(|(row, raw)| {
            convert_row(raw, &resolver, &origin, &destination)
                .map_err(|source| ConversionError::Row { row, source })
        })
        .collect()
}

fn convert_row(
    raw: &RawConnectionRow,
    resolver: &TimeResolver,
    origin: &Station,
    destination: &Station,
) -> Result<ConnectionSummary, FormatError> {
    let departure = resolver.resolve(&raw.departure_time)?;
    let arrival = resolver.resolve(&raw.arrival_time)?;

    let mut origin = Endpoint::new(origin.clone(), departure, None);
    if let Some(actual) = &raw.departure_actual {
        origin = origin.with_actual_time(resolver.resolve(actual)?);
    }

    let mut destination = Endpoint::new(destination.clone(), arrival, None);
    if let Some(actual) = &raw.arrival_actual {
        destination = destination.with_actual_time(resolver.resolve(actual)?);
    }

    let transfers = raw
        .transfers
        .parse::<u32>()
        .map_err(|_| FormatError::new("transfers", raw.transfers.as_str(), "expected a count"))?;

    Ok(ConnectionSummary {
        handle: DetailHandle::new(raw.handle.as_str()),
        origin,
        destination,
        transfers,
        products: raw.products.iter().cloned().collect::<BTreeSet<_>>(),
        cancelled: raw.cancelled,
    })
}

/// Convert a connection detail page into an itinerary.
pub fn convert_connection_detail(
    detail: &RawConnectionDetail,
) -> Result<Itinerary, ConversionError> {
    let resolver = page_resolver(&detail.date, &detail.reference_time)?;

    let legs = detail
        .legs
        .iter()
        .enumerate()
        .map(|(leg, raw)| {
            let departure = endpoint_fields(&raw.departure, &resolver).map_err(|source| {
                ConversionError::Leg {
                    leg,
                    station: raw.departure.station.clone(),
                    source,
                }
            })?;
            let arrival = endpoint_fields(&raw.arrival, &resolver).map_err(|source| {
                ConversionError::Leg {
                    leg,
                    station: raw.arrival.station.clone(),
                    source,
                }
            })?;
            Ok(LegFields {
                departure,
                arrival,
                train: raw.train.clone(),
            })
        })
        .collect::<Result<Vec<_>, ConversionError>>()?;

    Ok(Itinerary::from_fields(legs)?)
}

fn endpoint_fields(
    raw: &RawEndpoint,
    resolver: &TimeResolver,
) -> Result<EndpointFields, FormatError> {
    let mut fields = EndpointFields::new(raw.station.as_str(), resolver.resolve(&raw.time)?);
    if let Some(track) = &raw.track {
        fields = fields.with_track(track.as_str());
    }
    if let Some(actual) = &raw.actual_time {
        fields = fields.with_actual_time(resolver.resolve(actual)?);
    }
    Ok(fields)
}

fn page_resolver(date: &str, reference_time: &str) -> Result<TimeResolver, ConversionError> {
    let date = parse_source_date(date).map_err(ConversionError::Page)?;
    TimeResolver::new(date, reference_time).map_err(ConversionError::Page)
}
