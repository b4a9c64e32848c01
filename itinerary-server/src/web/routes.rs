//! HTTP route handlers.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::domain::{DetailHandle, DomainError, FormatError, Station};
use crate::provider::{
    ConnectionQuery, ConversionError, ProviderError, TimetableProvider, convert_connection_list,
};
use crate::replan::{ReplanError, Replanner};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/connections", get(list_connections))
        .route("/connections/detail", get(connection_detail))
        .route("/itinerary/alternatives", post(alternatives))
        .route("/itinerary/replan", post(replan))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List connections between two stations.
async fn list_connections(
    State(state): State<AppState>,
    Query(params): Query<ConnectionsParams>,
) -> Result<Json<ConnectionsResponse>, AppError> {
    let departure = parse_departure(params.departure.as_deref())?;
    let query = ConnectionQuery::new(params.from, params.to, departure)
        .with_direct_only(params.direct);

    let list = state.provider.list_connections(&query).await?;
    let summaries = convert_connection_list(&list)?;

    Ok(Json(ConnectionsResponse {
        connections: summaries.iter().map(ConnectionResult::from_summary).collect(),
    }))
}

/// Fetch the full itinerary behind a list entry.
async fn connection_detail(
    State(state): State<AppState>,
    Query(params): Query<DetailParams>,
) -> Result<Json<ItineraryResponse>, AppError> {
    let replanner = Replanner::new(state.provider.as_ref(), state.replan.as_ref());
    let itinerary = replanner
        .fetch_itinerary(&DetailHandle::new(params.handle))
        .await?;

    Ok(Json(ItineraryResponse::from_itinerary(&itinerary)))
}

/// List the alternatives after a missed connection.
async fn alternatives(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AlternativesResponse>, AppError> {
    let req: AlternativesRequest = parse_body(&body)?;
    let itinerary = req.itinerary.to_itinerary()?;
    let missed_at = Station::new(req.missed_at);

    let replanner = Replanner::new(state.provider.as_ref(), state.replan.as_ref());
    let query = replanner.query_after_missed(&itinerary, &missed_at)?;
    let candidates = replanner.search_after_missed(&itinerary, &missed_at).await?;

    Ok(Json(AlternativesResponse {
        origin: query.origin.name().to_string(),
        destination: query.destination.name().to_string(),
        earliest_departure: query.earliest_departure.to_rfc3339(),
        connections: candidates.iter().map(ConnectionResult::from_summary).collect(),
    }))
}

/// Splice a replacement connection into an itinerary.
async fn replan(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ItineraryResponse>, AppError> {
    let req: ReplanRequest = parse_body(&body)?;
    let mut itinerary = req.itinerary.to_itinerary()?;
    let missed_at = Station::new(req.missed_at);

    let replanner = Replanner::new(state.provider.as_ref(), state.replan.as_ref());
    match req.handle {
        Some(handle) => {
            replanner
                .replan(&mut itinerary, &missed_at, &DetailHandle::new(handle))
                .await?
        }
        None => {
            let used = replanner.replan_with_next(&mut itinerary, &missed_at).await?;
            debug!(handle = %used.handle, "replanned with next connection");
        }
    }

    Ok(Json(ItineraryResponse::from_itinerary(&itinerary)))
}

/// Parse a JSON body, logging it on failure.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(body), "invalid JSON body");
        AppError::BadRequest {
            message: format!("Invalid JSON: {e}"),
        }
    })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Upstream { message: String },
}

impl From<FormatError> for AppError {
    fn from(e: FormatError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::ForeignHandle { .. } => AppError::BadRequest {
                message: e.to_string(),
            },
            _ => AppError::Upstream {
                message: e.to_string(),
            },
        }
    }
}

impl From<ConversionError> for AppError {
    fn from(e: ConversionError) -> Self {
        AppError::Upstream {
            message: e.to_string(),
        }
    }
}

impl From<ReplanError> for AppError {
    fn from(e: ReplanError) -> Self {
        match e {
            ReplanError::Domain(e) => e.into(),
            ReplanError::Provider(e) => e.into(),
            ReplanError::Conversion(e) => e.into(),
            e @ ReplanError::NoAlternative { .. } => AppError::NotFound {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message),
        };

        if status.is_server_error() {
            error!(status = %status, "{message}");
        } else {
            warn!(status = %status, "{message}");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
