//! Web layer for the itinerary planner.
//!
//! Provides JSON endpoints for listing connections, fetching itineraries,
//! and replanning after a missed connection.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
