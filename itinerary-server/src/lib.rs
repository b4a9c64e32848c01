//! Itinerary server.
//!
//! A web application that answers: "I missed my connection at this
//! station, how do I still get to my destination?"

pub mod cache;
pub mod domain;
pub mod provider;
pub mod replan;
pub mod web;
