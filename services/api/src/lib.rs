//! Listing and offer service for the Rentora platform
//!
//! Owns the apartment directory and the offer lifecycle. Session tokens
//! issued by the auth service are verified here with the issuer's public
//! key; no call back to the issuer is needed.

pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod storage;

pub use state::AppState;
