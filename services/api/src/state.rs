//! Application state shared across handlers

use std::env;
use std::sync::Arc;

use sqlx::PgPool;

use common::currency::RateTable;

use crate::middleware::TokenVerifier;
use crate::repositories::{ApartmentRepository, OfferRepository};
use crate::storage::FileStorage;

/// How accepting an offer treats its pending siblings
///
/// The source product never settled whether accepting one offer should
/// reject the rest, so the behavior is explicit configuration instead of
/// a hidden rule.
#[derive(Debug, Clone, Copy)]
pub struct OfferPolicy {
    /// When true, accepting an offer rejects every other pending offer on
    /// the same apartment in the same request
    pub auto_reject_siblings: bool,
}

impl OfferPolicy {
    /// Read the policy from the environment
    ///
    /// # Environment Variables
    /// - `OFFER_AUTO_REJECT`: "true"/"1" to enable sibling auto-reject
    ///   (default: false, the owner manages siblings manually)
    pub fn from_env() -> Self {
        let auto_reject_siblings = env::var("OFFER_AUTO_REJECT")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        Self {
            auto_reject_siblings,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub apartment_repository: ApartmentRepository,
    pub offer_repository: OfferRepository,
    pub token_verifier: TokenVerifier,
    pub offer_policy: OfferPolicy,
    pub rate_table: RateTable,
    pub file_storage: Arc<dyn FileStorage>,
}
