//! Offer model, bid rules, and the offer status lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Minimum bid as a fraction of the listing rent; exactly the minimum is
/// accepted
pub const MIN_BID_RATIO: f64 = 0.8;

/// How an offer prices the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    /// Tenant proposes an amount, bounded below by [`MIN_BID_RATIO`]
    Bidding,
    /// The listing rent is taken as-is; any submitted amount is ignored
    Fixed,
}

impl OfferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferType::Bidding => "bidding",
            OfferType::Fixed => "fixed",
        }
    }
}

impl FromStr for OfferType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bidding" => Ok(OfferType::Bidding),
            "fixed" => Ok(OfferType::Fixed),
            other => Err(format!("Unknown offer type: {}", other)),
        }
    }
}

/// Offer lifecycle status
///
/// Only `pending` offers may be mutated, and only to `accepted` or
/// `rejected`. `expired` is part of the vocabulary but no sweep produces
/// it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Expired => "expired",
        }
    }

    /// Whether an owner decision may move this offer to `to`
    pub fn can_transition(&self, to: OfferStatus) -> bool {
        matches!(self, OfferStatus::Pending)
            && matches!(to, OfferStatus::Accepted | OfferStatus::Rejected)
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OfferStatus::Pending),
            "accepted" => Ok(OfferStatus::Accepted),
            "rejected" => Ok(OfferStatus::Rejected),
            "expired" => Ok(OfferStatus::Expired),
            other => Err(format!("Unknown offer status: {}", other)),
        }
    }
}

/// Offer entity
#[derive(Debug, Clone, Serialize)]
pub struct Offer {
    pub id: Uuid,
    pub apartment_id: Uuid,
    pub tenant_id: Uuid,
    pub offer_type: OfferType,
    pub bid_amount: f64,
    pub move_in_date: NaiveDate,
    pub duration_months: i32,
    pub message: Option<String>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated offer ready for insertion
#[derive(Debug, Clone)]
pub struct NewOffer {
    pub apartment_id: Uuid,
    pub tenant_id: Uuid,
    pub offer_type: OfferType,
    pub bid_amount: f64,
    pub move_in_date: NaiveDate,
    pub duration_months: i32,
    pub message: Option<String>,
}

/// Request to submit an offer on a listing
#[derive(Debug, Deserialize)]
pub struct SubmitOfferRequest {
    pub apartment_id: Uuid,
    pub offer_type: OfferType,
    pub bid_amount: f64,
    pub move_in_date: NaiveDate,
    pub duration_months: i32,
    pub message: Option<String>,
}

/// Request to decide a pending offer
#[derive(Debug, Deserialize)]
pub struct UpdateOfferStatusRequest {
    pub status: OfferStatus,
}

/// Resolve the amount an offer is stored with
///
/// Fixed offers take the listing rent regardless of the submitted amount.
/// Bidding offers must reach [`MIN_BID_RATIO`] of the rent; exactly the
/// threshold is accepted.
pub fn effective_bid_amount(
    offer_type: OfferType,
    bid_amount: f64,
    rent: f64,
) -> Result<f64, String> {
    match offer_type {
        OfferType::Fixed => Ok(rent),
        OfferType::Bidding => {
            let minimum = MIN_BID_RATIO * rent;
            if bid_amount < minimum {
                Err(format!(
                    "Bid amount {} is below the minimum of {} ({}x rent)",
                    bid_amount, minimum, MIN_BID_RATIO
                ))
            } else {
                Ok(bid_amount)
            }
        }
    }
}

/// Require a move-in date strictly after `today`; same-day is rejected
pub fn validate_move_in_date(move_in_date: NaiveDate, today: NaiveDate) -> Result<(), String> {
    if move_in_date <= today {
        Err("Move-in date must be in the future".to_string())
    } else {
        Ok(())
    }
}
