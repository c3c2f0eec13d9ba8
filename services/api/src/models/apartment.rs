//! Apartment listing model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::storage::FileStorage;

/// Listing status
///
/// Transitions are deliberately unconstrained: any caller authorized to
/// edit the listing may set any status at any time. The source system had
/// no tenant linkage to clean up, so none is modeled here either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApartmentStatus {
    Available,
    Rented,
    Maintenance,
    Unavailable,
}

impl ApartmentStatus {
    /// Canonical lowercase name, as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ApartmentStatus::Available => "available",
            ApartmentStatus::Rented => "rented",
            ApartmentStatus::Maintenance => "maintenance",
            ApartmentStatus::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ApartmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApartmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ApartmentStatus::Available),
            "rented" => Ok(ApartmentStatus::Rented),
            "maintenance" => Ok(ApartmentStatus::Maintenance),
            "unavailable" => Ok(ApartmentStatus::Unavailable),
            other => Err(format!("Unknown apartment status: {}", other)),
        }
    }
}

/// Apartment listing entity
#[derive(Debug, Clone, Serialize)]
pub struct Apartment {
    pub id: Uuid,
    pub title: String,
    pub address: String,
    pub rent: f64,
    pub currency: String,
    pub size_sqm: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub status: ApartmentStatus,
    pub amenities: Vec<String>,
    /// File-storage ids for listing media
    pub media: Vec<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Apartment {
    /// Projection for clients, with media ids resolved to URLs
    pub fn to_response(&self, storage: &dyn FileStorage) -> ApartmentResponse {
        ApartmentResponse {
            id: self.id,
            title: self.title.clone(),
            address: self.address.clone(),
            rent: self.rent,
            currency: self.currency.clone(),
            size_sqm: self.size_sqm,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            status: self.status,
            amenities: self.amenities.clone(),
            media_urls: self.media.iter().map(|id| storage.media_url(id)).collect(),
            owner_id: self.owner_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Request to create a listing
#[derive(Debug, Deserialize)]
pub struct CreateApartmentRequest {
    pub title: String,
    pub address: String,
    pub rent: f64,
    pub currency: String,
    pub size_sqm: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub media: Vec<String>,
}

/// Partial update of a listing; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateApartmentRequest {
    pub title: Option<String>,
    pub address: Option<String>,
    pub rent: Option<f64>,
    pub currency: Option<String>,
    pub size_sqm: Option<f64>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub status: Option<ApartmentStatus>,
    pub amenities: Option<Vec<String>>,
    pub media: Option<Vec<String>>,
}

/// Listing projection returned by the API
#[derive(Debug, Serialize)]
pub struct ApartmentResponse {
    pub id: Uuid,
    pub title: String,
    pub address: String,
    pub rent: f64,
    pub currency: String,
    pub size_sqm: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub status: ApartmentStatus,
    pub amenities: Vec<String>,
    pub media_urls: Vec<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
