//! Apartment repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{Apartment, ApartmentStatus, CreateApartmentRequest, UpdateApartmentRequest};

/// Apartment repository
#[derive(Clone)]
pub struct ApartmentRepository {
    pool: PgPool,
}

impl ApartmentRepository {
    /// Create a new apartment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new listing owned by `owner_id`; status starts as available
    pub async fn create(
        &self,
        owner_id: Uuid,
        payload: &CreateApartmentRequest,
    ) -> Result<Apartment> {
        info!("Creating listing '{}' for owner {}", payload.title, owner_id);

        let row = sqlx::query(
            r#"
            INSERT INTO apartments
                (title, address, rent, currency, size_sqm, bedrooms, bathrooms,
                 status, amenities, media, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, title, address, rent, currency, size_sqm, bedrooms,
                      bathrooms, status, amenities, media, owner_id,
                      created_at, updated_at
            "#,
        )
        .bind(&payload.title)
        .bind(&payload.address)
        .bind(payload.rent)
        .bind(&payload.currency)
        .bind(payload.size_sqm)
        .bind(payload.bedrooms)
        .bind(payload.bathrooms)
        .bind(ApartmentStatus::Available.as_str())
        .bind(serde_json::to_value(&payload.amenities)?)
        .bind(serde_json::to_value(&payload.media)?)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        apartment_from_row(&row)
    }

    /// Get all listings, newest first
    pub async fn get_all(&self) -> Result<Vec<Apartment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, address, rent, currency, size_sqm, bedrooms,
                   bathrooms, status, amenities, media, owner_id,
                   created_at, updated_at
            FROM apartments
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(apartment_from_row).collect()
    }

    /// Find a listing by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Apartment>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, address, rent, currency, size_sqm, bedrooms,
                   bathrooms, status, amenities, media, owner_id,
                   created_at, updated_at
            FROM apartments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(apartment_from_row).transpose()
    }

    /// Apply a partial update; absent fields keep their current value
    pub async fn update(
        &self,
        id: Uuid,
        payload: &UpdateApartmentRequest,
    ) -> Result<Option<Apartment>> {
        info!("Updating listing {}", id);

        let amenities = payload
            .amenities
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let media = payload
            .media
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let row = sqlx::query(
            r#"
            UPDATE apartments
            SET title = COALESCE($2, title),
                address = COALESCE($3, address),
                rent = COALESCE($4, rent),
                currency = COALESCE($5, currency),
                size_sqm = COALESCE($6, size_sqm),
                bedrooms = COALESCE($7, bedrooms),
                bathrooms = COALESCE($8, bathrooms),
                status = COALESCE($9, status),
                amenities = COALESCE($10, amenities),
                media = COALESCE($11, media),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, address, rent, currency, size_sqm, bedrooms,
                      bathrooms, status, amenities, media, owner_id,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.address)
        .bind(payload.rent)
        .bind(&payload.currency)
        .bind(payload.size_sqm)
        .bind(payload.bedrooms)
        .bind(payload.bathrooms)
        .bind(payload.status.map(|s| s.as_str()))
        .bind(amenities)
        .bind(media)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(apartment_from_row).transpose()
    }

    /// Delete a listing by ID
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        info!("Deleting listing {}", id);

        let result = sqlx::query("DELETE FROM apartments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn apartment_from_row(row: &sqlx::postgres::PgRow) -> Result<Apartment> {
    let status: ApartmentStatus = row
        .get::<String, _>("status")
        .parse()
        .map_err(|e: String| anyhow::anyhow!("Corrupt status column: {}", e))?;
    let amenities: Vec<String> = serde_json::from_value(row.get("amenities"))?;
    let media: Vec<String> = serde_json::from_value(row.get("media"))?;

    Ok(Apartment {
        id: row.get("id"),
        title: row.get("title"),
        address: row.get("address"),
        rent: row.get("rent"),
        currency: row.get("currency"),
        size_sqm: row.get("size_sqm"),
        bedrooms: row.get("bedrooms"),
        bathrooms: row.get("bathrooms"),
        status,
        amenities,
        media,
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
