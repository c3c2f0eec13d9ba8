//! Offer repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewOffer, Offer, OfferStatus, OfferType};

/// Offer repository
#[derive(Clone)]
pub struct OfferRepository {
    pool: PgPool,
}

impl OfferRepository {
    /// Create a new offer repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a validated offer; status starts as pending
    pub async fn create(&self, new_offer: &NewOffer) -> Result<Offer> {
        info!(
            "Creating offer on apartment {} by tenant {}",
            new_offer.apartment_id, new_offer.tenant_id
        );

        let row = sqlx::query(
            r#"
            INSERT INTO offers
                (apartment_id, tenant_id, offer_type, bid_amount, move_in_date,
                 duration_months, message, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, apartment_id, tenant_id, offer_type, bid_amount,
                      move_in_date, duration_months, message, status,
                      created_at, updated_at
            "#,
        )
        .bind(new_offer.apartment_id)
        .bind(new_offer.tenant_id)
        .bind(new_offer.offer_type.as_str())
        .bind(new_offer.bid_amount)
        .bind(new_offer.move_in_date)
        .bind(new_offer.duration_months)
        .bind(&new_offer.message)
        .bind(OfferStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        offer_from_row(&row)
    }

    /// Find an offer by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Offer>> {
        let row = sqlx::query(
            r#"
            SELECT id, apartment_id, tenant_id, offer_type, bid_amount,
                   move_in_date, duration_months, message, status,
                   created_at, updated_at
            FROM offers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(offer_from_row).transpose()
    }

    /// All offers referencing one apartment, newest first
    pub async fn find_by_apartment(&self, apartment_id: Uuid) -> Result<Vec<Offer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, apartment_id, tenant_id, offer_type, bid_amount,
                   move_in_date, duration_months, message, status,
                   created_at, updated_at
            FROM offers
            WHERE apartment_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(apartment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(offer_from_row).collect()
    }

    /// All offers one tenant submitted, optionally narrowed to one apartment
    pub async fn find_by_tenant(
        &self,
        tenant_id: Uuid,
        apartment_id: Option<Uuid>,
    ) -> Result<Vec<Offer>> {
        let rows = sqlx::query(
            r#"
            SELECT id, apartment_id, tenant_id, offer_type, bid_amount,
                   move_in_date, duration_months, message, status,
                   created_at, updated_at
            FROM offers
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR apartment_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(apartment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(offer_from_row).collect()
    }

    /// Move a pending offer to a decided status
    ///
    /// The `status = 'pending'` guard makes the write atomic against a
    /// concurrent decision; `None` means the offer was gone or no longer
    /// pending by the time the write landed.
    pub async fn decide(&self, id: Uuid, new_status: OfferStatus) -> Result<Option<Offer>> {
        info!("Deciding offer {} -> {}", id, new_status);

        let row = sqlx::query(
            r#"
            UPDATE offers
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id, apartment_id, tenant_id, offer_type, bid_amount,
                      move_in_date, duration_months, message, status,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(new_status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(offer_from_row).transpose()
    }

    /// Reject every other pending offer on the same apartment
    ///
    /// Single UPDATE statement, so siblings flip atomically relative to
    /// each other. Returns the number of offers rejected.
    pub async fn reject_other_pending(&self, apartment_id: Uuid, except: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE offers
            SET status = 'rejected', updated_at = NOW()
            WHERE apartment_id = $1 AND id <> $2 AND status = 'pending'
            "#,
        )
        .bind(apartment_id)
        .bind(except)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn offer_from_row(row: &sqlx::postgres::PgRow) -> Result<Offer> {
    let offer_type: OfferType = row
        .get::<String, _>("offer_type")
        .parse()
        .map_err(|e: String| anyhow::anyhow!("Corrupt offer_type column: {}", e))?;
    let status: OfferStatus = row
        .get::<String, _>("status")
        .parse()
        .map_err(|e: String| anyhow::anyhow!("Corrupt status column: {}", e))?;

    Ok(Offer {
        id: row.get("id"),
        apartment_id: row.get("apartment_id"),
        tenant_id: row.get("tenant_id"),
        offer_type,
        bid_amount: row.get("bid_amount"),
        move_in_date: row.get("move_in_date"),
        duration_months: row.get("duration_months"),
        message: row.get("message"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
