//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use common::auth::Role;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::{
        Apartment, ApartmentResponse, CreateApartmentRequest, NewOffer, Offer, OfferStatus,
        SubmitOfferRequest, UpdateApartmentRequest, UpdateOfferStatusRequest,
        offer::{effective_bid_amount, validate_move_in_date},
    },
};

/// Query parameters for the tenant offer listing
#[derive(Debug, Deserialize)]
pub struct MyOffersQuery {
    pub apartment_id: Option<Uuid>,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/apartments", post(create_apartment))
        .route("/apartments/:id", put(update_apartment))
        .route("/apartments/:id", delete(delete_apartment))
        .route("/offers", post(submit_offer))
        .route("/offers/apartment/:id", get(get_apartment_offers))
        .route("/offers/user", get(get_my_offers))
        .route("/offers/:id", put(decide_offer))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/apartments", get(get_apartments))
        .route("/apartments/:id", get(get_apartment))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// List all apartments (public)
pub async fn get_apartments(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let apartments = state.apartment_repository.get_all().await.map_err(|e| {
        error!("Failed to list apartments: {}", e);
        ApiError::InternalServerError
    })?;

    let responses: Vec<ApartmentResponse> = apartments
        .iter()
        .map(|a| a.to_response(state.file_storage.as_ref()))
        .collect();

    Ok(Json(responses))
}

/// Get one apartment by ID (public)
pub async fn get_apartment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let apartment = load_apartment(&state, id).await?;
    Ok(Json(apartment.to_response(state.file_storage.as_ref())))
}

/// Create an apartment listing; owner and admin roles only
pub async fn create_apartment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateApartmentRequest>,
) -> ApiResult<impl IntoResponse> {
    if !matches!(auth_user.role, Role::Owner | Role::Admin) {
        return Err(ApiError::NotAuthorized);
    }

    validate_listing_fields(
        &state,
        Some(&payload.title),
        Some(&payload.address),
        Some(payload.rent),
        Some(&payload.currency),
    )?;

    let apartment = state
        .apartment_repository
        .create(auth_user.id, &payload)
        .await
        .map_err(|e| {
            error!("Failed to create apartment: {}", e);
            ApiError::InternalServerError
        })?;

    Ok((
        StatusCode::CREATED,
        Json(apartment.to_response(state.file_storage.as_ref())),
    ))
}

/// Partially update a listing, including its status
///
/// Status values are accepted in any order; the directory keeps no status
/// state machine on purpose.
pub async fn update_apartment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApartmentRequest>,
) -> ApiResult<impl IntoResponse> {
    let apartment = load_apartment(&state, id).await?;
    if !auth_user.can_manage(apartment.owner_id) {
        return Err(ApiError::NotAuthorized);
    }

    validate_listing_fields(
        &state,
        payload.title.as_deref(),
        payload.address.as_deref(),
        payload.rent,
        payload.currency.as_deref(),
    )?;

    let updated = state
        .apartment_repository
        .update(id, &payload)
        .await
        .map_err(|e| {
            error!("Failed to update apartment: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Apartment"))?;

    Ok(Json(updated.to_response(state.file_storage.as_ref())))
}

/// Delete a listing
pub async fn delete_apartment(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let apartment = load_apartment(&state, id).await?;
    if !auth_user.can_manage(apartment.owner_id) {
        return Err(ApiError::NotAuthorized);
    }

    let deleted = state.apartment_repository.delete(id).await.map_err(|e| {
        error!("Failed to delete apartment: {}", e);
        ApiError::InternalServerError
    })?;

    if deleted {
        Ok(Json(json!({"message": "Apartment deleted successfully"})))
    } else {
        Err(ApiError::NotFound("Apartment"))
    }
}

/// Submit an offer on a listing
///
/// The server re-validates everything regardless of what the client
/// checked: the move-in date must be strictly in the future, bidding
/// offers must reach the bid floor, and fixed offers are stored at the
/// listing rent no matter what amount was submitted.
pub async fn submit_offer(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<SubmitOfferRequest>,
) -> ApiResult<impl IntoResponse> {
    let apartment = load_apartment(&state, payload.apartment_id).await?;

    validate_move_in_date(payload.move_in_date, Utc::now().date_naive())
        .map_err(ApiError::Validation)?;

    if payload.duration_months <= 0 {
        return Err(ApiError::Validation(
            "Duration must be at least one month".to_string(),
        ));
    }

    let bid_amount = effective_bid_amount(payload.offer_type, payload.bid_amount, apartment.rent)
        .map_err(ApiError::Validation)?;

    let new_offer = NewOffer {
        apartment_id: apartment.id,
        tenant_id: auth_user.id,
        offer_type: payload.offer_type,
        bid_amount,
        move_in_date: payload.move_in_date,
        duration_months: payload.duration_months,
        message: payload.message,
    };

    let offer = state
        .offer_repository
        .create(&new_offer)
        .await
        .map_err(|e| {
            error!("Failed to create offer: {}", e);
            ApiError::InternalServerError
        })?;

    Ok((StatusCode::CREATED, Json(offer)))
}

/// All offers on one apartment; only its owner (or an admin) may look
pub async fn get_apartment_offers(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let apartment = load_apartment(&state, id).await?;
    if !auth_user.can_manage(apartment.owner_id) {
        return Err(ApiError::NotAuthorized);
    }

    let offers = state
        .offer_repository
        .find_by_apartment(id)
        .await
        .map_err(|e| {
            error!("Failed to list offers: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(offers))
}

/// Offers the caller submitted; scoping happens in the query itself
pub async fn get_my_offers(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MyOffersQuery>,
) -> ApiResult<impl IntoResponse> {
    let offers = state
        .offer_repository
        .find_by_tenant(auth_user.id, query.apartment_id)
        .await
        .map_err(|e| {
            error!("Failed to list offers: {}", e);
            ApiError::InternalServerError
        })?;

    Ok(Json(offers))
}

/// Accept or reject a pending offer
pub async fn decide_offer(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOfferStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    if !matches!(payload.status, OfferStatus::Accepted | OfferStatus::Rejected) {
        return Err(ApiError::Validation(
            "Status must be accepted or rejected".to_string(),
        ));
    }

    let offer = state
        .offer_repository
        .find_by_id(id)
        .await
        .map_err(|e| {
            error!("Failed to load offer: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Offer"))?;

    let apartment = load_apartment(&state, offer.apartment_id).await?;
    if !auth_user.can_manage(apartment.owner_id) {
        return Err(ApiError::NotAuthorized);
    }

    if !offer.status.can_transition(payload.status) {
        return Err(ApiError::InvalidTransition(offer.status.to_string()));
    }

    // The repository re-checks pending status inside the UPDATE, so a
    // concurrent decision loses cleanly instead of double-writing.
    let decided: Offer = match state.offer_repository.decide(id, payload.status).await {
        Ok(Some(offer)) => offer,
        Ok(None) => {
            // Lost the race; the pre-read status is stale, so report
            // whatever actually landed
            let current = state.offer_repository.find_by_id(id).await.map_err(|e| {
                error!("Failed to reload offer: {}", e);
                ApiError::InternalServerError
            })?;
            return Err(decision_conflict(current.map(|o| o.status)));
        }
        Err(e) => {
            error!("Failed to update offer status: {}", e);
            return Err(ApiError::InternalServerError);
        }
    };

    if payload.status == OfferStatus::Accepted && state.offer_policy.auto_reject_siblings {
        let rejected = state
            .offer_repository
            .reject_other_pending(apartment.id, decided.id)
            .await
            .map_err(|e| {
                error!("Failed to reject sibling offers: {}", e);
                ApiError::InternalServerError
            })?;
        tracing::info!(
            "Auto-rejected {} sibling offers on apartment {}",
            rejected,
            apartment.id
        );
    }

    Ok(Json(decided))
}

/// Error for a decision that lost a concurrent race, named for the
/// status the offer holds now rather than the stale pre-read one
fn decision_conflict(current: Option<OfferStatus>) -> ApiError {
    match current {
        Some(status) => ApiError::InvalidTransition(status.to_string()),
        None => ApiError::NotFound("Offer"),
    }
}

/// Load an apartment or produce the uniform NotFound error
async fn load_apartment(state: &AppState, id: Uuid) -> Result<Apartment, ApiError> {
    state
        .apartment_repository
        .find_by_id(id)
        .await
        .map_err(|e| {
            error!("Failed to load apartment: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::NotFound("Apartment"))
}

/// Shared field validation for listing create/update payloads
fn validate_listing_fields(
    state: &AppState,
    title: Option<&str>,
    address: Option<&str>,
    rent: Option<f64>,
    currency: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("Title is required".to_string()));
        }
    }

    if let Some(address) = address {
        if address.trim().is_empty() {
            return Err(ApiError::Validation("Address is required".to_string()));
        }
    }

    if let Some(rent) = rent {
        if rent <= 0.0 || !rent.is_finite() {
            return Err(ApiError::Validation(
                "Rent must be a positive amount".to_string(),
            ));
        }
    }

    if let Some(currency) = currency {
        if !state.rate_table.is_supported(currency) {
            return Err(ApiError::Validation(format!(
                "Unsupported currency: {}",
                currency
            )));
        }
    }

    Ok(())
}
