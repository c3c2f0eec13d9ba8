//! API models for entities, requests, and responses

pub mod apartment;
pub mod offer;

pub use apartment::{
    Apartment, ApartmentResponse, ApartmentStatus, CreateApartmentRequest, UpdateApartmentRequest,
};
pub use offer::{
    MIN_BID_RATIO, NewOffer, Offer, OfferStatus, OfferType, SubmitOfferRequest,
    UpdateOfferStatusRequest,
};
