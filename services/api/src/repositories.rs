//! Repositories for database operations

pub mod apartment;
pub mod offer;

pub use apartment::ApartmentRepository;
pub use offer::OfferRepository;
