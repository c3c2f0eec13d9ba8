//! Common library for the Rentora platform
//!
//! This crate provides shared functionality used across the Rentora
//! services: database connectivity, error handling, the authentication
//! vocabulary (roles and token claims), and currency normalization for
//! listing prices.

pub mod auth;
pub mod currency;
pub mod database;
pub mod error;
