//! Client-side session and preference handling for the Rentora platform
//!
//! One reactive session store drives the whole login lifecycle: the
//! bootstrap check races token verification against a timeout so the UI
//! never blocks, a 401 anywhere tears the session down through explicit
//! observer callbacks, and the currency preference is validated against
//! the shared rate table before it is persisted.

pub mod currency;
pub mod http;
pub mod session;
pub mod token_store;

pub use currency::{CurrencyPreferences, RateSource, StaticRateSource};
pub use http::{ApiClient, ApiClientBuilder, ClientError};
pub use session::{IdentityVerifier, SessionManager, SessionState, UserProfile, VerifyError};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
