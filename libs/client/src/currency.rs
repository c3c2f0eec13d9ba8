//! Currency preference and rate refresh
//!
//! The preference is a purely client-local concern persisted under the
//! `preferredCurrency` key. An unknown code is a typed error, not a
//! silently logged no-op.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use common::currency::{CurrencyError, RateTable, format_amount};

use crate::token_store::TokenStore;

/// Source of replacement rate tables
///
/// `Ok(None)` means "nothing new"; the default source never produces
/// anything, keeping the static table in place.
pub trait RateSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<Option<RateTable>>> + Send;
}

/// Rate source that never updates anything
#[derive(Debug, Clone, Default)]
pub struct StaticRateSource;

impl RateSource for StaticRateSource {
    async fn fetch(&self) -> Result<Option<RateTable>> {
        Ok(None)
    }
}

/// Client-local currency preference over a shared rate table
#[derive(Clone)]
pub struct CurrencyPreferences {
    store: Arc<dyn TokenStore>,
    rates: Arc<RwLock<RateTable>>,
}

impl CurrencyPreferences {
    /// Create preferences seeded with the default rate table
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            rates: Arc::new(RwLock::new(RateTable::with_defaults())),
        }
    }

    /// The preferred display currency, defaulting to EUR
    pub fn preferred(&self) -> String {
        self.store
            .preferred_currency()
            .unwrap_or_else(|| "EUR".to_string())
    }

    /// Change the preferred display currency
    ///
    /// The code is validated against the rate table before anything is
    /// persisted; an unknown code is rejected outright.
    pub fn set_preferred(&self, code: &str) -> Result<(), CurrencyError> {
        let known = self
            .rates
            .read()
            .expect("rate table lock poisoned")
            .is_supported(code);
        if !known {
            return Err(CurrencyError::UnsupportedCurrency(code.to_string()));
        }

        if let Err(e) = self.store.save_preferred_currency(code) {
            warn!("Failed to persist currency preference: {}", e);
        }
        Ok(())
    }

    /// Convert a listing price into the preferred currency
    pub fn to_preferred(&self, amount: f64, listing_currency: &str) -> Result<f64, CurrencyError> {
        let preferred = self.preferred();
        self.rates
            .read()
            .expect("rate table lock poisoned")
            .convert(amount, listing_currency, &preferred)
    }

    /// Convert and format a listing price for display
    pub fn display_price(
        &self,
        amount: f64,
        listing_currency: &str,
    ) -> Result<String, CurrencyError> {
        let converted = self.to_preferred(amount, listing_currency)?;
        Ok(format_amount(converted, &self.preferred()))
    }

    /// Replace the whole rate table
    pub fn replace_rates(&self, table: RateTable) {
        *self.rates.write().expect("rate table lock poisoned") = table;
    }

    /// Spawn a background task that polls `source` every `interval`
    ///
    /// With [`StaticRateSource`] this is a heartbeat that never changes
    /// anything. The task runs until the handle is aborted or dropped
    /// with the runtime.
    pub fn spawn_refresher<S: RateSource>(
        &self,
        source: S,
        interval: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let prefs = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a refresh
            // cannot race application startup
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match source.fetch().await {
                    Ok(Some(table)) => {
                        debug!("Applying refreshed currency rates");
                        prefs.replace_rates(table);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Currency rate refresh failed: {}", e);
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::MemoryTokenStore;

    fn prefs() -> (CurrencyPreferences, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new());
        (CurrencyPreferences::new(store.clone()), store)
    }

    #[test]
    fn test_defaults_to_eur() {
        let (prefs, _store) = prefs();
        assert_eq!(prefs.preferred(), "EUR");
    }

    #[test]
    fn test_set_preferred_persists() {
        let (prefs, store) = prefs();
        prefs.set_preferred("USD").unwrap();
        assert_eq!(prefs.preferred(), "USD");
        assert_eq!(store.preferred_currency(), Some("USD".to_string()));
    }

    #[test]
    fn test_unknown_code_is_a_typed_error() {
        let (prefs, store) = prefs();
        let err = prefs.set_preferred("DOGE").unwrap_err();
        assert_eq!(err, CurrencyError::UnsupportedCurrency("DOGE".to_string()));
        // Nothing was persisted
        assert_eq!(store.preferred_currency(), None);
    }

    #[test]
    fn test_display_price_converts_then_formats() {
        let (prefs, _store) = prefs();
        prefs.set_preferred("USD").unwrap();
        // 100 EUR at 1.09 -> $109.00
        assert_eq!(prefs.display_price(100.0, "EUR").unwrap(), "$109.00");
    }

    #[test]
    fn test_replace_rates_applies_immediately() {
        let (prefs, _store) = prefs();
        let mut table = RateTable::with_defaults();
        table.set_rate("USD", 2.0);
        prefs.replace_rates(table);

        prefs.set_preferred("USD").unwrap();
        assert_eq!(prefs.to_preferred(100.0, "EUR").unwrap(), 200.0);
    }

    #[tokio::test]
    async fn test_static_source_never_updates() {
        let source = StaticRateSource;
        assert!(source.fetch().await.unwrap().is_none());
    }
}
