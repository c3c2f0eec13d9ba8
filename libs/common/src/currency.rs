//! Currency normalization for listing prices
//!
//! Conversion goes through a EUR pivot: every supported currency carries a
//! multiplier against a EUR base, so `amount / rate[from] * rate[to]`
//! converts between any two supported codes. Display formatting is a
//! separate pure step keyed by the target currency.

use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by currency operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurrencyError {
    /// The currency code is not present in the rate table
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

/// Table of currency multipliers against a EUR base
///
/// Seeded with static defaults on construction; reset on every process
/// start. Rates may be replaced wholesale by a refresh source.
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl RateTable {
    /// Create a rate table seeded with the built-in default rates
    pub fn with_defaults() -> Self {
        let mut rates = HashMap::new();
        rates.insert("EUR".to_string(), 1.0);
        rates.insert("USD".to_string(), 1.09);
        rates.insert("GBP".to_string(), 0.85);
        rates.insert("CHF".to_string(), 0.94);
        rates.insert("SEK".to_string(), 11.40);
        rates.insert("PLN".to_string(), 4.32);
        Self { rates }
    }

    /// Look up the EUR multiplier for a currency code
    pub fn rate(&self, code: &str) -> Result<f64, CurrencyError> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| CurrencyError::UnsupportedCurrency(code.to_string()))
    }

    /// Check whether a currency code is known to the table
    pub fn is_supported(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    /// All supported currency codes
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.rates.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Convert an amount between two currencies via the EUR pivot
    ///
    /// Identity when `from == to`. Both codes must be present in the table.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, CurrencyError> {
        let from_rate = self.rate(from)?;
        let to_rate = self.rate(to)?;

        if from == to {
            return Ok(amount);
        }

        let amount_in_eur = amount / from_rate;
        Ok(amount_in_eur * to_rate)
    }

    /// Replace the rate for a single currency code
    pub fn set_rate(&mut self, code: &str, rate: f64) {
        self.rates.insert(code.to_string(), rate);
    }
}

/// Display symbol for a currency code, falling back to the code itself
pub fn symbol(code: &str) -> &str {
    match code {
        "EUR" => "\u{20ac}",
        "USD" => "$",
        "GBP" => "\u{a3}",
        "CHF" => "CHF ",
        "SEK" => "kr ",
        "PLN" => "z\u{142} ",
        _ => code,
    }
}

/// Format an amount for display in the given currency
///
/// Two decimal places, symbol prefix. Formatting does not convert; pair
/// with [`RateTable::convert`] first when the source currency differs.
pub fn format_amount(amount: f64, code: &str) -> String {
    format!("{}{:.2}", symbol(code), amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_identity() {
        let table = RateTable::with_defaults();
        let result = table.convert(1234.56, "EUR", "EUR").unwrap();
        assert_eq!(result, 1234.56);
    }

    #[test]
    fn test_convert_via_eur_pivot() {
        let table = RateTable::with_defaults();
        // 109 USD -> 100 EUR -> 85 GBP
        let result = table.convert(109.0, "USD", "GBP").unwrap();
        assert!((result - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_convert_round_trip_all_pairs() {
        let table = RateTable::with_defaults();
        let codes = table.codes();
        for from in &codes {
            for to in &codes {
                let there = table.convert(1000.0, from, to).unwrap();
                let back = table.convert(there, to, from).unwrap();
                assert!(
                    (back - 1000.0).abs() < 1e-6,
                    "round trip {} -> {} -> {} drifted: {}",
                    from,
                    to,
                    from,
                    back
                );
            }
        }
    }

    #[test]
    fn test_convert_unsupported_currency() {
        let table = RateTable::with_defaults();
        let err = table.convert(100.0, "EUR", "XYZ").unwrap_err();
        assert_eq!(err, CurrencyError::UnsupportedCurrency("XYZ".to_string()));

        let err = table.convert(100.0, "XYZ", "EUR").unwrap_err();
        assert_eq!(err, CurrencyError::UnsupportedCurrency("XYZ".to_string()));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1250.0, "EUR"), "\u{20ac}1250.00");
        assert_eq!(format_amount(999.999, "USD"), "$1000.00");
        assert_eq!(format_amount(1.0, "CHF"), "CHF 1.00");
    }

    #[test]
    fn test_set_rate_overrides_default() {
        let mut table = RateTable::with_defaults();
        table.set_rate("USD", 2.0);
        let result = table.convert(100.0, "EUR", "USD").unwrap();
        assert!((result - 200.0).abs() < 1e-9);
    }
}
