//! Money amounts for display.
//!
//! Catalog prices are stored as bare `Decimal` amounts in the store's
//! currency. [`Price`] pairs an amount with a currency for rendering in API
//! responses.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A price in the store currency.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::USD)
    }

    /// Format for display, rounded to two decimal places (e.g. `$19.99`).
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{}{:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_display() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$19.99");

        let price = Price::new(Decimal::new(80, 0), CurrencyCode::GBP);
        assert_eq!(price.to_string(), "£80.00");
    }
}
