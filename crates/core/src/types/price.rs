//! Money and currency.
//!
//! All prices are stored in USD. EUR exists for display only and is derived
//! from USD with a fixed rate.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round a monetary amount to 2 decimal places, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Display currencies offered by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    USD,
    EUR,
}

impl Currency {
    /// USD to EUR conversion rate (0.92).
    pub const EUR_RATE: Decimal = Decimal::from_parts(92, 0, 0, false, 2);

    /// Currency symbol used as a prefix when formatting.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }

    /// Convert an amount in USD into this currency.
    ///
    /// USD amounts are returned unchanged; EUR amounts are rounded to cents.
    #[must_use]
    pub fn convert(self, amount_usd: Decimal) -> Decimal {
        match self {
            Self::USD => amount_usd,
            Self::EUR => round_money(amount_usd * Self::EUR_RATE),
        }
    }

    /// Convert a USD amount and render it with two decimals and a symbol.
    ///
    /// ```
    /// use rust_decimal::Decimal;
    /// use uephone_core::Currency;
    ///
    /// assert_eq!(Currency::USD.format(Decimal::new(1250, 2)), "$12.50");
    /// assert_eq!(Currency::EUR.format(Decimal::new(1250, 2)), "€11.50");
    /// ```
    #[must_use]
    pub fn format(self, amount_usd: Decimal) -> String {
        let converted = round_money(self.convert(amount_usd));
        format!("{}{converted:.2}", self.symbol())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a currency code is not supported.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            _ => Err(UnknownCurrency(s.to_owned())),
        }
    }
}

/// An amount together with the currency it is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (dollars, not cents).
    pub amount: Decimal,
    /// Currency the amount is expressed in.
    pub currency: Currency,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// A price in USD, the storage currency.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self::new(amount, Currency::USD)
    }

    /// Express a USD price in another display currency.
    ///
    /// Prices already in a non-USD currency are returned as-is; conversion
    /// only runs from the storage currency.
    #[must_use]
    pub fn to_currency(self, target: Currency) -> Self {
        if self.currency == Currency::USD {
            Self::new(target.convert(self.amount), target)
        } else {
            self
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency.symbol(), round_money(self.amount))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_eur_rate_is_point_nine_two() {
        assert_eq!(Currency::EUR_RATE, Decimal::new(92, 2));
    }

    #[test]
    fn test_convert_rounds_to_cents() {
        // 10.05 * 0.92 = 9.246
        assert_eq!(
            Currency::EUR.convert(Decimal::new(1005, 2)),
            Decimal::new(925, 2)
        );
        assert_eq!(
            Currency::USD.convert(Decimal::new(1005, 2)),
            Decimal::new(1005, 2)
        );
    }

    #[test]
    fn test_format_pads_two_decimals() {
        assert_eq!(Currency::USD.format(Decimal::from(300)), "$300.00");
        assert_eq!(Currency::EUR.format(Decimal::from(100)), "€92.00");
        assert_eq!(Currency::USD.format(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::EUR);
        assert_eq!(" Usd ".parse::<Currency>().unwrap(), Currency::USD);
        assert!("GBP".parse::<Currency>().is_err());
    }

    #[test]
    fn test_price_to_currency() {
        let price = Price::usd(Decimal::from(250));
        let eur = price.to_currency(Currency::EUR);
        assert_eq!(eur.amount, Decimal::from(230));
        assert_eq!(eur.to_string(), "€230.00");
        assert_eq!(eur.to_currency(Currency::USD), eur);
    }

    #[test]
    fn test_currency_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Currency::EUR).unwrap(), "\"EUR\"");
    }
}
