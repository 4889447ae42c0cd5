//! Fixed-point money in integer minor units.
//!
//! The API sends prices as decimal strings (`"1000"`, `"1000.00"`, `"12.5"`).
//! They are parsed once with [`rust_decimal`] and then carried as an `i64`
//! count of the currency's minor unit, so totals never drift.
//!
//! Currencies without a minor unit (XAF, XOF) have an exponent of 0: one
//! minor unit is one franc, and `"1000.50"` is rejected rather than rounded.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Errors that can occur when parsing or combining [`Money`] values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is empty or not a decimal number.
    #[error("invalid price: {0:?}")]
    Invalid(String),
    /// Prices cannot be negative.
    #[error("price cannot be negative: {0}")]
    Negative(String),
    /// The input has more fractional digits than the currency allows.
    #[error("{currency} prices allow at most {max_decimals} decimal places, got {input}")]
    ExcessPrecision {
        /// Raw input.
        input: String,
        /// Currency the value was parsed for.
        currency: CurrencyCode,
        /// Minor-unit exponent of the currency.
        max_decimals: u32,
    },
    /// The value does not fit in 64-bit minor units.
    #[error("price overflow")]
    Overflow,
    /// Two amounts in different currencies were combined.
    #[error("currency mismatch: {0} vs {1}")]
    CurrencyMismatch(CurrencyCode, CurrencyCode),
}

/// ISO 4217 currency codes supported by the catalogue API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Central African CFA franc.
    #[default]
    XAF,
    /// West African CFA franc.
    XOF,
    NGN,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Number of decimal places in the currency's minor unit.
    #[must_use]
    pub const fn exponent(self) -> u32 {
        match self {
            Self::XAF | Self::XOF => 0,
            Self::NGN | Self::USD | Self::EUR | Self::GBP => 2,
        }
    }

    /// The three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::XAF => "XAF",
            Self::XOF => "XOF",
            Self::NGN => "NGN",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "XAF" => Ok(Self::XAF),
            "XOF" => Ok(Self::XOF),
            "NGN" => Ok(Self::NGN),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

/// An amount of money in integer minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    minor_units: i64,
    currency: CurrencyCode,
}

impl Money {
    /// Create a money value from minor units.
    #[must_use]
    pub const fn from_minor(minor_units: i64, currency: CurrencyCode) -> Self {
        Self {
            minor_units,
            currency,
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self::from_minor(0, currency)
    }

    /// Parse a decimal price string for a currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a non-negative decimal, carries
    /// more precision than the currency's minor unit, or overflows `i64`.
    pub fn parse(input: &str, currency: CurrencyCode) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Invalid(input.to_owned()));
        }

        let value = Decimal::from_str(trimmed).map_err(|_| PriceError::Invalid(input.to_owned()))?;

        if value.is_sign_negative() && !value.is_zero() {
            return Err(PriceError::Negative(input.to_owned()));
        }

        let exponent = currency.exponent();
        let value = value.normalize();
        if value.scale() > exponent {
            return Err(PriceError::ExcessPrecision {
                input: input.to_owned(),
                currency,
                max_decimals: exponent,
            });
        }

        let factor = Decimal::from(10_i64.pow(exponent));
        let minor_units = value
            .checked_mul(factor)
            .and_then(|scaled| scaled.to_i64())
            .ok_or(PriceError::Overflow)?;

        Ok(Self::from_minor(minor_units, currency))
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor_units(&self) -> i64 {
        self.minor_units
    }

    /// Currency of the amount.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Multiply by a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the product does not fit.
    pub fn checked_mul(self, quantity: u32) -> Result<Self, PriceError> {
        self.minor_units
            .checked_mul(i64::from(quantity))
            .map(|minor| Self::from_minor(minor, self.currency))
            .ok_or(PriceError::Overflow)
    }

    /// Add another amount in the same currency.
    ///
    /// # Errors
    ///
    /// Returns an error on currency mismatch or overflow.
    pub fn checked_add(self, other: Self) -> Result<Self, PriceError> {
        if self.currency != other.currency {
            return Err(PriceError::CurrencyMismatch(self.currency, other.currency));
        }
        self.minor_units
            .checked_add(other.minor_units)
            .map(|minor| Self::from_minor(minor, self.currency))
            .ok_or(PriceError::Overflow)
    }

    /// Canonical decimal rendering with exactly the currency's decimal places.
    #[must_use]
    pub fn to_decimal_string(&self) -> String {
        Decimal::new(self.minor_units, self.currency.exponent()).to_string()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal_string(), self.currency)
    }
}

/// Serialize a [`Money`] as its canonical decimal string.
///
/// Used for wire payloads where the currency is implied by the tenant.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize_as_decimal<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&money.to_decimal_string())
}
