//! Currency-tagged monetary amounts.
//!
//! Amounts are `rust_decimal` values rounded half-up to 2 decimal places at
//! construction time, so chained operations never accumulate unrounded error.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::MoneyError;

/// Monetary values carry 2 decimal places, rounded half-up.
const DECIMAL_PLACES: u32 = 2;

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Supported currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Brazilian real.
    Brl,
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
}

impl Currency {
    /// Base currency used for zero totals of empty orders.
    pub const BASE: Currency = Currency::Brl;

    /// Returns the ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BRL" => Ok(Currency::Brl),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(MoneyError::InvalidCurrency {
                code: other.to_string(),
            }),
        }
    }
}

/// An immutable currency-tagged amount.
///
/// All binary operations require matching currencies and every operation
/// returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new amount, validating and rounding to 2 decimal places.
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        if amount < Decimal::ZERO {
            return Err(MoneyError::InvalidAmount { amount });
        }
        Ok(Self {
            amount: round2(amount),
            currency,
        })
    }

    /// Creates an amount from a float, rejecting NaN and infinities.
    pub fn from_f64(amount: f64, currency: Currency) -> Result<Self, MoneyError> {
        if !amount.is_finite() {
            return Err(MoneyError::InvalidAmount {
                amount: Decimal::ZERO,
            });
        }
        let decimal = Decimal::from_f64(amount).ok_or(MoneyError::InvalidAmount {
            amount: Decimal::ZERO,
        })?;
        Self::new(decimal, currency)
    }

    /// Returns zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Crate-internal constructor for amounts already validated and rounded.
    pub(crate) fn from_raw(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Returns the amount.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                actual: other.currency,
            });
        }
        Ok(())
    }

    /// Adds another amount of the same currency.
    pub fn add(&self, other: Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(&other)?;
        Ok(Self {
            amount: round2(self.amount + other.amount),
            currency: self.currency,
        })
    }

    /// Subtracts another amount of the same currency; never goes below zero.
    pub fn subtract(&self, other: Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(&other)?;
        let result = self.amount - other.amount;
        if result < Decimal::ZERO {
            return Err(MoneyError::NegativeResult);
        }
        Ok(Self {
            amount: round2(result),
            currency: self.currency,
        })
    }

    /// Multiplies by a non-negative scalar.
    pub fn multiply(&self, scalar: Decimal) -> Result<Money, MoneyError> {
        if scalar < Decimal::ZERO {
            return Err(MoneyError::InvalidScalar { scalar });
        }
        Ok(Self {
            amount: round2(self.amount * scalar),
            currency: self.currency,
        })
    }

    /// Divides by a strictly positive scalar.
    pub fn divide(&self, scalar: Decimal) -> Result<Money, MoneyError> {
        if scalar <= Decimal::ZERO {
            return Err(MoneyError::InvalidScalar { scalar });
        }
        Ok(Self {
            amount: round2(self.amount / scalar),
            currency: self.currency,
        })
    }

    /// Multiplies by an integer quantity. Always representable.
    pub fn times(&self, quantity: u32) -> Money {
        Self {
            amount: round2(self.amount * Decimal::from(quantity)),
            currency: self.currency,
        }
    }

    /// Returns the given percentage of this amount.
    pub fn percentage(&self, percent: Decimal) -> Result<Money, MoneyError> {
        self.multiply(percent / Decimal::ONE_HUNDRED)
    }

    /// Currency-checked equality.
    pub fn equals(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount == other.amount)
    }

    /// Currency-checked greater-than comparison.
    pub fn is_greater_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount > other.amount)
    }

    /// Currency-checked less-than comparison.
    pub fn is_less_than(&self, other: &Money) -> Result<bool, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount < other.amount)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.amount)
    }
}
