// app/src/money.rs

//! Integer minor-unit amounts. Nothing on the money path uses floats.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
  #[error("'{0}' is not a decimal amount")]
  Invalid(String),

  #[error("'{0}' has more than two decimal places")]
  TooPrecise(String),

  #[error("'{0}' is out of range")]
  OutOfRange(String),
}

/// An amount in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
  pub const ZERO: Money = Money(0);

  pub fn from_minor(minor: i64) -> Self {
    Money(minor)
  }

  pub fn minor(self) -> i64 {
    self.0
  }

  /// Accepts at most two fractional digits; `19.990` is fine, `19.999` is not.
  pub fn from_decimal(value: Decimal) -> Result<Self, MoneyError> {
    let normalized = value.normalize();
    if normalized.scale() > 2 {
      return Err(MoneyError::TooPrecise(value.to_string()));
    }
    normalized
      .checked_mul(Decimal::ONE_HUNDRED)
      .and_then(|cents| cents.to_i64())
      .map(Money)
      .ok_or_else(|| MoneyError::OutOfRange(value.to_string()))
  }

  pub fn parse(text: &str) -> Result<Self, MoneyError> {
    let trimmed = text.trim();
    let value = Decimal::from_str(trimmed)
      .or_else(|_| Decimal::from_scientific(trimmed))
      .map_err(|_| MoneyError::Invalid(text.to_string()))?;
    Self::from_decimal(value)
  }

  pub fn checked_add(self, other: Money) -> Option<Money> {
    self.0.checked_add(other.0).map(Money)
  }

  pub fn checked_mul(self, quantity: u32) -> Option<Money> {
    self.0.checked_mul(i64::from(quantity)).map(Money)
  }

  pub fn is_positive(self) -> bool {
    self.0 > 0
  }
}

/// Always exactly two decimals: `39.98`, `1.00`, `-0.50`.
impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.0 < 0 { "-" } else { "" };
    let abs = self.0.unsigned_abs();
    write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
  }
}

impl Serialize for Money {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// A client-supplied amount kept as text until it is validated.
///
/// JSON numbers are captured through their shortest decimal rendering, so
/// `19.99` arrives as `"19.99"` and never passes through `f64` arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AmountInput(pub String);

impl AmountInput {
  pub fn to_money(&self) -> Result<Money, MoneyError> {
    Money::parse(&self.0)
  }
}

impl From<&str> for AmountInput {
  fn from(value: &str) -> Self {
    AmountInput(value.to_string())
  }
}

impl<'de> Deserialize<'de> for AmountInput {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Number(serde_json::Number),
      Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
      Raw::Number(n) => AmountInput(n.to_string()),
      Raw::Text(s) => AmountInput(s),
    })
  }
}
