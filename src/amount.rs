// Amount - fixed-point LBC values stored as integer dewies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;
use thiserror::Error;

/// Number of dewies in one whole coin
pub const COIN: u64 = 100_000_000;

/// Number of fractional digits an amount can carry
const DECIMALS: usize = 8;

/// Errors from parsing or combining amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid amount: {0}")]
    Invalid(String),

    #[error("Amount has more than 8 decimal places: {0}")]
    TooPrecise(String),

    #[error("Amount overflow")]
    Overflow,
}

/// A non-negative amount of value, in dewies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Create from a raw dewies count
    pub const fn from_dewies(dewies: u64) -> Self {
        Self(dewies)
    }

    /// Create from whole coins
    pub fn from_coins(coins: u64) -> Result<Self, AmountError> {
        coins.checked_mul(COIN).map(Self).ok_or(AmountError::Overflow)
    }

    /// Get the raw dewies count
    pub const fn dewies(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Signed dewies, for ledger arithmetic that may dip below zero
    pub fn signed(&self) -> i128 {
        self.0 as i128
    }

    /// Convert a signed dewies total back into an amount, clamping negatives to zero
    pub fn from_signed_clamped(dewies: i128) -> Self {
        if dewies <= 0 {
            Amount::ZERO
        } else {
            Amount(u64::try_from(dewies).unwrap_or(u64::MAX))
        }
    }
}

impl fmt::Display for Amount {
    /// Renders like the RPC surface: `1.0`, `0.2`, `8.989893`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / COIN;
        let frac = self.0 % COIN;
        let digits = format!("{:0width$}", frac, width = DECIMALS);
        let trimmed = digits.trim_end_matches('0');
        if trimmed.is_empty() {
            write!(f, "{}.0", whole)
        } else {
            write!(f, "{}.{}", whole, trimmed)
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.starts_with('-') || s.starts_with('+') {
            return Err(AmountError::Invalid(s.to_string()));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::Invalid(s.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(AmountError::Invalid(s.to_string()));
        }
        if frac.len() > DECIMALS {
            return Err(AmountError::TooPrecise(s.to_string()));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| AmountError::Overflow)?
        };
        let frac: u64 = if frac.is_empty() {
            0
        } else {
            format!("{:0<width$}", frac, width = DECIMALS)
                .parse()
                .map_err(|_| AmountError::Invalid(s.to_string()))?
        };

        whole
            .checked_mul(COIN)
            .and_then(|d| d.checked_add(frac))
            .map(Amount)
            .ok_or(AmountError::Overflow)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Amount::saturating_add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Serde helper rendering amounts as decimal strings (`"1.0"`) for external output
pub mod as_coins {
    use super::Amount;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
