use super::key::EntityKey;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest integer a caller can send as a JSON number without losing precision.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// An amount exactly as a caller supplied it, before validation.
///
/// Request bodies carry plain numbers, so a value may arrive as an integer or
/// as a float (including NaN and the infinities). Nothing is accepted until it
/// passes through [`Amount::validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawAmount {
    Integer(i64),
    Float(f64),
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for RawAmount {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for RawAmount {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Amount> for RawAmount {
    fn from(amount: Amount) -> Self {
        Self::Integer(amount.0 as i64)
    }
}

impl FromStr for RawAmount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(value) = s.parse::<i64>() {
            return Ok(Self::Integer(value));
        }
        s.parse::<f64>()
            .map(Self::Float)
            .map_err(|_| LedgerError::InvalidAmount(format!("{s:?} is not a number")))
    }
}

/// A strictly positive integer amount, at most [`MAX_SAFE_INTEGER`].
///
/// Only [`Amount::validate`] constructs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(u64);

impl Amount {
    /// Validates a raw amount. Charge and use share this rule.
    pub fn validate(raw: impl Into<RawAmount>) -> Result<Self> {
        match raw.into() {
            RawAmount::Integer(value) => {
                if value <= 0 || value as u64 > MAX_SAFE_INTEGER {
                    return Err(invalid(value));
                }
                Ok(Self(value as u64))
            }
            RawAmount::Float(value) => {
                if !value.is_finite()
                    || value.fract() != 0.0
                    || value <= 0.0
                    || value > MAX_SAFE_INTEGER as f64
                {
                    return Err(invalid(value));
                }
                Ok(Self(value as u64))
            }
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

fn invalid(value: impl std::fmt::Display) -> LedgerError {
    LedgerError::InvalidAmount(format!("{value} is not a positive integer"))
}

/// The current balance of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub key: EntityKey,
    pub amount: u64,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// The balance of an entity that has never been written.
    pub fn zero(key: EntityKey) -> Self {
        Self {
            key,
            amount: 0,
            updated_at: Utc::now(),
        }
    }

    /// Balance after crediting `amount`.
    pub fn credited(&self, amount: Amount) -> Result<u64> {
        self.amount
            .checked_add(amount.value())
            .filter(|total| *total <= MAX_SAFE_INTEGER)
            .ok_or(LedgerError::BalanceOverflow {
                current: self.amount,
                amount: amount.value(),
            })
    }

    /// Balance after debiting `amount`; never goes below zero.
    pub fn debited(&self, amount: Amount) -> Result<u64> {
        self.amount
            .checked_sub(amount.value())
            .ok_or(LedgerError::InsufficientBalance {
                requested: amount.value(),
                available: self.amount,
            })
    }
}
