use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies the entity (typically a user) that owns a balance.
///
/// Always strictly positive. Construct through [`EntityKey::new`] or by parsing
/// text; malformed keys are rejected before any work is queued for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(u64);

impl EntityKey {
    pub fn new(value: i64) -> Result<Self> {
        if value > 0 {
            Ok(Self(value as u64))
        } else {
            Err(LedgerError::InvalidKey(format!(
                "{value} is not a positive integer"
            )))
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<i64> for EntityKey {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl FromStr for EntityKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| LedgerError::InvalidKey(format!("{s:?} is not a positive integer")))?;
        Self::new(value)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_accepts_positive() {
        assert_eq!(EntityKey::new(1).unwrap().value(), 1);
        assert_eq!(EntityKey::new(i64::MAX).unwrap().value(), i64::MAX as u64);
    }

    #[test]
    fn test_key_rejects_zero_and_negative() {
        assert!(matches!(EntityKey::new(0), Err(LedgerError::InvalidKey(_))));
        assert!(matches!(EntityKey::new(-7), Err(LedgerError::InvalidKey(_))));
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!(" 42 ".parse::<EntityKey>().unwrap().value(), 42);
        for bad in ["abc", "NaN", "1.5", "", "-1", "0"] {
            assert!(
                matches!(bad.parse::<EntityKey>(), Err(LedgerError::InvalidKey(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
