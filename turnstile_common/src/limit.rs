//! Validated concurrency ceiling.
//!
//! A [`ConcurrencyLimit`] is a non-negative 32-bit integer checked once when it
//! is built. Zero is accepted: a scheduler with no slots parks every caller
//! forever, which is useless but well-defined.

use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};

/// Errors raised while building a [`ConcurrencyLimit`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitError {
    #[error("concurrency limit must be non-negative, got {0}")]
    Negative(i64),

    #[error("concurrency limit {0} does not fit in a 32-bit signed integer")]
    TooLarge(u64),

    #[error("concurrency limit '{input}' is not an integer: {source}")]
    NotAnInteger {
        input: String,
        #[source]
        source: ParseIntError,
    },
}

/// Maximum number of operations a scheduler lets run at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct ConcurrencyLimit(u32);

impl ConcurrencyLimit {
    /// Largest accepted ceiling (`i32::MAX`).
    pub const MAX: ConcurrencyLimit = ConcurrencyLimit(i32::MAX as u32);

    /// A limit that admits nobody.
    pub const ZERO: ConcurrencyLimit = ConcurrencyLimit(0);

    /// Builds a limit, rejecting negatives and values beyond `i32::MAX`.
    pub fn new(value: i64) -> Result<Self, LimitError> {
        if value < 0 {
            return Err(LimitError::Negative(value));
        }
        if value > i64::from(i32::MAX) {
            return Err(LimitError::TooLarge(value as u64));
        }
        Ok(Self(value as u32))
    }

    /// Builds a limit from an unsigned value, capping it at [`Self::MAX`].
    pub const fn clamped(value: u32) -> Self {
        if value > i32::MAX as u32 {
            Self::MAX
        } else {
            Self(value)
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<i64> for ConcurrencyLimit {
    type Error = LimitError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i32> for ConcurrencyLimit {
    type Error = LimitError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl TryFrom<u32> for ConcurrencyLimit {
    type Error = LimitError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl TryFrom<usize> for ConcurrencyLimit {
    type Error = LimitError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let wide = i64::try_from(value).map_err(|_| LimitError::TooLarge(value as u64))?;
        Self::new(wide)
    }
}

impl From<ConcurrencyLimit> for u32 {
    fn from(limit: ConcurrencyLimit) -> Self {
        limit.0
    }
}

impl FromStr for ConcurrencyLimit {
    type Err = LimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<i64>()
            .map_err(|source| LimitError::NotAnInteger {
                input: trimmed.to_string(),
                source,
            })?;
        Self::new(value)
    }
}

impl fmt::Display for ConcurrencyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
