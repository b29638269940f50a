//! Generation counters
//!
//! A generation orders competing ring states. It only ever moves forward:
//! incrementing past `i64::MAX` is an error rather than a wrap.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64")]
pub struct Generation(i64);

impl Generation {
    /// Fresh counter at zero
    pub fn new() -> Self {
        Self(0)
    }

    /// Restore a counter from its serialized value
    pub fn from_value(value: i64) -> Result<Self> {
        if value < 0 {
            return Err(Error::NegativeGeneration(value));
        }
        Ok(Self(value))
    }

    /// A counter for a new lineage that is still strictly newer than `reference`
    pub fn with_baseline(reference: &Generation) -> Result<Self> {
        let fresh = Self::new();
        if reference.is_older_than(&fresh) {
            Ok(fresh)
        } else {
            reference.incremented()
        }
    }

    /// The next generation after this one
    pub fn incremented(&self) -> Result<Self> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(Error::GenerationExhausted(self.0))
    }

    /// True if `self` strictly precedes `other`
    pub fn is_older_than(&self, other: &Generation) -> bool {
        self.0 < other.0
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Generation {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Self::from_value(value)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
