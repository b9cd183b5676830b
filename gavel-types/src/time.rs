use std::fmt;
use std::ops::{Add, Deref};

use serde::{Deserialize, Serialize};

/// Ledger block timestamp in unix seconds.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Signed number of seconds from `self` until `end`.
    ///
    /// Negative once `end` lies in the past.
    pub fn remaining_until(self, end: Timestamp) -> i64 {
        let d = i128::from(end.0) - i128::from(self.0);
        d.clamp(i64::MIN.into(), i64::MAX.into()) as i64
    }
}

impl Add<u64> for Timestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for u64 {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl Deref for Timestamp {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
