use std::fmt;

use alloy_primitives::U256;
use alloy_primitives::utils::{UnitsError, format_ether, parse_ether};
use serde::{Deserialize, Serialize};

/// An amount in the ledger's smallest native unit.
///
/// Guards only ever compare `Wei` values. Ether strings exist at the
/// presentation boundary and nowhere else.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Wei(U256);

impl Wei {
    pub const ZERO: Self = Self(U256::ZERO);

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub const fn get(&self) -> U256 {
        self.0
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Parse a decimal ether amount such as `"1.5"`.
    pub fn parse_ether(s: &str) -> Result<Self, UnitsError> {
        parse_ether(s.trim()).map(Self)
    }

    pub fn to_ether_string(&self) -> String {
        format_ether(self.0)
    }
}

impl From<U256> for Wei {
    fn from(v: U256) -> Self {
        Self(v)
    }
}

impl From<u64> for Wei {
    fn from(v: u64) -> Self {
        Self(U256::from(v))
    }
}

impl From<Wei> for U256 {
    fn from(w: Wei) -> Self {
        w.0
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}
