use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A ledger account or contract address.
///
/// Equality, ordering and hashing are defined over the 20 raw address bytes,
/// so renderings that differ only in hex casing denote the same identity.
/// `Display` always produces the EIP-55 checksummed form.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Address);

impl Identity {
    /// The all-zero address, used on-chain for "nobody".
    pub const NULL: Self = Self(Address::ZERO);

    pub const fn from_bytes(b: [u8; 20]) -> Self {
        Self(Address::new(b))
    }

    pub fn is_null(&self) -> bool {
        self.0 == Address::ZERO
    }

    pub fn address(&self) -> Address {
        self.0
    }

    /// First bytes of the checksummed form, for compact tables.
    pub fn short(&self) -> String {
        let mut s = self.to_string();
        s.truncate(10);
        s
    }
}

impl From<Address> for Identity {
    fn from(a: Address) -> Self {
        Self(a)
    }
}

impl From<Identity> for Address {
    fn from(i: Identity) -> Self {
        i.0
    }
}

impl From<[u8; 20]> for Identity {
    fn from(b: [u8; 20]) -> Self {
        Self(Address::from(b))
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl FromStr for Identity {
    type Err = InvalidIdentity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Checksums are not enforced; all casings map to the same bytes.
        Address::from_str(s.trim())
            .map(Self)
            .map_err(|_| InvalidIdentity(s.to_string()))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_checksum(None))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid identity: {0:?}")]
pub struct InvalidIdentity(String);
