// SPDX-License-Identifier: AGPL-3.0-only
//! Opaque 32-byte identifiers for tokens and account holders.
//!
//! The all-zero value of each type is the *null* identifier. A null token id
//! can never be part of a pool, and the null holder only ever receives the
//! permanently locked minimum liquidity.
//!
//! Identifiers are rendered as 64 lowercase hex characters. `derive(label)`
//! produces a deterministic identifier from a human-readable label via
//! blake3, which is how tests, genesis files and the CLI name accounts.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of every identifier in bytes
pub const ID_LEN: usize = 32;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $domain:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; ID_LEN]);

        impl $name {
            /// The null identifier (all zero bytes).
            pub const ZERO: Self = Self([0u8; ID_LEN]);

            /// Wrap raw bytes.
            pub const fn new(bytes: [u8; ID_LEN]) -> Self {
                Self(bytes)
            }

            /// Deterministic identifier for a label: `blake3(domain || label)`.
            pub fn derive(label: &str) -> Self {
                let mut hasher = blake3::Hasher::new();
                hasher.update($domain);
                hasher.update(label.as_bytes());
                Self(*hasher.finalize().as_bytes())
            }

            pub fn as_bytes(&self) -> &[u8; ID_LEN] {
                &self.0
            }

            /// True for the null identifier.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }

            /// Lowercase hex rendering.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Short form for logs: first 8 hex chars.
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short())
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix("0x").unwrap_or(s);
                let bytes = hex::decode(raw).map_err(|_| IdParseError::InvalidHex)?;
                let arr: [u8; ID_LEN] = bytes
                    .try_into()
                    .map_err(|v: Vec<u8>| IdParseError::InvalidLength(v.len()))?;
                Ok(Self(arr))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

define_id!(
    /// Opaque token identifier. Pools order their two tokens by comparing
    /// these bytes.
    TokenId,
    b"xyk:token:"
);

define_id!(
    /// Identity of a caller, share holder, recipient or custody account.
    Address,
    b"xyk:address:"
);

impl Address {
    /// Custody address of the pool trading `low`/`high`.
    pub fn pool_custody(low: &TokenId, high: &TokenId) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"xyk:custody:");
        hasher.update(low.as_bytes());
        hasher.update(high.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }
}

/// Failure to parse an identifier from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("identifier is not valid hex")]
    InvalidHex,
    #[error("identifier must be {ID_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// Which canonical side of the pool a value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Low,
    High,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Low => f.write_str("token-low"),
            Side::High => f.write_str("token-high"),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// u128 ↔ String serialization (JSON doesn't support 128-bit integers)
// ─────────────────────────────────────────────────────────────

pub mod u128_str {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(val: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u128>().map_err(serde::de::Error::custom)
    }
}

/// Same convention for `holder → u128` maps.
pub mod u128_map_str {
    use super::Address;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(map: &BTreeMap<Address, u128>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let as_str: BTreeMap<&Address, String> =
            map.iter().map(|(k, v)| (k, v.to_string())).collect();
        as_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<Address, u128>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<Address, String>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(k, v)| {
                v.parse::<u128>()
                    .map(|n| (k, n))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
