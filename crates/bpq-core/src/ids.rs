//! Identifier types

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Name of a capacity-limited resource, e.g. the item short name `rifle.ak`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Create a new resource key
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Numeric identity of a participant (a player's user id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolderId(u64);

impl HolderId {
    /// Wrap a raw user id
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw user id
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for HolderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for HolderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| Error::InvalidHolder(format!("'{s}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holder_id_parse() {
        assert_eq!("76561198000000001".parse::<HolderId>().ok(), Some(HolderId::new(76_561_198_000_000_001)));
        assert_eq!(" 7 ".parse::<HolderId>().ok(), Some(HolderId::new(7)));
        assert!("-1".parse::<HolderId>().is_err());
        assert!("abc".parse::<HolderId>().is_err());
    }

    #[test]
    fn test_ids_serialize_transparently() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&ResourceKey::new("rifle.ak"))?, "\"rifle.ak\"");
        assert_eq!(serde_json::to_string(&HolderId::new(42))?, "42");
        Ok(())
    }
}
