//! Claim records and bond types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relation of a claim to its parents.
///
/// Wire values follow the ledger's `u8` encoding. The value `2` is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BondType {
    /// Root or new fact
    Genesis,
    /// Supporting detail or extension
    Derived,
    /// Opposing claim
    Contradicts,
}

impl BondType {
    pub fn as_u8(self) -> u8 {
        match self {
            BondType::Genesis => 0,
            BondType::Derived => 1,
            BondType::Contradicts => 3,
        }
    }
}

impl From<BondType> for u8 {
    fn from(bond: BondType) -> Self {
        bond.as_u8()
    }
}

impl TryFrom<u8> for BondType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BondType::Genesis),
            1 => Ok(BondType::Derived),
            3 => Ok(BondType::Contradicts),
            other => Err(format!("unknown bond type: {}", other)),
        }
    }
}

impl fmt::Display for BondType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BondType::Genesis => "GENESIS",
            BondType::Derived => "DERIVED",
            BondType::Contradicts => "CONTRADICTS",
        };
        f.write_str(name)
    }
}

/// Identifier assigned by the ledger to a recorded claim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(String);

impl ClaimId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClaimId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ClaimId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A claim ready to be written.
///
/// Parent ids are always ids the ledger has already returned; the builder
/// never constructs a `Claim` whose parent is still pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub content: String,
    pub bond_type: BondType,
    #[serde(default)]
    pub parent_ids: Vec<ClaimId>,
    pub source_url: String,
}

impl Claim {
    /// A root claim with no parents.
    pub fn genesis(content: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bond_type: BondType::Genesis,
            parent_ids: Vec::new(),
            source_url: source_url.into(),
        }
    }

    /// A claim bonded to a single recorded parent.
    pub fn child(
        content: impl Into<String>,
        bond_type: BondType,
        parent: ClaimId,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            bond_type,
            parent_ids: vec![parent],
            source_url: source_url.into(),
        }
    }

    /// Add another recorded parent.
    pub fn with_parent(mut self, parent: ClaimId) -> Self {
        self.parent_ids.push(parent);
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }
}

/// A claim the ledger accepted, with the id it assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedClaim {
    pub id: ClaimId,
    pub claim: Claim,
    /// 0 for topics, 1 for stances or flat children, 2 for nested claims,
    /// 3 for provenance leaves
    pub depth: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bond_type_wire_values() {
        assert_eq!(serde_json::to_string(&BondType::Contradicts).unwrap(), "3");
        assert_eq!(serde_json::from_str::<BondType>("1").unwrap(), BondType::Derived);
        assert!(serde_json::from_str::<BondType>("2").is_err());
    }

    #[test]
    fn test_claim_constructors() {
        let root = Claim::genesis("Bitcoin", "https://abmedia.io/a");
        assert!(root.is_root());
        assert_eq!(root.bond_type, BondType::Genesis);

        let child = Claim::child("ETF outflows", BondType::Derived, "0xroot".into(), "u")
            .with_parent("0xother".into());
        assert!(!child.is_root());
        assert_eq!(child.parent_ids.len(), 2);
    }

    #[test]
    fn test_claim_id_is_transparent() {
        let id = ClaimId::new("0xabc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0xabc\"");
        assert_eq!(id.to_string(), "0xabc");
    }
}
