//! Claim Extractor output shapes and their normalization.
//!
//! Extractors answer in one of three JSON shapes:
//!
//! - nested: `{"entities": [{"name", "stances": [{"name", "claims": [..]}]}]}`
//! - rooted: `{"root": {..}, "children": [..]}` (or `{"claims": [..]}`)
//! - bare:   `[{"content", "bond_type"}, ..]`
//!
//! All of them become an [`Extraction`], and every `Extraction` flattens to
//! the same [`TopicTree`] list so the builder has one traversal.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::claim::BondType;

/// A leaf or intermediate node as produced by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimNode {
    pub content: String,
    pub bond_type: BondType,
}

impl ClaimNode {
    pub fn new(content: impl Into<String>, bond_type: BondType) -> Self {
        Self {
            content: content.into(),
            bond_type,
        }
    }

    pub fn derived(content: impl Into<String>) -> Self {
        Self::new(content, BondType::Derived)
    }
}

/// A position taken on an entity, carrying its claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stance {
    pub name: String,
    /// Defaults to DERIVED when the extractor gives none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond_type: Option<BondType>,
    #[serde(default)]
    pub claims: Vec<ClaimNode>,
}

impl Stance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bond_type: None,
            claims: Vec::new(),
        }
    }

    pub fn with_bond_type(mut self, bond_type: BondType) -> Self {
        self.bond_type = Some(bond_type);
        self
    }

    pub fn with_claim(mut self, claim: ClaimNode) -> Self {
        self.claims.push(claim);
        self
    }
}

/// A top-level entity or topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub stances: Vec<Stance>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stances: Vec::new(),
        }
    }

    pub fn with_stance(mut self, stance: Stance) -> Self {
        self.stances.push(stance);
        self
    }
}

/// Result of one extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Extraction {
    /// Nothing usable came back
    #[default]
    Empty,

    /// One root topic with a flat list of claims under it
    Flat { root: ClaimNode, claims: Vec<ClaimNode> },

    /// Entity → Stance → Claim hierarchy
    Nested { entities: Vec<Entity> },
}

/// Second-level node with its third-level leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub content: String,
    pub bond_type: BondType,
    pub leaves: Vec<ClaimNode>,
}

/// A top-level label and everything that hangs under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicTree {
    pub label: String,
    pub branches: Vec<Branch>,
}

impl TopicTree {
    /// Number of nodes below the topic itself.
    pub fn descendant_count(&self) -> usize {
        self.branches.iter().map(|b| 1 + b.leaves.len()).sum()
    }
}

impl Extraction {
    pub fn flat(root: ClaimNode, claims: Vec<ClaimNode>) -> Self {
        Extraction::Flat { root, claims }
    }

    pub fn nested(entities: Vec<Entity>) -> Self {
        Extraction::Nested { entities }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Extraction::Empty => true,
            Extraction::Flat { .. } => false,
            Extraction::Nested { entities } => entities.is_empty(),
        }
    }

    /// Normalize either shape into topic trees.
    pub fn topics(&self) -> Vec<TopicTree> {
        match self {
            Extraction::Empty => Vec::new(),
            Extraction::Flat { root, claims } => vec![TopicTree {
                label: root.content.clone(),
                branches: claims
                    .iter()
                    .map(|c| Branch {
                        content: c.content.clone(),
                        bond_type: c.bond_type,
                        leaves: Vec::new(),
                    })
                    .collect(),
            }],
            Extraction::Nested { entities } => entities
                .iter()
                .map(|entity| TopicTree {
                    label: entity.name.clone(),
                    branches: entity
                        .stances
                        .iter()
                        .map(|stance| Branch {
                            content: format!("{}: {}", entity.name, stance.name),
                            bond_type: stance.bond_type.unwrap_or(BondType::Derived),
                            leaves: stance.claims.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Total number of nodes, topics included.
    pub fn node_count(&self) -> usize {
        self.topics()
            .iter()
            .map(|t| 1 + t.descendant_count())
            .sum()
    }
}

// =============================================================================
// Parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    content: String,
    #[serde(default)]
    bond_type: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawStance {
    #[serde(default)]
    name: String,
    #[serde(default)]
    bond_type: Option<serde_json::Value>,
    #[serde(default)]
    claims: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(default)]
    name: String,
    #[serde(default)]
    stances: Vec<RawStance>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawExtraction {
    Nested {
        entities: Vec<RawEntity>,
    },
    Rooted {
        root: RawNode,
        #[serde(default)]
        children: Vec<RawNode>,
    },
    Wrapped {
        claims: Vec<RawNode>,
    },
    Bare(Vec<RawNode>),
}

fn bond_from_value(value: Option<&serde_json::Value>, fallback: BondType) -> BondType {
    let Some(value) = value else {
        return fallback;
    };

    let number = match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match number.and_then(|n| u8::try_from(n).ok()).map(BondType::try_from) {
        Some(Ok(bond)) => bond,
        _ => {
            warn!(value = %value, fallback = %fallback, "Unknown bond type from extractor");
            fallback
        }
    }
}

fn node_from_raw(raw: RawNode, fallback: BondType) -> Option<ClaimNode> {
    let content = raw.content.trim();
    if content.is_empty() {
        return None;
    }
    Some(ClaimNode::new(
        content,
        bond_from_value(raw.bond_type.as_ref(), fallback),
    ))
}

fn flat_from_list(nodes: Vec<RawNode>) -> Extraction {
    let mut nodes: Vec<ClaimNode> = nodes
        .into_iter()
        .filter_map(|n| node_from_raw(n, BondType::Derived))
        .collect();

    if nodes.is_empty() {
        return Extraction::Empty;
    }

    let root_pos = nodes
        .iter()
        .position(|n| n.bond_type == BondType::Genesis)
        .unwrap_or(0);
    let root = nodes.remove(root_pos);

    Extraction::flat(root, nodes)
}

/// Parse raw extractor output. Anything unrecognizable is [`Extraction::Empty`].
pub fn parse_extraction(raw: &str) -> Extraction {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let parsed: RawExtraction = match serde_json::from_str(cleaned) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Extractor output is not a recognized claim structure");
            return Extraction::Empty;
        }
    };

    match parsed {
        RawExtraction::Nested { entities } => {
            let entities: Vec<Entity> = entities
                .into_iter()
                .filter_map(|raw_entity| {
                    let name = raw_entity.name.trim().to_string();
                    if name.is_empty() {
                        return None;
                    }
                    let stances = raw_entity
                        .stances
                        .into_iter()
                        .filter_map(|raw_stance| {
                            let stance_name = raw_stance.name.trim().to_string();
                            if stance_name.is_empty() {
                                return None;
                            }
                            Some(Stance {
                                name: stance_name,
                                bond_type: raw_stance
                                    .bond_type
                                    .as_ref()
                                    .map(|v| bond_from_value(Some(v), BondType::Derived)),
                                claims: raw_stance
                                    .claims
                                    .into_iter()
                                    .filter_map(|c| node_from_raw(c, BondType::Derived))
                                    .collect(),
                            })
                        })
                        .collect();
                    Some(Entity { name, stances })
                })
                .collect();

            if entities.is_empty() {
                Extraction::Empty
            } else {
                Extraction::nested(entities)
            }
        }
        RawExtraction::Rooted { root, children } => match node_from_raw(root, BondType::Genesis) {
            Some(root) => Extraction::flat(
                root,
                children
                    .into_iter()
                    .filter_map(|c| node_from_raw(c, BondType::Derived))
                    .collect(),
            ),
            None => Extraction::Empty,
        },
        RawExtraction::Wrapped { claims } => flat_from_list(claims),
        RawExtraction::Bare(nodes) => flat_from_list(nodes),
    }
}
