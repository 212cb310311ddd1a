//! Topic Index entries.

use serde::{Deserialize, Serialize};

use super::claim::ClaimId;

/// A previously minted top-level claim, as remembered locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEntry {
    pub id: ClaimId,
    pub content: String,
}

impl TopicEntry {
    pub fn new(id: impl Into<ClaimId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}
