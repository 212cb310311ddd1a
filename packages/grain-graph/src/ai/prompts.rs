//! Prompt text and response parsing for the LLM collaborators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{claim::ClaimId, topic::TopicEntry};

/// Which structure the extractor is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionShape {
    /// Entity → Stance → Claim
    #[default]
    Hierarchy,
    /// One root topic with a flat list of arguments
    Flat,
}

impl FromStr for ExtractionShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hierarchy" | "nested" => Ok(ExtractionShape::Hierarchy),
            "flat" | "rooted" => Ok(ExtractionShape::Flat),
            other => Err(format!(
                "unknown extraction shape '{}' (expected hierarchy or flat)",
                other
            )),
        }
    }
}

impl fmt::Display for ExtractionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExtractionShape::Hierarchy => "hierarchy",
            ExtractionShape::Flat => "flat",
        })
    }
}

const HIERARCHY_PROMPT: &str = r#"You are a logic topology analyst. Decompose the article into a three-level claim hierarchy:

1. Entities: the concrete subjects the article is about (an asset, a company, a person, a policy).
2. Stances: positions taken on each entity (for example "Bullish", "Bearish", "Regulatory risk").
3. Claims: specific factual or argumentative statements supporting each stance.

Bond types: 0 = GENESIS (new fact), 1 = DERIVED (supports or extends its parent), 3 = CONTRADICTS (opposes its parent).
Keep every text short and self-contained. Do not invent facts that are not in the article.

Respond with JSON only:
{
  "entities": [
    {
      "name": "Bitcoin",
      "stances": [
        {
          "name": "Bullish",
          "bond_type": 1,
          "claims": [ { "content": "MicroStrategy increases BTC holdings", "bond_type": 1 } ]
        }
      ]
    }
  ]
}"#;

const FLAT_PROMPT: &str = r#"You are a logic topology analyst. Analyze the article and extract:

1. One main issue (the root node).
2. Several key arguments about it (child nodes).

Bond types: 0 = GENESIS (the root), 1 = DERIVED (supports or extends the issue), 3 = CONTRADICTS (opposes it).
Do not invent facts that are not in the article.

Respond with JSON only:
{
  "root": { "content": "Main issue", "bond_type": 0 },
  "children": [ { "content": "Argument", "bond_type": 1 } ]
}"#;

impl ExtractionShape {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            ExtractionShape::Hierarchy => HIERARCHY_PROMPT,
            ExtractionShape::Flat => FLAT_PROMPT,
        }
    }
}

/// Prompt asking whether `label` belongs to one of `candidates`.
pub fn judge_prompt(label: &str, candidates: &[TopicEntry]) -> String {
    let listing = candidates
        .iter()
        .map(|c| format!("- {}: {}", c.id, c.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"A new topic was extracted: "{label}"

Known topics (id: label):
{listing}

Does the new topic belong to one of the known topics, as a subset, a related event, a follow-up development, or the same field?
Be generous: topics sharing a key subject (the same asset, company or person) belong together.

If one matches, answer with its id only (for example 0x123...).
If none is related, answer NONE."#
    )
}

/// Read a judge answer: the first `0x...` token, or `None`.
pub fn parse_judge_answer(answer: &str) -> Option<ClaimId> {
    answer
        .split(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | ',' | '.' | ':' | '(' | ')'))
        .find(|token| token.len() > 2 && (token.starts_with("0x") || token.starts_with("0X")))
        .map(ClaimId::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_judge_answer() {
        assert_eq!(parse_judge_answer("0xabc123"), Some(ClaimId::new("0xabc123")));
        assert_eq!(parse_judge_answer("\"0xabc123\"\n"), Some(ClaimId::new("0xabc123")));
        assert_eq!(
            parse_judge_answer("The matching topic is 0xabc123."),
            Some(ClaimId::new("0xabc123"))
        );
        assert_eq!(parse_judge_answer("0XABC123"), Some(ClaimId::new("0XABC123")));
        assert_eq!(parse_judge_answer("NONE"), None);
        assert_eq!(parse_judge_answer("0x"), None);
        assert_eq!(parse_judge_answer(""), None);
    }

    #[test]
    fn test_judge_prompt_lists_candidates() {
        let prompt = judge_prompt(
            "Bitcoin ETF inflow surge",
            &[TopicEntry::new("0xA", "Bitcoin ETF outflows"), TopicEntry::new("0xB", "xAI")],
        );
        assert!(prompt.contains("\"Bitcoin ETF inflow surge\""));
        assert!(prompt.contains("- 0xA: Bitcoin ETF outflows"));
        assert!(prompt.contains("- 0xB: xAI"));
        assert!(prompt.contains("NONE"));
    }

    #[test]
    fn test_shape_parsing() {
        assert_eq!("nested".parse::<ExtractionShape>().unwrap(), ExtractionShape::Hierarchy);
        assert_eq!("FLAT".parse::<ExtractionShape>().unwrap(), ExtractionShape::Flat);
        assert!("tree".parse::<ExtractionShape>().is_err());
        assert!(ExtractionShape::Hierarchy.system_prompt().contains("\"entities\""));
        assert!(ExtractionShape::Flat.system_prompt().contains("\"children\""));
    }
}
