//! OpenAI implementation of the extractor and judge traits.

use async_trait::async_trait;
use openai_client::{truncate_to_char_boundary, OpenAIClient};
use tracing::debug;

use super::prompts::{judge_prompt, parse_judge_answer, ExtractionShape};
use crate::error::{ExtractError, ExtractResult};
use crate::traits::extractor::{ClaimExtractor, TopicJudge};
use crate::types::{
    claim::ClaimId,
    extraction::{parse_extraction, Extraction},
    topic::TopicEntry,
};

/// Default chat model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Article text sent to the model, in bytes.
const MAX_INPUT_BYTES: usize = 8_000;

const EXTRACT_TEMPERATURE: f32 = 0.3;
const JUDGE_TEMPERATURE: f32 = 0.1;

/// Claim extractor and topic judge backed by OpenAI chat completions.
///
/// # Example
///
/// ```rust,ignore
/// use grain_graph::ai::{ExtractionShape, OpenAIExtractor};
///
/// let extractor = OpenAIExtractor::from_env()?.with_shape(ExtractionShape::Flat);
/// let extraction = extractor.extract(&article_text).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OpenAIExtractor {
    client: OpenAIClient,
    model: String,
    shape: ExtractionShape,
}

impl OpenAIExtractor {
    pub fn new(client: OpenAIClient) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
            shape: ExtractionShape::default(),
        }
    }

    /// Create from `OPENAI_API_KEY`.
    pub fn from_env() -> ExtractResult<Self> {
        let client = OpenAIClient::from_env().map_err(|e| ExtractError::AI(Box::new(e)))?;
        Ok(Self::new(client))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_shape(mut self, shape: ExtractionShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn shape(&self) -> ExtractionShape {
        self.shape
    }
}

#[async_trait]
impl ClaimExtractor for OpenAIExtractor {
    async fn extract(&self, text: &str) -> ExtractResult<Extraction> {
        let input = truncate_to_char_boundary(text, MAX_INPUT_BYTES);

        debug!(
            model = %self.model,
            shape = %self.shape,
            input_bytes = input.len(),
            truncated = input.len() < text.len(),
            "Extracting claims"
        );

        let raw = self
            .client
            .complete_json(&self.model, self.shape.system_prompt(), input, EXTRACT_TEMPERATURE)
            .await
            .map_err(|e| ExtractError::AI(Box::new(e)))?;

        let extraction = parse_extraction(&raw);
        debug!(nodes = extraction.node_count(), "Extraction parsed");
        Ok(extraction)
    }
}

#[async_trait]
impl TopicJudge for OpenAIExtractor {
    async fn judge(&self, label: &str, candidates: &[TopicEntry]) -> ExtractResult<Option<ClaimId>> {
        let prompt = judge_prompt(label, candidates);

        let answer = self
            .client
            .complete(&self.model, &prompt, JUDGE_TEMPERATURE)
            .await
            .map_err(|e| ExtractError::AI(Box::new(e)))?;

        let verdict = parse_judge_answer(&answer);
        debug!(label = %label, answer = %answer.trim(), verdict = ?verdict, "Topic judged");
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let extractor = OpenAIExtractor::new(OpenAIClient::new("sk-test"));
        assert_eq!(extractor.model(), "gpt-4o-mini");
        assert_eq!(extractor.shape(), ExtractionShape::Hierarchy);

        let extractor = extractor
            .with_model("gpt-4o")
            .with_shape(ExtractionShape::Flat);
        assert_eq!(extractor.model(), "gpt-4o");
        assert_eq!(extractor.shape(), ExtractionShape::Flat);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_ai_error() {
        let client = OpenAIClient::new("sk-test").with_base_url("http://127.0.0.1:9");
        let extractor = OpenAIExtractor::new(client);

        assert!(matches!(
            extractor.extract("Tether invests in Anchorage Digital").await,
            Err(ExtractError::AI(_))
        ));
        assert!(matches!(
            extractor.judge("Tether", &[TopicEntry::new("0xA", "Tether")]).await,
            Err(ExtractError::AI(_))
        ));
    }
}
