//! LLM-backed extractor and topic judge.

mod openai;
pub mod prompts;

pub use openai::{OpenAIExtractor, DEFAULT_MODEL};
pub use prompts::{parse_judge_answer, ExtractionShape};
