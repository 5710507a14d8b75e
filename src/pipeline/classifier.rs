//! Category classifier — AI tier with a deterministic keyword fallback.
//!
//! The AI tier asks the generative service for a JSON verdict over the
//! configured category names. A malformed or incomplete answer degrades to
//! keyword matching; a failed service call aborts the run.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{CategoryTable, DEFAULT_CATEGORY};
use crate::error::PipelineError;
use crate::llm::{TextService, json};
use crate::pipeline::types::{ClassificationResult, ParsedMessage, Staged};

/// Low temperature for consistent category assignment.
const CLASSIFY_TEMPERATURE: f32 = 0.3;

/// Body excerpt length embedded in the prompt.
const BODY_EXCERPT_CHARS: usize = 500;

/// Fallback confidence added per keyword match.
const CONFIDENCE_PER_MATCH: f64 = 0.2;

#[derive(Debug, serde::Deserialize)]
struct ClassifyResponse {
    category: String,
    confidence: f64,
    reasoning: String,
}

/// Two-tier category classifier.
pub struct Classifier {
    service: Arc<dyn TextService>,
    categories: Arc<CategoryTable>,
}

impl Classifier {
    pub fn new(service: Arc<dyn TextService>, categories: Arc<CategoryTable>) -> Self {
        Self {
            service,
            categories,
        }
    }

    /// Classify a message. Service unavailability is fatal; an unusable
    /// answer falls back to keyword matching.
    pub async fn classify(
        &self,
        msg: &ParsedMessage,
    ) -> Result<Staged<ClassificationResult>, PipelineError> {
        let system = build_system_instruction(&self.categories);
        let prompt = build_prompt(msg);

        let raw = self
            .service
            .generate(&prompt, &system, CLASSIFY_TEMPERATURE)
            .await?;

        match json::parse_object::<ClassifyResponse>(&raw) {
            Ok(response) => {
                debug!(category = %response.category, "Classified via generative service");
                Ok(Staged::ai(ClassificationResult {
                    category: response.category,
                    confidence: response.confidence,
                    reasoning: response.reasoning,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Unusable classification answer, using keyword fallback");
                Ok(Staged::fallback(self.fallback(msg)))
            }
        }
    }

    /// Deterministic keyword classification: first configured category with
    /// at least one substring match wins.
    pub fn fallback(&self, msg: &ParsedMessage) -> ClassificationResult {
        let text = format!("{} {}", msg.subject, msg.body).to_lowercase();

        for category in self.categories.iter() {
            let matches = category
                .keywords
                .iter()
                .filter(|k| text.contains(k.to_lowercase().as_str()))
                .count();
            if matches > 0 {
                return ClassificationResult {
                    category: category.name.clone(),
                    confidence: (matches as f64 * CONFIDENCE_PER_MATCH).min(1.0),
                    reasoning: format!("Matched {matches} keywords"),
                };
            }
        }

        ClassificationResult {
            category: DEFAULT_CATEGORY.to_string(),
            confidence: 0.5,
            reasoning: "Default classification".to_string(),
        }
    }
}

fn build_system_instruction(categories: &CategoryTable) -> String {
    let category_list = categories.names().join(", ");
    format!(
        "You are a message classification expert.\n\
         Analyze the message and classify it into ONE of these categories: {category_list}\n\n\
         Consider:\n\
         - Subject line keywords\n\
         - Sender information\n\
         - Message content and context\n\
         - Tone and purpose\n\n\
         IMPORTANT: Your response MUST be a valid JSON object with these exact fields:\n\
         {{\"category\": \"category name\", \"confidence\": 0.0-1.0, \"reasoning\": \"brief explanation\"}}\n\n\
         Do not include any text before or after the JSON."
    )
}

fn build_prompt(msg: &ParsedMessage) -> String {
    let excerpt: String = msg.body.chars().take(BODY_EXCERPT_CHARS).collect();
    format!(
        "Classify this message:\n\n\
         From: {}\n\
         Subject: {}\n\
         Body: {}",
        msg.sender.address, msg.subject, excerpt
    )
}
