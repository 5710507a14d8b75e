//! Summarizer — AI tier with a deterministic truncation fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::llm::{TextService, json};
use crate::pipeline::types::{ParsedMessage, Staged, SummaryResult};

const SUMMARIZE_TEMPERATURE: f32 = 0.5;

/// Fallback summary length cap.
const FALLBACK_SUMMARY_CHARS: usize = 150;

#[derive(Debug, serde::Deserialize)]
struct SummarizeResponse {
    summary: String,
    key_points: Vec<String>,
    action_items: Vec<String>,
}

/// Two-tier message summarizer.
pub struct Summarizer {
    service: Arc<dyn TextService>,
}

impl Summarizer {
    pub fn new(service: Arc<dyn TextService>) -> Self {
        Self { service }
    }

    /// Summarize a message in the context of its category.
    pub async fn summarize(
        &self,
        msg: &ParsedMessage,
        category: &str,
    ) -> Result<Staged<SummaryResult>, PipelineError> {
        let prompt = build_prompt(msg, category);

        let raw = self
            .service
            .generate(&prompt, SYSTEM_INSTRUCTION, SUMMARIZE_TEMPERATURE)
            .await?;

        match json::parse_object::<SummarizeResponse>(&raw) {
            Ok(response) => {
                debug!("Summarized via generative service");
                Ok(Staged::ai(SummaryResult {
                    summary: response.summary,
                    key_points: response.key_points,
                    action_items: response.action_items,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Unusable summary answer, using truncation fallback");
                Ok(Staged::fallback(fallback(msg)))
            }
        }
    }
}

/// Deterministic summary: first sentence of the body capped at 150 chars,
/// or the subject when the body is empty.
pub fn fallback(msg: &ParsedMessage) -> SummaryResult {
    let summary = if msg.body.is_empty() {
        msg.subject.clone()
    } else {
        let first_sentence = match msg.body.split_once('.') {
            Some((sentence, _)) => format!("{sentence}."),
            None => msg.body.clone(),
        };
        first_sentence.chars().take(FALLBACK_SUMMARY_CHARS).collect()
    };

    let key_points = if msg.subject.is_empty() {
        Vec::new()
    } else {
        vec![msg.subject.clone()]
    };

    SummaryResult {
        summary,
        key_points,
        action_items: Vec::new(),
    }
}

const SYSTEM_INSTRUCTION: &str = "You are an expert message summarizer.\n\
    Create a concise summary of the message in 1-2 sentences.\n\
    Extract key points and action items if any.\n\n\
    IMPORTANT: Your response MUST be a valid JSON object with these exact fields:\n\
    {\"summary\": \"1-2 sentence summary\", \"key_points\": [\"point 1\", \"point 2\"], \"action_items\": [\"action 1\"]}\n\n\
    Use an empty array for action_items when there are none.\n\
    Do not include any text before or after the JSON.";

fn build_prompt(msg: &ParsedMessage, category: &str) -> String {
    format!(
        "Summarize this message:\n\n\
         Subject: {}\n\
         From: {}\n\
         Category: {}\n\n\
         Body:\n{}",
        msg.subject, msg.sender.display_name, category, msg.body
    )
}
