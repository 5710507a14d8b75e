//! Reply generator — AI tier with a category-keyed template fallback.
//!
//! Runs only when the decided actions include a reply trigger. The AI tier
//! asks for three reply lengths with concrete, content-specific answers; the
//! fallback renders the configured per-category templates.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ReplyTemplates;
use crate::error::PipelineError;
use crate::llm::{TextService, json};
use crate::pipeline::types::{ParsedMessage, ReplyBundle, Staged};

const REPLY_TEMPERATURE: f32 = 0.7;

/// Body excerpt length embedded in the prompt.
const BODY_EXCERPT_CHARS: usize = 800;

#[derive(Debug, serde::Deserialize)]
struct ReplyResponse {
    brief: String,
    standard: String,
    detailed: String,
    subject_reply: String,
}

/// Two-tier reply generator.
pub struct ReplyGenerator {
    service: Arc<dyn TextService>,
    templates: Arc<ReplyTemplates>,
}

impl ReplyGenerator {
    pub fn new(service: Arc<dyn TextService>, templates: Arc<ReplyTemplates>) -> Self {
        Self { service, templates }
    }

    /// Draft replies for a message that needs one.
    pub async fn generate(
        &self,
        msg: &ParsedMessage,
        category: &str,
        tone: &str,
        summary: &str,
        action_items: &[String],
    ) -> Result<Staged<ReplyBundle>, PipelineError> {
        let system = build_system_instruction(category, tone);
        let prompt = build_prompt(msg, summary, action_items);

        let raw = self
            .service
            .generate(&prompt, &system, REPLY_TEMPERATURE)
            .await?;

        match json::parse_object::<ReplyResponse>(&raw) {
            Ok(response) => {
                debug!("Reply drafted via generative service");
                Ok(Staged::ai(ReplyBundle {
                    brief: response.brief,
                    standard: response.standard,
                    detailed: response.detailed,
                    subject: response.subject_reply,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Unusable reply answer, using template fallback");
                Ok(Staged::fallback(self.fallback(msg, category)))
            }
        }
    }

    /// Render the configured template for this category.
    pub fn fallback(&self, msg: &ParsedMessage, category: &str) -> ReplyBundle {
        let template = self.templates.for_category(category);
        let (brief, standard, detailed) =
            template.render(&msg.sender.display_name, &msg.subject);
        ReplyBundle {
            brief,
            standard,
            detailed,
            subject: format!("Re: {}", msg.subject),
        }
    }
}

fn build_system_instruction(category: &str, tone: &str) -> String {
    format!(
        "You are a professional assistant that writes ACTIONABLE and SPECIFIC replies.\n\n\
         IMPORTANT RULES:\n\
         1. DO NOT write generic responses like \"I'll review and get back to you\"\n\
         2. DO provide SPECIFIC answers, solutions, or next steps\n\
         3. Address the actual content and questions in the message\n\
         4. Match the tone: {tone}\n\
         5. Category: {category}\n\n\
         Generate 3 versions of the reply:\n\
         1. Brief (2-3 sentences) - quick but specific\n\
         2. Standard (4-5 sentences) - professional with details\n\
         3. Detailed (6-8 sentences) - comprehensive with reasoning\n\n\
         Your response MUST be a valid JSON object:\n\
         {{\"brief\": \"...\", \"standard\": \"...\", \"detailed\": \"...\", \"subject_reply\": \"Re: suggested subject\"}}\n\n\
         Write the reply in the same language as the original message.\n\
         Do not include any text before or after the JSON."
    )
}

fn build_prompt(msg: &ParsedMessage, summary: &str, action_items: &[String]) -> String {
    let excerpt: String = msg.body.chars().take(BODY_EXCERPT_CHARS).collect();
    let items = if action_items.is_empty() {
        "None".to_string()
    } else {
        action_items.join(", ")
    };
    format!(
        "Generate a SPECIFIC and ACTIONABLE reply for this message:\n\n\
         Original Subject: {}\n\
         From: {} <{}>\n\n\
         Message Summary: {}\n\n\
         Full Original Content:\n{}\n\n\
         Action Items Identified: {}\n\n\
         INSTRUCTIONS:\n\
         - Address specific questions or requests\n\
         - Provide concrete answers or next steps\n\
         - If approvals are needed, state a decision\n\
         - If meetings are requested, suggest a specific time",
        msg.subject, msg.sender.display_name, msg.sender.address, summary, excerpt, items
    )
}
