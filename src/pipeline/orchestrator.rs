//! Pipeline orchestrator — sequences the analysis stages for one message.
//!
//! Parse → Classify → Summarize → Decide → [Reply] → Assemble, strictly in
//! order. A validation failure or an unavailable generative service aborts
//! the run; fallback-tier stage results continue it and are reported only
//! through per-stage provenance on the final record.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::config::{CategoryTable, ReplyTemplates};
use crate::error::PipelineError;
use crate::llm::TextService;
use crate::pipeline::actions;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::importance::ImportanceScorer;
use crate::pipeline::parser::MessageParser;
use crate::pipeline::reply::ReplyGenerator;
use crate::pipeline::summarizer::Summarizer;
use crate::pipeline::tone::ToneAnalyzer;
use crate::pipeline::types::{AnalysisRecord, RawMessage, StageProvenance};

/// End-to-end message analysis pipeline.
///
/// Holds no per-run state; the category and template tables are shared
/// read-only, so one instance serves concurrent runs.
pub struct AnalysisPipeline {
    parser: MessageParser,
    classifier: Classifier,
    summarizer: Summarizer,
    scorer: ImportanceScorer,
    tone: ToneAnalyzer,
    reply: ReplyGenerator,
}

impl AnalysisPipeline {
    pub fn new(
        service: Arc<dyn TextService>,
        categories: Arc<CategoryTable>,
        templates: Arc<ReplyTemplates>,
    ) -> Self {
        Self {
            parser: MessageParser::new(),
            classifier: Classifier::new(Arc::clone(&service), Arc::clone(&categories)),
            summarizer: Summarizer::new(Arc::clone(&service)),
            scorer: ImportanceScorer::new(categories),
            tone: ToneAnalyzer::new(),
            reply: ReplyGenerator::new(service, templates),
        }
    }

    /// Run one message through the full pipeline.
    pub async fn analyze(&self, raw: &RawMessage) -> Result<AnalysisRecord, PipelineError> {
        let parsed = self.parser.parse(raw)?;
        info!(
            sender = %parsed.sender.address,
            subject = %parsed.subject,
            "Analyzing message"
        );

        let mut provenance = Vec::new();

        let classification = self.classifier.classify(&parsed).await?;
        provenance.push(StageProvenance::new("classify", classification.tier));
        let classification = classification.value;
        debug!(
            category = %classification.category,
            confidence = classification.confidence,
            "Classification complete"
        );

        let summary = self
            .summarizer
            .summarize(&parsed, &classification.category)
            .await?;
        provenance.push(StageProvenance::new("summarize", summary.tier));
        let summary = summary.value;

        // Importance and tone are independent pure functions; order between
        // them carries no meaning.
        let importance = self.scorer.score(&parsed, &classification.category);
        let tone = self.tone.analyze(&parsed.subject, &parsed.body);
        let suggested_actions = actions::decide(&classification.category, &importance, &tone);
        debug!(
            score = importance.score,
            level = importance.level.as_str(),
            tone = %tone.primary_tone,
            ?suggested_actions,
            "Decision complete"
        );

        let suggested_reply = if suggested_actions.iter().any(|a| a.triggers_reply()) {
            let staged = self
                .reply
                .generate(
                    &parsed,
                    &classification.category,
                    &tone.primary_tone,
                    &summary.summary,
                    &summary.action_items,
                )
                .await?;
            provenance.push(StageProvenance::new("reply", staged.tier));
            Some(staged.value)
        } else {
            debug!("No reply-trigger action, skipping reply stage");
            None
        };

        Ok(AnalysisRecord {
            message: parsed,
            category: classification.category,
            classification_confidence: classification.confidence,
            classification_reasoning: classification.reasoning,
            summary: summary.summary,
            key_points: summary.key_points,
            action_items: summary.action_items,
            importance_score: importance.score,
            is_important: importance.is_important,
            importance_level: importance.level,
            importance_reasons: importance.reasons,
            tone: tone.primary_tone,
            formality: tone.formality,
            suggested_actions,
            suggested_reply,
            provenance,
            analyzed_at: Utc::now(),
        })
    }

    /// Analyze a batch of messages independently.
    ///
    /// One failing message does not stop the rest; every outcome is returned
    /// in input order.
    pub async fn analyze_batch(
        &self,
        raws: &[RawMessage],
    ) -> Vec<Result<AnalysisRecord, PipelineError>> {
        let count = raws.len();
        info!(count, "Analyzing message batch");

        let mut results = Vec::with_capacity(count);
        for raw in raws {
            let result = self.analyze(raw).await;
            if let Err(e) = &result {
                error!(error = %e, "Failed to analyze message in batch");
            }
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        info!(succeeded, total = count, "Batch analysis complete");
        results
    }
}
