//! Importance scorer — five-factor weighted additive scoring.
//!
//! Each factor is computed independently and capped (30/25/20/15/10), so the
//! total has a natural ceiling of 100. Deterministic, total function: every
//! input gets a score.

use std::sync::Arc;

use crate::config::CategoryTable;
use crate::pipeline::types::{ImportanceLevel, ImportanceResult, ParsedMessage};

const AUTHORITY_INDICATORS: &[&str] =
    &["boss", "ceo", "manager", "director", "urgent", "important"];

const ORG_DOMAINS: &[&str] = &[".edu", ".gov", ".org"];

const HIGH_PRIORITY_SUBJECT: &[&str] =
    &["urgent", "important", "asap", "critical", "action required"];

const MEDIUM_PRIORITY_SUBJECT: &[&str] = &["meeting", "deadline", "response needed", "reminder"];

const URGENT_BODY: &[&str] = &["urgent", "asap", "immediately"];

/// Threshold below which a message counts as important.
const IMPORTANT_THRESHOLD: u32 = 50;

/// Word count under which a body reads as a quick note.
const SHORT_BODY_WORDS: usize = 50;

/// Weighted additive importance scorer.
pub struct ImportanceScorer {
    categories: Arc<CategoryTable>,
}

impl ImportanceScorer {
    pub fn new(categories: Arc<CategoryTable>) -> Self {
        Self { categories }
    }

    /// Score a parsed message given its category.
    pub fn score(&self, msg: &ParsedMessage, category: &str) -> ImportanceResult {
        let mut score = 0;
        let mut reasons = Vec::new();

        let mut add = |points: u32, reason: String| {
            score += points;
            if points > 0 {
                reasons.push(reason);
            }
        };

        let category_points = self.categories.weight_for(category);
        add(
            category_points,
            format!("Category '{category}' adds {category_points} points"),
        );

        let sender_points = score_sender(msg);
        add(
            sender_points,
            format!("Sender importance adds {sender_points} points"),
        );

        let subject_points = score_subject(&msg.subject);
        add(
            subject_points,
            format!("Subject keywords add {subject_points} points"),
        );

        let body_points = score_body(&msg.body);
        add(
            body_points,
            format!("Body content adds {body_points} points"),
        );

        let metadata_points = score_metadata(msg);
        add(
            metadata_points,
            format!("Message metadata adds {metadata_points} points"),
        );

        ImportanceResult {
            score,
            is_important: score >= IMPORTANT_THRESHOLD,
            level: ImportanceLevel::from_score(score),
            reasons,
        }
    }
}

/// Sender factor (0–25), checks in priority order: authority keyword,
/// organizational domain, no-reply marker, default.
fn score_sender(msg: &ParsedMessage) -> u32 {
    let name = msg.sender.display_name.to_lowercase();
    let address = msg.sender.address.to_lowercase();

    if AUTHORITY_INDICATORS
        .iter()
        .any(|k| name.contains(k) || address.contains(k))
    {
        return 25;
    }
    if ORG_DOMAINS.iter().any(|d| address.contains(d)) {
        return 15;
    }
    if address.contains("noreply") || address.contains("no-reply") {
        return 0;
    }
    10
}

/// Subject factor (0–20).
fn score_subject(subject: &str) -> u32 {
    let lower = subject.to_lowercase();
    if HIGH_PRIORITY_SUBJECT.iter().any(|k| lower.contains(k)) {
        return 20;
    }
    if MEDIUM_PRIORITY_SUBJECT.iter().any(|k| lower.contains(k)) {
        return 15;
    }
    if subject.contains('?') {
        return 10;
    }
    5
}

/// Body factor (0–15).
fn score_body(body: &str) -> u32 {
    let lower = body.to_lowercase();
    if URGENT_BODY.iter().any(|k| lower.contains(k)) {
        return 15;
    }
    if body.contains('?') {
        return 10;
    }
    if body.split_whitespace().count() < SHORT_BODY_WORDS {
        return 8;
    }
    5
}

/// Metadata factor (0–10), additive over independent signals.
fn score_metadata(msg: &ParsedMessage) -> u32 {
    let mut points = 0;
    if msg.metadata.has_question {
        points += 5;
    }
    if msg.metadata.has_phone {
        points += 3;
    }
    if msg.metadata.word_count < SHORT_BODY_WORDS {
        points += 2;
    }
    points
}
