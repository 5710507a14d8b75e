//! Shared types for the message analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Inbound message ─────────────────────────────────────────────────

/// Raw inbound message, exactly as submitted.
///
/// Immutable once received. The parser turns this into a [`ParsedMessage`];
/// nothing downstream reads the raw form again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Free-text sender, e.g. `"Alice Tran <alice@company.com>"` or a bare address.
    pub sender: String,
    /// Subject line (may be empty).
    #[serde(default)]
    pub subject: String,
    /// Body content (may be empty).
    #[serde(default)]
    pub body: String,
    /// When the message was received, if known.
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    /// Whether the message carried attachments.
    #[serde(default)]
    pub has_attachments: bool,
}

/// Sender split into display name and address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub display_name: String,
    pub address: String,
}

/// Lightweight metadata extracted from the body by regex/substring checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyMetadata {
    pub has_links: bool,
    pub has_phone: bool,
    pub word_count: usize,
    pub has_question: bool,
}

/// Normalized message produced by the parser, owned by one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub sender: Sender,
    /// Subject with any leading reply/forward marker stripped.
    pub subject: String,
    /// Body with whitespace collapsed and the signature block removed.
    pub body: String,
    pub metadata: BodyMetadata,
    pub received_at: Option<DateTime<Utc>>,
    pub has_attachments: bool,
}

// ── Stage results ───────────────────────────────────────────────────

/// Category classification for one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    /// Self-reported by the AI tier, or `matches × 0.2` from the fallback.
    pub confidence: f64,
    pub reasoning: String,
}

/// Formality register of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    Formal,
    Casual,
    Neutral,
}

impl Formality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Formal => "formal",
            Self::Casual => "casual",
            Self::Neutral => "neutral",
        }
    }
}

/// Tone analysis for one message. Never fails — defaults to neutral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneResult {
    /// Chosen by fixed priority: urgent, apologetic, grateful, inquisitive,
    /// friendly, concerned, then the formality value.
    pub primary_tone: String,
    pub formality: Formality,
    /// All detected tone flags. Order carries no meaning.
    pub all_tones: Vec<String>,
    pub confidence: f64,
}

impl ToneResult {
    pub fn has_tone(&self, tone: &str) -> bool {
        self.all_tones.iter().any(|t| t == tone)
    }
}

/// Importance band for a scored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportanceLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ImportanceLevel {
    /// Band boundaries: Critical ≥ 70, High ≥ 50, Medium ≥ 30, else Low.
    pub fn from_score(score: u32) -> Self {
        if score >= 70 {
            Self::Critical
        } else if score >= 50 {
            Self::High
        } else if score >= 30 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }
}

/// Importance score with the factors that contributed to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceResult {
    /// Sum of five independently capped factors; natural ceiling 100.
    pub score: u32,
    /// `score >= 50`.
    pub is_important: bool,
    pub level: ImportanceLevel,
    /// Factors that contributed > 0, in evaluation order.
    pub reasons: Vec<String>,
}

/// Summary of one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
}

/// Recommended handling action for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Delete,
    Unsubscribe,
    Highlight,
    PriorityInbox,
    ReplyAsap,
    Flag,
    NeedsReply,
    Track,
    CalendarReminder,
    Archive,
    MarkAsRead,
    ReadLater,
    Review,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Unsubscribe => "unsubscribe",
            Self::Highlight => "highlight",
            Self::PriorityInbox => "priority_inbox",
            Self::ReplyAsap => "reply_asap",
            Self::Flag => "flag",
            Self::NeedsReply => "needs_reply",
            Self::Track => "track",
            Self::CalendarReminder => "calendar_reminder",
            Self::Archive => "archive",
            Self::MarkAsRead => "mark_as_read",
            Self::ReadLater => "read_later",
            Self::Review => "review",
        }
    }

    /// Actions that cause the reply stage to run.
    pub fn triggers_reply(&self) -> bool {
        matches!(self, Self::NeedsReply | Self::ReplyAsap)
    }
}

/// Draft replies at three lengths, plus a reply subject line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyBundle {
    pub brief: String,
    pub standard: String,
    pub detailed: String,
    pub subject: String,
}

// ── Provenance ──────────────────────────────────────────────────────

/// Which execution tier produced a stage's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Generative service answered and the answer was usable.
    Ai,
    /// Deterministic fallback logic ran instead.
    Fallback,
}

/// Provenance marker for one AI-assisted stage of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageProvenance {
    pub stage: String,
    pub tier: Tier,
}

impl StageProvenance {
    pub fn new(stage: &str, tier: Tier) -> Self {
        Self {
            stage: stage.to_string(),
            tier,
        }
    }
}

/// A stage result tagged with the tier that produced it.
#[derive(Debug, Clone)]
pub struct Staged<T> {
    pub value: T,
    pub tier: Tier,
}

impl<T> Staged<T> {
    pub fn ai(value: T) -> Self {
        Self {
            value,
            tier: Tier::Ai,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            tier: Tier::Fallback,
        }
    }
}

// ── Final record ────────────────────────────────────────────────────

/// Complete analysis for one message — the pipeline's terminal output.
///
/// Handed to the persistence collaborator as a value; the pipeline keeps
/// no reference to it after the run completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub message: ParsedMessage,
    pub category: String,
    pub classification_confidence: f64,
    pub classification_reasoning: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
    pub importance_score: u32,
    pub is_important: bool,
    pub importance_level: ImportanceLevel,
    pub importance_reasons: Vec<String>,
    pub tone: String,
    pub formality: Formality,
    pub suggested_actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_reply: Option<ReplyBundle>,
    /// Per-stage tier markers for the AI-assisted stages that ran.
    pub provenance: Vec<StageProvenance>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// True if any stage of the run fell back to deterministic logic.
    pub fn is_degraded(&self) -> bool {
        self.provenance.iter().any(|p| p.tier == Tier::Fallback)
    }
}
