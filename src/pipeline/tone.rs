//! Tone analyzer — keyword-driven tone and formality detection.
//!
//! Entirely deterministic. Always returns a result; a message with no
//! matching indicators comes back neutral.

use crate::pipeline::types::{Formality, ToneResult};

const FORMAL_INDICATORS: &[&str] = &[
    "dear sir",
    "dear madam",
    "to whom it may concern",
    "sincerely",
    "respectfully",
    "regards",
    "kindly",
    "hereby",
    "pursuant",
];

const CASUAL_INDICATORS: &[&str] = &[
    "hey", "hi there", "thanks", "cheers", "cool", "awesome", "gonna", "wanna",
];

const URGENT_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "immediately",
    "critical",
    "emergency",
    "important",
    "time-sensitive",
    "action required",
    "respond now",
];

const POSITIVE_WORDS: &[&str] = &[
    "thank",
    "great",
    "excellent",
    "wonderful",
    "appreciate",
    "happy",
    "pleased",
    "glad",
];

const NEGATIVE_WORDS: &[&str] = &[
    "sorry",
    "unfortunately",
    "disappointed",
    "concerned",
    "problem",
    "issue",
    "mistake",
    "error",
    "unhappy",
];

const GRATITUDE_WORDS: &[&str] = &["thank", "appreciate", "grateful", "thanks"];

const APOLOGY_WORDS: &[&str] = &["sorry", "apologize", "apologies", "regret"];

const QUESTION_INDICATORS: &[&str] = &[
    "?",
    "could you",
    "would you",
    "can you",
    "please let me know",
];

/// Keyword/pattern tone classifier.
pub struct ToneAnalyzer;

impl ToneAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze the tone of a message from its subject and body.
    pub fn analyze(&self, subject: &str, body: &str) -> ToneResult {
        let text = format!("{subject} {body}").to_lowercase();

        let formality = detect_formality(&text);

        let mut all_tones = Vec::new();
        if contains_any(&text, URGENT_KEYWORDS) {
            all_tones.push("urgent".to_string());
        }
        if let Some(sentiment) = detect_sentiment(&text) {
            all_tones.push(sentiment.to_string());
        }
        if contains_any(&text, GRATITUDE_WORDS) {
            all_tones.push("grateful".to_string());
        }
        if contains_any(&text, APOLOGY_WORDS) {
            all_tones.push("apologetic".to_string());
        }
        if contains_any(&text, QUESTION_INDICATORS) {
            all_tones.push("inquisitive".to_string());
        }

        let primary_tone = primary_tone(formality, &all_tones);

        ToneResult {
            primary_tone,
            formality,
            all_tones,
            confidence: 0.8,
        }
    }
}

impl Default for ToneAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn count_matches(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| text.contains(*k)).count()
}

/// Formal vs casual indicator counts; ties are neutral.
fn detect_formality(text: &str) -> Formality {
    let formal = count_matches(text, FORMAL_INDICATORS);
    let casual = count_matches(text, CASUAL_INDICATORS);
    if formal > casual {
        Formality::Formal
    } else if casual > formal {
        Formality::Casual
    } else {
        Formality::Neutral
    }
}

/// A strict majority of positive or negative words yields a sentiment label.
fn detect_sentiment(text: &str) -> Option<&'static str> {
    let positive = count_matches(text, POSITIVE_WORDS);
    let negative = count_matches(text, NEGATIVE_WORDS);
    if positive > negative && positive > 0 {
        Some("positive")
    } else if negative > positive && negative > 0 {
        Some("negative")
    } else {
        None
    }
}

/// Fixed priority order; first match wins, formality is the final default.
fn primary_tone(formality: Formality, tones: &[String]) -> String {
    let has = |t: &str| tones.iter().any(|tone| tone == t);
    if has("urgent") {
        "urgent".into()
    } else if has("apologetic") {
        "apologetic".into()
    } else if has("grateful") {
        "grateful".into()
    } else if has("inquisitive") {
        "inquisitive".into()
    } else if has("positive") {
        "friendly".into()
    } else if has("negative") {
        "concerned".into()
    } else {
        formality.as_str().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_neutral() {
        let tone = ToneAnalyzer::new().analyze("Status update", "The report is attached.");
        assert_eq!(tone.primary_tone, "neutral");
        assert_eq!(tone.formality, Formality::Neutral);
        assert!(tone.all_tones.is_empty());
    }

    #[test]
    fn urgent_beats_everything() {
        let tone = ToneAnalyzer::new().analyze(
            "URGENT request",
            "Thanks so much, could you send it today?",
        );
        assert!(tone.has_tone("urgent"));
        assert!(tone.has_tone("grateful"));
        assert!(tone.has_tone("inquisitive"));
        assert_eq!(tone.primary_tone, "urgent");
    }

    #[test]
    fn apologetic_beats_grateful() {
        let tone = ToneAnalyzer::new().analyze("", "Sorry for the delay, and thank you!");
        assert!(tone.has_tone("apologetic"));
        assert!(tone.has_tone("grateful"));
        assert_eq!(tone.primary_tone, "apologetic");
    }

    #[test]
    fn grateful_beats_inquisitive() {
        let tone = ToneAnalyzer::new().analyze("", "Thanks a lot! Could you confirm the time?");
        assert!(tone.has_tone("grateful"));
        assert!(tone.has_tone("inquisitive"));
        assert_eq!(tone.primary_tone, "grateful");
    }

    #[test]
    fn positive_majority_reads_friendly() {
        let tone = ToneAnalyzer::new().analyze("", "What a great and wonderful release, so pleased.");
        assert!(tone.has_tone("positive"));
        assert_eq!(tone.primary_tone, "friendly");
    }

    #[test]
    fn negative_majority_reads_concerned() {
        let tone = ToneAnalyzer::new().analyze("", "There is a problem and an error in the invoice.");
        assert!(tone.has_tone("negative"));
        assert_eq!(tone.primary_tone, "concerned");
    }

    #[test]
    fn balanced_sentiment_emits_nothing() {
        // One positive ("great") and one negative ("problem") — no majority.
        let tone = ToneAnalyzer::new().analyze("", "A great fix for the problem.");
        assert!(!tone.has_tone("positive"));
        assert!(!tone.has_tone("negative"));
    }

    #[test]
    fn question_mark_alone_is_inquisitive() {
        let tone = ToneAnalyzer::new().analyze("", "Will you be there tomorrow?");
        assert!(tone.has_tone("inquisitive"));
        assert_eq!(tone.primary_tone, "inquisitive");
    }

    #[test]
    fn formality_detection() {
        let formal = ToneAnalyzer::new().analyze("", "Dear Sir, I hereby submit my report. Sincerely.");
        assert_eq!(formal.formality, Formality::Formal);

        let casual = ToneAnalyzer::new().analyze("", "hey, that demo was awesome, cheers");
        assert_eq!(casual.formality, Formality::Casual);
    }

    #[test]
    fn formality_is_primary_when_no_tones_fire() {
        let tone = ToneAnalyzer::new().analyze("", "Dear Madam, please find the contract enclosed. Respectfully.");
        assert_eq!(tone.primary_tone, "formal");
    }

    #[test]
    fn subject_contributes_to_detection() {
        let tone = ToneAnalyzer::new().analyze("Action required", "All details below.");
        assert!(tone.has_tone("urgent"));
    }
}
