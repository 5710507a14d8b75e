//! Message parser — normalizes raw input into a [`ParsedMessage`].
//!
//! Purely deterministic: sender splitting, subject/body cleanup, and
//! regex/substring metadata extraction. The only failure mode is a message
//! with neither subject nor body, which is a validation error — the pipeline
//! never starts for such input.

use regex::Regex;

use crate::error::PipelineError;
use crate::pipeline::types::{BodyMetadata, ParsedMessage, RawMessage, Sender};

/// Deterministic parser for inbound messages.
pub struct MessageParser {
    addr_spec: Regex,
    subject_prefix: Regex,
    signature: Regex,
    link: Regex,
    phone: Regex,
}

impl MessageParser {
    pub fn new() -> Self {
        Self {
            // "Display Name <addr@host>" — display part may be quoted.
            addr_spec: Regex::new(r#"^"?([^"<>]*)"?\s*<([^<>]+)>$"#).unwrap(),
            subject_prefix: Regex::new(r"(?i)^(re:|fwd:|fw:)\s*").unwrap(),
            // Two or more dashes start a signature block; drop the rest.
            signature: Regex::new(r"(?s)-{2,}.*$").unwrap(),
            link: Regex::new(r"https?://").unwrap(),
            phone: Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").unwrap(),
        }
    }

    /// Parse a raw message into its normalized form.
    ///
    /// Fails with a validation error when both subject and body are empty;
    /// everything else always parses.
    pub fn parse(&self, raw: &RawMessage) -> Result<ParsedMessage, PipelineError> {
        if raw.subject.is_empty() && raw.body.is_empty() {
            return Err(PipelineError::Validation(
                "message must have at least a subject or a body".into(),
            ));
        }

        Ok(ParsedMessage {
            sender: self.parse_sender(&raw.sender),
            subject: self.clean_subject(&raw.subject),
            body: self.clean_body(&raw.body),
            metadata: self.extract_metadata(&raw.body),
            received_at: raw.received_at,
            has_attachments: raw.has_attachments,
        })
    }

    /// Split a free-text sender into display name and address.
    ///
    /// With no display part, the name is derived from the local part of the
    /// address. An unparseable sender keeps the raw string as the address.
    fn parse_sender(&self, raw: &str) -> Sender {
        let trimmed = raw.trim();

        if let Some(caps) = self.addr_spec.captures(trimmed) {
            let name = caps[1].trim().to_string();
            let address = caps[2].trim().to_string();
            let display_name = if name.is_empty() {
                local_part(&address)
            } else {
                name
            };
            return Sender {
                display_name,
                address,
            };
        }

        if trimmed.is_empty() {
            return Sender {
                display_name: "Unknown".into(),
                address: String::new(),
            };
        }

        // Bare address (or arbitrary text) — retained verbatim.
        Sender {
            display_name: local_part(trimmed),
            address: trimmed.to_string(),
        }
    }

    /// Strip a leading reply/forward marker and surrounding whitespace.
    fn clean_subject(&self, subject: &str) -> String {
        self.subject_prefix.replace(subject, "").trim().to_string()
    }

    /// Collapse whitespace runs and truncate at the signature delimiter.
    fn clean_body(&self, body: &str) -> String {
        let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
        self.signature.replace(&collapsed, "").trim().to_string()
    }

    /// Regex/substring metadata over the raw body.
    fn extract_metadata(&self, body: &str) -> BodyMetadata {
        BodyMetadata {
            has_links: self.link.is_match(body),
            has_phone: self.phone.is_match(body),
            word_count: body.split_whitespace().count(),
            has_question: body.contains('?'),
        }
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Substring before `@`, or the whole string when there is none.
fn local_part(address: &str) -> String {
    address
        .split('@')
        .next()
        .unwrap_or(address)
        .to_string()
}
