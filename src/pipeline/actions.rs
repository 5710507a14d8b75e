//! Action decision engine — pure rule table over category, importance, tone.
//!
//! No external calls and no failure mode. Rules are evaluated in a fixed
//! order and append their actions; only the Spam rule short-circuits.

use crate::pipeline::types::{Action, ImportanceResult, ToneResult};

/// Work messages above this score also get a calendar reminder.
const CALENDAR_REMINDER_SCORE: u32 = 30;

/// Decide the recommended actions for a message.
///
/// The returned set is ordered by rule evaluation and never empty.
pub fn decide(category: &str, importance: &ImportanceResult, tone: &ToneResult) -> Vec<Action> {
    // Spam is terminal — nothing else applies.
    if category == "Spam" {
        return vec![Action::Delete, Action::Unsubscribe];
    }

    let mut actions = Vec::new();

    if importance.is_important {
        actions.push(Action::Highlight);
        actions.push(Action::PriorityInbox);
    }

    if tone.has_tone("urgent") {
        actions.push(Action::ReplyAsap);
        actions.push(Action::Flag);
    }

    if tone.has_tone("inquisitive") {
        actions.push(Action::NeedsReply);
    }

    if category == "Work" {
        actions.push(Action::Track);
        if importance.score > CALENDAR_REMINDER_SCORE {
            actions.push(Action::CalendarReminder);
        }
    }

    if category == "Financial" {
        actions.push(Action::Archive);
        actions.push(Action::MarkAsRead);
    }

    if category == "Newsletter" {
        actions.push(Action::ReadLater);
        actions.push(Action::Archive);
    }

    if actions.is_empty() {
        actions.push(Action::Review);
    }

    actions
}
