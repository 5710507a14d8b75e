//! End-to-end pipeline scenarios against the public API.

use std::sync::Arc;

use async_trait::async_trait;

use mail_insight::config::{CategoryTable, ReplyTemplates};
use mail_insight::error::{PipelineError, ServiceError};
use mail_insight::llm::TextService;
use mail_insight::pipeline::types::{Action, ImportanceLevel, RawMessage, Tier};
use mail_insight::pipeline::AnalysisPipeline;
use mail_insight::store::{Database, LibSqlBackend, RecordFilter};

/// Scripted generative service, routed on the system instruction of each
/// stage prompt.
struct ScriptedService {
    classify: Answer,
    summarize: Answer,
    reply: Answer,
}

#[derive(Clone)]
enum Answer {
    Json(&'static str),
    Garbage,
    Unavailable,
}

#[async_trait]
impl TextService for ScriptedService {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        _prompt: &str,
        system_instruction: &str,
        _temperature: f32,
    ) -> Result<String, ServiceError> {
        let answer = if system_instruction.contains("classification expert") {
            &self.classify
        } else if system_instruction.contains("summarizer") {
            &self.summarize
        } else {
            &self.reply
        };
        match answer {
            Answer::Json(text) => Ok(text.to_string()),
            Answer::Garbage => Ok("I'm not sure how to answer that.".to_string()),
            Answer::Unavailable => Err(ServiceError::Unavailable {
                reason: "connection reset".into(),
            }),
        }
    }
}

fn pipeline(service: ScriptedService) -> AnalysisPipeline {
    AnalysisPipeline::new(
        Arc::new(service),
        Arc::new(CategoryTable::default()),
        Arc::new(ReplyTemplates::default()),
    )
}

fn raw(sender: &str, subject: &str, body: &str) -> RawMessage {
    RawMessage {
        sender: sender.into(),
        subject: subject.into(),
        body: body.into(),
        received_at: None,
        has_attachments: false,
    }
}

fn all_ai() -> ScriptedService {
    ScriptedService {
        classify: Answer::Json(
            r#"{"category": "Work", "confidence": 0.95, "reasoning": "budget approval request from management"}"#,
        ),
        summarize: Answer::Json(
            r#"{"summary": "The Q4 budget needs approval before end of week.", "key_points": ["Q4 budget", "deadline Friday"], "action_items": ["approve budget"]}"#,
        ),
        reply: Answer::Json(
            r#"{"brief": "Approved, go ahead.", "standard": "The Q4 budget is approved; please circulate the final numbers.", "detailed": "The Q4 budget is approved. Please circulate the final numbers to the team and set up a short review call for Friday morning.", "subject_reply": "Re: Q4 Budget Approval"}"#,
        ),
    }
}

#[tokio::test]
async fn urgent_budget_message_is_critical_and_gets_a_reply() {
    let record = pipeline(all_ai())
        .analyze(&raw(
            "boss@company.com",
            "URGENT: Q4 Budget Approval Needed",
            "This is urgent. We need the budget approved ASAP, it is critical for the quarter.",
        ))
        .await
        .unwrap();

    assert_eq!(record.category, "Work");
    assert!(record.importance_score >= 70);
    assert_eq!(record.importance_level, ImportanceLevel::Critical);
    assert_eq!(record.tone, "urgent");
    assert!(record.suggested_actions.contains(&Action::ReplyAsap));
    assert!(record.suggested_actions.contains(&Action::Flag));

    let reply = record.suggested_reply.expect("reply stage should run");
    assert_eq!(reply.subject, "Re: Q4 Budget Approval");
    assert!(record.provenance.iter().all(|p| p.tier == Tier::Ai));
}

#[tokio::test]
async fn newsletter_is_filed_without_a_reply() {
    let service = ScriptedService {
        classify: Answer::Garbage,
        summarize: Answer::Garbage,
        reply: Answer::Garbage,
    };
    let record = pipeline(service)
        .analyze(&raw(
            "newsletter@techcrunch.com",
            "TechCrunch Daily: Top tech news",
            "All of today's top stories in one place. Unsubscribe anytime.",
        ))
        .await
        .unwrap();

    assert_eq!(record.category, "Newsletter");
    assert!(record.suggested_actions.contains(&Action::ReadLater));
    assert!(record.suggested_actions.contains(&Action::Archive));
    assert!(record.suggested_reply.is_none());
    assert!(record.provenance.iter().all(|p| p.stage != "reply"));
}

#[tokio::test]
async fn empty_message_aborts_with_validation_error() {
    let err = pipeline(all_ai())
        .analyze(&raw("someone@example.com", "", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[tokio::test]
async fn non_json_classification_degrades_but_completes() {
    let service = ScriptedService {
        classify: Answer::Garbage,
        summarize: Answer::Json(
            r#"{"summary": "Meeting proposal for Tuesday.", "key_points": ["Tuesday"], "action_items": []}"#,
        ),
        reply: Answer::Json(
            r#"{"brief": "Tuesday works.", "standard": "Tuesday works for me, let's do 3pm.", "detailed": "Tuesday works for me. I suggest 3pm so we have the room; I'll send an invite.", "subject_reply": "Re: Meeting"}"#,
        ),
    };
    let record = pipeline(service)
        .analyze(&raw(
            "alice@company.com",
            "Meeting",
            "Can we meet Tuesday to go over the project?",
        ))
        .await
        .unwrap();

    // Keyword fallback still lands on a category and the run completes.
    assert_eq!(record.category, "Work");
    let classify = record
        .provenance
        .iter()
        .find(|p| p.stage == "classify")
        .expect("classify provenance present");
    assert_eq!(classify.tier, Tier::Fallback);
    assert!(record.is_degraded());

    // The question still drives a reply.
    assert!(record.suggested_actions.contains(&Action::NeedsReply));
    assert!(record.suggested_reply.is_some());
}

#[tokio::test]
async fn unavailable_service_aborts_the_run() {
    let service = ScriptedService {
        classify: Answer::Unavailable,
        summarize: Answer::Garbage,
        reply: Answer::Garbage,
    };
    let err = pipeline(service)
        .analyze(&raw("a@x.com", "Hello", "Anything at all"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Service(ServiceError::Unavailable { .. })
    ));
}

#[tokio::test]
async fn analyzed_records_round_trip_through_the_store() {
    let db = LibSqlBackend::new_memory().await.unwrap();
    let p = pipeline(all_ai());

    let record = p
        .analyze(&raw(
            "boss@company.com",
            "URGENT: Q4 Budget Approval Needed",
            "We need this urgently approved.",
        ))
        .await
        .unwrap();
    let id = db.insert_record("owner-1", &record).await.unwrap();

    let loaded = db.get_record(&id, "owner-1").await.unwrap().unwrap();
    assert_eq!(loaded.record.category, "Work");
    assert!(loaded.record.is_important);
    assert!(loaded.record.suggested_reply.is_some());

    let important = db
        .list_records(
            "owner-1",
            &RecordFilter {
                category: None,
                is_important: Some(true),
            },
        )
        .await
        .unwrap();
    assert_eq!(important.len(), 1);

    let stats = db.record_stats("owner-1").await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.important, 1);
    assert_eq!(stats.by_category.get("Work"), Some(&1));
}

#[tokio::test]
async fn batch_isolates_failures() {
    let p = pipeline(all_ai());
    let results = p
        .analyze_batch(&[
            raw("a@x.com", "", ""),
            raw("boss@company.com", "Budget", "Please approve the budget."),
        ])
        .await;

    assert_eq!(results.len(), 2);
    assert!(matches!(
        results[0].as_ref().unwrap_err(),
        PipelineError::Validation(_)
    ));
    assert_eq!(results[1].as_ref().unwrap().category, "Work");
}
