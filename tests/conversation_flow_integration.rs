//! Integration tests for complete follow-up calls.
//!
//! These tests drive `ConversationFlow` through the public API the way a
//! host would:
//! 1. Load the shipped dialogue script from disk
//! 2. Begin a session and exchange messages
//! 3. Inspect status and the exported summary
//! 4. Archive through a summary sink
//!
//! The text generator is the scripted mock, so no external service is needed.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stroke_navigator::adapters::{InMemorySummarySink, JsonFileSummarySink, MockTextGenerator};
use stroke_navigator::application::{ConversationFlow, FlowSettings};
use stroke_navigator::domain::conversation::{ConversationState, EventKind, SessionSummary};
use stroke_navigator::domain::dialogue::{DialogueDefinition, DialogueLoader};
use stroke_navigator::ports::{
    GenerationError, GenerationRequest, SinkError, SummarySink, TextGenerator,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn standard_definition() -> Arc<DialogueDefinition> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/dialogues/stroke_followup.yml");
    Arc::new(DialogueLoader::load_file(path).expect("shipped dialogue loads"))
}

fn new_flow() -> ConversationFlow {
    ConversationFlow::new(standard_definition(), FlowSettings::default())
}

const FULL_RUN_ANSWERS: [&str; 8] = [
    "yes",
    "It's when a clot blocks blood flow to the brain",
    "Tired, but a little better every day",
    "I picked up all my prescriptions",
    "My neurologist appointment is next week",
    "I've cut back on salt and I walk daily",
    "My son does the grocery shopping for me",
    "I'd call my care coordinator",
];

/// Generator that counts calls and always fails.
struct BrokenGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for BrokenGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::failed("model crashed"))
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn emergency_mid_assessment_ends_call_with_warning_signs() {
    let mut flow = new_flow();

    let greeting = flow.begin("Jane", "Ms.", "Org", "Site").await;
    assert_eq!(flow.current_state(), ConversationState::Greeting);
    assert!(greeting.contains("Jane"));

    flow.submit("hello").await;
    assert_eq!(flow.current_state(), ConversationState::Consent);

    flow.submit("yes").await;
    assert_eq!(flow.current_state(), ConversationState::KnowledgeCheck);

    flow.submit("I understand strokes").await;
    assert_eq!(flow.current_state(), ConversationState::GeneralWellbeing);

    let text = flow.submit("I have chest pain").await;
    let status = flow.status();

    assert!(status.emergency_detected);
    assert_eq!(status.state, ConversationState::EmergencyExit);
    assert!(!status.is_active);

    let definition = flow.definition();
    let mut expected = format!(
        "{}\n\nStroke warning signs to watch for:",
        definition.emergency_disclaimer()
    );
    for sign in definition.warning_signs() {
        expected.push_str("\n- ");
        expected.push_str(sign);
    }
    assert_eq!(text, expected);
}

#[tokio::test]
async fn declining_consent_skips_the_assessment() {
    let mut flow = new_flow();
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    flow.submit("no").await;

    assert_eq!(flow.current_state(), ConversationState::EmergencyExit);
    assert_eq!(
        flow.history(),
        &[
            ConversationState::Greeting,
            ConversationState::Consent,
            ConversationState::EmergencyExit,
        ]
    );
    assert!(!flow.status().emergency_detected);
}

#[tokio::test]
async fn full_run_exports_answers_in_order() {
    let mut flow = new_flow();
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    for answer in FULL_RUN_ANSWERS {
        flow.submit(answer).await;
    }
    assert_eq!(flow.current_state(), ConversationState::Wrapup);

    let wrapup = flow.submit("Thank you").await;
    assert_eq!(flow.current_state(), ConversationState::Completed);
    assert!(!wrapup.is_empty());

    let summary = flow.export_summary();
    let keys: Vec<&str> = summary.responses.iter().map(|r| r.question.as_str()).collect();
    assert_eq!(
        keys,
        [
            "consent",
            "know_ischemic",
            "general_feeling",
            "meds_pickup",
            "fup_scheduled",
            "lifestyle_adherence",
            "adl_support",
            "who_to_call",
        ]
    );
    assert_eq!(summary.responses[3].response, FULL_RUN_ANSWERS[3]);
    assert_eq!(summary.state_history.first(), Some(&ConversationState::Greeting));
    assert_eq!(summary.state_history.last(), Some(&ConversationState::Completed));
    assert_eq!(summary.state_history.len(), 11);
    assert!(summary.completed);
    assert!(summary.data_issues.is_empty());
}

#[tokio::test]
async fn wrapup_is_personalized() {
    let mut flow = new_flow();
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    let mut last = String::new();
    for answer in FULL_RUN_ANSWERS {
        last = flow.submit(answer).await;
    }
    assert!(last.contains("Thank you, Jane for taking the time"));
}

#[tokio::test]
async fn status_and_summary_are_stable_between_turns() {
    let mut flow = new_flow();
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    flow.submit("yes").await;

    let status = flow.status();
    let summary = flow.export_summary();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    assert_eq!(flow.status(), status);
    assert_eq!(flow.export_summary(), summary);
    assert_eq!(flow.export_summary().to_json().unwrap(), summary.to_json().unwrap());
}

#[tokio::test]
async fn emergency_summary_reports_issue_and_event() {
    let mut flow = new_flow();
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    flow.submit("yes").await;
    flow.submit("I can't speak properly").await;

    let summary = flow.export_summary();
    assert!(summary.emergency_detected);
    assert_eq!(summary.final_state, ConversationState::EmergencyExit);
    assert!(summary
        .data_issues
        .contains(&"Conversation ended due to emergency detection".to_string()));

    let kinds: Vec<EventKind> = summary.events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds[0], EventKind::SessionStarted);
    assert!(kinds.contains(&EventKind::EmergencyDetected));
}

#[tokio::test]
async fn extra_keywords_from_settings_are_honored() {
    let settings = FlowSettings {
        extra_emergency_keywords: vec!["fainted".to_string()],
        ..FlowSettings::default()
    };
    let mut flow = ConversationFlow::new(standard_definition(), settings);
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    flow.submit("yes").await;
    flow.submit("I fainted this morning").await;

    assert_eq!(flow.current_state(), ConversationState::EmergencyExit);
}

#[tokio::test]
async fn reset_allows_a_fresh_session() {
    let mut flow = new_flow();
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    flow.submit("emergency").await;
    let first_id = flow.context().session_id();

    flow.reset();
    assert_eq!(flow.current_state(), ConversationState::Idle);
    assert!(!flow.status().emergency_detected);

    flow.begin("John", "Mr.", "Org", "Site").await;
    assert_ne!(flow.context().session_id(), first_id);
    assert_eq!(flow.status().responses_count, 0);
    assert_eq!(flow.current_state(), ConversationState::Greeting);
}

// =============================================================================
// Generator collaborator
// =============================================================================

#[tokio::test]
async fn failing_generator_never_reaches_the_patient() {
    let generator = Arc::new(BrokenGenerator {
        calls: AtomicUsize::new(0),
    });
    let mut flow = new_flow().with_generator(generator.clone());

    let greeting = flow.begin("Jane", "Ms.", "Org", "Site").await;
    let consent = flow.submit("hello").await;

    assert!(greeting.contains("Ms. Jane"));
    assert!(consent.contains("Is it okay to continue?"));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);

    let fallbacks = flow
        .events()
        .iter()
        .filter(|e| e.kind == EventKind::GeneratorFallback)
        .count();
    assert_eq!(fallbacks, 2);
}

#[tokio::test]
async fn generator_sees_state_and_context() {
    let mock = Arc::new(MockTextGenerator::new());
    let mut flow = new_flow().with_generator(mock.clone());
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    flow.submit("yes").await;

    let calls = mock.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].state, ConversationState::Greeting);
    assert_eq!(calls[2].state, ConversationState::KnowledgeCheck);
    assert_eq!(calls[2].context.answer("consent"), Some("yes"));
    assert!(calls[2].system_prompt.contains("PennState Health"));
}

// =============================================================================
// Summary sinks
// =============================================================================

struct RejectingSink;

#[async_trait]
impl SummarySink for RejectingSink {
    async fn store(&self, _summary: &SessionSummary) -> Result<(), SinkError> {
        Err(SinkError::Rejected("read-only".to_string()))
    }
}

#[tokio::test]
async fn archive_to_memory() {
    let sink = Arc::new(InMemorySummarySink::new());
    let mut flow = new_flow().with_sink(sink.clone());
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    flow.submit("yes").await;

    let archived = flow.archive().await.unwrap();
    let stored = sink.summaries().await;
    assert_eq!(stored, vec![archived]);
    assert_eq!(stored[0].responses.len(), 1);
}

#[tokio::test]
async fn archive_errors_are_returned() {
    let mut flow = new_flow().with_sink(Arc::new(RejectingSink));
    flow.begin("Jane", "Ms.", "Org", "Site").await;

    let err = flow.archive().await.unwrap_err();
    assert_eq!(err, SinkError::Rejected("read-only".to_string()));

    let failing = new_flow().with_sink(Arc::new(InMemorySummarySink::failing("disk full")));
    assert!(matches!(failing.archive().await, Err(SinkError::Unavailable(_))));
}

#[tokio::test]
async fn archive_to_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(JsonFileSummarySink::new(dir.path().join("summaries")));
    let mut flow = new_flow().with_sink(sink.clone());
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    flow.submit("yes").await;

    let summary = flow.archive().await.unwrap();
    let path = sink.summary_path(summary.session_id);
    let written = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();

    assert_eq!(value["patient_name"], "Jane");
    assert_eq!(value["final_state"], "knowledge_check");
    assert_eq!(value["responses"][0]["question"], "consent");

    let leftovers: Vec<_> = std::fs::read_dir(sink.base_path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn csv_export_matches_answers() {
    let mut flow = new_flow();
    flow.begin("Jane", "Ms.", "Org", "Site").await;
    flow.submit("hello").await;
    flow.submit("yes").await;
    flow.submit("a clot, I think").await;

    let csv = flow.export_summary().to_csv().unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        [
            "question,response,section",
            "consent,yes,introduction",
            "know_ischemic,\"a clot, I think\",knowledge",
        ]
    );
}
