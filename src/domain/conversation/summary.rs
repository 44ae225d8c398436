//! Exported record of a session.
//!
//! A summary is a snapshot: building one never changes the session, and two
//! summaries taken without an intervening turn are equal.

use serde::Serialize;
use thiserror::Error;

use super::context::{SessionContext, TimeOfDay};
use super::state::ConversationState;
use crate::domain::dialogue::CONSENT_KEY;
use crate::domain::foundation::{SessionId, Timestamp};

pub const NOT_STARTED_ISSUE: &str = "Conversation has not been started";
pub const MISSING_CONSENT_ISSUE: &str = "Missing required response: consent";
pub const EMERGENCY_ISSUE: &str = "Conversation ended due to emergency detection";

/// What happened at a point in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    SessionStarted,
    PatientResponse,
    StateChanged,
    EmergencyDetected,
    GeneratorFallback,
    SessionReset,
}

/// One entry in the session's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationEvent {
    pub kind: EventKind,
    pub at: Timestamp,
    /// State current when the event was logged.
    pub state: ConversationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ConversationEvent {
    pub fn new(kind: EventKind, at: Timestamp, state: ConversationState) -> Self {
        Self {
            kind,
            at,
            state,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// One recorded answer with the section its question belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseEntry {
    pub question: String,
    pub response: String,
    pub section: Option<String>,
    pub recorded_at: Timestamp,
}

/// Structured record of a session for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub patient_name: String,
    pub honorific: String,
    pub time_of_day: TimeOfDay,
    pub organization: String,
    pub site: String,
    pub started_at: Timestamp,
    pub last_activity: Timestamp,
    pub duration_secs: i64,
    pub final_state: ConversationState,
    pub emergency_detected: bool,
    pub completed: bool,
    /// In answer order.
    pub responses: Vec<ResponseEntry>,
    pub state_history: Vec<ConversationState>,
    pub events: Vec<ConversationEvent>,
    /// Structural findings from the dialogue script.
    pub validation_issues: Vec<String>,
    /// Problems with the data collected in this session.
    pub data_issues: Vec<String>,
}

/// Failures while formatting a summary.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer could not be flushed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Serialize)]
struct CsvRow<'a> {
    question: &'a str,
    response: &'a str,
    section: &'a str,
}

impl SessionSummary {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One row per response under a `question,response,section` header.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.responses.is_empty() {
            writer.write_record(["question", "response", "section"])?;
        }
        for entry in &self.responses {
            writer.serialize(CsvRow {
                question: &entry.question,
                response: &entry.response,
                section: entry.section.as_deref().unwrap_or(""),
            })?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }

    pub fn has_data_issues(&self) -> bool {
        !self.data_issues.is_empty()
    }
}

/// Problems with what a session has collected so far.
pub fn session_data_issues(context: &SessionContext) -> Vec<String> {
    if !context.is_started() {
        return vec![NOT_STARTED_ISSUE.to_string()];
    }

    let mut issues = Vec::new();
    if context.answer(CONSENT_KEY).is_none() {
        issues.push(MISSING_CONSENT_ISSUE.to_string());
    }
    if context.emergency_detected() {
        issues.push(EMERGENCY_ISSUE.to_string());
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_with(responses: Vec<ResponseEntry>) -> SessionSummary {
        let started = Timestamp::now();
        SessionSummary {
            session_id: SessionId::new(),
            patient_name: "Jane".into(),
            honorific: "Ms.".into(),
            time_of_day: TimeOfDay::Morning,
            organization: "Org".into(),
            site: "Site".into(),
            started_at: started,
            last_activity: started.plus_secs(90),
            duration_secs: 90,
            final_state: ConversationState::Completed,
            emergency_detected: false,
            completed: true,
            responses,
            state_history: vec![ConversationState::Greeting, ConversationState::Completed],
            events: Vec::new(),
            validation_issues: Vec::new(),
            data_issues: Vec::new(),
        }
    }

    fn entry(question: &str, response: &str, section: Option<&str>) -> ResponseEntry {
        ResponseEntry {
            question: question.into(),
            response: response.into(),
            section: section.map(Into::into),
            recorded_at: Timestamp::now(),
        }
    }

    mod data_issues {
        use super::*;

        #[test]
        fn unstarted_session_reports_only_that() {
            let issues = session_data_issues(&SessionContext::unstarted());
            assert_eq!(issues, vec![NOT_STARTED_ISSUE.to_string()]);
        }

        #[test]
        fn started_without_consent() {
            let ctx = SessionContext::start("Jane", "Ms.", "Org", "Site");
            assert_eq!(session_data_issues(&ctx), vec![MISSING_CONSENT_ISSUE.to_string()]);
        }

        #[test]
        fn consent_given_is_clean() {
            let mut ctx = SessionContext::start("Jane", "Ms.", "Org", "Site");
            ctx.record_answer(CONSENT_KEY, "yes");
            assert!(session_data_issues(&ctx).is_empty());
        }

        #[test]
        fn emergency_is_reported() {
            let mut ctx = SessionContext::start("Jane", "Ms.", "Org", "Site");
            ctx.record_answer(CONSENT_KEY, "yes");
            ctx.mark_emergency();
            assert_eq!(session_data_issues(&ctx), vec![EMERGENCY_ISSUE.to_string()]);
        }
    }

    mod export {
        use super::*;

        #[test]
        fn csv_has_header_and_rows_in_order() {
            let summary = summary_with(vec![
                entry("consent", "yes", Some("introduction")),
                entry("general_feeling", "tired, but better", Some("general_wellbeing")),
            ]);
            let csv = summary.to_csv().unwrap();
            let lines: Vec<&str> = csv.lines().collect();

            assert_eq!(lines[0], "question,response,section");
            assert_eq!(lines[1], "consent,yes,introduction");
            assert_eq!(lines[2], "general_feeling,\"tired, but better\",general_wellbeing");
            assert_eq!(lines.len(), 3);
        }

        #[test]
        fn csv_without_responses_is_header_only() {
            let csv = summary_with(Vec::new()).to_csv().unwrap();
            assert_eq!(csv.trim_end(), "question,response,section");
        }

        #[test]
        fn json_uses_snake_case_states() {
            let json = summary_with(vec![entry("consent", "yes", None)]).to_json().unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();

            assert_eq!(value["final_state"], "completed");
            assert_eq!(value["state_history"][0], "greeting");
            assert_eq!(value["responses"][0]["question"], "consent");
            assert_eq!(value["duration_secs"], 90);
        }

        #[test]
        fn event_detail_is_omitted_when_absent() {
            let event = ConversationEvent::new(
                EventKind::SessionStarted,
                Timestamp::now(),
                ConversationState::Greeting,
            );
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["kind"], "session_started");
            assert!(json.get("detail").is_none());
        }
    }
}
