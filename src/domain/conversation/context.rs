//! Per-session context.
//!
//! Identity, timing and the answers recorded so far. The emergency flag is
//! monotonic: once raised it stays raised until the whole context is
//! replaced by a reset.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{SessionId, Timestamp};

/// Coarse time-of-day bucket used in the greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Buckets a wall-clock hour: [5,12) morning, [12,17) afternoon, else evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedAnswer {
    pub question_key: String,
    pub answer: String,
    pub recorded_at: Timestamp,
}

/// Mutable record of a single follow-up call.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    session_id: SessionId,
    started: bool,
    patient_name: String,
    honorific: String,
    time_of_day: TimeOfDay,
    organization: String,
    site: String,
    started_at: Timestamp,
    answers: Vec<RecordedAnswer>,
    emergency_detected: bool,
}

impl SessionContext {
    /// Opens a context for a new call, bucketing the current local hour.
    pub fn start(
        patient_name: impl Into<String>,
        honorific: impl Into<String>,
        organization: impl Into<String>,
        site: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self::start_at(
            now,
            TimeOfDay::from_hour(now.local_hour()),
            patient_name,
            honorific,
            organization,
            site,
        )
    }

    /// Opens a context with an explicit start time and bucket.
    pub fn start_at(
        started_at: Timestamp,
        time_of_day: TimeOfDay,
        patient_name: impl Into<String>,
        honorific: impl Into<String>,
        organization: impl Into<String>,
        site: impl Into<String>,
    ) -> Self {
        Self {
            session_id: SessionId::new(),
            started: true,
            patient_name: patient_name.into(),
            honorific: honorific.into(),
            time_of_day,
            organization: organization.into(),
            site: site.into(),
            started_at,
            answers: Vec::new(),
            emergency_detected: false,
        }
    }

    /// Placeholder context held by an idle machine.
    pub fn unstarted() -> Self {
        let now = Timestamp::now();
        Self {
            session_id: SessionId::new(),
            started: false,
            patient_name: String::new(),
            honorific: String::new(),
            time_of_day: TimeOfDay::from_hour(now.local_hour()),
            organization: String::new(),
            site: String::new(),
            started_at: now,
            answers: Vec::new(),
            emergency_detected: false,
        }
    }

    /// Records an answer. A repeated key keeps its original position.
    pub fn record_answer(&mut self, question_key: impl Into<String>, text: impl Into<String>) {
        let question_key = question_key.into();
        let answer = text.into();
        let recorded_at = Timestamp::now();

        match self.answers.iter_mut().find(|a| a.question_key == question_key) {
            Some(existing) => {
                existing.answer = answer;
                existing.recorded_at = recorded_at;
            }
            None => self.answers.push(RecordedAnswer {
                question_key,
                answer,
                recorded_at,
            }),
        }
    }

    /// Raises the emergency flag. Idempotent.
    pub fn mark_emergency(&mut self) {
        self.emergency_detected = true;
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// False only for the placeholder context of an idle machine.
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn patient_name(&self) -> &str {
        &self.patient_name
    }

    pub fn honorific(&self) -> &str {
        &self.honorific
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        self.time_of_day
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Answers in the order they were first given.
    pub fn answers(&self) -> &[RecordedAnswer] {
        &self.answers
    }

    pub fn answer(&self, question_key: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.question_key == question_key)
            .map(|a| a.answer.as_str())
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    pub fn emergency_detected(&self) -> bool {
        self.emergency_detected
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::unstarted()
    }
}
