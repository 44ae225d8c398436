//! Conversation state machine.
//!
//! Owns the current state, the session context and the state history for
//! one call. `submit` is the only mutation path while a call is active.

use tracing::{debug, error, info, warn};

use super::context::SessionContext;
use super::emergency::EmergencyDetector;
use super::rules::TRANSITION_TABLE;
use super::state::ConversationState;
use crate::domain::foundation::StateMachine;

/// Drives one session through the guarded rule table.
#[derive(Debug, Clone)]
pub struct ConversationStateMachine {
    current: ConversationState,
    context: SessionContext,
    history: Vec<ConversationState>,
    detector: EmergencyDetector,
}

impl ConversationStateMachine {
    /// Idle machine using the standard emergency keywords.
    pub fn new() -> Self {
        Self::with_detector(EmergencyDetector::standard())
    }

    /// Idle machine using a caller-supplied detector.
    pub fn with_detector(detector: EmergencyDetector) -> Self {
        Self {
            current: ConversationState::Idle,
            context: SessionContext::unstarted(),
            history: Vec::new(),
            detector,
        }
    }

    /// Opens a session and moves to the greeting.
    pub fn start(
        &mut self,
        patient_name: &str,
        honorific: &str,
        organization: &str,
        site: &str,
    ) {
        self.start_with_context(SessionContext::start(patient_name, honorific, organization, site));
    }

    /// Opens a session from a prepared context.
    pub fn start_with_context(&mut self, context: SessionContext) {
        if self.current != ConversationState::Idle {
            debug!(from = %self.current, "Starting over a previous session");
        }
        self.context = context;
        self.current = ConversationState::Greeting;
        self.history = vec![ConversationState::Greeting];
        info!(
            session_id = %self.context.session_id(),
            patient = self.context.patient_name(),
            "Conversation started"
        );
    }

    /// Records a patient message and attempts one transition.
    ///
    /// The answer is stored under the question bound to the current state,
    /// the emergency detector always runs, and then the first satisfied
    /// rule is applied. Returns whether the state changed. Calls before
    /// `start` or on an ended session are ignored.
    pub fn submit(&mut self, message: &str) -> bool {
        if !self.context.is_started() {
            debug!(state = %self.current, "Ignoring message before the session started");
            return false;
        }
        if !self.current.is_active() {
            debug!(state = %self.current, "Ignoring message for ended session");
            return false;
        }

        if let Some(key) = self.current.question_key() {
            self.context.record_answer(key, message);
        }

        let matched = self.detector.matched_keywords(message);
        if !matched.is_empty() {
            warn!(
                session_id = %self.context.session_id(),
                state = %self.current,
                keywords = ?matched,
                "Emergency keywords detected"
            );
            self.context.mark_emergency();
        }

        self.try_transition()
    }

    fn try_transition(&mut self) -> bool {
        let Some(rule) = TRANSITION_TABLE.select(self.current, &self.context) else {
            debug!(state = %self.current, "No transition rule matched");
            return false;
        };

        info!(
            session_id = %self.context.session_id(),
            from = %rule.from,
            to = %rule.to,
            "State transition"
        );
        self.current = rule.to;
        self.history.push(rule.to);
        true
    }

    /// Ends the session in the Error state.
    pub fn fail(&mut self, reason: &str) {
        error!(
            session_id = %self.context.session_id(),
            state = %self.current,
            reason,
            "Conversation failed"
        );
        self.current = ConversationState::Error;
        self.history.push(ConversationState::Error);
    }

    /// Follows the Error → Idle rule, discarding the failed session.
    pub fn recover(&mut self) -> bool {
        match self.current.transition_to(ConversationState::Idle) {
            Ok(_) => {
                self.reset();
                true
            }
            Err(err) => {
                debug!(error = %err, "Recovery not applicable");
                false
            }
        }
    }

    /// Discards context and history and returns to Idle.
    pub fn reset(&mut self) {
        self.current = ConversationState::Idle;
        self.context = SessionContext::unstarted();
        self.history.clear();
        info!("State machine reset");
    }

    pub fn current_state(&self) -> ConversationState {
        self.current
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// States visited since `start`, beginning with Greeting.
    pub fn history(&self) -> &[ConversationState] {
        &self.history
    }

    pub fn detector(&self) -> &EmergencyDetector {
        &self.detector
    }

    pub fn is_active(&self) -> bool {
        self.current.is_active()
    }

    pub fn is_emergency_exit(&self) -> bool {
        self.current == ConversationState::EmergencyExit
    }

    pub fn is_completed(&self) -> bool {
        self.current == ConversationState::Completed
    }
}

impl Default for ConversationStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
