//! ConversationFlow - drives one follow-up call from greeting to close.
//!
//! The flow owns a state machine and prompt generator for a single session.
//! Every turn goes: record and transition, render the new state, optionally
//! rephrase through the text generator. Failures never escape to the host;
//! they degrade to fixed text.
//!
//! Calls on one flow must be serialized by the host. Independent sessions
//! use independent flows sharing one `Arc<DialogueDefinition>`.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::settings::FlowSettings;
use super::status::{FlowStatus, QuestionOutline};
use crate::domain::conversation::{
    session_data_issues, ConversationEvent, ConversationState, ConversationStateMachine,
    EmergencyDetector, EventKind, ResponseEntry, SessionContext, SessionSummary,
};
use crate::domain::dialogue::{DialogueDefinition, Question};
use crate::domain::foundation::Timestamp;
use crate::domain::prompts::templates::{INTERNAL_FAULT_MESSAGE, REPROMPT_MESSAGE, START_FAILURE_MESSAGE};
use crate::domain::prompts::{PromptError, PromptGenerator};
use crate::ports::{GenerationError, GenerationRequest, SinkError, SummarySink, TextGenerator};

/// Orchestrates one patient session.
pub struct ConversationFlow {
    definition: Arc<DialogueDefinition>,
    settings: FlowSettings,
    machine: ConversationStateMachine,
    prompts: PromptGenerator,
    generator: Option<Arc<dyn TextGenerator>>,
    sink: Option<Arc<dyn SummarySink>>,
    events: Vec<ConversationEvent>,
    last_activity: Option<Timestamp>,
}

impl ConversationFlow {
    pub fn new(definition: Arc<DialogueDefinition>, settings: FlowSettings) -> Self {
        let detector =
            EmergencyDetector::standard().with_keywords(&settings.extra_emergency_keywords);

        for issue in definition.validation_issues() {
            warn!(%issue, "Dialogue structure issue");
        }

        Self {
            machine: ConversationStateMachine::with_detector(detector.clone()),
            prompts: PromptGenerator::new(Arc::clone(&definition), detector)
                .with_bot_name(&settings.bot_name),
            definition,
            settings,
            generator: None,
            sink: None,
            events: Vec::new(),
            last_activity: None,
        }
    }

    /// Routes greeting, question and wrap-up text through `generator`.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Target for [`ConversationFlow::archive`].
    pub fn with_sink(mut self, sink: Arc<dyn SummarySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Turns
    // ════════════════════════════════════════════════════════════════════════════

    /// Starts a session and returns the greeting.
    ///
    /// Blank `organization` or `site` fall back to the dialogue script's
    /// `meta`. Starting while another session is underway replaces it.
    pub async fn begin(
        &mut self,
        patient_name: &str,
        honorific: &str,
        organization: &str,
        site: &str,
    ) -> String {
        let meta = self.definition.meta();
        let organization = non_blank_or(organization, &meta.organization);
        let site = non_blank_or(site, &meta.site);

        let context = SessionContext::start(patient_name, honorific, organization, site);
        let started_at = context.started_at();
        self.events.clear();
        self.machine.start_with_context(context);
        self.last_activity = Some(started_at);
        self.record_at(
            EventKind::SessionStarted,
            started_at,
            Some(format!("{} {}", honorific, patient_name).trim().to_string()),
        );

        match self.prompts.render(ConversationState::Greeting, self.machine.context()) {
            Ok(greeting) => self.deliver(ConversationState::Greeting, greeting).await,
            Err(err) => {
                error!(error = %err, "Greeting could not be rendered");
                self.machine.fail(&err.to_string());
                self.record(EventKind::StateChanged, Some(transition_detail(
                    ConversationState::Greeting,
                    ConversationState::Error,
                )));
                START_FAILURE_MESSAGE.to_string()
            }
        }
    }

    /// Handles one patient message and returns what to say next.
    pub async fn submit(&mut self, message: &str) -> String {
        let before = self.machine.current_state();

        if before == ConversationState::Idle {
            debug!("Message received before the session started");
            return self.render_fixed(before);
        }
        if !before.is_active() {
            debug!(state = %before, "Message received after the session ended");
            return self.render_fixed(before);
        }

        self.last_activity = Some(Timestamp::now());
        self.record(EventKind::PatientResponse, Some(message.to_string()));

        let asked = self.prompts.question_for(before).cloned();
        let flagged_before = self.machine.context().emergency_detected();
        let moved = self.machine.submit(message);

        if !flagged_before && self.machine.context().emergency_detected() {
            let matched = self.machine.detector().matched_keywords(message).join(", ");
            self.record(EventKind::EmergencyDetected, Some(matched));
        }

        if !moved {
            return self.reprompt(before);
        }

        let after = self.machine.current_state();
        self.record(EventKind::StateChanged, Some(transition_detail(before, after)));

        match self.respond(after, asked.as_ref(), message).await {
            Ok(text) => text,
            Err(err) => {
                error!(state = %after, error = %err, "Prompt could not be rendered");
                INTERNAL_FAULT_MESSAGE.to_string()
            }
        }
    }

    async fn respond(
        &mut self,
        state: ConversationState,
        asked: Option<&Question>,
        answer: &str,
    ) -> Result<String, PromptError> {
        match state {
            ConversationState::EmergencyExit => {
                let emergency = self.prompts.emergency_message();
                if self.machine.context().emergency_detected() {
                    return Ok(emergency);
                }
                let deny = asked
                    .map(|q| self.prompts.deny_text(q))
                    .unwrap_or_default();
                Ok(join_paragraphs(deny, &emergency))
            }
            ConversationState::Completed | ConversationState::Error => {
                self.prompts.render(state, self.machine.context())
            }
            _ => {
                let rendered = self.prompts.render(state, self.machine.context())?;
                let text = self.deliver(state, rendered).await;
                let lead = asked
                    .map(|q| self.prompts.followup(q, answer))
                    .unwrap_or_default();
                Ok(join_sentences(&lead, &text))
            }
        }
    }

    /// Re-asks the current question after an answer that moved nothing.
    fn reprompt(&self, state: ConversationState) -> String {
        debug!(%state, "No transition, asking again");
        match self.prompts.render(state, self.machine.context()) {
            Ok(prompt) => join_paragraphs(REPROMPT_MESSAGE, &prompt),
            Err(_) => REPROMPT_MESSAGE.to_string(),
        }
    }

    fn render_fixed(&self, state: ConversationState) -> String {
        self.prompts
            .render(state, self.machine.context())
            .unwrap_or_else(|_| INTERNAL_FAULT_MESSAGE.to_string())
    }

    /// Passes rendered text through the generator, falling back on any failure.
    async fn deliver(&mut self, state: ConversationState, rendered: String) -> String {
        let Some(generator) = self.generator.clone() else {
            return rendered;
        };

        let system_prompt = match self.prompts.system_instructions() {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "System instructions could not be rendered");
                return rendered;
            }
        };

        let request = GenerationRequest {
            system_prompt,
            user_prompt: rendered.clone(),
            state,
            context: self.machine.context().clone(),
        };

        let timeout = self.settings.generator_timeout;
        let failure = match tokio::time::timeout(timeout, generator.generate(request)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => return text,
            Ok(Ok(_)) => GenerationError::EmptyResponse,
            Ok(Err(err)) => err,
            Err(_) => GenerationError::Timeout {
                timeout_secs: timeout.as_secs(),
            },
        };

        warn!(%state, error = %failure, "Text generator failed, using scripted text");
        self.record(EventKind::GeneratorFallback, Some(failure.to_string()));
        rendered
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Session control
    // ════════════════════════════════════════════════════════════════════════════

    /// Discards the session and returns to Idle.
    pub fn reset(&mut self) {
        self.machine.reset();
        self.events.clear();
        self.last_activity = None;
        self.record(EventKind::SessionReset, None);
        info!("Conversation reset");
    }

    /// Leaves the Error state through a reset. Returns false outside Error.
    pub fn recover(&mut self) -> bool {
        if !self.machine.recover() {
            return false;
        }
        self.events.clear();
        self.last_activity = None;
        self.record(EventKind::SessionReset, Some("recovered from error".to_string()));
        true
    }

    /// Hands the current summary to the configured sink.
    pub async fn archive(&self) -> Result<SessionSummary, SinkError> {
        let Some(sink) = &self.sink else {
            return Err(SinkError::NotConfigured);
        };
        let summary = self.export_summary();
        sink.store(&summary).await?;
        info!(session_id = %summary.session_id, "Session archived");
        Ok(summary)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Queries
    // ════════════════════════════════════════════════════════════════════════════

    pub fn status(&self) -> FlowStatus {
        let context = self.machine.context();
        let duration_secs = self.elapsed_secs();
        FlowStatus {
            state: self.machine.current_state(),
            is_active: self.machine.is_active(),
            is_emergency: self.machine.is_emergency_exit(),
            is_completed: self.machine.is_completed(),
            emergency_detected: context.emergency_detected(),
            patient_name: context.patient_name().to_string(),
            responses_count: context.answer_count(),
            duration_secs,
            over_time_limit: duration_secs > self.settings.max_duration.as_secs(),
        }
    }

    pub fn export_summary(&self) -> SessionSummary {
        let context = self.machine.context();
        let responses = context
            .answers()
            .iter()
            .map(|a| ResponseEntry {
                question: a.question_key.clone(),
                response: a.answer.clone(),
                section: self
                    .definition
                    .question(&a.question_key)
                    .and_then(|q| q.section.clone()),
                recorded_at: a.recorded_at,
            })
            .collect();

        SessionSummary {
            session_id: context.session_id(),
            patient_name: context.patient_name().to_string(),
            honorific: context.honorific().to_string(),
            time_of_day: context.time_of_day(),
            organization: context.organization().to_string(),
            site: context.site().to_string(),
            started_at: context.started_at(),
            last_activity: self.last_activity.unwrap_or_else(|| context.started_at()),
            duration_secs: self.elapsed_secs() as i64,
            final_state: self.machine.current_state(),
            emergency_detected: context.emergency_detected(),
            completed: self.machine.is_completed(),
            responses,
            state_history: self.machine.history().to_vec(),
            events: self.events.clone(),
            validation_issues: self.definition.validation_issues(),
            data_issues: session_data_issues(context),
        }
    }

    /// Problems with the data collected so far.
    pub fn validate_session_data(&self) -> Vec<String> {
        session_data_issues(self.machine.context())
    }

    /// Every answerable question in the script.
    pub fn available_questions(&self) -> Vec<QuestionOutline> {
        self.definition
            .questions()
            .iter()
            .filter(|q| q.kind.is_answerable())
            .map(QuestionOutline::from)
            .collect()
    }

    pub fn questions_in_section(&self, section: &str) -> Vec<QuestionOutline> {
        self.definition
            .questions_in_section(section)
            .into_iter()
            .map(QuestionOutline::from)
            .collect()
    }

    /// Instruction text for a clinician-facing summary of this session.
    pub fn summary_prompt(&self) -> Result<String, PromptError> {
        let context = self.machine.context();
        self.prompts
            .summary_prompt(context, &context.started_at().local_date())
    }

    pub fn current_state(&self) -> ConversationState {
        self.machine.current_state()
    }

    pub fn context(&self) -> &SessionContext {
        self.machine.context()
    }

    pub fn history(&self) -> &[ConversationState] {
        self.machine.history()
    }

    pub fn events(&self) -> &[ConversationEvent] {
        &self.events
    }

    pub fn definition(&self) -> &DialogueDefinition {
        &self.definition
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    fn elapsed_secs(&self) -> u64 {
        if !self.machine.context().is_started() {
            return 0;
        }
        let started = self.machine.context().started_at();
        let last = self.last_activity.unwrap_or(started);
        last.duration_since(&started).num_seconds().max(0) as u64
    }

    fn record(&mut self, kind: EventKind, detail: Option<String>) {
        self.record_at(kind, Timestamp::now(), detail);
    }

    fn record_at(&mut self, kind: EventKind, at: Timestamp, detail: Option<String>) {
        let mut event = ConversationEvent::new(kind, at, self.machine.current_state());
        if let Some(detail) = detail {
            event = event.with_detail(detail);
        }
        debug!(kind = ?event.kind, state = %event.state, "Conversation event");
        self.events.push(event);
    }
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn transition_detail(from: ConversationState, to: ConversationState) -> String {
    format!("{} -> {}", from, to)
}

fn join_sentences(lead: &str, text: &str) -> String {
    if lead.is_empty() {
        text.to_string()
    } else {
        format!("{} {}", lead, text)
    }
}

fn join_paragraphs(first: &str, second: &str) -> String {
    if first.is_empty() {
        second.to_string()
    } else {
        format!("{}\n\n{}", first, second)
    }
}
