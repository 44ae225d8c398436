//! Guarded transition rules.
//!
//! The table is keyed by from-state; each state owns an ordered list of
//! `(guard, to)` pairs and the first satisfied guard wins. Every state that
//! takes patient input lists its emergency rule first, so a message that
//! both trips the detector and satisfies a normal guard always exits.

use super::context::SessionContext;
use super::state::ConversationState;
use crate::domain::dialogue::CONSENT_KEY;

/// Predicate over the session context that gates a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Guard {
    /// Unconditional.
    Always,
    EmergencyDetected,
    ConsentGiven,
    ConsentDeclined,
}

impl Guard {
    /// Evaluates the guard against the current context.
    pub fn allows(&self, context: &SessionContext) -> bool {
        match self {
            Guard::Always => true,
            Guard::EmergencyDetected => context.emergency_detected(),
            Guard::ConsentGiven => {
                consent_answer(context) == Some(ConsentAnswer::Affirmative)
            }
            Guard::ConsentDeclined => consent_answer(context) == Some(ConsentAnswer::Declined),
        }
    }
}

fn consent_answer(context: &SessionContext) -> Option<ConsentAnswer> {
    context.answer(CONSENT_KEY).map(ConsentAnswer::interpret)
}

/// How a reply to the consent question reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentAnswer {
    Affirmative,
    Declined,
    Undecided,
}

const AFFIRMATIVE_WORDS: [&str; 8] =
    ["yes", "yeah", "yep", "sure", "ok", "okay", "absolutely", "certainly"];
const DECLINING_WORDS: [&str; 3] = ["no", "nope", "nah"];

impl ConsentAnswer {
    /// Reads the first word of a reply, case-insensitively.
    pub fn interpret(text: &str) -> Self {
        let lowered = text.trim().to_lowercase();
        let first_word = lowered
            .split(|c: char| !c.is_alphanumeric())
            .find(|w| !w.is_empty())
            .unwrap_or("");

        if AFFIRMATIVE_WORDS.contains(&first_word) {
            Self::Affirmative
        } else if DECLINING_WORDS.contains(&first_word) {
            Self::Declined
        } else {
            Self::Undecided
        }
    }
}

/// A single `(from, guard, to)` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: ConversationState,
    pub guard: Guard,
    pub to: ConversationState,
}

const fn rule(from: ConversationState, guard: Guard, to: ConversationState) -> TransitionRule {
    TransitionRule { from, guard, to }
}

use ConversationState as S;

const IDLE: [TransitionRule; 1] = [rule(S::Idle, Guard::Always, S::Greeting)];

const GREETING: [TransitionRule; 2] = [
    rule(S::Greeting, Guard::EmergencyDetected, S::EmergencyExit),
    rule(S::Greeting, Guard::Always, S::Consent),
];

const CONSENT: [TransitionRule; 3] = [
    rule(S::Consent, Guard::EmergencyDetected, S::EmergencyExit),
    rule(S::Consent, Guard::ConsentGiven, S::KnowledgeCheck),
    rule(S::Consent, Guard::ConsentDeclined, S::EmergencyExit),
];

const KNOWLEDGE_CHECK: [TransitionRule; 2] = [
    rule(S::KnowledgeCheck, Guard::EmergencyDetected, S::EmergencyExit),
    rule(S::KnowledgeCheck, Guard::Always, S::GeneralWellbeing),
];

const GENERAL_WELLBEING: [TransitionRule; 2] = [
    rule(S::GeneralWellbeing, Guard::EmergencyDetected, S::EmergencyExit),
    rule(S::GeneralWellbeing, Guard::Always, S::Medications),
];

const MEDICATIONS: [TransitionRule; 2] = [
    rule(S::Medications, Guard::EmergencyDetected, S::EmergencyExit),
    rule(S::Medications, Guard::Always, S::FollowupCare),
];

const FOLLOWUP_CARE: [TransitionRule; 2] = [
    rule(S::FollowupCare, Guard::EmergencyDetected, S::EmergencyExit),
    rule(S::FollowupCare, Guard::Always, S::Lifestyle),
];

const LIFESTYLE: [TransitionRule; 2] = [
    rule(S::Lifestyle, Guard::EmergencyDetected, S::EmergencyExit),
    rule(S::Lifestyle, Guard::Always, S::DailyActivities),
];

const DAILY_ACTIVITIES: [TransitionRule; 2] = [
    rule(S::DailyActivities, Guard::EmergencyDetected, S::EmergencyExit),
    rule(S::DailyActivities, Guard::Always, S::Resources),
];

const RESOURCES: [TransitionRule; 2] = [
    rule(S::Resources, Guard::EmergencyDetected, S::EmergencyExit),
    rule(S::Resources, Guard::Always, S::Wrapup),
];

const WRAPUP: [TransitionRule; 2] = [
    rule(S::Wrapup, Guard::EmergencyDetected, S::EmergencyExit),
    rule(S::Wrapup, Guard::Always, S::Completed),
];

const ERROR: [TransitionRule; 1] = [rule(S::Error, Guard::Always, S::Idle)];

/// The conversation's rule table.
#[derive(Debug, Clone, Copy)]
pub struct TransitionTable;

/// Shared instance; the table holds no data of its own.
pub static TRANSITION_TABLE: TransitionTable = TransitionTable;

impl TransitionTable {
    /// Ordered rules for a from-state.
    pub fn rules_from(&self, from: ConversationState) -> &'static [TransitionRule] {
        match from {
            S::Idle => &IDLE,
            S::Greeting => &GREETING,
            S::Consent => &CONSENT,
            S::KnowledgeCheck => &KNOWLEDGE_CHECK,
            S::GeneralWellbeing => &GENERAL_WELLBEING,
            S::Medications => &MEDICATIONS,
            S::FollowupCare => &FOLLOWUP_CARE,
            S::Lifestyle => &LIFESTYLE,
            S::DailyActivities => &DAILY_ACTIVITIES,
            S::Resources => &RESOURCES,
            S::Wrapup => &WRAPUP,
            S::EmergencyExit | S::Completed => &[],
            S::Error => &ERROR,
        }
    }

    /// First rule from `from` whose guard holds, if any.
    pub fn select(
        &self,
        from: ConversationState,
        context: &SessionContext,
    ) -> Option<&'static TransitionRule> {
        self.rules_from(from)
            .iter()
            .find(|rule| rule.guard.allows(context))
    }
}
