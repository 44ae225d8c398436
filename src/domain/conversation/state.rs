//! Conversation states.
//!
//! Exactly one state is current per session. Reachability is defined by the
//! guarded rule table in `rules`; this module only names the states and
//! binds each one to the question it asks.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules::TRANSITION_TABLE;
use crate::domain::foundation::StateMachine;

/// Where a follow-up call currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// No session started.
    #[default]
    Idle,
    Greeting,
    Consent,
    KnowledgeCheck,
    GeneralWellbeing,
    Medications,
    FollowupCare,
    Lifestyle,
    DailyActivities,
    Resources,
    Wrapup,
    /// Call halted for a possible emergency or declined consent.
    EmergencyExit,
    Completed,
    Error,
}

impl ConversationState {
    /// Every state, in script order.
    pub const ALL: [ConversationState; 14] = [
        Self::Idle,
        Self::Greeting,
        Self::Consent,
        Self::KnowledgeCheck,
        Self::GeneralWellbeing,
        Self::Medications,
        Self::FollowupCare,
        Self::Lifestyle,
        Self::DailyActivities,
        Self::Resources,
        Self::Wrapup,
        Self::EmergencyExit,
        Self::Completed,
        Self::Error,
    ];

    /// Key of the question whose answer an incoming message records.
    ///
    /// Exhaustive on purpose: adding a state without deciding its binding
    /// does not compile.
    pub fn question_key(&self) -> Option<&'static str> {
        match self {
            Self::Consent => Some("consent"),
            Self::KnowledgeCheck => Some("know_ischemic"),
            Self::GeneralWellbeing => Some("general_feeling"),
            Self::Medications => Some("meds_pickup"),
            Self::FollowupCare => Some("fup_scheduled"),
            Self::Lifestyle => Some("lifestyle_adherence"),
            Self::DailyActivities => Some("adl_support"),
            Self::Resources => Some("who_to_call"),
            Self::Idle
            | Self::Greeting
            | Self::Wrapup
            | Self::EmergencyExit
            | Self::Completed
            | Self::Error => None,
        }
    }

    /// Returns true while the call can still take patient input.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Completed | Self::EmergencyExit | Self::Error)
    }

    /// Returns true for the assessment states between consent and wrap-up.
    pub fn is_assessment(&self) -> bool {
        matches!(
            self,
            Self::KnowledgeCheck
                | Self::GeneralWellbeing
                | Self::Medications
                | Self::FollowupCare
                | Self::Lifestyle
                | Self::DailyActivities
                | Self::Resources
        )
    }

    /// Stable snake_case name, as used in summaries and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Greeting => "greeting",
            Self::Consent => "consent",
            Self::KnowledgeCheck => "knowledge_check",
            Self::GeneralWellbeing => "general_wellbeing",
            Self::Medications => "medications",
            Self::FollowupCare => "followup_care",
            Self::Lifestyle => "lifestyle",
            Self::DailyActivities => "daily_activities",
            Self::Resources => "resources",
            Self::Wrapup => "wrapup",
            Self::EmergencyExit => "emergency_exit",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for ConversationState {
    fn can_transition_to(&self, target: &Self) -> bool {
        TRANSITION_TABLE
            .rules_from(*self)
            .iter()
            .any(|rule| rule.to == *target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        let mut targets = Vec::new();
        for rule in TRANSITION_TABLE.rules_from(*self) {
            if !targets.contains(&rule.to) {
                targets.push(rule.to);
            }
        }
        targets
    }

    // Error still has its reset edge, yet it ends the call.
    fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}
