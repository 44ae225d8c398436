//! Fixed texts for the follow-up call.
//!
//! Everything the engine says that is not taken from the dialogue script.

// ============================================================================
// Patient-facing messages
// ============================================================================

pub const IDLE_MESSAGE: &str = "The follow-up call has not started yet.";

pub const COMPLETED_MESSAGE: &str =
    "Thank you for completing your follow-up call. Take care, and have a good day.";

pub const ERROR_MESSAGE: &str =
    "I apologize for the technical difficulty. Please try again later.";

/// Returned when a turn fails internally; the session stays where it was.
pub const INTERNAL_FAULT_MESSAGE: &str =
    "I apologize for the technical difficulty. Let me try to continue our conversation.";

/// Returned when a session cannot be started.
pub const START_FAILURE_MESSAGE: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again later.";

pub const REPROMPT_MESSAGE: &str =
    "I'm sorry, I didn't quite catch that. Could you please repeat your response?";

/// Used when the script has no question for a state that should ask one.
pub const FALLBACK_QUESTION: &str = "Let me ask you a few more questions about your recovery.";

pub const CONSENT_ACCEPTED_MESSAGE: &str =
    "Thank you. Let's begin with a few questions about your recovery.";

pub const DEFAULT_DENY_MESSAGE: &str = "I understand. We won't proceed with the call.";

/// Spoken on emergency exit when the script carries no disclaimer.
pub const DEFAULT_EMERGENCY_DISCLAIMER: &str =
    "If you are experiencing a medical emergency, please hang up and call 911 immediately.";

/// Name the navigator introduces itself with when none is configured.
pub const DEFAULT_BOT_NAME: &str = "AI Stroke Navigator";

pub const WARNING_SIGNS_HEADING: &str = "Stroke warning signs to watch for:";

// ============================================================================
// Generator instructions
// ============================================================================

/// Guidance handed to the external text generator every turn.
///
/// Placeholders: `{{bot_name}}`, `{{organization}}`, `{{keywords}}`.
pub const SYSTEM_INSTRUCTIONS: &str = r#"You are {{bot_name}}, a stroke navigator calling on behalf of {{organization}}.
You are conducting a post-discharge follow-up call with a patient recovering from an ischemic stroke.

GUIDELINES:
1. Be warm, professional, and supportive
2. Use short sentences and plain language
3. Rephrase the question you are given; do not add new questions or skip it
4. Do not give medical advice; you are gathering information for the care team
5. Address the patient by name and honorific when it feels natural
6. Keep each reply to a few sentences

EMERGENCY KEYWORDS to watch for:
{{keywords}}

If the patient mentions any of these, tell them to hang up and call 911 immediately.

CALL STRUCTURE:
- Greeting and consent
- Understanding of ischemic stroke
- General well-being, medications, follow-up care, lifestyle, daily activities, resources
- Wrap-up and emergency instructions

You cannot answer questions during this call, but you will record any requests for the care team."#;

/// Request for a clinician-facing summary of a finished call.
///
/// Placeholders: `{{patient_name}}`, `{{date}}`, `{{answer_count}}`, `{{answers}}`.
pub const SUMMARY_PROMPT: &str = r#"Write a professional summary of this stroke follow-up call for the care team.

Patient: {{patient_name}}
Date: {{date}}
Questions answered: {{answer_count}}

Recorded answers:
{{answers}}

Structure the summary as:
1. Current condition and concerns
2. Medication adherence
3. Follow-up care status
4. Red flags or urgent concerns
5. Suggested next steps for the care team

Keep it concise and factual."#;
