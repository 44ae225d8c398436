//! Renders patient-facing text for each conversation state.
//!
//! The generator is read-only: it looks at the shared dialogue script and a
//! session context and produces strings. It never mutates the session.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use super::render::{render_template, PromptError};
use super::templates::{
    COMPLETED_MESSAGE, CONSENT_ACCEPTED_MESSAGE, DEFAULT_BOT_NAME, DEFAULT_DENY_MESSAGE,
    DEFAULT_EMERGENCY_DISCLAIMER, ERROR_MESSAGE, FALLBACK_QUESTION, IDLE_MESSAGE,
    REPROMPT_MESSAGE, SUMMARY_PROMPT, SYSTEM_INSTRUCTIONS, WARNING_SIGNS_HEADING,
};
use super::tone::ResponseTone;
use crate::domain::conversation::{
    ConsentAnswer, ConversationState, EmergencyDetector, SessionContext,
};
use crate::domain::dialogue::{DialogueDefinition, Question, QuestionKind};

/// A note added to a section's question when an earlier answer touched its topic.
struct ContextNote {
    section: &'static str,
    topic_words: &'static [&'static str],
    note: &'static str,
}

const CONTEXT_NOTES: [ContextNote; 2] = [
    ContextNote {
        section: "medications",
        topic_words: &["medication", "medicine", "pill", "prescription"],
        note: "You mentioned your medications earlier, so let's talk about them now.",
    },
    ContextNote {
        section: "followup_care",
        topic_words: &["appointment", "doctor", "clinic", "follow-up", "neurologist"],
        note: "You brought up your appointments earlier, so I'd like to follow up on that.",
    },
];

/// Builds the text shown to the patient and the instructions handed to an
/// external text generator.
#[derive(Debug, Clone)]
pub struct PromptGenerator {
    definition: Arc<DialogueDefinition>,
    detector: EmergencyDetector,
    bot_name: String,
}

impl PromptGenerator {
    pub fn new(definition: Arc<DialogueDefinition>, detector: EmergencyDetector) -> Self {
        Self {
            definition,
            detector,
            bot_name: DEFAULT_BOT_NAME.to_string(),
        }
    }

    /// Name used in the generator instructions. Blank keeps the default.
    pub fn with_bot_name(mut self, name: &str) -> Self {
        if !name.trim().is_empty() {
            self.bot_name = name.trim().to_string();
        }
        self
    }

    pub fn definition(&self) -> &DialogueDefinition {
        &self.definition
    }

    /// Text for `state`.
    ///
    /// Only the greeting can fail, when the script's template refers to an
    /// unsupported variable or is malformed.
    pub fn render(
        &self,
        state: ConversationState,
        context: &SessionContext,
    ) -> Result<String, PromptError> {
        let text = match state {
            ConversationState::Idle => IDLE_MESSAGE.to_string(),
            ConversationState::Greeting => self.greeting(context)?,
            ConversationState::Wrapup => self.wrapup(context),
            ConversationState::EmergencyExit => self.emergency_message(),
            ConversationState::Completed => COMPLETED_MESSAGE.to_string(),
            ConversationState::Error => ERROR_MESSAGE.to_string(),
            _ => self.question_prompt(state, context),
        };
        Ok(text)
    }

    /// Fills the greeting template.
    pub fn greeting(&self, context: &SessionContext) -> Result<String, PromptError> {
        let data = json!({
            "timeofday": context.time_of_day().as_str(),
            "honorific": context.honorific(),
            "patient_name": context.patient_name(),
            "organization": context.organization(),
            "site": context.site(),
        });
        render_template(&self.definition.greeting().template, &data)
    }

    /// Question the patient answers while in `state`, if the script has one.
    pub fn question_for(&self, state: ConversationState) -> Option<&Question> {
        state
            .question_key()
            .and_then(|key| self.definition.question(key))
    }

    fn question_prompt(&self, state: ConversationState, context: &SessionContext) -> String {
        let Some(question) = self.question_for(state) else {
            warn!(%state, "No scripted question for state, using fallback prompt");
            return FALLBACK_QUESTION.to_string();
        };

        match self.context_note(question, context) {
            Some(note) => format!("{}\n\n{}", question.prompt, note),
            None => question.prompt.clone(),
        }
    }

    /// Note for a section whose topic came up in an earlier answer.
    fn context_note(&self, question: &Question, context: &SessionContext) -> Option<&'static str> {
        let section = question.section.as_deref()?;
        let entry = CONTEXT_NOTES.iter().find(|n| n.section == section)?;

        let mentioned = context
            .answers()
            .iter()
            .filter(|a| a.question_key != question.key)
            .any(|a| {
                let lower = a.answer.to_lowercase();
                entry.topic_words.iter().any(|w| lower.contains(w))
            });

        mentioned.then_some(entry.note)
    }

    /// Wrap-up message, with "Thank you" personalized when a name is known.
    pub fn wrapup(&self, context: &SessionContext) -> String {
        let message = self.definition.wrapup_message();
        let name = context.patient_name().trim();
        if name.is_empty() || !message.starts_with("Thank you") {
            return message.to_string();
        }
        message.replacen("Thank you", &format!("Thank you, {}", name), 1)
    }

    /// Disclaimer followed by the itemized warning signs.
    pub fn emergency_message(&self) -> String {
        let disclaimer = match self.definition.emergency_disclaimer().trim() {
            "" => DEFAULT_EMERGENCY_DISCLAIMER,
            text => text,
        };

        let signs = self.definition.warning_signs();
        if signs.is_empty() {
            return disclaimer.to_string();
        }

        let mut out = format!("{}\n\n{}", disclaimer, WARNING_SIGNS_HEADING);
        for sign in signs {
            out.push_str("\n- ");
            out.push_str(sign);
        }
        out
    }

    /// Immediate reply to an answer, before the next prompt.
    ///
    /// Emergency text wins over everything. Confirm questions get an
    /// acceptance or their deny text; free-text answers get the tone
    /// phrase for their keyword bucket.
    pub fn followup(&self, question: &Question, answer: &str) -> String {
        if self.detector.detect(answer) {
            return self.emergency_message();
        }

        match question.kind {
            QuestionKind::Confirm => match ConsentAnswer::interpret(answer) {
                ConsentAnswer::Affirmative => CONSENT_ACCEPTED_MESSAGE.to_string(),
                ConsentAnswer::Declined => self.deny_text(question).to_string(),
                ConsentAnswer::Undecided => REPROMPT_MESSAGE.to_string(),
            },
            QuestionKind::FreeText => ResponseTone::classify(answer).acknowledgement().to_string(),
            QuestionKind::SectionMarker => String::new(),
        }
    }

    /// The question's own deny text, or the default one.
    pub fn deny_text<'a>(&self, question: &'a Question) -> &'a str {
        question
            .on_deny
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_DENY_MESSAGE)
    }

    /// Guidance for an external text generator, including the live keyword list.
    pub fn system_instructions(&self) -> Result<String, PromptError> {
        let keywords = self
            .detector
            .keywords()
            .iter()
            .map(|k| format!("- {}", k))
            .collect::<Vec<_>>()
            .join("\n");
        let data = json!({
            "bot_name": self.bot_name,
            "organization": self.definition.meta().organization,
            "keywords": keywords,
        });
        render_template(SYSTEM_INSTRUCTIONS, &data)
    }

    /// Request for a clinician-facing summary of the session.
    pub fn summary_prompt(
        &self,
        context: &SessionContext,
        date: &str,
    ) -> Result<String, PromptError> {
        let answers = if context.answers().is_empty() {
            "(no answers recorded)".to_string()
        } else {
            context
                .answers()
                .iter()
                .map(|a| format!("- {}: {}", a.question_key, a.answer))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let data = json!({
            "patient_name": context.patient_name(),
            "date": date,
            "answer_count": context.answer_count(),
            "answers": answers,
        });
        render_template(SUMMARY_PROMPT, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialogue::DialogueLoader;

    const STANDARD_SCRIPT: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/dialogues/stroke_followup.yml"
    ));

    fn generator() -> PromptGenerator {
        let definition = DialogueLoader::load_str(STANDARD_SCRIPT).unwrap();
        PromptGenerator::new(Arc::new(definition), EmergencyDetector::standard())
    }

    fn generator_for(yaml: &str) -> PromptGenerator {
        let definition = DialogueLoader::load_str(yaml).unwrap();
        PromptGenerator::new(Arc::new(definition), EmergencyDetector::standard())
    }

    fn jane() -> SessionContext {
        SessionContext::start("Jane", "Ms.", "Org", "Site")
    }

    mod greeting {
        use super::*;

        #[test]
        fn fills_every_variable() {
            let text = generator().greeting(&jane()).unwrap();
            assert!(text.contains("Ms. Jane"));
            assert!(text.contains("Org"));
            assert!(text.contains("Site"));
            assert!(!text.contains('{'));
        }

        #[test]
        fn unsupported_variable_is_an_error() {
            let gen = generator_for(
                "meta: {organization: O}\n\
                 greeting: {template: 'Hi {nickname}'}\n\
                 flow:\n  - section: introduction\n  - key: consent\n    type: confirm\n    prompt: ok?\n\
                 wrapup: {message: bye}\n",
            );
            let err = gen.greeting(&jane()).unwrap_err();
            assert!(
                matches!(&err, PromptError::UnknownTemplateVariable(name) if name.contains("nickname")),
                "unexpected error: {:?}",
                err
            );
            assert!(gen.render(ConversationState::Greeting, &jane()).is_err());
        }
    }

    mod render {
        use super::*;

        #[test]
        fn question_states_render_their_prompt() {
            let gen = generator();
            let ctx = jane();
            let text = gen.render(ConversationState::GeneralWellbeing, &ctx).unwrap();
            assert_eq!(text, "How have you been feeling since you left the hospital?");

            let consent = gen.render(ConversationState::Consent, &ctx).unwrap();
            assert!(consent.contains("Is it okay to continue?"));
        }

        #[test]
        fn every_state_renders_something() {
            let gen = generator();
            let ctx = jane();
            for state in ConversationState::ALL {
                let text = gen.render(state, &ctx).unwrap();
                assert!(!text.is_empty(), "{state} rendered empty text");
            }
        }

        #[test]
        fn missing_question_falls_back() {
            let gen = generator_for(
                "meta: {organization: O}\n\
                 greeting: {template: Hello}\n\
                 flow:\n  - section: introduction\n  - key: consent\n    type: confirm\n    prompt: ok?\n\
                 wrapup: {message: bye}\n",
            );
            let text = gen.render(ConversationState::Medications, &jane()).unwrap();
            assert_eq!(text, FALLBACK_QUESTION);
        }

        #[test]
        fn earlier_medication_answer_adds_note() {
            let gen = generator();
            let mut ctx = jane();
            ctx.record_answer("general_feeling", "Tired, and I keep forgetting my pills");

            let text = gen.render(ConversationState::Medications, &ctx).unwrap();
            assert!(text.starts_with("Were you able to pick up"));
            assert!(text.ends_with(CONTEXT_NOTES[0].note));
        }

        #[test]
        fn own_answer_does_not_trigger_note() {
            let gen = generator();
            let mut ctx = jane();
            ctx.record_answer("meds_pickup", "I got my prescription");

            let text = gen.render(ConversationState::Medications, &ctx).unwrap();
            assert!(!text.contains(CONTEXT_NOTES[0].note));
        }

        #[test]
        fn emergency_exit_lists_warning_signs() {
            let gen = generator();
            let text = gen.render(ConversationState::EmergencyExit, &jane()).unwrap();

            let expected_head = "If you are experiencing a medical emergency, please hang up and call 911 immediately.\n\nStroke warning signs to watch for:\n- ";
            assert!(text.starts_with(expected_head));
            assert_eq!(text.lines().filter(|l| l.starts_with("- ")).count(), 5);
        }

        #[test]
        fn wrapup_is_personalized() {
            let text = generator().render(ConversationState::Wrapup, &jane()).unwrap();
            assert!(text.starts_with("Thank you, Jane for taking the time"));
        }

        #[test]
        fn wrapup_without_name_is_unchanged() {
            let gen = generator();
            let ctx = SessionContext::start("", "", "Org", "Site");
            let text = gen.render(ConversationState::Wrapup, &ctx).unwrap();
            assert_eq!(text, gen.definition().wrapup_message());
        }

        #[test]
        fn fixed_texts_for_terminal_states() {
            let gen = generator();
            let ctx = jane();
            assert_eq!(gen.render(ConversationState::Completed, &ctx).unwrap(), COMPLETED_MESSAGE);
            assert_eq!(gen.render(ConversationState::Error, &ctx).unwrap(), ERROR_MESSAGE);
        }
    }

    mod followup {
        use super::*;

        #[test]
        fn emergency_answer_gets_emergency_text() {
            let gen = generator();
            let question = gen.definition().question("general_feeling").unwrap().clone();
            assert_eq!(gen.followup(&question, "I have chest pain"), gen.emergency_message());
        }

        #[test]
        fn consent_accept_and_deny() {
            let gen = generator();
            let consent = gen.definition().consent_question().unwrap().clone();

            assert_eq!(gen.followup(&consent, "yes"), CONSENT_ACCEPTED_MESSAGE);
            let denied = gen.followup(&consent, "no thanks");
            assert!(denied.starts_with("I understand. We won't continue today."));
            assert_eq!(gen.followup(&consent, "maybe later"), REPROMPT_MESSAGE);
        }

        #[test]
        fn confirm_without_deny_text_uses_default() {
            let gen = generator();
            let question = Question {
                key: "callback".into(),
                kind: QuestionKind::Confirm,
                prompt: "Would you like a callback?".into(),
                on_deny: None,
                section: Some("resources".into()),
            };
            assert_eq!(gen.followup(&question, "nope"), DEFAULT_DENY_MESSAGE);
        }

        #[test]
        fn free_text_gets_tone_phrase() {
            let gen = generator();
            let question = gen.definition().question("general_feeling").unwrap().clone();
            assert_eq!(
                gen.followup(&question, "Much better, thanks"),
                ResponseTone::Positive.acknowledgement()
            );
        }
    }

    mod instructions {
        use super::*;

        #[test]
        fn system_instructions_embed_keywords_and_organization() {
            let gen = generator();
            let text = gen.system_instructions().unwrap();
            assert!(text.contains("PennState Health"));
            assert!(text.contains("- chest pain"));
            assert!(text.contains("- 911"));
        }

        #[test]
        fn system_instructions_name_the_bot() {
            assert!(generator()
                .system_instructions()
                .unwrap()
                .starts_with("You are AI Stroke Navigator,"));

            let named = generator().with_bot_name(" Valley Navigator ");
            assert!(named
                .system_instructions()
                .unwrap()
                .starts_with("You are Valley Navigator,"));

            let blank = generator().with_bot_name("  ");
            assert!(blank.system_instructions().unwrap().contains(DEFAULT_BOT_NAME));
        }

        #[test]
        fn system_instructions_include_added_keywords() {
            let definition = DialogueLoader::load_str(STANDARD_SCRIPT).unwrap();
            let detector = EmergencyDetector::standard().with_keywords(["fainted"]);
            let gen = PromptGenerator::new(Arc::new(definition), detector);
            assert!(gen.system_instructions().unwrap().contains("- fainted"));
        }

        #[test]
        fn summary_prompt_lists_answers_in_order() {
            let gen = generator();
            let mut ctx = jane();
            ctx.record_answer("consent", "yes");
            ctx.record_answer("know_ischemic", "a clot");

            let text = gen.summary_prompt(&ctx, "2026-10-19").unwrap();
            assert!(text.contains("Patient: Jane"));
            assert!(text.contains("Date: 2026-10-19"));
            assert!(text.contains("Questions answered: 2"));
            let consent = text.find("- consent: yes").unwrap();
            let knowledge = text.find("- know_ischemic: a clot").unwrap();
            assert!(consent < knowledge);
        }

        #[test]
        fn summary_prompt_without_answers() {
            let text = generator().summary_prompt(&jane(), "2026-10-19").unwrap();
            assert!(text.contains("(no answers recorded)"));
        }
    }
}
