//! Keyword buckets for choosing an acknowledgement phrase.
//!
//! This is a word lookup, not sentiment analysis. "not good" lands in the
//! positive bucket because "good" is checked first.

use serde::Serialize;

const POSITIVE_WORDS: [&str; 6] = ["good", "better", "improving", "fine", "okay", "great"];
const NEGATIVE_WORDS: [&str; 6] = ["worse", "bad", "difficult", "struggling", "hard", "tired"];
const MEDICATION_WORDS: [&str; 4] = ["medication", "medicine", "pill", "prescription"];

/// Bucket a free-text answer falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTone {
    Positive,
    Negative,
    MedicationRelated,
    Neutral,
}

impl ResponseTone {
    /// Checks positive, negative, then medication words; first hit wins.
    pub fn classify(answer: &str) -> Self {
        let lower = answer.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if mentions(&POSITIVE_WORDS) {
            Self::Positive
        } else if mentions(&NEGATIVE_WORDS) {
            Self::Negative
        } else if mentions(&MEDICATION_WORDS) {
            Self::MedicationRelated
        } else {
            Self::Neutral
        }
    }

    /// Canned transitional phrase for the bucket.
    pub fn acknowledgement(&self) -> &'static str {
        match self {
            Self::Positive => "That's good to hear.",
            Self::Negative => {
                "I'm sorry this has been hard. Thank you for telling me; I'll make sure your care team knows."
            }
            Self::MedicationRelated => {
                "Thank you for sharing that about your medications. I'll pass it along to your care team."
            }
            Self::Neutral => "Thank you for sharing that. It's helpful for your care team.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_words_win_first() {
        assert_eq!(ResponseTone::classify("I'm feeling better"), ResponseTone::Positive);
        assert_eq!(ResponseTone::classify("not good"), ResponseTone::Positive);
    }

    #[test]
    fn negative_words() {
        assert_eq!(ResponseTone::classify("It's been really hard"), ResponseTone::Negative);
    }

    #[test]
    fn medication_words() {
        assert_eq!(
            ResponseTone::classify("I ran out of my blood thinner pills"),
            ResponseTone::MedicationRelated
        );
    }

    #[test]
    fn everything_else_is_neutral() {
        assert_eq!(ResponseTone::classify("My daughter drives me"), ResponseTone::Neutral);
        assert_eq!(ResponseTone::classify(""), ResponseTone::Neutral);
    }

    #[test]
    fn every_bucket_has_a_phrase() {
        for tone in [
            ResponseTone::Positive,
            ResponseTone::Negative,
            ResponseTone::MedicationRelated,
            ResponseTone::Neutral,
        ] {
            assert!(!tone.acknowledgement().is_empty());
        }
    }
}
