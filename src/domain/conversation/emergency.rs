//! Emergency keyword detection.
//!
//! Plain case-insensitive substring matching. Recall matters more than
//! precision here: a false alarm ends a call early, a miss does not end it
//! at all. Callers may add terms; nothing removes them.

use once_cell::sync::Lazy;

/// Terms that end the call with emergency instructions.
///
/// Bare "stroke" is absent: patients are asked to describe their stroke,
/// so the list names symptom and recurrence phrases instead.
pub const DEFAULT_EMERGENCY_KEYWORDS: [&str; 19] = [
    "emergency",
    "911",
    "urgent",
    "help",
    "pain",
    "chest pain",
    "can't breathe",
    "cannot breathe",
    "can't speak",
    "cannot speak",
    "numb",
    "paralyzed",
    "stroke symptoms",
    "having a stroke",
    "another stroke",
    "stroke again",
    "a stroke now",
    "face drooping",
    "slurred speech",
];

static STANDARD_DETECTOR: Lazy<EmergencyDetector> = Lazy::new(EmergencyDetector::standard);

/// Checks text against the built-in keyword list.
pub fn contains_emergency_keyword(text: &str) -> bool {
    STANDARD_DETECTOR.detect(text)
}

/// Keyword matcher with an append-only term list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyDetector {
    keywords: Vec<String>,
}

impl EmergencyDetector {
    /// Detector over [`DEFAULT_EMERGENCY_KEYWORDS`].
    pub fn standard() -> Self {
        let mut detector = Self {
            keywords: Vec::with_capacity(DEFAULT_EMERGENCY_KEYWORDS.len()),
        };
        for keyword in DEFAULT_EMERGENCY_KEYWORDS {
            detector.add_keyword(keyword);
        }
        detector
    }

    /// Standard list plus extra terms.
    pub fn with_keywords<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for keyword in extra {
            self.add_keyword(keyword.as_ref());
        }
        self
    }

    /// Adds a term. Blank and already-known terms are ignored; returns
    /// whether the list grew.
    pub fn add_keyword(&mut self, keyword: &str) -> bool {
        let normalized = normalize(keyword.trim());
        if normalized.is_empty() || self.keywords.contains(&normalized) {
            return false;
        }
        self.keywords.push(normalized);
        true
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn detect(&self, text: &str) -> bool {
        let haystack = normalize(text);
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    /// Terms found in the text, in list order.
    pub fn matched_keywords(&self, text: &str) -> Vec<&str> {
        let haystack = normalize(text);
        self.keywords
            .iter()
            .filter(|k| haystack.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }
}

impl Default for EmergencyDetector {
    fn default() -> Self {
        Self::standard()
    }
}

// Speech-to-text output often carries typographic apostrophes.
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}
