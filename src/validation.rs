//! Authoring rules for rooms: word-count limits and room code format.

/// Default lower bound on whitespace-separated words in a question or answer.
pub const MIN_WORDS: usize = 1;
/// Default upper bound on whitespace-separated words in a question or answer.
pub const MAX_WORDS: usize = 500;

/// A single unmet requirement found while validating a room for save.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationViolation {
    #[error("room needs at least one icon")]
    NoIcons,

    #[error("room has {count} icons (maximum {max})")]
    TooManyIcons { count: usize, max: usize },

    #[error("room needs a chest icon")]
    MissingChest,

    #[error("room has {count} chest icons (only one allowed)")]
    MultipleChests { count: usize },

    #[error("icon {icon_id} ({icon_type}) has no question")]
    MissingQuestion { icon_id: String, icon_type: String },

    #[error("question for icon {icon_id} has {words} words (allowed {min}-{max})")]
    QuestionWordCount {
        icon_id: String,
        words: usize,
        min: usize,
        max: usize,
    },

    #[error("icon {icon_id} has {count} accepted answers (allowed 1-{max})")]
    AnswerCount {
        icon_id: String,
        count: usize,
        max: usize,
    },

    #[error("answer {index} for icon {icon_id} has {words} words (allowed {min}-{max})")]
    AnswerWordCount {
        icon_id: String,
        index: usize,
        words: usize,
        min: usize,
        max: usize,
    },
}

/// Word limits applied to question text and each accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRule {
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for WordRule {
    fn default() -> Self {
        Self {
            min_words: MIN_WORDS,
            max_words: MAX_WORDS,
        }
    }
}

impl WordRule {
    pub fn new(min_words: usize, max_words: usize) -> Self {
        Self {
            min_words,
            max_words,
        }
    }

    /// True when `text` holds an allowed number of words.
    pub fn accepts(&self, text: &str) -> bool {
        let words = word_count(text);
        words >= self.min_words && words <= self.max_words
    }
}

/// Count whitespace-separated words; blank text has zero words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Room codes are 6-8 characters of uppercase ASCII letters and digits.
pub fn is_valid_room_code(code: &str) -> bool {
    (6..=8).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
