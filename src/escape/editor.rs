//! Room editor: the authoring surface for a single draft room.
//!
//! Every command reads the full draft from the layout and question stores,
//! applies one change, and writes the result back. Limits on icon count and
//! chest count are only enforced by [`RoomEditor::validate_and_save`], so an
//! author can pass through invalid intermediate states while arranging icons.

use log::{debug, info, warn};

use crate::escape::codes::RoomCodeFormat;
use crate::escape::errors::EscapeError;
use crate::escape::layout::LayoutStore;
use crate::escape::questions::{QuestionStore, DEFAULT_MAX_ANSWER_SLOTS};
use crate::escape::registry::RoomRegistry;
use crate::escape::storage::SharedStore;
use crate::escape::types::{IconType, PlacedItem, Question, RoomData};
use crate::logutil::escape_log;
use crate::validation::{word_count, ValidationViolation, WordRule};

pub const DEFAULT_MAX_ICONS: usize = 5;

/// Structural and text limits checked on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorRules {
    pub max_icons: usize,
    pub max_answers: usize,
    pub words: WordRule,
}

impl Default for EditorRules {
    fn default() -> Self {
        Self {
            max_icons: DEFAULT_MAX_ICONS,
            max_answers: DEFAULT_MAX_ANSWER_SLOTS,
            words: WordRule::default(),
        }
    }
}

pub struct RoomEditor {
    layout: LayoutStore,
    questions: QuestionStore,
    registry: RoomRegistry,
    rules: EditorRules,
    author: String,
}

impl RoomEditor {
    pub fn new(store: SharedStore, author: impl Into<String>) -> Self {
        Self::with_rules(store, author, EditorRules::default())
    }

    pub fn with_rules(store: SharedStore, author: impl Into<String>, rules: EditorRules) -> Self {
        Self {
            layout: LayoutStore::new(store.clone()),
            questions: QuestionStore::with_max_answers(store.clone(), rules.max_answers),
            registry: RoomRegistry::new(store),
            rules,
            author: author.into(),
        }
    }

    /// Use a registry configured elsewhere (custom code lengths).
    pub fn with_registry(mut self, registry: RoomRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn rules(&self) -> &EditorRules {
        &self.rules
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn icons(&self) -> Vec<PlacedItem> {
        self.layout.load()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.questions.load()
    }

    pub fn question_for(&self, icon_id: &str) -> Option<Question> {
        self.questions.for_item(icon_id)
    }

    /// Place a new icon at the canvas center. No limits are checked here.
    pub fn add_icon(&self, icon_type: IconType) -> PlacedItem {
        self.layout.add(icon_type)
    }

    /// Move an icon, clamping coordinates into the canvas. Unknown ids are ignored.
    pub fn move_icon(&self, icon_id: &str, x: f64, y: f64) -> Option<(f64, f64)> {
        let moved = self.layout.move_to(icon_id, x, y);
        if moved.is_none() {
            debug!("move_icon: unknown icon {}", icon_id);
        }
        moved
    }

    /// Remove an icon and its question. Unknown ids are a no-op.
    pub fn delete_icon(&self, icon_id: &str) -> bool {
        let removed = self.layout.remove(icon_id).is_some();
        let orphan = self.questions.remove_for_item(icon_id);
        if orphan && !removed {
            debug!("delete_icon: dropped orphaned question for {}", icon_id);
        }
        removed
    }

    /// Return the icon's question, creating it with the icon's current type if needed.
    pub fn open_question_editor(&self, icon_id: &str) -> Result<Question, EscapeError> {
        let item = self
            .layout
            .get(icon_id)
            .ok_or_else(|| EscapeError::UnknownIcon(icon_id.to_string()))?;
        if item.icon_type.is_chest() {
            return Err(EscapeError::ChestHasNoQuestion);
        }
        Ok(self.questions.ensure_for(&item))
    }

    pub fn set_question_text(&self, question_id: &str, text: &str) -> Result<Question, EscapeError> {
        self.questions.set_text(question_id, text)
    }

    pub fn set_answer(
        &self,
        question_id: &str,
        index: usize,
        text: &str,
    ) -> Result<Question, EscapeError> {
        self.questions.set_answer(question_id, index, text)
    }

    pub fn add_answer_slot(&self, question_id: &str) -> Result<Question, EscapeError> {
        self.questions.add_answer_slot(question_id)
    }

    pub fn remove_answer_slot(&self, question_id: &str, index: usize) -> Result<Question, EscapeError> {
        self.questions.remove_answer_slot(question_id, index)
    }

    /// Check the draft against every save rule and return all violations.
    pub fn validate(&self) -> Vec<ValidationViolation> {
        let items = self.layout.load();
        let questions = self.questions.load();
        validate_room(&items, &questions, &self.rules)
    }

    /// Validate the draft and, when it passes, store it as a new room.
    ///
    /// On failure nothing is stored and the draft stays as it was.
    pub fn validate_and_save(&self) -> Result<RoomData, EscapeError> {
        let items = self.layout.load();
        let questions = self.questions.load();
        let violations = validate_room(&items, &questions, &self.rules);
        if !violations.is_empty() {
            warn!(
                "Room save blocked by {} rule(s): {}",
                violations.len(),
                escape_log(
                    &violations
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join("; ")
                )
            );
            return Err(EscapeError::Validation(violations));
        }

        // Only questions belonging to icons still on the canvas go into the room.
        let questions: Vec<Question> = items
            .iter()
            .filter(|item| !item.icon_type.is_chest())
            .filter_map(|item| {
                let qid = item.question_id();
                questions.iter().find(|q| q.id == qid).cloned()
            })
            .collect();

        let code = self.registry.generate_room_code(RoomCodeFormat::Editor);
        let room = RoomData::new(code, items, questions, self.author.clone());
        let stored = self.registry.store(room)?;
        info!("Room {} saved by {}", stored.room_code, stored.created_by);
        Ok(stored)
    }

    /// Discard the draft to start a new room.
    pub fn clear(&self) {
        self.layout.clear();
        self.questions.clear();
    }
}

/// Apply the save rules to a layout and question set.
pub fn validate_room(
    items: &[PlacedItem],
    questions: &[Question],
    rules: &EditorRules,
) -> Vec<ValidationViolation> {
    let mut violations = Vec::new();

    if items.is_empty() {
        violations.push(ValidationViolation::NoIcons);
    }
    if items.len() > rules.max_icons {
        violations.push(ValidationViolation::TooManyIcons {
            count: items.len(),
            max: rules.max_icons,
        });
    }
    let chests = items.iter().filter(|i| i.icon_type.is_chest()).count();
    match chests {
        0 => violations.push(ValidationViolation::MissingChest),
        1 => {}
        count => violations.push(ValidationViolation::MultipleChests { count }),
    }

    for item in items.iter().filter(|i| !i.icon_type.is_chest()) {
        let qid = item.question_id();
        let Some(question) = questions.iter().find(|q| q.id == qid) else {
            violations.push(ValidationViolation::MissingQuestion {
                icon_id: item.id.clone(),
                icon_type: item.icon_type.to_string(),
            });
            continue;
        };
        violations.extend(validate_question(&item.id, question, rules));
    }

    violations
}

fn validate_question(
    icon_id: &str,
    question: &Question,
    rules: &EditorRules,
) -> Vec<ValidationViolation> {
    let mut violations = Vec::new();
    let WordRule {
        min_words,
        max_words,
    } = rules.words;

    if !rules.words.accepts(&question.question) {
        violations.push(ValidationViolation::QuestionWordCount {
            icon_id: icon_id.to_string(),
            words: word_count(&question.question),
            min: min_words,
            max: max_words,
        });
    }

    let count = question.expected_answers.len();
    if count == 0 || count > rules.max_answers {
        violations.push(ValidationViolation::AnswerCount {
            icon_id: icon_id.to_string(),
            count,
            max: rules.max_answers,
        });
    }

    for (index, answer) in question.expected_answers.iter().enumerate() {
        if !rules.words.accepts(answer) {
            violations.push(ValidationViolation::AnswerWordCount {
                icon_id: icon_id.to_string(),
                index,
                words: word_count(answer),
                min: min_words,
                max: max_words,
            });
        }
    }

    violations
}
