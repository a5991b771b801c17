//! Question store: per-icon riddles for the room currently being authored.

use log::debug;

use crate::escape::errors::EscapeError;
use crate::escape::storage::{load_snapshot, save_snapshot_lossy, SharedStore, QUESTIONS_KEY};
use crate::escape::types::{question_id_for, PlacedItem, Question};

/// Accepted-answer slots per question.
pub const MIN_ANSWER_SLOTS: usize = 1;
pub const DEFAULT_MAX_ANSWER_SLOTS: usize = 2;

pub struct QuestionStore {
    store: SharedStore,
    max_answer_slots: usize,
}

impl QuestionStore {
    pub fn new(store: SharedStore) -> Self {
        Self::with_max_answers(store, DEFAULT_MAX_ANSWER_SLOTS)
    }

    pub fn with_max_answers(store: SharedStore, max_answer_slots: usize) -> Self {
        Self {
            store,
            max_answer_slots: max_answer_slots.max(MIN_ANSWER_SLOTS),
        }
    }

    pub fn max_answer_slots(&self) -> usize {
        self.max_answer_slots
    }

    pub fn load(&self) -> Vec<Question> {
        load_snapshot(self.store.as_ref(), QUESTIONS_KEY).unwrap_or_default()
    }

    pub fn save(&self, questions: &[Question]) {
        save_snapshot_lossy(self.store.as_ref(), QUESTIONS_KEY, questions);
    }

    pub fn get(&self, question_id: &str) -> Option<Question> {
        self.load().into_iter().find(|q| q.id == question_id)
    }

    pub fn for_item(&self, item_id: &str) -> Option<Question> {
        self.get(&question_id_for(item_id))
    }

    /// Return the icon's question, creating an empty one on first open.
    pub fn ensure_for(&self, item: &PlacedItem) -> Question {
        let mut questions = self.load();
        let qid = item.question_id();
        if let Some(existing) = questions.iter().find(|q| q.id == qid) {
            return existing.clone();
        }
        let question = Question::for_item(item);
        questions.push(question.clone());
        self.save(&questions);
        debug!("Questions: created {}", qid);
        question
    }

    fn update<F>(&self, question_id: &str, f: F) -> Result<Question, EscapeError>
    where
        F: FnOnce(&mut Question, usize) -> Result<(), EscapeError>,
    {
        let mut questions = self.load();
        let question = questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or_else(|| EscapeError::UnknownQuestion(question_id.to_string()))?;
        f(question, self.max_answer_slots)?;
        let updated = question.clone();
        self.save(&questions);
        Ok(updated)
    }

    pub fn set_text(&self, question_id: &str, text: &str) -> Result<Question, EscapeError> {
        self.update(question_id, |q, _| {
            q.question = text.to_string();
            Ok(())
        })
    }

    pub fn set_answer(
        &self,
        question_id: &str,
        index: usize,
        text: &str,
    ) -> Result<Question, EscapeError> {
        self.update(question_id, |q, _| {
            let len = q.expected_answers.len();
            let slot = q
                .expected_answers
                .get_mut(index)
                .ok_or(EscapeError::AnswerIndexOutOfRange { index, len })?;
            *slot = text.to_string();
            Ok(())
        })
    }

    pub fn add_answer_slot(&self, question_id: &str) -> Result<Question, EscapeError> {
        self.update(question_id, |q, max| {
            if q.expected_answers.len() >= max {
                return Err(EscapeError::AnswerSlotLimit {
                    min: MIN_ANSWER_SLOTS,
                    max,
                });
            }
            q.expected_answers.push(String::new());
            Ok(())
        })
    }

    /// Drop the answer slot at `index`, keeping at least one.
    pub fn remove_answer_slot(&self, question_id: &str, index: usize) -> Result<Question, EscapeError> {
        self.update(question_id, |q, max| {
            let len = q.expected_answers.len();
            if len <= MIN_ANSWER_SLOTS {
                return Err(EscapeError::AnswerSlotLimit {
                    min: MIN_ANSWER_SLOTS,
                    max,
                });
            }
            if index >= len {
                return Err(EscapeError::AnswerIndexOutOfRange { index, len });
            }
            q.expected_answers.remove(index);
            Ok(())
        })
    }

    /// Remove the question attached to an icon, if any.
    pub fn remove_for_item(&self, item_id: &str) -> bool {
        let mut questions = self.load();
        let qid = question_id_for(item_id);
        let before = questions.len();
        questions.retain(|q| q.id != qid);
        if questions.len() == before {
            return false;
        }
        self.save(&questions);
        true
    }

    pub fn clear(&self) {
        self.save(&[]);
    }
}
