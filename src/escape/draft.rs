//! Declarative room drafts.
//!
//! A draft file lists icons with their positions and riddles. Applying it
//! replays the same editor commands an author would issue by hand, so a
//! draft is validated exactly like an interactively built room.
//!
//! ```toml
//! author = "ms-lee"
//!
//! [[icons]]
//! type = "key"
//! x = 30
//! y = 40
//! question = "color of sky"
//! answers = ["blue"]
//!
//! [[icons]]
//! type = "chest"
//! x = 70
//! y = 60
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::escape::editor::RoomEditor;
use crate::escape::errors::EscapeError;
use crate::escape::types::{IconType, PlacedItem, DEFAULT_POSITION};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RoomDraft {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub icons: Vec<DraftIcon>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DraftIcon {
    #[serde(rename = "type")]
    pub icon_type: IconType,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answers: Vec<String>,
}

impl RoomDraft {
    pub fn from_toml_str(content: &str) -> Result<Self, EscapeError> {
        toml::from_str(content).map_err(|e| EscapeError::InvalidDraft(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, EscapeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Replace the editor's draft with this one, icon by icon.
    pub fn apply(&self, editor: &RoomEditor) -> Result<Vec<PlacedItem>, EscapeError> {
        editor.clear();
        let mut placed = Vec::with_capacity(self.icons.len());
        for icon in &self.icons {
            let item = editor.add_icon(icon.icon_type);
            let x = icon.x.unwrap_or(DEFAULT_POSITION.0);
            let y = icon.y.unwrap_or(DEFAULT_POSITION.1);
            editor.move_icon(&item.id, x, y);

            if icon.icon_type.is_chest() {
                if icon.question.is_some() || !icon.answers.is_empty() {
                    return Err(EscapeError::InvalidDraft(
                        "chest icons take key codes, not a question".to_string(),
                    ));
                }
            } else {
                let question = editor.open_question_editor(&item.id)?;
                if let Some(text) = &icon.question {
                    editor.set_question_text(&question.id, text)?;
                }
                for (index, answer) in icon.answers.iter().enumerate() {
                    if index > 0 {
                        editor.add_answer_slot(&question.id)?;
                    }
                    editor.set_answer(&question.id, index, answer)?;
                }
            }
            placed.push(item);
        }
        Ok(placed)
    }
}
