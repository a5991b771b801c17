//! # Escaperoom - escape room authoring and gameplay engine
//!
//! An author places up to five icons on a room canvas, attaches a riddle and
//! one or two accepted answers to each non-chest icon, and saves the room
//! under a short room code. A player then opens the room by code, answers
//! each riddle to collect random key-code fragments, and enters those
//! fragments into the chest locks to win.
//!
//! ## Quick Start
//!
//! ```rust
//! use escaperoom::escape::{
//!     AnswerOutcome, GameplayEngine, GameplaySettings, IconType, MemoryStore, RoomEditor,
//! };
//!
//! # fn main() -> Result<(), escaperoom::escape::EscapeError> {
//! let store = MemoryStore::shared();
//! let editor = RoomEditor::new(store.clone(), "ms-lee");
//! let key = editor.add_icon(IconType::Key);
//! editor.add_icon(IconType::Chest);
//! let question = editor.open_question_editor(&key.id)?;
//! editor.set_question_text(&question.id, "color of sky")?;
//! editor.set_answer(&question.id, 0, "blue")?;
//! let room = editor.validate_and_save()?;
//!
//! let mut engine = GameplayEngine::load(
//!     store,
//!     editor.registry(),
//!     &room.room_code,
//!     GameplaySettings::default(),
//! )?;
//! if let AnswerOutcome::Correct { fragment } = engine.submit_answer(&key.id, "Blue")? {
//!     let update = engine.set_lock_value(0, &fragment.to_lowercase())?;
//!     assert!(update.chest_open);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`escape`] - stores, registry, editor, gameplay engine, countdown, catalog
//! - [`config`] - TOML configuration
//! - [`validation`] - word-count and room-code rules
//! - [`logutil`] - single-line escaping for logged user text

pub mod config;
pub mod escape;
pub mod logutil;
pub mod validation;
