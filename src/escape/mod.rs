//! Escape room core: authoring stores, room registry, editor, and the
//! gameplay engine.
//!
//! Components are constructed explicitly around a [`SharedStore`] handle at
//! session start; nothing in this module keeps ambient global state.

pub mod catalog;
pub mod codes;
pub mod commands;
pub mod countdown;
pub mod draft;
pub mod editor;
pub mod errors;
pub mod gameplay;
pub mod layout;
pub mod questions;
pub mod registry;
pub mod storage;
pub mod types;

pub use catalog::{CatalogRoom, PlayableRoom, RoomCatalog};
pub use codes::{generate_key_fragment, RoomCodeFormat};
pub use commands::{parse_play_command, PlayCommand, PlayShell, ShellReply};
pub use countdown::{Countdown, TimeLimit};
pub use draft::RoomDraft;
pub use editor::{validate_room, EditorRules, RoomEditor};
pub use errors::EscapeError;
pub use gameplay::{
    AnswerOutcome, GameplayEngine, GameplaySettings, IconView, Progress, SlotState, SlotUpdate,
    WinSignal,
};
pub use layout::LayoutStore;
pub use questions::QuestionStore;
pub use registry::RoomRegistry;
pub use storage::{KeyValueStore, MemoryStore, SharedStore, SledStore, SledStoreBuilder};
pub use types::*;
