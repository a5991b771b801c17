//! Room registry: collision-free room codes and lookup by code.
//!
//! Rooms are kept as one snapshot list under a single key. This registry is
//! the local one used for solo play; the server-side catalog in
//! [`crate::escape::catalog`] keeps its own identifier space.

use std::collections::HashSet;

use log::{debug, info};

use crate::escape::codes::{draw_room_code, RoomCodeFormat};
use crate::escape::errors::EscapeError;
use crate::escape::storage::{load_snapshot, save_snapshot, SharedStore, ROOMS_KEY};
use crate::escape::types::RoomData;
use crate::validation::is_valid_room_code;

pub struct RoomRegistry {
    store: SharedStore,
    editor_code_length: usize,
    play_code_length: usize,
}

impl RoomRegistry {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            editor_code_length: RoomCodeFormat::Editor.default_length(),
            play_code_length: RoomCodeFormat::Play.default_length(),
        }
    }

    /// Override code lengths; values outside 6-8 fall back to the defaults.
    pub fn with_code_lengths(mut self, editor: usize, play: usize) -> Self {
        if (6..=8).contains(&editor) {
            self.editor_code_length = editor;
        }
        if (6..=8).contains(&play) {
            self.play_code_length = play;
        }
        self
    }

    pub fn code_length(&self, format: RoomCodeFormat) -> usize {
        match format {
            RoomCodeFormat::Editor => self.editor_code_length,
            RoomCodeFormat::Play => self.play_code_length,
        }
    }

    /// Every stored room, oldest first. Unreadable storage yields an empty list.
    pub fn list(&self) -> Vec<RoomData> {
        load_snapshot(self.store.as_ref(), ROOMS_KEY).unwrap_or_default()
    }

    pub fn codes(&self) -> HashSet<String> {
        self.list().into_iter().map(|room| room.room_code).collect()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.list().iter().any(|room| room.room_code == code)
    }

    /// Exact, case-sensitive lookup.
    pub fn find_by_code(&self, code: &str) -> Option<RoomData> {
        self.list().into_iter().find(|room| room.room_code == code)
    }

    /// Draw codes until one is not already taken.
    pub fn generate_room_code(&self, format: RoomCodeFormat) -> String {
        let taken = self.codes();
        let len = self.code_length(format);
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let code = draw_room_code(format, len);
            if !taken.contains(&code) {
                if attempts > 1 {
                    debug!("Room code found after {} draws", attempts);
                }
                return code;
            }
        }
    }

    /// Append a new room. The code must be well-formed and unused.
    pub fn store(&self, room: RoomData) -> Result<RoomData, EscapeError> {
        if !is_valid_room_code(&room.room_code) {
            return Err(EscapeError::InvalidRoomCode(room.room_code));
        }
        let mut rooms = self.list();
        if rooms.iter().any(|r| r.room_code == room.room_code) {
            return Err(EscapeError::DuplicateRoomCode(room.room_code));
        }
        rooms.push(room.clone());
        save_snapshot(self.store.as_ref(), ROOMS_KEY, &rooms)?;
        info!(
            "Stored room {} ({} icons) by {}",
            room.room_code,
            room.icon_layout.len(),
            room.created_by
        );
        Ok(room)
    }

    /// Replace the layout and questions of an existing room.
    pub fn update(&self, room: RoomData) -> Result<RoomData, EscapeError> {
        let mut rooms = self.list();
        let existing = rooms
            .iter_mut()
            .find(|r| r.room_code == room.room_code)
            .ok_or_else(|| EscapeError::NotFound(format!("room: {}", room.room_code)))?;
        existing.icon_layout = room.icon_layout;
        existing.questions = room.questions;
        let updated = existing.clone();
        save_snapshot(self.store.as_ref(), ROOMS_KEY, &rooms)?;
        info!("Updated room {}", updated.room_code);
        Ok(updated)
    }

    /// Store a copy of `room` under a freshly minted play code.
    pub fn register_for_play(&self, room: &RoomData) -> Result<RoomData, EscapeError> {
        let mut copy = room.clone();
        copy.room_code = self.generate_room_code(RoomCodeFormat::Play);
        self.store(copy)
    }
}
