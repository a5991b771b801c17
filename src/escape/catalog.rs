//! Server-side room catalog.
//!
//! Rooms published here get a UUID `room_id`, separate from the room codes
//! used by the local [`RoomRegistry`](crate::escape::registry::RoomRegistry).
//! Unlike the play-side stores, catalog operations propagate storage errors.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::escape::errors::EscapeError;
use crate::escape::storage::{save_snapshot, SharedStore, CATALOG_PREFIX};
use crate::escape::types::{PlacedItem, Question};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRoom {
    pub room_id: String,
    pub icon_layout: Vec<PlacedItem>,
    pub questions: Vec<Question>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog room as handed to players: no author identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayableRoom {
    pub room_id: String,
    pub icon_layout: Vec<PlacedItem>,
    pub questions: Vec<Question>,
}

impl From<CatalogRoom> for PlayableRoom {
    fn from(room: CatalogRoom) -> Self {
        Self {
            room_id: room.room_id,
            icon_layout: room.icon_layout,
            questions: room.questions,
        }
    }
}

pub struct RoomCatalog {
    store: SharedStore,
}

impl RoomCatalog {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    fn key(room_id: &str) -> String {
        format!("{}{}", CATALOG_PREFIX, room_id)
    }

    fn read(&self, room_id: &str) -> Result<CatalogRoom, EscapeError> {
        let bytes = self
            .store
            .get(&Self::key(room_id))?
            .ok_or_else(|| EscapeError::NotFound(format!("catalog room: {}", room_id)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn create(
        &self,
        icon_layout: Vec<PlacedItem>,
        questions: Vec<Question>,
        user_name: &str,
    ) -> Result<CatalogRoom, EscapeError> {
        let now = Utc::now();
        let room = CatalogRoom {
            room_id: Uuid::new_v4().to_string(),
            icon_layout,
            questions,
            created_by: user_name.to_string(),
            created_at: now,
            updated_at: now,
        };
        save_snapshot(self.store.as_ref(), &Self::key(&room.room_id), &room)?;
        info!("Catalog: created room {} for {}", room.room_id, user_name);
        Ok(room)
    }

    /// Every catalog room, oldest first.
    pub fn list(&self) -> Result<Vec<CatalogRoom>, EscapeError> {
        let mut rooms = Vec::new();
        for key in self.store.keys_with_prefix(CATALOG_PREFIX)? {
            if let Some(id) = key.strip_prefix(CATALOG_PREFIX) {
                rooms.push(self.read(id)?);
            }
        }
        rooms.sort_by_key(|r| r.created_at);
        Ok(rooms)
    }

    pub fn get(&self, room_id: &str) -> Result<CatalogRoom, EscapeError> {
        self.read(room_id)
    }

    pub fn update(
        &self,
        room_id: &str,
        icon_layout: Vec<PlacedItem>,
        questions: Vec<Question>,
    ) -> Result<CatalogRoom, EscapeError> {
        let mut room = self.read(room_id)?;
        room.icon_layout = icon_layout;
        room.questions = questions;
        room.updated_at = Utc::now();
        save_snapshot(self.store.as_ref(), &Self::key(room_id), &room)?;
        info!("Catalog: updated room {}", room_id);
        Ok(room)
    }

    /// Fetch a room for play with the author stripped.
    pub fn play(&self, room_id: &str) -> Result<PlayableRoom, EscapeError> {
        self.read(room_id).map(PlayableRoom::from)
    }
}
