use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const ROOM_SCHEMA_VERSION: u8 = 1;

/// Canvas coordinates are percentages of the room image.
pub const CANVAS_MIN: f64 = 0.0;
pub const CANVAS_MAX: f64 = 100.0;
/// New icons land in the middle of the canvas.
pub const DEFAULT_POSITION: (f64, f64) = (50.0, 50.0);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum IconType {
    Barrel,
    Chest,
    Key,
    Torch,
    Treasure,
}

impl IconType {
    pub const ALL: [IconType; 5] = [
        IconType::Barrel,
        IconType::Chest,
        IconType::Key,
        IconType::Torch,
        IconType::Treasure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IconType::Barrel => "barrel",
            IconType::Chest => "chest",
            IconType::Key => "key",
            IconType::Torch => "torch",
            IconType::Treasure => "treasure",
        }
    }

    pub fn is_chest(&self) -> bool {
        matches!(self, IconType::Chest)
    }

    /// Flavor text shown above the question when a player opens the icon.
    pub fn story(&self) -> &'static str {
        match self {
            IconType::Barrel => {
                "An old oak barrel sits in the corner. Something rattles inside, \
                 but the lid is sealed with a riddle carved into the wood."
            }
            IconType::Chest => {
                "A heavy treasure chest bound in iron. Each lock needs one of the \
                 key codes hidden around the room."
            }
            IconType::Key => {
                "A tarnished key hangs from a hook. A tag tied to it asks a question \
                 before it will reveal its code."
            }
            IconType::Torch => {
                "A flickering torch lights the wall. Words appear in the smoke, \
                 waiting for an answer."
            }
            IconType::Treasure => {
                "A small pile of coins glitters on the floor. Beneath it lies a \
                 scrap of parchment with a puzzle."
            }
        }
    }
}

impl fmt::Display for IconType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IconType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "barrel" => Ok(IconType::Barrel),
            "chest" => Ok(IconType::Chest),
            "key" => Ok(IconType::Key),
            "torch" => Ok(IconType::Torch),
            "treasure" => Ok(IconType::Treasure),
            other => Err(format!(
                "unknown icon type '{}' (expected barrel, chest, key, torch, treasure)",
                other
            )),
        }
    }
}

/// One interactive hotspot on the room canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub icon_type: IconType,
    pub x: f64,
    pub y: f64,
}

impl PlacedItem {
    pub fn new(icon_type: IconType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            icon_type,
            x: DEFAULT_POSITION.0,
            y: DEFAULT_POSITION.1,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = clamp_coordinate(x);
        self.y = clamp_coordinate(y);
        self
    }

    pub fn question_id(&self) -> String {
        question_id_for(&self.id)
    }
}

/// Clamp a drag coordinate into the canvas. NaN lands on the lower edge.
pub fn clamp_coordinate(value: f64) -> f64 {
    if value.is_nan() {
        return CANVAS_MIN;
    }
    value.clamp(CANVAS_MIN, CANVAS_MAX)
}

pub fn question_id_for(item_id: &str) -> String {
    format!("question-{}", item_id)
}

/// The riddle attached to a non-chest icon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub icon_type: IconType,
    pub question: String,
    pub expected_answers: Vec<String>,
}

impl Question {
    /// Fresh question for an icon: empty text and a single empty answer slot.
    pub fn for_item(item: &PlacedItem) -> Self {
        Self {
            id: item.question_id(),
            icon_type: item.icon_type,
            question: String::new(),
            expected_answers: vec![String::new()],
        }
    }

    pub fn item_id(&self) -> Option<&str> {
        self.id.strip_prefix("question-")
    }

    /// Case-insensitive, trim-insensitive exact match against any accepted answer.
    pub fn accepts(&self, answer: &str) -> bool {
        let submitted = normalize_answer(answer);
        self.expected_answers
            .iter()
            .any(|expected| normalize_answer(expected) == submitted)
    }
}

pub fn normalize_answer(text: &str) -> String {
    text.trim().to_lowercase()
}

/// A finished, validated escape room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomData {
    pub room_code: String,
    pub icon_layout: Vec<PlacedItem>,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
}

fn default_schema_version() -> u8 {
    ROOM_SCHEMA_VERSION
}

impl RoomData {
    pub fn new(
        room_code: impl Into<String>,
        icon_layout: Vec<PlacedItem>,
        questions: Vec<Question>,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            room_code: room_code.into(),
            icon_layout,
            questions,
            created_at: Utc::now(),
            created_by: created_by.into(),
            schema_version: ROOM_SCHEMA_VERSION,
        }
    }

    pub fn item(&self, item_id: &str) -> Option<&PlacedItem> {
        self.icon_layout.iter().find(|item| item.id == item_id)
    }

    pub fn question_for(&self, item_id: &str) -> Option<&Question> {
        let qid = question_id_for(item_id);
        self.questions.iter().find(|q| q.id == qid)
    }

    pub fn chest(&self) -> Option<&PlacedItem> {
        self.icon_layout.iter().find(|item| item.icon_type.is_chest())
    }

    pub fn puzzle_items(&self) -> impl Iterator<Item = &PlacedItem> {
        self.icon_layout
            .iter()
            .filter(|item| !item.icon_type.is_chest())
    }

    /// Number of chest lock slots: one per non-chest icon.
    pub fn lock_slot_count(&self) -> usize {
        self.puzzle_items().count()
    }
}

/// Per-play-through progress for one room.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameplayState {
    pub collected_key_codes: Vec<String>,
    pub chest_answer: String,
    /// Icon id to the fragment issued when it was solved.
    #[serde(default)]
    pub solved: BTreeMap<String, String>,
    /// Raw chest lock inputs, one per slot.
    #[serde(default)]
    pub lock_inputs: Vec<String>,
    /// Wrong answers submitted per icon; only consulted when attempts are capped.
    #[serde(default)]
    pub attempts: BTreeMap<String, u32>,
    /// When the chest opened; unset while any lock is still closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chest_opened_at: Option<DateTime<Utc>>,
    /// Set once the win signal has been handed to the host.
    #[serde(default)]
    pub win_delivered: bool,
}

impl GameplayState {
    pub fn is_solved(&self, item_id: &str) -> bool {
        self.solved.contains_key(item_id)
    }

    pub fn fragment_for(&self, item_id: &str) -> Option<&str> {
        self.solved.get(item_id).map(String::as_str)
    }
}
