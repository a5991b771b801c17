//! Gameplay engine: drives one player through a stored room.
//!
//! Each non-chest icon starts unsolved. A correct answer solves it for good
//! and awards one random key-code fragment. The chest has one lock slot per
//! non-chest icon; a slot unlocks when its entered value matches a collected
//! fragment that no other unlocked slot is already using. When every slot is
//! unlocked the chest opens, and after a fixed delay a single win signal is
//! handed to the host.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};

use crate::escape::codes::{fragment_matches, generate_key_fragment};
use crate::escape::countdown::TimeLimit;
use crate::escape::errors::EscapeError;
use crate::escape::registry::RoomRegistry;
use crate::escape::storage::{gameplay_key, load_snapshot, save_snapshot_lossy, SharedStore};
use crate::escape::types::{GameplayState, PlacedItem, RoomData};
use crate::logutil::escape_log;

pub const DEFAULT_WIN_DELAY_MS: i64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameplaySettings {
    /// Delay between the chest opening and the win signal.
    pub win_delay: Duration,
    /// Reject answers and lock input once an observed time limit expires.
    pub enforce_time_limit: bool,
    /// Wrong answers allowed per icon; `None` means unlimited.
    pub max_answer_attempts: Option<u32>,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            win_delay: Duration::milliseconds(DEFAULT_WIN_DELAY_MS),
            enforce_time_limit: false,
            max_answer_attempts: None,
        }
    }
}

/// What the player sees when opening an icon.
#[derive(Debug, Clone, PartialEq)]
pub enum IconView {
    Unsolved {
        item: PlacedItem,
        story: &'static str,
        question: String,
    },
    Solved {
        item: PlacedItem,
        fragment: String,
    },
    Chest {
        item: PlacedItem,
        story: &'static str,
        slots: Vec<SlotState>,
        open: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct { fragment: String },
    /// Generic incorrect-answer signal. `attempts_left` is only set when attempts are capped.
    Incorrect { attempts_left: Option<u32> },
    AlreadySolved { fragment: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotUpdate {
    pub slot: usize,
    pub state: SlotState,
    pub unlocked: usize,
    pub required: usize,
    pub chest_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinSignal {
    pub room_code: String,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub solved: usize,
    pub puzzles: usize,
    pub unlocked: usize,
    pub required: usize,
    pub chest_open: bool,
}

#[derive(Debug, Clone, Default)]
struct LockSlot {
    value: String,
    /// Index into `collected_key_codes` this slot is consuming.
    bound: Option<usize>,
}

pub struct GameplayEngine {
    store: SharedStore,
    room: RoomData,
    state: GameplayState,
    slots: Vec<LockSlot>,
    settings: GameplaySettings,
    time_limit: Option<Arc<dyn TimeLimit>>,
}

impl GameplayEngine {
    /// Look up `room_code` in the registry and resume any saved progress.
    pub fn load(
        store: SharedStore,
        registry: &RoomRegistry,
        room_code: &str,
        settings: GameplaySettings,
    ) -> Result<Self, EscapeError> {
        let room = registry
            .find_by_code(room_code)
            .ok_or_else(|| EscapeError::NotFound(format!("room: {}", room_code)))?;
        Ok(Self::for_room(store, room, settings))
    }

    pub fn for_room(store: SharedStore, room: RoomData, settings: GameplaySettings) -> Self {
        let mut state: GameplayState =
            load_snapshot(store.as_ref(), &gameplay_key(&room.room_code)).unwrap_or_default();
        state.solved.retain(|id, _| room.item(id).is_some());

        let mut engine = Self {
            slots: vec![LockSlot::default(); room.lock_slot_count()],
            store,
            room,
            state,
            settings,
            time_limit: None,
        };
        engine.restore_lock_inputs();
        info!(
            "Loaded room {} ({} puzzles, {} fragments collected)",
            engine.room.room_code,
            engine.slots.len(),
            engine.state.collected_key_codes.len()
        );
        engine
    }

    fn restore_lock_inputs(&mut self) {
        let inputs = std::mem::take(&mut self.state.lock_inputs);
        for (slot, value) in inputs.iter().enumerate().take(self.slots.len()) {
            self.reconcile_slot(slot, value);
        }
        self.sync_chest_answer();
        if self.unlocked_count() < self.slots.len() {
            // Saved inputs no longer open every lock.
            self.state.chest_opened_at = None;
            self.state.win_delivered = false;
        } else if self.state.chest_opened_at.is_none() && !self.slots.is_empty() {
            self.state.chest_opened_at = Some(Utc::now());
        }
    }

    /// Let the engine observe a host-owned countdown.
    pub fn observe_time_limit(&mut self, limit: Arc<dyn TimeLimit>) {
        self.time_limit = Some(limit);
    }

    /// Stop observing any countdown.
    pub fn clear_time_limit(&mut self) {
        self.time_limit = None;
    }

    pub fn room(&self) -> &RoomData {
        &self.room
    }

    pub fn state(&self) -> &GameplayState {
        &self.state
    }

    pub fn settings(&self) -> &GameplaySettings {
        &self.settings
    }

    fn check_time(&self) -> Result<(), EscapeError> {
        if !self.settings.enforce_time_limit {
            return Ok(());
        }
        match &self.time_limit {
            Some(limit) if limit.is_expired() => Err(EscapeError::TimeExpired),
            _ => Ok(()),
        }
    }

    fn persist(&self) {
        save_snapshot_lossy(
            self.store.as_ref(),
            &gameplay_key(&self.room.room_code),
            &self.state,
        );
    }

    fn item(&self, icon_id: &str) -> Result<&PlacedItem, EscapeError> {
        self.room
            .item(icon_id)
            .ok_or_else(|| EscapeError::UnknownIcon(icon_id.to_string()))
    }

    /// Show an icon: story and question while unsolved, the awarded fragment once solved.
    pub fn open_icon(&self, icon_id: &str) -> Result<IconView, EscapeError> {
        let item = self.item(icon_id)?.clone();
        if item.icon_type.is_chest() {
            return Ok(IconView::Chest {
                story: item.icon_type.story(),
                item,
                slots: self.lock_slots(),
                open: self.is_chest_open(),
            });
        }
        if let Some(fragment) = self.state.fragment_for(&item.id) {
            return Ok(IconView::Solved {
                fragment: fragment.to_string(),
                item,
            });
        }
        let question = self
            .room
            .question_for(&item.id)
            .map(|q| q.question.clone())
            .unwrap_or_default();
        Ok(IconView::Unsolved {
            story: item.icon_type.story(),
            item,
            question,
        })
    }

    /// Check an answer for an icon. Wrong answers can be retried without limit
    /// unless attempts are capped in the settings.
    pub fn submit_answer(&mut self, icon_id: &str, answer: &str) -> Result<AnswerOutcome, EscapeError> {
        self.check_time()?;
        let item = self.item(icon_id)?.clone();
        if item.icon_type.is_chest() {
            return Err(EscapeError::ChestHasNoQuestion);
        }
        if let Some(fragment) = self.state.fragment_for(&item.id) {
            return Ok(AnswerOutcome::AlreadySolved {
                fragment: fragment.to_string(),
            });
        }
        let used = self.state.attempts.get(&item.id).copied().unwrap_or(0);
        if let Some(max) = self.settings.max_answer_attempts {
            if used >= max {
                return Err(EscapeError::AttemptsExhausted(item.id));
            }
        }
        let question = self
            .room
            .question_for(&item.id)
            .ok_or_else(|| EscapeError::NotFound(format!("question for icon {}", item.id)))?;

        if question.accepts(answer) {
            let fragment = generate_key_fragment();
            self.state.collected_key_codes.push(fragment.clone());
            self.state.solved.insert(item.id.clone(), fragment.clone());
            self.persist();
            info!(
                "Room {}: {} {} solved",
                self.room.room_code, item.icon_type, item.id
            );
            return Ok(AnswerOutcome::Correct { fragment });
        }

        let used = used + 1;
        self.state.attempts.insert(item.id.clone(), used);
        self.persist();
        debug!(
            "Room {}: wrong answer for {}: {}",
            self.room.room_code,
            item.id,
            escape_log(answer)
        );
        Ok(AnswerOutcome::Incorrect {
            attempts_left: self
                .settings
                .max_answer_attempts
                .map(|max| max.saturating_sub(used)),
        })
    }

    pub fn lock_slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn lock_slots(&self) -> Vec<SlotState> {
        self.slots.iter().map(slot_state).collect()
    }

    pub fn unlocked_count(&self) -> usize {
        self.slots.iter().filter(|s| s.bound.is_some()).count()
    }

    pub fn is_chest_open(&self) -> bool {
        self.state.chest_opened_at.is_some()
    }

    /// True once the win signal has been delivered; the room is finished.
    pub fn is_won(&self) -> bool {
        self.state.win_delivered
    }

    /// Bind the slot to the first collected fragment it matches that no other
    /// slot holds. Only this slot is re-evaluated.
    fn reconcile_slot(&mut self, slot: usize, value: &str) {
        self.slots[slot].bound = None;
        self.slots[slot].value = value.to_string();
        let taken: Vec<usize> = self.slots.iter().filter_map(|s| s.bound).collect();
        let bound = self
            .state
            .collected_key_codes
            .iter()
            .enumerate()
            .find(|(idx, fragment)| !taken.contains(idx) && fragment_matches(value, fragment))
            .map(|(idx, _)| idx);
        self.slots[slot].bound = bound;
    }

    fn sync_chest_answer(&mut self) {
        self.state.lock_inputs = self.slots.iter().map(|s| s.value.clone()).collect();
        self.state.chest_answer = self
            .slots
            .iter()
            .map(|s| s.value.trim().to_uppercase())
            .collect::<Vec<_>>()
            .join("-");
    }

    /// Enter a value into one chest lock slot.
    pub fn set_lock_value(&mut self, slot: usize, value: &str) -> Result<SlotUpdate, EscapeError> {
        self.check_time()?;
        let len = self.slots.len();
        if slot >= len {
            return Err(EscapeError::LockSlotOutOfRange { index: slot, len });
        }
        if self.state.win_delivered {
            return Err(EscapeError::RoomCompleted(self.room.room_code.clone()));
        }
        self.reconcile_slot(slot, value);
        self.sync_chest_answer();

        let unlocked = self.unlocked_count();
        if unlocked == len {
            if self.state.chest_opened_at.is_none() {
                self.open_now();
            }
        } else if self.state.chest_opened_at.take().is_some() {
            info!(
                "Room {}: chest closed again ({}/{} locks open)",
                self.room.room_code, unlocked, len
            );
        }
        self.persist();

        Ok(SlotUpdate {
            slot,
            state: slot_state(&self.slots[slot]),
            unlocked,
            required: len,
            chest_open: self.is_chest_open(),
        })
    }

    fn open_now(&mut self) {
        self.state.chest_opened_at = Some(Utc::now());
        info!(
            "Room {}: chest opened with {} key codes",
            self.room.room_code,
            self.slots.len()
        );
    }

    /// Open the chest explicitly; fails while any slot is still locked.
    pub fn open_chest(&mut self) -> Result<DateTime<Utc>, EscapeError> {
        self.check_time()?;
        if let Some(at) = self.state.chest_opened_at {
            return Ok(at);
        }
        let unlocked = self.unlocked_count();
        let required = self.slots.len();
        if unlocked < required {
            return Err(EscapeError::ChestLocked { unlocked, required });
        }
        self.open_now();
        self.persist();
        Ok(self.state.chest_opened_at.unwrap_or_else(Utc::now))
    }

    /// When the chest has been open for the win delay, hand out the win signal once.
    pub fn poll_win(&mut self, now: DateTime<Utc>) -> Option<WinSignal> {
        let opened_at = self.state.chest_opened_at?;
        if self.state.win_delivered || now < opened_at + self.settings.win_delay {
            return None;
        }
        self.state.win_delivered = true;
        self.persist();
        info!("Room {} completed", self.room.room_code);
        Some(WinSignal {
            room_code: self.room.room_code.clone(),
            opened_at,
        })
    }

    /// Time until the win signal is due, if the chest is open and it has not been delivered.
    pub fn win_due_in(&self, now: DateTime<Utc>) -> Option<Duration> {
        let opened_at = self.state.chest_opened_at?;
        if self.state.win_delivered {
            return None;
        }
        let due = opened_at + self.settings.win_delay;
        Some(if due > now { due - now } else { Duration::zero() })
    }

    pub fn progress(&self) -> Progress {
        Progress {
            solved: self.state.solved.len(),
            puzzles: self.slots.len(),
            unlocked: self.unlocked_count(),
            required: self.slots.len(),
            chest_open: self.is_chest_open(),
        }
    }

    /// Throw away all progress for this room and start over.
    pub fn restart(&mut self) {
        self.state = GameplayState::default();
        self.slots = vec![LockSlot::default(); self.room.lock_slot_count()];
        self.clear_time_limit();
        if let Err(e) = self.store.remove(&gameplay_key(&self.room.room_code)) {
            warn!("Could not clear saved progress for {}: {}", self.room.room_code, e);
        }
        info!("Room {} restarted", self.room.room_code);
    }
}

fn slot_state(slot: &LockSlot) -> SlotState {
    if slot.bound.is_some() {
        SlotState::Unlocked
    } else if slot.value.trim().is_empty() {
        SlotState::Empty
    } else {
        SlotState::Locked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::storage::MemoryStore;
    use crate::escape::types::{IconType, Question};

    fn room_with(items: Vec<(IconType, &str)>) -> RoomData {
        let mut layout = Vec::new();
        let mut questions = Vec::new();
        for (i, (icon_type, answer)) in items.into_iter().enumerate() {
            let mut item = PlacedItem::new(icon_type);
            item.id = format!("item{}", i);
            if !icon_type.is_chest() {
                let mut q = Question::for_item(&item);
                q.question = format!("riddle {}", i);
                q.expected_answers = vec![answer.to_string()];
                questions.push(q);
            }
            layout.push(item);
        }
        RoomData::new("TESTROOM", layout, questions, "tester")
    }

    fn engine(room: RoomData) -> GameplayEngine {
        GameplayEngine::for_room(MemoryStore::shared(), room, GameplaySettings::default())
    }

    fn solve(engine: &mut GameplayEngine, id: &str, answer: &str) -> String {
        match engine.submit_answer(id, answer).unwrap() {
            AnswerOutcome::Correct { fragment } => fragment,
            other => panic!("expected correct answer, got {:?}", other),
        }
    }

    #[test]
    fn solved_icon_redisplays_its_fragment() {
        let mut engine = engine(room_with(vec![(IconType::Key, "blue"), (IconType::Chest, "")]));
        let fragment = solve(&mut engine, "item0", " Blue ");
        assert_eq!(
            engine.submit_answer("item0", "blue").unwrap(),
            AnswerOutcome::AlreadySolved {
                fragment: fragment.clone()
            }
        );
        assert_eq!(engine.state().collected_key_codes, vec![fragment.clone()]);
        match engine.open_icon("item0").unwrap() {
            IconView::Solved { fragment: shown, .. } => assert_eq!(shown, fragment),
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn wrong_answers_are_unlimited_by_default() {
        let mut engine = engine(room_with(vec![(IconType::Key, "blue"), (IconType::Chest, "")]));
        for _ in 0..50 {
            assert_eq!(
                engine.submit_answer("item0", "red").unwrap(),
                AnswerOutcome::Incorrect { attempts_left: None }
            );
        }
        assert!(matches!(
            engine.submit_answer("item0", "blue").unwrap(),
            AnswerOutcome::Correct { .. }
        ));
    }

    #[test]
    fn capped_attempts_lock_out_the_icon() {
        let settings = GameplaySettings {
            max_answer_attempts: Some(2),
            ..GameplaySettings::default()
        };
        let mut engine = GameplayEngine::for_room(
            MemoryStore::shared(),
            room_with(vec![(IconType::Key, "blue"), (IconType::Chest, "")]),
            settings,
        );
        assert_eq!(
            engine.submit_answer("item0", "red").unwrap(),
            AnswerOutcome::Incorrect {
                attempts_left: Some(1)
            }
        );
        engine.submit_answer("item0", "green").unwrap();
        assert!(matches!(
            engine.submit_answer("item0", "blue"),
            Err(EscapeError::AttemptsExhausted(_))
        ));
    }

    #[test]
    fn one_fragment_cannot_unlock_two_slots() {
        let mut engine = engine(room_with(vec![
            (IconType::Barrel, "wine"),
            (IconType::Torch, "fire"),
            (IconType::Chest, ""),
        ]));
        let a = solve(&mut engine, "item0", "wine");
        assert_eq!(engine.lock_slot_count(), 2);

        assert_eq!(engine.set_lock_value(0, &a).unwrap().state, SlotState::Unlocked);
        let second = engine.set_lock_value(1, &a.to_lowercase()).unwrap();
        assert_eq!(second.state, SlotState::Locked);
        assert!(!second.chest_open);

        // Releasing slot 0 does not re-evaluate slot 1 until it is edited.
        engine.set_lock_value(0, "x!").unwrap();
        assert_eq!(engine.lock_slots(), vec![SlotState::Locked, SlotState::Locked]);
        let retry = engine.set_lock_value(1, &a).unwrap();
        assert_eq!(retry.state, SlotState::Unlocked);
        assert_eq!(retry.unlocked, 1);
    }

    #[test]
    fn chest_opens_only_when_all_slots_unlock() {
        let mut engine = engine(room_with(vec![
            (IconType::Barrel, "wine"),
            (IconType::Torch, "fire"),
            (IconType::Chest, ""),
        ]));
        let a = solve(&mut engine, "item0", "wine");
        let b = solve(&mut engine, "item1", "fire");
        engine.set_lock_value(0, &a).unwrap();
        assert!(matches!(
            engine.open_chest(),
            Err(EscapeError::ChestLocked {
                unlocked: 1,
                required: 2
            })
        ));
        assert!(engine.poll_win(Utc::now() + Duration::hours(1)).is_none());

        let update = engine.set_lock_value(1, &b).unwrap();
        assert!(update.chest_open);
        assert!(engine.win_due_in(Utc::now()).is_some());
        let later = Utc::now() + Duration::seconds(10);
        let win = engine.poll_win(later).expect("win after delay");
        assert_eq!(win.room_code, "TESTROOM");
        assert!(engine.poll_win(later).is_none(), "win is delivered once");
    }

    #[test]
    fn relocking_a_slot_closes_the_chest_before_the_win() {
        let mut engine = engine(room_with(vec![(IconType::Key, "blue"), (IconType::Chest, "")]));
        let fragment = solve(&mut engine, "item0", "blue");
        assert!(engine.set_lock_value(0, &fragment).unwrap().chest_open);

        let update = engine.set_lock_value(0, "x!").unwrap();
        assert_eq!(update.state, SlotState::Locked);
        assert_eq!(update.unlocked, 0);
        assert!(!update.chest_open);
        assert!(!engine.progress().chest_open);
        assert!(engine.win_due_in(Utc::now()).is_none());
        assert!(engine.poll_win(Utc::now() + Duration::hours(1)).is_none());

        assert!(engine.set_lock_value(0, &fragment).unwrap().chest_open);
        assert!(engine.poll_win(Utc::now() + Duration::seconds(10)).is_some());
        assert!(matches!(
            engine.set_lock_value(0, "x!"),
            Err(EscapeError::RoomCompleted(_))
        ));
        assert!(engine.is_chest_open());
    }

    #[test]
    fn reloading_a_won_room_does_not_repeat_the_win() {
        let store = MemoryStore::shared();
        let room = room_with(vec![(IconType::Key, "blue"), (IconType::Chest, "")]);
        let opened_at = {
            let mut engine =
                GameplayEngine::for_room(store.clone(), room.clone(), GameplaySettings::default());
            let fragment = solve(&mut engine, "item0", "blue");
            engine.set_lock_value(0, &fragment).unwrap();
            let opened_at = engine.open_chest().unwrap();
            assert!(engine.poll_win(opened_at + Duration::seconds(10)).is_some());
            opened_at
        };

        let mut reloaded =
            GameplayEngine::for_room(store.clone(), room.clone(), GameplaySettings::default());
        assert!(reloaded.is_chest_open());
        assert!(reloaded.is_won());
        assert_eq!(reloaded.open_chest().unwrap(), opened_at);
        assert!(reloaded.win_due_in(Utc::now()).is_none());
        assert!(reloaded.poll_win(Utc::now() + Duration::hours(1)).is_none());
    }

    #[test]
    fn reloading_an_open_chest_keeps_its_open_time() {
        let store = MemoryStore::shared();
        let room = room_with(vec![(IconType::Key, "blue"), (IconType::Chest, "")]);
        let opened_at = {
            let mut engine =
                GameplayEngine::for_room(store.clone(), room.clone(), GameplaySettings::default());
            let fragment = solve(&mut engine, "item0", "blue");
            engine.set_lock_value(0, &fragment).unwrap();
            engine.open_chest().unwrap()
        };

        let mut reloaded = GameplayEngine::for_room(store, room, GameplaySettings::default());
        assert!(!reloaded.is_won());
        let win = reloaded
            .poll_win(opened_at + Duration::seconds(10))
            .expect("pending win survives reload");
        assert_eq!(win.opened_at, opened_at);
    }

    #[test]
    fn chest_only_room_opens_on_request() {
        let mut engine = engine(room_with(vec![(IconType::Chest, "")]));
        assert_eq!(engine.lock_slot_count(), 0);
        assert!(!engine.is_chest_open());
        engine.open_chest().unwrap();
        assert!(engine.is_chest_open());
    }

    #[test]
    fn progress_survives_reload_and_restart_clears_it() {
        let store = MemoryStore::shared();
        let room = room_with(vec![(IconType::Key, "blue"), (IconType::Chest, "")]);
        let fragment = {
            let mut engine =
                GameplayEngine::for_room(store.clone(), room.clone(), GameplaySettings::default());
            let f = solve(&mut engine, "item0", "blue");
            engine.set_lock_value(0, "wr-ng").unwrap();
            f
        };

        let mut engine =
            GameplayEngine::for_room(store.clone(), room.clone(), GameplaySettings::default());
        assert_eq!(engine.state().fragment_for("item0"), Some(fragment.as_str()));
        assert_eq!(engine.lock_slots(), vec![SlotState::Locked]);
        assert_eq!(engine.state().chest_answer, "WR-NG");

        engine.restart();
        assert!(engine.state().collected_key_codes.is_empty());
        assert_eq!(engine.lock_slots(), vec![SlotState::Empty]);

        let reloaded = GameplayEngine::for_room(store, room, GameplaySettings::default());
        assert!(reloaded.state().solved.is_empty());
    }

    #[test]
    fn unknown_icons_and_slots_are_errors() {
        let mut engine = engine(room_with(vec![(IconType::Key, "blue"), (IconType::Chest, "")]));
        assert!(matches!(
            engine.submit_answer("ghost", "x"),
            Err(EscapeError::UnknownIcon(_))
        ));
        assert!(matches!(
            engine.submit_answer("item1", "x"),
            Err(EscapeError::ChestHasNoQuestion)
        ));
        assert!(matches!(
            engine.set_lock_value(3, "x"),
            Err(EscapeError::LockSlotOutOfRange { index: 3, len: 1 })
        ));
    }
}
