//! End-to-end play-throughs: author a room, then solve it by code.

use chrono::{Duration, Utc};
use escaperoom::escape::{
    AnswerOutcome, EscapeError, GameplayEngine, GameplaySettings, IconType, IconView,
    MemoryStore, PlacedItem, RoomData, RoomEditor, SharedStore, SlotState,
};

fn author(store: &SharedStore, icons: &[(IconType, &str, &str)]) -> (RoomData, Vec<PlacedItem>) {
    let editor = RoomEditor::new(store.clone(), "ms-lee");
    let mut placed = Vec::new();
    for (icon_type, question, answer) in icons {
        let item = editor.add_icon(*icon_type);
        if !icon_type.is_chest() {
            let q = editor.open_question_editor(&item.id).unwrap();
            editor.set_question_text(&q.id, question).unwrap();
            editor.set_answer(&q.id, 0, answer).unwrap();
        }
        placed.push(item);
    }
    (editor.validate_and_save().unwrap(), placed)
}

fn play(store: &SharedStore, room: &RoomData) -> GameplayEngine {
    let registry = escaperoom::escape::RoomRegistry::new(store.clone());
    GameplayEngine::load(
        store.clone(),
        &registry,
        &room.room_code,
        GameplaySettings::default(),
    )
    .unwrap()
}

#[test]
fn sky_room_is_won_with_a_lowercase_fragment() {
    let store = MemoryStore::shared();
    let editor = RoomEditor::new(store.clone(), "ms-lee");
    let key = editor.add_icon(IconType::Key);
    editor.move_icon(&key.id, 30.0, 40.0);
    editor.add_icon(IconType::Chest);
    let q = editor.open_question_editor(&key.id).unwrap();
    editor.set_question_text(&q.id, "color of sky").unwrap();
    editor.set_answer(&q.id, 0, "blue").unwrap();
    let room = editor.validate_and_save().unwrap();

    let mut engine = play(&store, &room);
    match engine.open_icon(&key.id).unwrap() {
        IconView::Unsolved { question, story, .. } => {
            assert_eq!(question, "color of sky");
            assert!(!story.is_empty());
        }
        other => panic!("unexpected view {:?}", other),
    }

    let fragment = match engine.submit_answer(&key.id, "Blue").unwrap() {
        AnswerOutcome::Correct { fragment } => fragment,
        other => panic!("expected a fragment, got {:?}", other),
    };
    assert!((3..=5).contains(&fragment.len()));
    assert!(fragment
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    let update = engine.set_lock_value(0, &fragment.to_lowercase()).unwrap();
    assert_eq!(update.state, SlotState::Unlocked);
    assert!(update.chest_open);
    assert_eq!(engine.state().chest_answer, fragment);

    let opened = engine.open_chest().unwrap();
    assert!(engine.poll_win(opened).is_none(), "win waits for the delay");
    let win = engine
        .poll_win(opened + Duration::milliseconds(1500))
        .expect("win after delay");
    assert_eq!(win.room_code, room.room_code);
    assert!(engine.poll_win(Utc::now() + Duration::hours(1)).is_none());
}

#[test]
fn half_unlocked_chest_gives_no_win() {
    let store = MemoryStore::shared();
    let (room, placed) = author(
        &store,
        &[
            (IconType::Barrel, "what holds wine", "barrel"),
            (IconType::Torch, "what burns", "fire"),
            (IconType::Chest, "", ""),
        ],
    );
    let mut engine = play(&store, &room);
    assert_eq!(engine.lock_slot_count(), 2);

    let barrel = match engine.submit_answer(&placed[0].id, "BARREL ").unwrap() {
        AnswerOutcome::Correct { fragment } => fragment,
        other => panic!("expected a fragment, got {:?}", other),
    };
    assert_eq!(
        engine.submit_answer(&placed[1].id, "water").unwrap(),
        AnswerOutcome::Incorrect { attempts_left: None }
    );

    let update = engine.set_lock_value(0, &barrel).unwrap();
    assert_eq!((update.unlocked, update.required), (1, 2));
    assert!(!update.chest_open);
    assert!(matches!(
        engine.open_chest(),
        Err(EscapeError::ChestLocked {
            unlocked: 1,
            required: 2
        })
    ));
    assert!(engine.poll_win(Utc::now() + Duration::hours(1)).is_none());

    let progress = engine.progress();
    assert_eq!((progress.solved, progress.puzzles), (1, 2));
    assert!(!progress.chest_open);
}

#[test]
fn alternate_answer_is_accepted() {
    let store = MemoryStore::shared();
    let editor = RoomEditor::new(store.clone(), "ms-lee");
    let treasure = editor.add_icon(IconType::Treasure);
    editor.add_icon(IconType::Chest);
    let q = editor.open_question_editor(&treasure.id).unwrap();
    editor.set_question_text(&q.id, "shiny yellow metal").unwrap();
    editor.set_answer(&q.id, 0, "gold").unwrap();
    editor.add_answer_slot(&q.id).unwrap();
    editor.set_answer(&q.id, 1, "Au").unwrap();
    let room = editor.validate_and_save().unwrap();

    let mut engine = play(&store, &room);
    assert!(matches!(
        engine.submit_answer(&treasure.id, " au ").unwrap(),
        AnswerOutcome::Correct { .. }
    ));
}

#[test]
fn progress_resumes_across_sessions() {
    let store = MemoryStore::shared();
    let (room, placed) = author(
        &store,
        &[
            (IconType::Key, "color of sky", "blue"),
            (IconType::Chest, "", ""),
        ],
    );
    let fragment = {
        let mut engine = play(&store, &room);
        match engine.submit_answer(&placed[0].id, "blue").unwrap() {
            AnswerOutcome::Correct { fragment } => fragment,
            other => panic!("expected a fragment, got {:?}", other),
        }
    };

    let mut engine = play(&store, &room);
    assert_eq!(engine.state().collected_key_codes, vec![fragment.clone()]);
    assert!(engine.set_lock_value(0, &fragment).unwrap().chest_open);
}

#[test]
fn unknown_room_code_is_not_found() {
    let store = MemoryStore::shared();
    let registry = escaperoom::escape::RoomRegistry::new(store.clone());
    assert!(matches!(
        GameplayEngine::load(store, &registry, "NOPE2345", GameplaySettings::default()),
        Err(EscapeError::NotFound(_))
    ));
}
