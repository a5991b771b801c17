//! Rooms and progress persisted through the sled backend.

use std::sync::Arc;

use escaperoom::escape::{
    AnswerOutcome, GameplayEngine, GameplaySettings, IconType, RoomEditor, RoomRegistry,
    SharedStore, SledStoreBuilder,
};
use tempfile::TempDir;

fn open(dir: &TempDir) -> SharedStore {
    Arc::new(SledStoreBuilder::new(dir.path()).open().unwrap())
}

#[test]
fn room_and_progress_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let (code, key_id, fragment) = {
        let store = open(&dir);
        let editor = RoomEditor::new(store.clone(), "ms-lee");
        let key = editor.add_icon(IconType::Key);
        editor.add_icon(IconType::Chest);
        let q = editor.open_question_editor(&key.id).unwrap();
        editor.set_question_text(&q.id, "color of sky").unwrap();
        editor.set_answer(&q.id, 0, "blue").unwrap();
        let room = editor.validate_and_save().unwrap();

        let mut engine = GameplayEngine::load(
            store,
            editor.registry(),
            &room.room_code,
            GameplaySettings::default(),
        )
        .unwrap();
        let fragment = match engine.submit_answer(&key.id, "blue").unwrap() {
            AnswerOutcome::Correct { fragment } => fragment,
            other => panic!("expected a fragment, got {:?}", other),
        };
        (room.room_code, key.id, fragment)
    };

    let store = open(&dir);
    let registry = RoomRegistry::new(store.clone());
    assert_eq!(registry.list().len(), 1);
    let engine =
        GameplayEngine::load(store, &registry, &code, GameplaySettings::default()).unwrap();
    assert_eq!(engine.state().fragment_for(&key_id), Some(fragment.as_str()));
}

#[test]
fn editor_draft_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let key = {
        let editor = RoomEditor::new(open(&dir), "ms-lee");
        let key = editor.add_icon(IconType::Torch);
        editor.move_icon(&key.id, 12.5, 87.5);
        key
    };
    let editor = RoomEditor::new(open(&dir), "ms-lee");
    let icons = editor.icons();
    assert_eq!(icons.len(), 1);
    assert_eq!(icons[0].id, key.id);
    assert_eq!((icons[0].x, icons[0].y), (12.5, 87.5));
}
