//! Text shell driving a room, with and without a countdown.

use std::sync::Arc;
use std::time::Duration;

use escaperoom::escape::{
    Countdown, GameplayEngine, GameplaySettings, IconType, MemoryStore, PlayShell, RoomEditor,
    TimeLimit,
};

fn sky_engine(settings: GameplaySettings) -> GameplayEngine {
    let store = MemoryStore::shared();
    let editor = RoomEditor::new(store.clone(), "ms-lee");
    let key = editor.add_icon(IconType::Key);
    editor.add_icon(IconType::Chest);
    let q = editor.open_question_editor(&key.id).unwrap();
    editor.set_question_text(&q.id, "color of sky").unwrap();
    editor.set_answer(&q.id, 0, "blue").unwrap();
    let room = editor.validate_and_save().unwrap();
    GameplayEngine::load(store, editor.registry(), &room.room_code, settings).unwrap()
}

#[test]
fn shell_plays_through_a_room() {
    let mut shell = PlayShell::new(sky_engine(GameplaySettings {
        win_delay: chrono::Duration::zero(),
        ..GameplaySettings::default()
    }));

    let look = shell.handle_line("look").text;
    assert!(look.contains("1. key"), "{}", look);
    assert!(look.contains("[locked]"), "{}", look);

    assert!(shell.handle_line("open 1").text.contains("color of sky"));
    assert!(shell.handle_line("answer 1 red").text.contains("Incorrect"));
    assert!(shell.handle_line("chest").text.contains("still locked"));

    shell.handle_line("answer 1 BLUE");
    let fragment = shell.engine().state().collected_key_codes[0].clone();
    let reply = shell.handle_line(&format!("lock 1 {}", fragment.to_lowercase()));
    assert!(reply.text.contains("creaks open"), "{}", reply.text);

    let win = shell.poll_win().expect("win with zero delay");
    assert_eq!(win.room_code, shell.engine().room().room_code);
    assert!(shell.poll_win().is_none());
}

#[test]
fn unknown_input_gets_help_hint() {
    let mut shell = PlayShell::new(sky_engine(GameplaySettings::default()));
    let reply = shell.handle_line("dance");
    assert!(reply.text.contains("HELP"));
    assert!(!reply.quit);
    assert!(shell.handle_line("open 9").text.contains("no icon"));
    assert!(shell.handle_line("lock 4 abc").text.contains("out of range"));
    assert!(shell.handle_line("quit").quit);
}

#[tokio::test]
async fn expired_countdown_blocks_answers_when_enforced() {
    let engine = sky_engine(GameplaySettings {
        enforce_time_limit: true,
        ..GameplaySettings::default()
    });
    let countdown = Countdown::start(Duration::from_millis(20), Duration::from_millis(5), |_| {});
    let mut shell = PlayShell::new(engine).with_countdown(countdown.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(countdown.is_expired());
    assert_eq!(shell.handle_line("answer 1 blue").text, "Time is up!");
    assert!(shell.engine().state().collected_key_codes.is_empty());
}

#[tokio::test]
async fn restart_and_quit_stop_the_countdown() {
    let countdown = Countdown::start(Duration::from_secs(600), Duration::from_secs(60), |_| {});
    let mut shell = PlayShell::new(sky_engine(GameplaySettings::default()))
        .with_countdown(countdown.clone());
    assert!(shell.handle_line("status").text.contains("Time left"));

    shell.handle_line("restart");
    assert!(countdown.is_cancelled());
    let frozen = countdown.remaining();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(countdown.remaining(), frozen);

    let other = Countdown::start(Duration::from_secs(600), Duration::from_secs(60), |_| {});
    let mut shell = PlayShell::new(sky_engine(GameplaySettings::default()))
        .with_countdown(Arc::clone(&other));
    assert!(shell.handle_line("q").quit);
    assert!(other.is_cancelled());
}

#[tokio::test]
async fn restart_after_time_runs_out_starts_a_fresh_clock() {
    let engine = sky_engine(GameplaySettings {
        enforce_time_limit: true,
        ..GameplaySettings::default()
    });
    let mut shell = PlayShell::new(engine).with_countdown_source(|| {
        Countdown::start(Duration::from_millis(30), Duration::from_millis(5), |_| {})
    });
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(shell.handle_line("answer 1 blue").text, "Time is up!");

    shell.handle_line("restart");
    let fresh = shell.countdown().expect("countdown restarted").clone();
    assert!(!fresh.is_expired());
    assert!(shell.handle_line("status").text.contains("Time left"));
    assert!(shell.handle_line("answer 1 blue").text.starts_with("Correct!"));
}

#[tokio::test]
async fn restart_keeps_the_same_limit_for_a_plain_countdown() {
    let engine = sky_engine(GameplaySettings {
        enforce_time_limit: true,
        ..GameplaySettings::default()
    });
    let expired = Arc::new(Countdown::new(Duration::ZERO));
    let mut shell = PlayShell::new(engine).with_countdown(expired.clone());
    assert_eq!(shell.handle_line("lock 1 abc").text, "Time is up!");

    shell.handle_line("restart");
    assert!(expired.is_cancelled());
    let fresh = shell.countdown().expect("countdown restarted").clone();
    assert_eq!(fresh.limit(), Duration::ZERO);
}

#[test]
fn engine_restart_drops_the_observed_limit() {
    let mut engine = sky_engine(GameplaySettings {
        enforce_time_limit: true,
        ..GameplaySettings::default()
    });
    engine.observe_time_limit(Arc::new(Countdown::new(Duration::ZERO)));
    assert!(engine.set_lock_value(0, "abc").is_err());
    engine.restart();
    assert!(engine.set_lock_value(0, "abc").is_ok());
}
