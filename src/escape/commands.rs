//! Text command parsing and the play shell used by the CLI host.
//!
//! Icons and lock slots are addressed by 1-based numbers in the order they
//! appear on the canvas.

use std::sync::Arc;

use chrono::Utc;
use log::debug;

use crate::escape::countdown::{format_remaining, Countdown, TimeLimit};
use crate::escape::errors::EscapeError;
use crate::escape::gameplay::{AnswerOutcome, GameplayEngine, IconView, SlotState, WinSignal};
use crate::logutil::escape_log;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayCommand {
    Look,                   // L - list icons
    Open(usize),            // O n - open icon n
    Answer(usize, String),  // A n text - answer icon n
    Lock(usize, String),    // K n code - enter code into lock slot n
    Chest,                  // C - try the chest
    Status,                 // S - progress and time left
    Restart,                // R - start over
    Help,                   // H
    Quit,                   // Q
    Unknown(String),
}

pub fn parse_play_command(input: &str) -> PlayCommand {
    let trimmed = input.trim();
    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (trimmed, ""),
    };
    let verb = verb.to_ascii_lowercase();

    let numbered = |rest: &str| -> Option<(usize, String)> {
        let (n, tail) = match rest.split_once(char::is_whitespace) {
            Some((n, tail)) => (n, tail.trim()),
            None => (rest, ""),
        };
        let n: usize = n.parse().ok()?;
        if n == 0 {
            return None;
        }
        Some((n - 1, tail.to_string()))
    };

    match verb.as_str() {
        "l" | "look" => PlayCommand::Look,
        "o" | "open" => match numbered(rest) {
            Some((n, tail)) if tail.is_empty() => PlayCommand::Open(n),
            _ => PlayCommand::Unknown(trimmed.to_string()),
        },
        "a" | "answer" => match numbered(rest) {
            Some((n, tail)) if !tail.is_empty() => PlayCommand::Answer(n, tail),
            _ => PlayCommand::Unknown(trimmed.to_string()),
        },
        "k" | "lock" => match numbered(rest) {
            Some((n, tail)) => PlayCommand::Lock(n, tail),
            None => PlayCommand::Unknown(trimmed.to_string()),
        },
        "c" | "chest" => PlayCommand::Chest,
        "s" | "status" => PlayCommand::Status,
        "r" | "restart" => PlayCommand::Restart,
        "h" | "help" | "?" => PlayCommand::Help,
        "q" | "quit" | "exit" => PlayCommand::Quit,
        _ => PlayCommand::Unknown(trimmed.to_string()),
    }
}

pub const PLAY_HELP: &str = "Commands:\n\
  look            list the icons in the room\n\
  open <n>        inspect icon n\n\
  answer <n> <a>  answer icon n's question\n\
  lock <n> <code> enter a key code into chest lock n\n\
  chest           try to open the chest\n\
  status          show progress\n\
  restart         start the room over\n\
  quit            leave";

/// Reply to one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellReply {
    pub text: String,
    pub quit: bool,
}

impl ShellReply {
    fn say(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

/// Builds a fresh countdown whenever a session (re)starts.
pub type CountdownSource = Box<dyn Fn() -> Arc<Countdown> + Send>;

/// One player's session: the engine plus the host-owned countdown.
pub struct PlayShell {
    engine: GameplayEngine,
    countdown: Option<Arc<Countdown>>,
    countdown_source: Option<CountdownSource>,
}

impl PlayShell {
    pub fn new(engine: GameplayEngine) -> Self {
        Self {
            engine,
            countdown: None,
            countdown_source: None,
        }
    }

    /// Attach a countdown; the engine observes it, the shell owns it.
    /// A restart replaces it with a fresh countdown of the same length, without tick callbacks.
    pub fn with_countdown(self, countdown: Arc<Countdown>) -> Self {
        let limit = countdown.limit();
        self.attach(countdown, Box::new(move || Arc::new(Countdown::new(limit))))
    }

    /// Start a countdown from `source` now and again on every restart.
    pub fn with_countdown_source<F>(self, source: F) -> Self
    where
        F: Fn() -> Arc<Countdown> + Send + 'static,
    {
        let countdown = source();
        self.attach(countdown, Box::new(source))
    }

    fn attach(mut self, countdown: Arc<Countdown>, source: CountdownSource) -> Self {
        self.engine.observe_time_limit(countdown.clone());
        self.countdown = Some(countdown);
        self.countdown_source = Some(source);
        self
    }

    pub fn countdown(&self) -> Option<&Arc<Countdown>> {
        self.countdown.as_ref()
    }

    pub fn engine(&self) -> &GameplayEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut GameplayEngine {
        &mut self.engine
    }

    fn icon_id(&self, n: usize) -> Result<String, EscapeError> {
        self.engine
            .room()
            .icon_layout
            .get(n)
            .map(|item| item.id.clone())
            .ok_or_else(|| EscapeError::UnknownIcon(format!("#{}", n + 1)))
    }

    pub fn handle_line(&mut self, line: &str) -> ShellReply {
        let command = parse_play_command(line);
        debug!("Play command: {:?}", command);
        match self.handle(command) {
            Ok(reply) => reply,
            Err(e) => ShellReply::say(describe_error(&e)),
        }
    }

    pub fn handle(&mut self, command: PlayCommand) -> Result<ShellReply, EscapeError> {
        let reply = match command {
            PlayCommand::Look => ShellReply::say(self.look()),
            PlayCommand::Open(n) => {
                let id = self.icon_id(n)?;
                ShellReply::say(render_view(&self.engine.open_icon(&id)?))
            }
            PlayCommand::Answer(n, text) => {
                let id = self.icon_id(n)?;
                match self.engine.submit_answer(&id, &text)? {
                    AnswerOutcome::Correct { fragment } => {
                        ShellReply::say(format!("Correct! Your key code is {}.", fragment))
                    }
                    AnswerOutcome::AlreadySolved { fragment } => {
                        ShellReply::say(format!("Already solved. Your key code is {}.", fragment))
                    }
                    AnswerOutcome::Incorrect {
                        attempts_left: Some(left),
                    } => ShellReply::say(format!("Incorrect answer. {} attempts left.", left)),
                    AnswerOutcome::Incorrect { attempts_left: None } => {
                        ShellReply::say("Incorrect answer, try again.")
                    }
                }
            }
            PlayCommand::Lock(n, code) => {
                debug!("Lock {} <- {}", n + 1, escape_log(&code));
                let update = self.engine.set_lock_value(n, &code)?;
                let state = match update.state {
                    SlotState::Unlocked => "unlocked",
                    SlotState::Locked => "still locked",
                    SlotState::Empty => "cleared",
                };
                let mut text = format!(
                    "Lock {} {} ({}/{} open).",
                    n + 1,
                    state,
                    update.unlocked,
                    update.required
                );
                if update.chest_open {
                    text.push_str(" The chest creaks open!");
                }
                ShellReply::say(text)
            }
            PlayCommand::Chest => {
                self.engine.open_chest()?;
                ShellReply::say("The chest creaks open!")
            }
            PlayCommand::Status => ShellReply::say(self.status()),
            PlayCommand::Restart => {
                self.engine.restart();
                if let Some(countdown) = self.countdown.take() {
                    countdown.cancel();
                }
                if let Some(source) = &self.countdown_source {
                    let fresh = source();
                    self.engine.observe_time_limit(fresh.clone());
                    self.countdown = Some(fresh);
                }
                ShellReply::say("The room resets around you.")
            }
            PlayCommand::Help => ShellReply::say(PLAY_HELP),
            PlayCommand::Quit => {
                if let Some(countdown) = &self.countdown {
                    countdown.cancel();
                }
                ShellReply {
                    text: "Goodbye.".to_string(),
                    quit: true,
                }
            }
            PlayCommand::Unknown(input) => {
                return Err(EscapeError::InvalidCommand(input));
            }
        };
        Ok(reply)
    }

    /// Hand out the win signal once its delay has passed; stops the countdown.
    pub fn poll_win(&mut self) -> Option<WinSignal> {
        let win = self.engine.poll_win(Utc::now())?;
        if let Some(countdown) = &self.countdown {
            countdown.cancel();
        }
        Some(win)
    }

    fn look(&self) -> String {
        let mut out = format!("Room {}:", self.engine.room().room_code);
        for (i, item) in self.engine.room().icon_layout.iter().enumerate() {
            let marker = if item.icon_type.is_chest() {
                if self.engine.is_chest_open() {
                    "open"
                } else {
                    "locked"
                }
            } else if self.engine.state().is_solved(&item.id) {
                "solved"
            } else {
                "unsolved"
            };
            out.push_str(&format!(
                "\n  {}. {} at ({:.0}, {:.0}) [{}]",
                i + 1,
                item.icon_type,
                item.x,
                item.y,
                marker
            ));
        }
        out
    }

    fn status(&self) -> String {
        let p = self.engine.progress();
        let mut out = format!(
            "Solved {}/{} puzzles, {}/{} locks open.",
            p.solved, p.puzzles, p.unlocked, p.required
        );
        if !self.engine.state().collected_key_codes.is_empty() {
            out.push_str(&format!(
                " Key codes: {}.",
                self.engine.state().collected_key_codes.join(", ")
            ));
        }
        if let Some(countdown) = &self.countdown {
            out.push_str(&format!(" Time left: {}.", format_remaining(countdown.remaining())));
        }
        out
    }
}

pub fn render_view(view: &IconView) -> String {
    match view {
        IconView::Unsolved {
            item,
            story,
            question,
        } => format!("[{}] {}\nQuestion: {}", item.icon_type, story, question),
        IconView::Solved { item, fragment } => {
            format!("[{}] Solved. Your key code: {}", item.icon_type, fragment)
        }
        IconView::Chest {
            story, slots, open, ..
        } => {
            if *open {
                return "[chest] The chest stands open.".to_string();
            }
            let locks: Vec<&str> = slots
                .iter()
                .map(|s| match s {
                    SlotState::Unlocked => "open",
                    SlotState::Locked => "wrong",
                    SlotState::Empty => "empty",
                })
                .collect();
            format!("[chest] {}\nLocks: {}", story, locks.join(" | "))
        }
    }
}

/// Player-facing wording for engine errors.
pub fn describe_error(error: &EscapeError) -> String {
    match error {
        EscapeError::InvalidCommand(_) => "Unknown command. Type HELP for commands.".to_string(),
        EscapeError::UnknownIcon(id) => format!("There is no icon {}.", id),
        EscapeError::ChestLocked { unlocked, required } => {
            format!("The chest is still locked ({}/{} locks open).", unlocked, required)
        }
        EscapeError::TimeExpired => "Time is up!".to_string(),
        EscapeError::RoomCompleted(_) => "You already escaped this room.".to_string(),
        other => other.to_string(),
    }
}
