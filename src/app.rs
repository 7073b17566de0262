use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::info;

use crate::runtime::AppEvent;
use crate::session::{Effect, Phase, Session, SessionConfig};

/// What a key press means to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Type(char),
    Backspace,
    Restart,
    /// Quit the whole program.
    Interrupt,
}

impl Command {
    /// Maps a terminal key event, ignoring keys that carry no command.
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => Some(Command::Interrupt),
            KeyCode::Char('c') if ctrl => Some(Command::Interrupt),
            KeyCode::Char('r') if ctrl => Some(Command::Restart),
            KeyCode::Backspace => Some(Command::Backspace),
            KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => None,
            KeyCode::Char(c) => Some(Command::Type(c)),
            _ => None,
        }
    }
}

/// Owns the session and turns driver events into session transitions.
#[derive(Debug)]
pub struct App {
    session: Session,
    should_quit: bool,
}

impl App {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            session: Session::new(config),
            should_quit: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn execute(&mut self, command: Command, now: Instant) -> Effect {
        match command {
            Command::Type(c) => self.session.type_char(c, now),
            Command::Backspace => {
                self.session.backspace();
                Effect::None
            }
            Command::Restart => {
                self.session.restart();
                // a pending tick must not reach the fresh session
                Effect::StopTimer
            }
            Command::Interrupt => {
                info!(phase = %self.session.phase(), "quit requested");
                self.should_quit = true;
                Effect::StopTimer
            }
        }
    }

    /// Applies one driver event, returning the timer effect to perform.
    pub fn dispatch(&mut self, event: AppEvent, now: Instant) -> Effect {
        let was_finished = self.session.phase() == Phase::Finished;
        let effect = match event {
            AppEvent::Tick => self.session.tick(now),
            AppEvent::Resize(..) => Effect::None,
            AppEvent::Key(key) => match Command::from_key(key) {
                Some(command) => self.execute(command, now),
                None => Effect::None,
            },
        };

        if !was_finished && self.session.phase() == Phase::Finished {
            info!(
                wpm = self.session.wpm().unwrap_or_default(),
                correct = self.session.correct_count(),
                "test finished"
            );
        }
        effect
    }
}
