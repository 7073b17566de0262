use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::{debug, warn};

use crate::session::Effect;

/// How long to wait for input between disconnect checks while no timer is armed.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Everything the driver loop reacts to: key presses, terminal resizes and countdown ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
}

/// Where key and resize events come from.
pub trait EventSource: Send + 'static {
    /// Waits at most `timeout` for the next event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Reads the real terminal on a background thread.
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) => AppEvent::Key(key),
                Ok(CtEvent::Resize(w, h)) => AppEvent::Resize(w, h),
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "terminal event reader stopped");
                    break;
                }
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Spacing between countdown ticks.
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// One tick per second, the countdown resolution.
    pub fn per_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed events, for driving the loop without a terminal.
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Multiplexes input events with the countdown timer.
///
/// The timer is only armed between a session's first keystroke and the end
/// of its countdown; until then `step` waits on input alone.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    deadline: Option<Instant>,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            deadline: None,
        }
    }

    /// Schedules the first tick one interval after `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.ticker.interval());
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Performs a timer effect returned by a session transition.
    pub fn apply(&mut self, effect: Effect, now: Instant) {
        match effect {
            Effect::StartTimer => {
                debug!("timer armed");
                self.arm(now)
            }
            Effect::StopTimer => {
                debug!("timer disarmed");
                self.disarm()
            }
            Effect::None => {}
        }
    }

    /// Blocks until the next input event or timer tick.
    ///
    /// Returns `None` once the input source has disconnected.
    pub fn step(&mut self) -> Option<AppEvent> {
        loop {
            let timeout = match self.deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        // keep a steady cadence regardless of key traffic
                        self.deadline = Some(deadline + self.ticker.interval());
                        return Some(AppEvent::Tick);
                    }
                    deadline - now
                }
                None => IDLE_POLL,
            };

            match self.event_source.recv_timeout(timeout) {
                Ok(ev) => return Some(ev),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}
