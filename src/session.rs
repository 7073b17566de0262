use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::passage::ReferenceText;

/// Countdown length used when none is configured.
pub const DEFAULT_COUNTDOWN_SECS: u64 = 30;

/// Characters counted as one "word" by the WPM metric.
pub const CHARS_PER_WORD: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub reference_text: ReferenceText,
    pub countdown_seconds: u64,
}

impl SessionConfig {
    pub fn new(reference_text: impl Into<ReferenceText>, countdown_seconds: u64) -> Self {
        Self {
            reference_text: reference_text.into(),
            countdown_seconds,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reference_text: ReferenceText::default(),
            countdown_seconds: DEFAULT_COUNTDOWN_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Running,
    Finished,
}

/// Side effect the owner of a session must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// First keystroke accepted: begin delivering one tick per second.
    StartTimer,
    /// Countdown over (or session reset): stop delivering ticks.
    StopTimer,
}

/// How a single reference character should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Correct,
    Incorrect,
    Pending,
}

/// A timed typing test against a fixed passage.
///
/// All transitions are total: events that make no sense in the current
/// phase are ignored rather than reported.
#[derive(Debug, Clone)]
pub struct Session {
    reference: ReferenceText,
    countdown_seconds: u64,
    typed: Vec<char>,
    correct_count: usize,
    remaining_seconds: i64,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    phase: Phase,
    wpm: Option<f64>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            remaining_seconds: i64::try_from(config.countdown_seconds).unwrap_or(i64::MAX),
            reference: config.reference_text,
            countdown_seconds: config.countdown_seconds,
            typed: Vec::new(),
            correct_count: 0,
            started_at: None,
            finished_at: None,
            phase: Phase::Idle,
            wpm: None,
        }
    }

    /// Appends `c` to the typed buffer, scoring it against the passage.
    ///
    /// The first accepted character starts the clock and asks the caller to
    /// start ticking. Characters typed past the end of the passage are kept
    /// but never scored.
    pub fn type_char(&mut self, c: char, now: Instant) -> Effect {
        if self.phase == Phase::Finished || c.is_control() {
            return Effect::None;
        }

        self.typed.push(c);
        let idx = self.typed.len() - 1;
        if self.reference.get(idx) == Some(c) {
            self.correct_count += 1;
        }
        trace!(idx, %c, correct = self.correct_count, "typed");

        if self.phase != Phase::Idle {
            return Effect::None;
        }

        self.started_at = Some(now);
        self.phase = Phase::Running;
        debug!(countdown = self.countdown_seconds, "session started");

        if self.remaining_seconds <= 0 {
            // a zero-length countdown has nothing to tick through
            self.finish(now);
            return Effect::None;
        }
        Effect::StartTimer
    }

    /// Removes the last typed character.
    ///
    /// The correct count is left as is: a correct character that gets erased
    /// keeps counting toward the score.
    pub fn backspace(&mut self) {
        if self.phase == Phase::Finished {
            return;
        }
        if self.typed.pop().is_some() {
            trace!(cursor = self.cursor(), "backspace");
        }
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self, now: Instant) -> Effect {
        if self.phase != Phase::Running {
            return Effect::None;
        }

        self.remaining_seconds -= 1;
        trace!(remaining = self.remaining_seconds, "tick");

        if self.remaining_seconds <= 0 {
            self.finish(now);
            return Effect::StopTimer;
        }
        Effect::None
    }

    /// Discards all progress, keeping the passage and countdown length.
    pub fn restart(&mut self) {
        debug!(phase = %self.phase, "session restarted");
        *self = Session::new(SessionConfig {
            reference_text: self.reference.clone(),
            countdown_seconds: self.countdown_seconds,
        });
    }

    fn finish(&mut self, now: Instant) {
        let elapsed = self
            .started_at
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default();
        let wpm = words_per_minute(self.correct_count, self.countdown_seconds, elapsed);

        self.finished_at = Some(now);
        self.wpm = Some(wpm);
        self.phase = Phase::Finished;
        debug!(
            correct = self.correct_count,
            elapsed_ms = elapsed.as_millis() as u64,
            wpm,
            "session finished"
        );
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reference(&self) -> &ReferenceText {
        &self.reference
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    /// Always equal to the number of typed characters.
    pub fn cursor(&self) -> usize {
        self.typed.len()
    }

    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    pub fn countdown_seconds(&self) -> u64 {
        self.countdown_seconds
    }

    pub fn remaining_seconds(&self) -> i64 {
        self.remaining_seconds
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    /// Time between the first keystroke and the end of the countdown.
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            _ => None,
        }
    }

    /// Result of the test, available once finished.
    pub fn wpm(&self) -> Option<f64> {
        self.wpm
    }

    /// Number of positions currently matching the passage, by full scan.
    pub fn matching_positions(&self) -> usize {
        self.typed
            .iter()
            .zip(self.reference.as_slice())
            .filter(|(typed, expected)| typed == expected)
            .count()
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            reference: self.reference.as_slice(),
            typed: &self.typed,
            cursor: self.cursor(),
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            correct_count: self.correct_count,
            wpm: self.wpm,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Read-only view of a session handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub reference: &'a [char],
    pub typed: &'a [char],
    pub cursor: usize,
    pub phase: Phase,
    pub remaining_seconds: i64,
    pub correct_count: usize,
    pub wpm: Option<f64>,
}

impl Snapshot<'_> {
    /// Classifies the reference character at `idx` against what was typed.
    pub fn classify(&self, idx: usize) -> CharClass {
        match (self.typed.get(idx), self.reference.get(idx)) {
            (Some(typed), Some(expected)) if typed == expected => CharClass::Correct,
            (Some(_), _) => CharClass::Incorrect,
            (None, _) => CharClass::Pending,
        }
    }

    /// Every reference character paired with its classification.
    pub fn classified(&self) -> impl Iterator<Item = (char, CharClass)> + '_ {
        self.reference
            .iter()
            .enumerate()
            .map(|(idx, &c)| (c, self.classify(idx)))
    }
}

/// Words per minute for `correct_count` characters over `elapsed`.
///
/// Returns 0 when nothing elapsed on a zero-length countdown. Any other
/// zero-elapsed case still divides.
pub fn words_per_minute(correct_count: usize, countdown_seconds: u64, elapsed: Duration) -> f64 {
    let minutes = elapsed.as_secs_f64() / 60.0;
    if minutes == 0.0 && countdown_seconds == 0 {
        return 0.0;
    }
    correct_count as f64 / CHARS_PER_WORD / minutes
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn session(text: &str, secs: u64) -> Session {
        Session::new(SessionConfig::new(text, secs))
    }

    fn type_str(session: &mut Session, s: &str, now: Instant) {
        for c in s.chars() {
            session.type_char(c, now);
        }
    }

    #[test]
    fn new_session_is_idle() {
        let s = session("abc", 30);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.cursor(), 0);
        assert_eq!(s.correct_count(), 0);
        assert_eq!(s.remaining_seconds(), 30);
        assert!(s.started_at().is_none());
        assert!(s.finished_at().is_none());
        assert!(s.wpm().is_none());
    }

    #[test]
    fn default_uses_builtin_passage_and_thirty_seconds() {
        let s = Session::default();
        assert_eq!(s.countdown_seconds(), DEFAULT_COUNTDOWN_SECS);
        assert_eq!(s.reference(), &ReferenceText::default());
    }

    #[test]
    fn first_keystroke_starts_timer() {
        let mut s = session("abc", 30);
        let now = Instant::now();

        assert_eq!(s.type_char('a', now), Effect::StartTimer);
        assert_eq!(s.phase(), Phase::Running);
        assert_eq!(s.started_at(), Some(now));

        assert_eq!(s.type_char('b', now), Effect::None);
        assert_eq!(s.started_at(), Some(now));
    }

    #[test]
    fn first_keystroke_starts_timer_even_when_wrong() {
        let mut s = session("abc", 30);
        assert_eq!(s.type_char('z', Instant::now()), Effect::StartTimer);
        assert_eq!(s.correct_count(), 0);
        assert_eq!(s.phase(), Phase::Running);
    }

    #[test]
    fn control_characters_are_ignored() {
        let mut s = session("abc", 30);
        assert_eq!(s.type_char('\n', Instant::now()), Effect::None);
        assert_eq!(s.type_char('\u{1b}', Instant::now()), Effect::None);
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.typed().is_empty());
    }

    #[test]
    fn abc_two_second_scenario() {
        let mut s = session("abc", 2);
        let t0 = Instant::now();

        assert_eq!(s.type_char('a', t0), Effect::StartTimer);
        assert_eq!(s.phase(), Phase::Running);
        assert_eq!(s.correct_count(), 1);

        s.type_char('x', t0);
        assert_eq!(s.correct_count(), 1);

        assert_eq!(s.tick(t0 + Duration::from_secs(1)), Effect::None);
        assert_eq!(s.remaining_seconds(), 1);
        assert_eq!(s.phase(), Phase::Running);

        assert_eq!(s.tick(t0 + Duration::from_secs(2)), Effect::StopTimer);
        assert_eq!(s.remaining_seconds(), 0);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.elapsed(), Some(Duration::from_secs(2)));

        let expected = (1.0 / 5.0) / (2.0 / 60.0);
        let wpm = s.wpm().unwrap();
        assert!((wpm - expected).abs() < 1e-9, "wpm was {wpm}");
    }

    #[test]
    fn overshoot_is_accepted_but_not_scored() {
        let mut s = session("ab", 30);
        type_str(&mut s, "abcd", Instant::now());

        assert_eq!(s.typed().len(), 4);
        assert_eq!(s.cursor(), 4);
        assert_eq!(s.correct_count(), 2);
    }

    #[test]
    fn backspace_keeps_correct_count() {
        let mut s = session("abc", 30);
        type_str(&mut s, "ab", Instant::now());
        assert_eq!(s.correct_count(), 2);

        s.backspace();
        assert_eq!(s.cursor(), 1);
        assert_eq!(s.typed(), &['a']);
        assert_eq!(s.correct_count(), 2);
        assert_eq!(s.matching_positions(), 1);

        // retyping the same char scores it a second time
        s.type_char('b', Instant::now());
        assert_eq!(s.correct_count(), 3);
    }

    #[test]
    fn backspace_on_empty_buffer_is_noop() {
        let mut s = session("abc", 30);
        s.backspace();
        assert_eq!(s.cursor(), 0);
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn finished_session_ignores_input() {
        let mut s = session("abc", 1);
        let t0 = Instant::now();
        s.type_char('a', t0);
        s.tick(t0 + Duration::from_secs(1));
        assert_eq!(s.phase(), Phase::Finished);

        assert_eq!(s.type_char('b', t0), Effect::None);
        s.backspace();
        assert_eq!(s.typed(), &['a']);
        assert_eq!(s.correct_count(), 1);
    }

    #[test]
    fn tick_while_idle_is_noop() {
        let mut s = session("abc", 5);
        assert_eq!(s.tick(Instant::now()), Effect::None);
        assert_eq!(s.remaining_seconds(), 5);
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn stale_ticks_after_finish_change_nothing() {
        let mut s = session("abc", 1);
        let t0 = Instant::now();
        s.type_char('a', t0);
        s.tick(t0 + Duration::from_secs(1));
        let wpm = s.wpm();

        for n in 2..5 {
            assert_eq!(s.tick(t0 + Duration::from_secs(n)), Effect::None);
        }
        assert_eq!(s.remaining_seconds(), 0);
        assert_eq!(s.wpm(), wpm);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.finished_at(), Some(t0 + Duration::from_secs(1)));
    }

    #[test]
    fn countdown_ticks_drive_to_finished() {
        let mut s = session("hello", 30);
        let t0 = Instant::now();
        s.type_char('h', t0);

        let mut effects = Vec::new();
        for n in 1..=30 {
            effects.push(s.tick(t0 + Duration::from_secs(n)));
        }

        assert_eq!(s.phase(), Phase::Finished);
        assert!(s.remaining_seconds() <= 0);
        assert_matches!(effects.last(), Some(Effect::StopTimer));
        assert!(effects[..29].iter().all(|e| *e == Effect::None));
    }

    #[test]
    fn zero_countdown_finishes_on_first_keystroke_with_zero_wpm() {
        let mut s = session("abc", 0);
        let now = Instant::now();

        assert_eq!(s.type_char('a', now), Effect::None);
        assert_eq!(s.phase(), Phase::Finished);
        assert_eq!(s.correct_count(), 1);
        assert_eq!(s.elapsed(), Some(Duration::ZERO));
        assert_eq!(s.wpm(), Some(0.0));
    }

    #[test]
    fn restart_from_every_phase() {
        let t0 = Instant::now();
        let idle = session("abc", 3);
        let mut running = session("abc", 3);
        running.type_char('a', t0);
        let mut finished = session("abc", 1);
        finished.type_char('a', t0);
        finished.tick(t0 + Duration::from_secs(1));

        for mut s in [idle, running, finished] {
            s.restart();
            assert_eq!(s.phase(), Phase::Idle);
            assert!(s.typed().is_empty());
            assert_eq!(s.cursor(), 0);
            assert_eq!(s.correct_count(), 0);
            assert_eq!(s.remaining_seconds(), s.countdown_seconds() as i64);
            assert_eq!(s.reference().to_string(), "abc");
            assert!(s.wpm().is_none());
            assert!(s.started_at().is_none());
        }
    }

    #[test]
    fn wpm_zero_guard_only_for_zero_countdown() {
        assert_eq!(words_per_minute(0, 0, Duration::ZERO), 0.0);
        assert_eq!(words_per_minute(7, 0, Duration::ZERO), 0.0);
        assert!(words_per_minute(5, 30, Duration::ZERO).is_infinite());
        assert!(words_per_minute(0, 30, Duration::ZERO).is_nan());
    }

    #[test]
    fn wpm_formula() {
        assert_eq!(words_per_minute(50, 60, Duration::from_secs(60)), 10.0);
        assert_eq!(words_per_minute(25, 30, Duration::from_secs(30)), 10.0);
        assert_eq!(words_per_minute(0, 30, Duration::from_secs(30)), 0.0);
    }

    #[test]
    fn snapshot_classifies_each_reference_char() {
        let mut s = session("abcd", 30);
        type_str(&mut s, "axc", Instant::now());
        let snap = s.snapshot();

        let classes: Vec<CharClass> = snap.classified().map(|(_, class)| class).collect();
        assert_eq!(
            classes,
            vec![
                CharClass::Correct,
                CharClass::Incorrect,
                CharClass::Correct,
                CharClass::Pending
            ]
        );
        assert_eq!(snap.cursor, 3);
        assert_eq!(snap.phase, Phase::Running);
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Idle.to_string(), "Idle");
        assert_eq!(Phase::Finished.to_string(), "Finished");
    }
}
