use std::collections::HashSet;

use crate::coords::Vec2;
use crate::time::{Clock, ClockSample};

use super::state::{StateTable, TransitionState};
use super::types::{InputEvent, InputId, Key, MouseButton, RawInput, Transition};

/// Where `InputCapture` pulls platform events from.
pub trait EventSource {
    /// Appends every event queued since the previous call. Never blocks.
    fn drain(&mut self, out: &mut Vec<RawInput>);
}

/// Input capture settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CaptureConfig {
    /// Keys whose press latches `should_quit()`.
    pub quit_keys: Vec<Key>,

    /// Whether a window close request latches `should_quit()`.
    pub quit_on_close: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            quit_keys: vec![Key::Escape],
            quit_on_close: true,
        }
    }
}

impl CaptureConfig {
    pub fn with_quit_keys(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        self.quit_keys = keys.into_iter().collect();
        self
    }
}

/// Pull-model input capture.
///
/// `poll_once()` drains the source, stamps the whole batch with one clock
/// sample taken at drain time, updates the key/button tables and appends to
/// the session history. Nothing happens between polls.
#[derive(Debug)]
pub struct InputCapture<S> {
    source: S,
    clock: Clock,
    config: CaptureConfig,
    session_start: ClockSample,

    keys: StateTable<Key>,
    buttons: StateTable<MouseButton>,
    pointer: Option<Vec2>,

    key_events: Vec<InputEvent>,
    button_events: Vec<InputEvent>,

    pressed_now: HashSet<Key>,
    released_now: HashSet<Key>,

    quit: bool,
    polls: u64,
    scratch: Vec<RawInput>,
}

impl<S: EventSource> InputCapture<S> {
    pub fn new(source: S, clock: Clock) -> Self {
        Self::with_config(source, clock, CaptureConfig::default())
    }

    pub fn with_config(source: S, clock: Clock, config: CaptureConfig) -> Self {
        let session_start = clock.now();
        Self {
            source,
            clock,
            config,
            session_start,
            keys: StateTable::default(),
            buttons: StateTable::default(),
            pointer: None,
            key_events: Vec::new(),
            button_events: Vec::new(),
            pressed_now: HashSet::new(),
            released_now: HashSet::new(),
            quit: false,
            polls: 0,
            scratch: Vec::new(),
        }
    }

    /// Drains pending events and returns them stamped, in arrival order.
    ///
    /// Pointer moves are returned but not kept in the history.
    pub fn poll_once(&mut self) -> Vec<InputEvent> {
        let mut raw = std::mem::take(&mut self.scratch);
        raw.clear();
        self.source.drain(&mut raw);
        let at = self.clock.now();

        self.pressed_now.clear();
        self.released_now.clear();
        self.polls += 1;

        let mut out = Vec::with_capacity(raw.len());
        for ev in &raw {
            self.apply(ev, at, &mut out);
        }
        self.scratch = raw;

        if !out.is_empty() {
            log::trace!("poll {} drained {} event(s) at {}", self.polls, out.len(), at);
        }
        out
    }

    fn apply(&mut self, raw: &RawInput, at: ClockSample, out: &mut Vec<InputEvent>) {
        match *raw {
            RawInput::Key {
                key,
                pressed,
                repeat,
            } => {
                self.record_key(key, pressed, repeat, at, out);
                if pressed && self.config.quit_keys.contains(&key) {
                    self.latch_quit(format_args!("quit key {key}"));
                }
            }

            RawInput::Button { button, pressed } => {
                self.record_button(button, pressed, at, out);
            }

            RawInput::PointerMoved { x, y } => {
                let position = Vec2::new(x, y);
                self.pointer = Some(position);
                out.push(InputEvent {
                    id: InputId::Pointer,
                    transition: Transition::Moved,
                    at,
                    position: Some(position),
                    repeat: false,
                });
            }

            RawInput::Focus(true) => {}

            RawInput::Focus(false) => {
                // Releases are lost while unfocused; treat everything as let go.
                let mut keys: Vec<Key> = self.keys.held().collect();
                keys.sort();
                let mut buttons: Vec<MouseButton> = self.buttons.held().collect();
                buttons.sort();

                if !keys.is_empty() || !buttons.is_empty() {
                    log::debug!(
                        "focus lost; releasing {} key(s) and {} button(s)",
                        keys.len(),
                        buttons.len()
                    );
                }
                for key in keys {
                    self.record_key(key, false, false, at, out);
                }
                for button in buttons {
                    self.record_button(button, false, at, out);
                }
            }

            RawInput::CloseRequested => {
                if self.config.quit_on_close {
                    self.latch_quit(format_args!("window close request"));
                }
            }
        }
    }

    fn record_key(
        &mut self,
        key: Key,
        pressed: bool,
        repeat: bool,
        at: ClockSample,
        out: &mut Vec<InputEvent>,
    ) {
        if self.keys.apply(key, pressed, at) {
            if pressed {
                self.pressed_now.insert(key);
            } else {
                self.released_now.insert(key);
            }
        }

        let ev = InputEvent {
            id: InputId::Key(key),
            transition: if pressed { Transition::Down } else { Transition::Up },
            at,
            position: None,
            repeat,
        };
        self.key_events.push(ev);
        out.push(ev);
    }

    fn record_button(
        &mut self,
        button: MouseButton,
        pressed: bool,
        at: ClockSample,
        out: &mut Vec<InputEvent>,
    ) {
        self.buttons.apply(button, pressed, at);

        let ev = InputEvent {
            id: InputId::Button(button),
            transition: if pressed { Transition::Down } else { Transition::Up },
            at,
            position: self.pointer,
            repeat: false,
        };
        self.button_events.push(ev);
        out.push(ev);
    }

    fn latch_quit(&mut self, reason: std::fmt::Arguments<'_>) {
        if !self.quit {
            log::info!("quit requested ({reason})");
            self.quit = true;
        }
    }
}

impl<S> InputCapture<S> {
    // ── state queries ─────────────────────────────────────────────────────

    #[inline]
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys.is_down(key)
    }

    #[inline]
    pub fn is_key_up(&self, key: Key) -> bool {
        !self.keys.is_down(key)
    }

    /// Whether any of `keys` is held, e.g. `Key::SHIFT` for either shift.
    pub fn is_any_key_down(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.keys.is_down(*k))
    }

    #[inline]
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons.is_down(button)
    }

    pub fn key_state(&self, key: Key) -> Option<TransitionState> {
        self.keys.get(key)
    }

    pub fn button_state(&self, button: MouseButton) -> Option<TransitionState> {
        self.buttons.get(button)
    }

    /// `true` if `key` went from up to down during the most recent poll.
    pub fn pressed_this_poll(&self, key: Key) -> bool {
        self.pressed_now.contains(&key)
    }

    /// `true` if `key` went from down to up during the most recent poll.
    pub fn released_this_poll(&self, key: Key) -> bool {
        self.released_now.contains(&key)
    }

    /// Last reported pointer position in physical pixels.
    pub fn pointer_position(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Latched once a quit key or close request is polled; stays set until
    /// `reset()`.
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    // ── history ───────────────────────────────────────────────────────────

    /// Every key-down event of the session, including auto-repeats.
    pub fn key_presses(&self) -> Vec<InputEvent> {
        self.key_events.iter().filter(|e| e.is_down()).copied().collect()
    }

    /// Every key event of the session, downs and ups.
    pub fn key_events(&self) -> &[InputEvent] {
        &self.key_events
    }

    /// Every mouse button press of the session.
    pub fn mouse_clicks(&self) -> Vec<InputEvent> {
        self.button_events.iter().filter(|e| e.is_down()).copied().collect()
    }

    pub fn button_events(&self) -> &[InputEvent] {
        &self.button_events
    }

    pub fn poll_count(&self) -> u64 {
        self.polls
    }

    // ── session time ──────────────────────────────────────────────────────

    /// Clock sample taken at construction or at the last `reset()`.
    pub fn session_start(&self) -> ClockSample {
        self.session_start
    }

    /// Seconds from the session start to `sample`; negative for earlier samples.
    pub fn relative_seconds(&self, sample: ClockSample) -> f64 {
        let delta = i128::from(sample.as_nanos()) - i128::from(self.session_start.as_nanos());
        delta as f64 / 1e9
    }

    /// Clears histories, state tables and the quit latch, and restarts the
    /// session clock reference.
    pub fn reset(&mut self) {
        self.keys.clear();
        self.buttons.clear();
        self.pointer = None;
        self.key_events.clear();
        self.button_events.clear();
        self.pressed_now.clear();
        self.released_now.clear();
        self.quit = false;
        self.polls = 0;
        self.session_start = self.clock.now();
        log::debug!("input capture reset at {}", self.session_start);
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::input::ScriptedEvents;

    fn capture() -> (InputCapture<ScriptedEvents>, std::sync::Arc<crate::time::ManualClock>) {
        let (clock, manual) = Clock::manual();
        (InputCapture::new(ScriptedEvents::default(), clock), manual)
    }

    const MS: Duration = Duration::from_millis(1);

    // ── state machine ─────────────────────────────────────────────────────

    #[test]
    fn down_up_down_sequence() {
        let (mut input, manual) = capture();

        manual.advance(10 * MS);
        input.source_mut().push(RawInput::key_down(Key::A));
        input.poll_once();
        assert!(input.is_key_down(Key::A));
        let t1 = input.clock().now();

        manual.advance(10 * MS);
        input.source_mut().push(RawInput::key_up(Key::A));
        input.poll_once();
        assert!(input.is_key_up(Key::A));

        manual.advance(10 * MS);
        input.source_mut().push(RawInput::key_down(Key::A));
        input.poll_once();
        assert!(input.is_key_down(Key::A));
        let t3 = input.clock().now();

        let presses = input.key_presses();
        assert_eq!(presses.len(), 2);
        assert_eq!(presses[0].at, t1);
        assert_eq!(presses[1].at, t3);
        assert_eq!(input.key_events().len(), 3);
    }

    #[test]
    fn duplicate_down_is_kept_in_history_but_not_a_transition() {
        let (mut input, manual) = capture();

        input.source_mut().push(RawInput::key_down(Key::Space));
        input.poll_once();
        manual.advance(5 * MS);
        input.source_mut().push(RawInput::Key {
            key: Key::Space,
            pressed: true,
            repeat: true,
        });
        input.poll_once();

        assert!(!input.pressed_this_poll(Key::Space));
        assert_eq!(input.key_presses().len(), 2);
        assert!(input.key_presses()[1].repeat);
        assert_eq!(input.key_state(Key::Space).unwrap().last_transition, ClockSample::ZERO);
    }

    #[test]
    fn left_and_right_modifiers_are_tracked_separately() {
        let (mut input, _manual) = capture();

        input.source_mut().push(RawInput::key_down(Key::ShiftLeft));
        input.poll_once();
        input.source_mut().push(RawInput::key_down(Key::ShiftRight));
        input.poll_once();
        assert!(input.pressed_this_poll(Key::ShiftRight));

        input.source_mut().push(RawInput::key_up(Key::ShiftLeft));
        input.poll_once();
        assert!(input.is_key_up(Key::ShiftLeft));
        assert!(input.is_key_down(Key::ShiftRight));
        assert!(input.is_any_key_down(&Key::SHIFT));

        input.source_mut().push(RawInput::key_up(Key::ShiftRight));
        input.poll_once();
        assert!(!input.is_any_key_down(&Key::SHIFT));
        assert_eq!(input.key_presses().len(), 2);
    }

    #[test]
    fn keypad_digits_do_not_alias_the_main_row() {
        let (mut input, _manual) = capture();
        input.source_mut().push(RawInput::key_down(Key::Numpad1));
        input.source_mut().push(RawInput::key_down(Key::Digit1));
        input.source_mut().push(RawInput::key_up(Key::Numpad1));
        input.poll_once();

        assert!(input.is_key_down(Key::Digit1));
        assert!(input.is_key_up(Key::Numpad1));
    }

    #[test]
    fn batch_shares_one_drain_timestamp() {
        let (mut input, manual) = capture();
        manual.advance(7 * MS);
        input.source_mut().push(RawInput::key_down(Key::F));
        input.source_mut().push(RawInput::key_down(Key::J));

        let events = input.poll_once();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.at == ClockSample::ZERO + 7 * MS));
    }

    #[test]
    fn per_poll_sets_are_cleared() {
        let (mut input, _manual) = capture();
        input.source_mut().push(RawInput::key_down(Key::A));
        input.poll_once();
        assert!(input.pressed_this_poll(Key::A));

        input.poll_once();
        assert!(!input.pressed_this_poll(Key::A));
        assert!(input.is_key_down(Key::A));

        input.source_mut().push(RawInput::key_up(Key::A));
        input.poll_once();
        assert!(input.released_this_poll(Key::A));
    }

    // ── quit latch ────────────────────────────────────────────────────────

    #[test]
    fn quit_latches_forever() {
        let (mut input, _manual) = capture();
        input.source_mut().push(RawInput::key_down(Key::A));
        input.poll_once();
        assert!(!input.should_quit());

        input.source_mut().push(RawInput::key_down(Key::Escape));
        input.poll_once();
        assert!(input.should_quit());

        input.source_mut().push(RawInput::key_up(Key::Escape));
        input.source_mut().push(RawInput::key_down(Key::B));
        input.poll_once();
        input.poll_once();
        assert!(input.should_quit());
    }

    #[test]
    fn close_request_quits_and_custom_keys_apply() {
        let (clock, _manual) = Clock::manual();
        let config = CaptureConfig::default().with_quit_keys([Key::Q]);
        let mut input = InputCapture::with_config(ScriptedEvents::default(), clock, config);

        input.source_mut().push(RawInput::key_down(Key::Escape));
        input.poll_once();
        assert!(!input.should_quit());

        input.source_mut().push(RawInput::CloseRequested);
        input.poll_once();
        assert!(input.should_quit());
    }

    // ── mouse ─────────────────────────────────────────────────────────────

    #[test]
    fn clicks_carry_pointer_position() {
        let (mut input, _manual) = capture();
        input.source_mut().push(RawInput::PointerMoved { x: 12.0, y: 34.0 });
        input.source_mut().push(RawInput::button_down(MouseButton::Left));
        input.source_mut().push(RawInput::button_up(MouseButton::Left));
        let polled = input.poll_once();

        assert_eq!(polled.len(), 3);
        assert_eq!(polled[0].transition, Transition::Moved);
        let clicks = input.mouse_clicks();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].position, Some(Vec2::new(12.0, 34.0)));
        assert!(!input.is_button_down(MouseButton::Left));
        assert_eq!(input.button_events().len(), 2);
    }

    // ── focus + reset ─────────────────────────────────────────────────────

    #[test]
    fn focus_loss_releases_held_inputs() {
        let (mut input, _manual) = capture();
        input.source_mut().push(RawInput::key_down(Key::A));
        input.source_mut().push(RawInput::button_down(MouseButton::Right));
        input.poll_once();

        input.source_mut().push(RawInput::Focus(false));
        let events = input.poll_once();

        assert!(input.is_key_up(Key::A));
        assert!(!input.is_button_down(MouseButton::Right));
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.transition == Transition::Up));
    }

    #[test]
    fn reset_clears_session() {
        let (mut input, manual) = capture();
        input.source_mut().push(RawInput::key_down(Key::Escape));
        input.poll_once();

        manual.advance(100 * MS);
        input.reset();

        assert!(!input.should_quit());
        assert!(input.key_presses().is_empty());
        assert!(input.is_key_up(Key::Escape));
        assert_eq!(input.session_start(), ClockSample::ZERO + 100 * MS);
        assert_eq!(input.relative_seconds(ClockSample::ZERO + 150 * MS), 0.05);
        assert!(input.relative_seconds(ClockSample::ZERO) < 0.0);
    }
}
