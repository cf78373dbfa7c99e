/// Keyboard input collector.
///
/// Turns crossterm key events into `key_down` / `key_up` calls on the engine:
///   - Press and auto-repeat events add the direction to the pending set
///   - Release events remove it (only when the terminal reports them)
///   - Otherwise a key that has been silent for `hold_timeout` is released
///
/// The engine consumes each pending direction once per frame, so a held key
/// moves the avatar at the terminal's auto-repeat rate, not every frame.
/// Keys with no direction are never forwarded to the engine.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::Direction;
use crate::sim::world::GameState;

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Map a key to the direction it steers, if any.
pub fn direction_for(code: KeyCode) -> Option<Direction> {
    if KEYS_LEFT.contains(&code) {
        Some(Direction::Left)
    } else if KEYS_RIGHT.contains(&code) {
        Some(Direction::Right)
    } else if KEYS_UP.contains(&code) {
        Some(Direction::Up)
    } else if KEYS_DOWN.contains(&code) {
        Some(Direction::Down)
    } else {
        None
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each direction key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys freshly pressed during the most recent drain. Used for meta keys.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain.
    pub raw_events: Vec<KeyEvent>,

    /// Latest terminal size reported during the drain, if the terminal resized.
    pub resized: Option<(u16, u16)>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,

    hold_timeout: Duration,
}

impl InputState {
    pub fn new(hold_timeout: Duration) -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            resized: None,
            honor_release: false,
            hold_timeout,
        }
    }

    /// Drain all pending terminal events, forwarding directions to `world`.
    /// Call this once per frame, before `advance`.
    pub fn drain_events(&mut self, world: &mut GameState) {
        self.begin_frame();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(ev) => self.handle_event(ev, Instant::now(), world),
                Err(e) => {
                    log::warn!("terminal event read failed: {e}");
                    break;
                }
            }
        }

        self.expire(Instant::now(), world);
    }

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.resized = None;
    }

    fn handle_event(&mut self, ev: Event, now: Instant, world: &mut GameState) {
        match ev {
            Event::Key(key) => self.handle_key(key, now, world),
            Event::Resize(w, h) => self.resized = Some((w, h)),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant, world: &mut GameState) {
        self.raw_events.push(key);
        let dir = direction_for(key.code);

        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
                if let Some(d) = dir {
                    world.key_up(d);
                }
            }
            KeyEventKind::Release => {
                // Not trusted; the hold timeout releases the key instead
            }
            _ => {
                if !self.last_active.contains_key(&key.code) {
                    self.fresh_presses.push(key.code);
                }
                self.last_active.insert(key.code, now);
                if let Some(d) = dir {
                    world.key_down(d);
                }
            }
        }
    }

    /// Forget keys that have been silent longer than the hold timeout,
    /// releasing the directions among them.
    fn expire(&mut self, now: Instant, world: &mut GameState) {
        let timeout = self.hold_timeout;
        self.last_active.retain(|code, t| {
            let alive = now.saturating_duration_since(*t) < timeout;
            if !alive {
                if let Some(d) = direction_for(*code) {
                    world.key_up(d);
                }
            }
            alive
        });
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    /// Convenience: was any of these keys freshly pressed?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_pressed(KEYS_RESTART)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(KEYS_QUIT) || self.ctrl_c_pressed()
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
