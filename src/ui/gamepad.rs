/// Gamepad input collector using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Movement (one step per press)
///   Start                 →  Restart
///   Select                →  Quit

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::Direction;
use crate::sim::world::GameState;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,      // LeftTrigger
    R1,      // RightTrigger
    L2,      // LeftTrigger2
    R2,      // RightTrigger2
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "L2" | "LT" | "LEFTTRIGGER2"  => Some(Btn::L2),
            "R2" | "RT" | "RIGHTTRIGGER2" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South     => Some(Btn::A),
            Button::East      => Some(Btn::B),
            Button::West      => Some(Btn::X),
            Button::North     => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2  => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start     => Some(Btn::Start),
            Button::Select    => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-input edge state for the current frame.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
    just_released: bool,
}

impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held { self.just_pressed = true; }
        if !held && self.held { self.just_released = true; }
        self.held = held;
    }

    fn clear_edges(&mut self) {
        self.just_pressed = false;
        self.just_released = false;
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    restart: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            restart: vec![Btn::Start],
            quit:    vec![Btn::Select],
        }
    }
}

/// One digital direction: D-pad and stick are tracked separately, either counts.
#[derive(Clone, Copy, Debug, Default)]
struct DirInput {
    dpad: BtnState,
    stick: BtnState,
}

impl DirInput {
    fn pressed(&self) -> bool {
        let dpad_before = self.dpad.held && !self.dpad.just_pressed;
        let stick_before = self.stick.held && !self.stick.just_pressed;
        (self.dpad.just_pressed || self.stick.just_pressed) && !dpad_before && !stick_before
    }

    fn released(&self) -> bool {
        (self.dpad.just_released || self.stick.just_released) && !self.dpad.held && !self.stick.held
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    // All tracked buttons (indexed by Btn)
    buttons: [BtnState; 10],

    // Indexed like `Direction::RESOLVE_ORDER`
    dirs: [DirInput; 4],

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    // Action mapping
    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Down  => 0,
        Direction::Up    => 1,
        Direction::Left  => 2,
        Direction::Right => 3,
    }
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = {
            match Gilrs::new() {
                Ok(g) => {
                    let has_pad = g.gamepads().next().is_some();
                    (Some(g), has_pad)
                }
                Err(e) => {
                    log::warn!("gamepad support unavailable: {e}");
                    (None, false)
                }
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dirs: [DirInput::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let rs = parse_list(&cfg.restart);
        if !rs.is_empty() { map.restart = rs; }
        let qt = parse_list(&cfg.quit);
        if !qt.is_empty() { map.quit = qt; }
    }

    /// Poll the pad and forward direction edges to `world`.
    pub fn update(&mut self, world: &mut GameState) {
        self.clear_edges();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        self.feed(world);
    }

    /// Fresh presses become `key_down`, full releases become `key_up`.
    fn feed(&self, world: &mut GameState) {
        for dir in Direction::RESOLVE_ORDER {
            let input = &self.dirs[dir_index(dir)];
            if input.pressed() {
                world.key_down(dir);
            }
            if input.released() {
                world.key_up(dir);
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    self.update_axis(axis, value);
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Derive stick digital states
        self.dirs[dir_index(Direction::Left)].stick.set(self.stick_x < -STICK_DEADZONE);
        self.dirs[dir_index(Direction::Right)].stick.set(self.stick_x > STICK_DEADZONE);
        self.dirs[dir_index(Direction::Up)].stick.set(self.stick_y > STICK_DEADZONE);
        self.dirs[dir_index(Direction::Down)].stick.set(self.stick_y < -STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        // D-pad handled separately (not in Btn enum)
        let dpad = match gilrs_btn {
            Button::DPadUp    => Some(Direction::Up),
            Button::DPadDown  => Some(Direction::Down),
            Button::DPadLeft  => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(dir) = dpad {
            self.dirs[dir_index(dir)].dpad.set(held);
            return;
        }

        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.buttons[btn_index(btn)].set(held);
        }
    }

    #[cfg(feature = "gamepad")]
    fn update_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::LeftStickX => self.stick_x = value,
            Axis::LeftStickY => self.stick_y = value,
            _ => {}
        }
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.quit)
    }

    // ── Internal ──

    fn clear_edges(&mut self) {
        for b in &mut self.buttons { b.clear_edges(); }
        for d in &mut self.dirs {
            d.dpad.clear_edges();
            d.stick.clear_edges();
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { b.set(false); }
        for d in &mut self.dirs {
            d.dpad.set(false);
            d.stick.set(false);
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
