use crate::config::{Config, RotationMode};
use crate::geometry::Scene;
use crate::math::Angles;
use std::time::{Duration, Instant};

/// Smallest rotation speed the speed keys can reach
pub const MIN_SPEED: f64 = 0.001;
/// Amount one frame of a speed key changes the speed by
pub const SPEED_STEP: f64 = 0.001;

/// How long a key seen only as a press stays held; outlasts the usual
/// delay before a terminal starts auto-repeating
pub const FIRST_REPEAT_TIMEOUT: Duration = Duration::from_millis(550);
/// How long a key stays held after an auto-repeat
pub const REPEAT_TIMEOUT: Duration = Duration::from_millis(120);

/// A held keyboard control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    PitchUp,
    PitchDown,
    YawLeft,
    YawRight,
    RollLeft,
    RollRight,
    SpeedUp,
    SpeedDown,
}

impl Control {
    pub const ALL: [Control; 8] = [
        Control::PitchUp,
        Control::PitchDown,
        Control::YawLeft,
        Control::YawRight,
        Control::RollLeft,
        Control::RollRight,
        Control::SpeedUp,
        Control::SpeedDown,
    ];
    const COUNT: usize = Self::ALL.len();

    fn index(self) -> usize {
        self as usize
    }
}

/// Set of controls currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    held: [bool; Control::COUNT],
}

impl HeldKeys {
    pub fn press(&mut self, control: Control) {
        self.held[control.index()] = true;
    }

    pub fn release(&mut self, control: Control) {
        self.held[control.index()] = false;
    }

    pub fn is_held(&self, control: Control) -> bool {
        self.held[control.index()]
    }

    pub fn clear(&mut self) {
        self.held = [false; Control::COUNT];
    }

    fn any_rotation(&self) -> bool {
        [
            Control::PitchUp,
            Control::PitchDown,
            Control::YawLeft,
            Control::YawRight,
            Control::RollLeft,
            Control::RollRight,
        ]
        .into_iter()
        .any(|c| self.is_held(c))
    }

    /// +1, -1 or 0 depending on which of the pair is held
    fn axis(&self, negative: Control, positive: Control) -> f64 {
        match (self.is_held(negative), self.is_held(positive)) {
            (false, true) => 1.0,
            (true, false) => -1.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pulse {
    at: Instant,
    repeating: bool,
}

/// Infers held keys from presses and auto-repeats alone, for terminals
/// that never report releases. A key counts as held until its repeats stop
/// arriving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulsedKeys {
    pulses: [Option<Pulse>; Control::COUNT],
}

impl PulsedKeys {
    /// Records a press or repeat of `control` and marks it held
    pub fn pulse(&mut self, control: Control, now: Instant, held: &mut HeldKeys) {
        let slot = &mut self.pulses[control.index()];
        *slot = Some(Pulse {
            at: now,
            repeating: slot.is_some(),
        });
        held.press(control);
    }

    /// Releases every control whose last pulse is older than its timeout
    pub fn expire(&mut self, now: Instant, held: &mut HeldKeys) {
        for control in Control::ALL {
            let slot = &mut self.pulses[control.index()];
            if let Some(pulse) = *slot {
                let timeout = if pulse.repeating {
                    REPEAT_TIMEOUT
                } else {
                    FIRST_REPEAT_TIMEOUT
                };
                if now.saturating_duration_since(pulse.at) > timeout {
                    *slot = None;
                    held.release(control);
                }
            }
        }
    }

    pub fn release(&mut self, control: Control) {
        self.pulses[control.index()] = None;
    }

    pub fn clear(&mut self) {
        self.pulses = [None; Control::COUNT];
    }
}

/// Mouse drag state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Left button held; `last` is the position consumed by the previous frame
    Dragging { last: (f64, f64) },
}

/// Everything the user's input changes between frames
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    pub angles: Angles,
    pub speed: f64,
    pub sensitivity: f64,
    pub drag: DragState,
    /// Latest pointer position reported by the surface
    pub pointer: (f64, f64),
    pub paused: bool,
    pub debug: bool,
}

impl InteractionState {
    pub fn new(speed: f64, sensitivity: f64) -> Self {
        InteractionState {
            angles: Angles::default(),
            speed,
            sensitivity,
            drag: DragState::Idle,
            pointer: (0.0, 0.0),
            paused: false,
            debug: false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Left button down: anchor the drag at `pos`
    pub fn mouse_down(&mut self, pos: (f64, f64)) {
        if self.paused {
            return;
        }
        self.pointer = pos;
        self.drag = DragState::Dragging { last: pos };
    }

    pub fn mouse_moved(&mut self, pos: (f64, f64)) {
        self.pointer = pos;
    }

    pub fn mouse_up(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        if self.paused {
            self.drag = DragState::Idle;
        }
    }

    /// Advances the interaction by one frame and reports whether the
    /// geometry should be rotated this frame.
    pub fn step(&mut self, held: &HeldKeys, mode: RotationMode) -> bool {
        if self.paused {
            return false;
        }

        if held.is_held(Control::SpeedUp) {
            self.speed += SPEED_STEP;
        }
        if held.is_held(Control::SpeedDown) {
            self.speed = (self.speed - SPEED_STEP).max(MIN_SPEED);
        }

        self.angles.x += held.axis(Control::PitchUp, Control::PitchDown) * self.speed;
        self.angles.y += held.axis(Control::YawLeft, Control::YawRight) * self.speed;
        self.angles.z += held.axis(Control::RollRight, Control::RollLeft) * self.speed;

        if let DragState::Dragging { last } = self.drag {
            let dx = self.pointer.0 - last.0;
            let dy = self.pointer.1 - last.1;
            self.angles.x += dy * self.sensitivity;
            self.angles.y += dx * self.sensitivity;
            self.drag = DragState::Dragging { last: self.pointer };
        }

        match mode {
            RotationMode::Interactive => held.any_rotation() || self.is_dragging(),
            RotationMode::Always => {
                self.angles.y += self.speed;
                true
            }
        }
    }
}

/// The scene plus the input state driving it, owned by the main loop
#[derive(Debug, Clone)]
pub struct Simulation {
    pub scene: Scene,
    pub interaction: InteractionState,
    pub mode: RotationMode,
    pub frames: u64,
}

impl Simulation {
    pub fn new(config: &Config) -> Self {
        Simulation {
            scene: Scene::cube(),
            interaction: InteractionState::new(config.speed, config.sensitivity),
            mode: config.mode,
            frames: 0,
        }
    }

    /// Runs one frame of input handling and transformation
    pub fn tick(&mut self, held: &HeldKeys) {
        self.frames += 1;
        if self.interaction.step(held, self.mode) && !self.interaction.angles.is_zero() {
            self.scene.rotate(self.interaction.angles);
        }
    }
}
