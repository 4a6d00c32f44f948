use crate::config::Config;
use crate::graphics::Frame;
use crate::render::{render_scene, BACKGROUND};
use crate::state::{Control, HeldKeys, PulsedKeys, Simulation};
use crate::terminal::{TerminalSurface, Viewport};
use anyhow::Context;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use log::{debug, info, trace};
use std::io;
use std::time::{Duration, Instant};

const CONTROLS: &str =
    "arrows pitch/yaw  z/x roll  +/- speed  drag rotate  p pause  d debug  q quit";

/// How held keys are known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTracking {
    /// The terminal reports releases; a key stays held until released
    Reported,
    /// Only presses and repeats arrive; a key stays held while its
    /// auto-repeats keep coming
    Pulsed,
}

/// Frames-per-second counter for the debug overlay
#[derive(Debug)]
struct FpsCounter {
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
}

impl FpsCounter {
    fn new() -> Self {
        FpsCounter {
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
        }
    }

    fn frame(&mut self) {
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let duration = now.duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }
    }
}

/// The interactive viewer: simulation, input bookkeeping and the frame buffer
pub struct App {
    config: Config,
    sim: Simulation,
    held: HeldKeys,
    pulses: PulsedKeys,
    key_tracking: KeyTracking,
    frame: Frame,
    running: bool,
    fps: FpsCounter,
}

fn control_for(code: KeyCode) -> Option<Control> {
    match code {
        KeyCode::Up => Some(Control::PitchUp),
        KeyCode::Down => Some(Control::PitchDown),
        KeyCode::Left => Some(Control::YawLeft),
        KeyCode::Right => Some(Control::YawRight),
        KeyCode::Char('z') | KeyCode::Char('Z') => Some(Control::RollLeft),
        KeyCode::Char('x') | KeyCode::Char('X') => Some(Control::RollRight),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Control::SpeedUp),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Control::SpeedDown),
        _ => None,
    }
}

impl App {
    pub fn new(config: Config, key_tracking: KeyTracking) -> Self {
        let frame = Frame::new(config.camera.width as usize, config.camera.height as usize);
        App {
            sim: Simulation::new(&config),
            config,
            held: HeldKeys::default(),
            pulses: PulsedKeys::default(),
            key_tracking,
            frame,
            running: true,
            fps: FpsCounter::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    fn release_all(&mut self) {
        self.held.clear();
        self.pulses.clear();
    }

    /// Applies one input event received at `now`; `viewport` maps mouse
    /// cells to surface pixels
    pub fn handle_event(&mut self, event: Event, viewport: Viewport, now: Instant) {
        match event {
            Event::Key(key) => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse, viewport),
            Event::FocusLost => self.release_all(),
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if let Some(control) = control_for(key.code) {
            match (key.kind, self.key_tracking) {
                (KeyEventKind::Release, _) => {
                    self.pulses.release(control);
                    self.held.release(control);
                }
                (_, KeyTracking::Reported) => self.held.press(control),
                (_, KeyTracking::Pulsed) => self.pulses.pulse(control, now, &mut self.held),
            }
            return;
        }

        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.sim.interaction.toggle_pause();
                // Drop any keys captured before the pause
                self.release_all();
                info!("paused: {}", self.sim.interaction.paused);
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                self.sim.interaction.debug = !self.sim.interaction.debug;
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, viewport: Viewport) {
        let pos = viewport.cell_to_surface(mouse.column, mouse.row);
        let interaction = &mut self.sim.interaction;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => interaction.mouse_down(pos),
            MouseEventKind::Up(MouseButton::Left) => interaction.mouse_up(),
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                interaction.mouse_moved(pos)
            }
            _ => {}
        }
    }

    /// State update for the frame starting at `now`
    pub fn update(&mut self, now: Instant) {
        if self.key_tracking == KeyTracking::Pulsed {
            self.pulses.expire(now, &mut self.held);
        }
        self.sim.tick(&self.held);
        trace!("frame {} angles {:?}", self.sim.frames, self.sim.interaction.angles);
    }

    fn overlay(&self) -> Vec<String> {
        let interaction = &self.sim.interaction;
        if !interaction.debug {
            return Vec::new();
        }
        let angles = interaction.angles;
        vec![
            format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            format!(
                "Angle X: {:.3}, Angle Y: {:.3}, Angle Z: {:.3}",
                angles.x, angles.y, angles.z
            ),
            format!("Speed: {:.3}", interaction.speed),
            format!("Mode: {:?}", self.sim.mode),
            format!("FPS: {:.2}", self.fps.fps),
        ]
    }

    fn status(&self) -> String {
        if self.sim.interaction.paused {
            format!("[paused]  {CONTROLS}")
        } else {
            CONTROLS.to_string()
        }
    }

    /// Renders the scene and presents it
    fn draw(&mut self, surface: &mut TerminalSurface) -> io::Result<()> {
        self.fps.frame();
        let labels = render_scene(
            &mut self.frame,
            &self.sim.scene,
            &self.config.camera,
            self.config.light,
        );
        let overlay = self.overlay();
        let status = self.status();
        surface.present(&self.frame, BACKGROUND, &labels, &overlay, &status)
    }

    /// Polls input until `deadline`
    fn poll_until(&mut self, deadline: Instant, surface: &mut TerminalSurface) -> io::Result<()> {
        while self.running {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if !event::poll(timeout)? {
                break;
            }
            match event::read()? {
                Event::Resize(cols, rows) => {
                    debug!("resized to {cols}x{rows}");
                    surface.resize(cols, rows)?;
                }
                event => self.handle_event(event, surface.viewport(), Instant::now()),
            }
        }
        Ok(())
    }

    /// Input, update, render and present at a fixed rate until quit
    pub fn run_loop(&mut self, surface: &mut TerminalSurface) -> io::Result<()> {
        let interval = self.config.frame_interval();
        let mut next_frame = Instant::now() + interval;

        while self.is_running() {
            self.poll_until(next_frame, surface)?;
            if !self.is_running() {
                break;
            }
            self.update(Instant::now());
            self.draw(surface)?;

            next_frame += interval;
            let now = Instant::now();
            if next_frame + Duration::from_secs(1) < now {
                // Too far behind to catch up; restart the cadence
                next_frame = now + interval;
            }
        }
        Ok(())
    }
}

/// Opens the terminal and runs the viewer until the user quits
pub fn run(config: Config) -> anyhow::Result<()> {
    let mut surface = TerminalSurface::open(
        config.camera.width as usize,
        config.camera.height as usize,
    )
    .context("failed to acquire a terminal display surface")?;

    let key_tracking = if surface.reports_key_release() {
        KeyTracking::Reported
    } else {
        KeyTracking::Pulsed
    };
    info!("starting in {:?} mode, key tracking {:?}", config.mode, key_tracking);

    let mut app = App::new(config, key_tracking);
    let result = app.run_loop(&mut surface);
    drop(surface);
    info!("stopped after {} frames", app.simulation().frames);
    result.context("terminal I/O failed")
}
