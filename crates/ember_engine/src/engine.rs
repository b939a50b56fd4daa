//! Core engine implementation
//!
//! The engine coordinates the scene, the event bus, and frame timing in a
//! single-threaded cooperative loop: fixed-timestep physics ticks first, then
//! the variable-timestep gameplay passes, then one full drain of the deferred
//! event queue, then application of pending removals. By the time gameplay
//! code runs, every physics event of the frame's ticks has already been
//! routed to components.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{Event, EventBus, EventListener, EventQueue, EventType};
use crate::foundation::math::Vec3;
use crate::foundation::time::{FixedStep, Timer};
use crate::scene::{PlayMode, Scene};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window title
    pub title: String,

    /// Window width
    pub width: u32,

    /// Window height
    pub height: u32,

    /// Fixed physics timestep in seconds
    pub fixed_timestep: f32,

    /// Cap on physics ticks drained per frame
    pub max_ticks_per_frame: u32,

    /// Gravity vector applied to dynamic bodies
    pub gravity: [f32; 3],

    /// Log filter in `env_logger` syntax
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Ember Engine Application".to_string(),
            width: 1280,
            height: 720,
            fixed_timestep: 1.0 / 50.0,
            max_ticks_per_frame: 8,
            gravity: [0.0, -9.81, 0.0],
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path)
            .map_err(|err| EngineError::ConfigError(err.to_string()))?;
        toml::from_str(&text).map_err(|err| EngineError::ConfigError(err.to_string()))
    }

    fn gravity_vector(&self) -> Vec3 {
        Vec3::new(self.gravity[0], self.gravity[1], self.gravity[2])
    }
}

/// Engine-level errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Initialization error
    #[error("engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Listener flipping the running flag when a quit event arrives
struct RuntimeControl {
    running: bool,
}

impl EventListener for RuntimeControl {
    fn on_event(&mut self, event: &Event, _events: &mut EventQueue) {
        if matches!(event, Event::Quit) {
            log::info!("engine shutdown requested");
            self.running = false;
        }
    }
}

/// Main engine struct
///
/// Owns the scene, the event bus, and frame timing, and drives the per-frame
/// lifecycle.
pub struct Engine {
    scene: Rc<RefCell<Scene>>,
    bus: EventBus,
    timer: Timer,
    fixed: FixedStep,
    control: Rc<RefCell<RuntimeControl>>,
    #[allow(dead_code)] // Retained for runtime reconfiguration
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        log::info!("initializing engine...");

        let scene = Rc::new(RefCell::new(Scene::with_gravity(config.gravity_vector())));
        let control = Rc::new(RefCell::new(RuntimeControl { running: true }));
        let mut bus = EventBus::new();

        let scene_listener: Rc<RefCell<dyn EventListener>> = scene.clone();
        bus.subscribe(
            &[
                EventType::ObjectRemoved,
                EventType::SceneCreate,
                EventType::SceneLoad,
                EventType::SceneSave,
                EventType::WindowResized,
                EventType::SceneViewResized,
                EventType::PlayModeChanged,
            ],
            &scene_listener,
        )
        .map_err(|err| EngineError::InitializationFailed(err.to_string()))?;

        let control_listener: Rc<RefCell<dyn EventListener>> = control.clone();
        bus.subscribe(&[EventType::Quit], &control_listener)
            .map_err(|err| EngineError::InitializationFailed(err.to_string()))?;

        let fixed = FixedStep::new(config.fixed_timestep, config.max_ticks_per_frame);

        Ok(Self {
            scene,
            bus,
            timer: Timer::new(),
            fixed,
            control,
            config,
        })
    }

    /// The shared scene handle
    pub fn scene(&self) -> &Rc<RefCell<Scene>> {
        &self.scene
    }

    /// The event bus
    pub fn bus(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Whether the engine is still running
    pub fn is_running(&self) -> bool {
        self.control.borrow().running
    }

    /// Request engine shutdown at the next frame boundary
    pub fn request_quit(&mut self) {
        self.bus.queue_event(Event::Quit);
    }

    /// Raise a play-mode transition through the bus
    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.bus.queue_event(Event::PlayModeChanged { mode });
    }

    /// Run one frame using wall-clock timing
    pub fn tick(&mut self) {
        self.timer.update();
        let dt = self.timer.delta_time();
        self.advance(dt);
    }

    /// Run one frame with an explicit delta time (deterministic runs, tests)
    pub fn advance(&mut self, dt: f32) {
        let ticks = self.fixed.advance(dt);
        {
            let mut scene = self.scene.borrow_mut();
            scene.start_pending(self.bus.queue_mut());
            for _ in 0..ticks {
                let fixed_dt = self.fixed.step();
                scene.step_physics(fixed_dt, self.bus.queue_mut());
                scene.fixed_update(fixed_dt, self.bus.queue_mut());
            }
            scene.update(dt, self.bus.queue_mut());
            scene.late_update(dt, self.bus.queue_mut());
        }
        // One full drain per frame boundary, then the two-phase removal commit
        self.bus.process_events();
        self.scene.borrow_mut().apply_pending_removals();
    }

    /// Run frames at a fixed cadence until quit or `max_frames` elapse
    ///
    /// Headless driver used by tools and demos; rendering hosts call
    /// [`Engine::tick`] from their own loop instead.
    pub fn run_frames(&mut self, max_frames: u64, dt: f32) {
        let mut frames = 0;
        while self.is_running() && frames < max_frames {
            self.advance(dt);
            frames += 1;
        }
        log::info!("engine loop finished after {frames} frames");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::components::{Collider, PhysicsBody};
    use crate::object::ComponentData;
    use approx::assert_relative_eq;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_quit_event_stops_the_loop() {
        let mut engine = engine();
        assert!(engine.is_running());
        engine.request_quit();
        // The flag flips only when the queue drains at the frame boundary
        assert!(engine.is_running());
        engine.advance(0.016);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_fixed_ticks_accumulate() {
        let mut engine = engine();
        let (crate_key, start_y) = {
            let mut scene = engine.scene().borrow_mut();
            let key = scene.create_object("Crate");
            if let Some(transform) = scene.transform_of_mut(key) {
                transform.position.y = 100.0;
            }
            scene.add_component(key, ComponentData::PhysicsBody(PhysicsBody::new()));
            (key, 100.0)
        };

        // One second of simulated time in 0.1s frames
        for _ in 0..10 {
            engine.advance(0.1);
        }

        let scene = engine.scene().borrow();
        let y = scene.transform_of(crate_key).unwrap().position.y;
        assert!(y < start_y, "gravity should have pulled the crate down");
    }

    #[test]
    fn test_destruction_applies_at_frame_boundary() {
        let mut engine = engine();
        let key = {
            let mut scene = engine.scene().borrow_mut();
            let key = scene.create_object("Doomed");
            scene.add_component(key, ComponentData::Collider(Collider::new_sphere(1.0)));
            key
        };

        {
            let scene_rc = engine.scene().clone();
            let mut scene = scene_rc.borrow_mut();
            scene.destroy_object(key, engine.bus().queue_mut());
        }

        // Deferred: the object survives, inactive, until the frame boundary
        assert!(engine.scene().borrow().object(key).is_some());
        assert!(!engine.scene().borrow().object(key).unwrap().is_active());

        engine.advance(0.016);
        assert!(engine.scene().borrow().object(key).is_none());
        assert_eq!(engine.scene().borrow().physics().actor_count(), 0);
    }

    #[test]
    fn test_play_mode_transition_via_bus() {
        let mut engine = engine();
        engine.set_play_mode(PlayMode::Play);
        assert_eq!(engine.scene().borrow().play_mode(), PlayMode::Edit);
        engine.advance(0.016);
        assert_eq!(engine.scene().borrow().play_mode(), PlayMode::Play);
    }

    #[test]
    fn test_config_round_trip() {
        let config = EngineConfig::default();
        assert_relative_eq!(config.fixed_timestep, 0.02);
        let text = toml::to_string(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.title, config.title);
        assert_relative_eq!(parsed.fixed_timestep, config.fixed_timestep);
    }
}
