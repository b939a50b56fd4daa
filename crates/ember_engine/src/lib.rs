//! # Ember Engine
//!
//! A component-based game engine runtime written in Rust.
//!
//! ## Architecture
//!
//! - **Game objects** aggregate polymorphic components drawn from a closed
//!   set (transform, camera, visualizer, collider, physics body)
//! - **The scene** is the single strong owner of objects and components;
//!   every other consumer holds generational handles validated on access
//! - **The event bus** decouples subsystems with immediate and deferred
//!   (once-per-frame) delivery
//! - **The physics bridge** keeps one correctly-typed rigid actor per object
//!   and routes the simulation's contact/trigger events back to behaviors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ember_engine::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     let mut engine = Engine::new(EngineConfig::default())?;
//!     {
//!         let mut scene = engine.scene().borrow_mut();
//!         let crate_object = scene.create_object("Crate");
//!         scene.add_component(crate_object, ComponentData::PhysicsBody(PhysicsBody::new()));
//!     }
//!     engine.run_frames(600, 1.0 / 60.0);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod events;
pub mod foundation;
pub mod object;
pub mod physics;
pub mod scene;

mod engine;

pub use engine::{Engine, EngineConfig, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        engine::{Engine, EngineConfig, EngineError},
        events::{Event, EventBus, EventListener, EventQueue, EventType},
        foundation::{
            math::{Mat4, Quat, Vec3},
            time::{FixedStep, Timer},
        },
        object::{
            components::{Camera, Collider, PhysicsBody, Transform, Visualizer},
            ComponentData, ComponentKey, ComponentKind, ObjectBehavior, ObjectContext, ObjectKey,
        },
        physics::{ActorKind, FreezeAxes, ShapeGeometry},
        scene::{PlayMode, Scene},
    };
}
