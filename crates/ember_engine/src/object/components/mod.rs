//! Concrete component payloads
//!
//! One file per component kind, mirroring the closed set in
//! [`ComponentKind`](super::component::ComponentKind).

pub mod camera;
pub mod collider;
pub mod physics_body;
pub mod transform;
pub mod visualizer;

pub use camera::Camera;
pub use collider::{BehaviorHook, Collider, CollisionKind};
pub use physics_body::PhysicsBody;
pub use transform::Transform;
pub use visualizer::Visualizer;
