//! Physics: rigid-body simulation and the component bridge
//!
//! [`sim`] is the rigid-body engine behind a deliberately narrow contract:
//! opaque actor/shape handles, attach/detach, geometry mutation, and a fixed
//! step that returns the tick's contact/trigger events. [`bridge`] keeps
//! collider and physics-body components consistent with it.

pub(crate) mod bridge;
pub mod sim;

pub use sim::{
    ActorKey, ActorKind, BodyProps, ContactCategory, ContactEvent, ContactPhase, FreezeAxes,
    PhysicsError, PhysicsSim, ShapeGeometry, ShapeKey,
};
