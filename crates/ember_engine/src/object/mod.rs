//! Game object and component model
//!
//! A game object is a named aggregate of polymorphic components drawn from a
//! closed set. Components live in the scene's arena and are addressed by
//! generational handles; the object holds the owning side, every other
//! consumer validates its handle on access.

pub mod behavior;
pub mod component;
pub mod components;
pub mod game_object;
pub mod registry;

pub use behavior::{ObjectBehavior, ObjectContext};
pub use component::{Component, ComponentData, ComponentKey, ComponentKind, ComponentView};
pub use game_object::{GameObject, ObjectKey};
pub use registry::{ObjectFactory, ObjectRegistry, RegistryError};
