//! Physics body component: dynamic rigid-body settings
//!
//! Attaching a physics body promotes the object's rigid actor from static to
//! dynamic; the settings here are pushed into the simulation whenever the
//! actor is (re)created.

use crate::physics::{BodyProps, FreezeAxes};

/// Dynamic rigid-body settings for a game object
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsBody {
    /// Mass in kilograms
    pub mass: f32,

    /// Linear velocity damping factor
    pub drag: f32,

    /// Whether scene gravity applies to this body
    pub use_gravity: bool,

    /// World axes along which the body may not translate
    pub frozen: FreezeAxes,
}

impl Default for PhysicsBody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            drag: 0.0,
            use_gravity: true,
            frozen: FreezeAxes::empty(),
        }
    }
}

impl PhysicsBody {
    /// Create a body with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style mass override
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Builder-style drag override
    pub fn with_drag(mut self, drag: f32) -> Self {
        self.drag = drag;
        self
    }

    /// Builder-style gravity toggle
    pub fn with_gravity(mut self, use_gravity: bool) -> Self {
        self.use_gravity = use_gravity;
        self
    }

    /// Builder-style axis constraints
    pub fn with_frozen_axes(mut self, frozen: FreezeAxes) -> Self {
        self.frozen = frozen;
        self
    }

    /// Snapshot of the settings in the simulation's terms
    pub fn props(&self) -> BodyProps {
        BodyProps {
            mass: self.mass,
            drag: self.drag,
            use_gravity: self.use_gravity,
            frozen: self.frozen,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let body = PhysicsBody::new()
            .with_mass(4.0)
            .with_drag(0.5)
            .with_gravity(false)
            .with_frozen_axes(FreezeAxes::X | FreezeAxes::Z);

        let props = body.props();
        assert_eq!(props.mass, 4.0);
        assert_eq!(props.drag, 0.5);
        assert!(!props.use_gravity);
        assert!(props.frozen.contains(FreezeAxes::X));
        assert!(!props.frozen.contains(FreezeAxes::Y));
    }
}
