//! Collider component: a physics collision volume bound to a rigid actor
//!
//! The collider owns an opaque simulation shape handle and routes the
//! simulation's contact/trigger notifications to the owning object's behavior
//! hooks. Geometry mutation never touches the shape directly; the scene
//! detaches, mutates, and reattaches because the simulation forbids mutating
//! the geometry of an attached shape.

use std::collections::HashMap;

use crate::foundation::math::Vec3;
use crate::physics::{ContactCategory, ContactPhase, ShapeGeometry, ShapeKey};

/// Collision event kinds routed to collider callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    /// Rigid contact began this tick
    CollisionEnter,
    /// Rigid contact persisted from the previous tick
    CollisionStay,
    /// Rigid contact ended this tick
    CollisionExit,
    /// Trigger overlap began this tick
    TriggerEnter,
    /// Trigger overlap persisted from the previous tick
    TriggerStay,
    /// Trigger overlap ended this tick
    TriggerExit,
}

impl CollisionKind {
    /// Map a simulation event classification onto a collision kind
    pub fn from_parts(category: ContactCategory, phase: ContactPhase) -> Self {
        match (category, phase) {
            (ContactCategory::Contact, ContactPhase::Enter) => Self::CollisionEnter,
            (ContactCategory::Contact, ContactPhase::Stay) => Self::CollisionStay,
            (ContactCategory::Contact, ContactPhase::Exit) => Self::CollisionExit,
            (ContactCategory::Trigger, ContactPhase::Enter) => Self::TriggerEnter,
            (ContactCategory::Trigger, ContactPhase::Stay) => Self::TriggerStay,
            (ContactCategory::Trigger, ContactPhase::Exit) => Self::TriggerExit,
        }
    }

    /// All six kinds, in callback-registration order
    pub fn all() -> [Self; 6] {
        [
            Self::CollisionEnter,
            Self::CollisionStay,
            Self::CollisionExit,
            Self::TriggerEnter,
            Self::TriggerStay,
            Self::TriggerExit,
        ]
    }
}

/// Owner-side hook a collision callback resolves to
///
/// The indirection lets an object author override collision behavior through
/// [`ObjectBehavior`](crate::object::ObjectBehavior) without knowing anything
/// about the physics simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorHook {
    /// `on_collision_enter`
    CollisionEnter,
    /// `on_collision_stay`
    CollisionStay,
    /// `on_collision_exit`
    CollisionExit,
    /// `on_trigger_enter`
    TriggerEnter,
    /// `on_trigger_stay`
    TriggerStay,
    /// `on_trigger_exit`
    TriggerExit,
}

impl BehaviorHook {
    /// The default hook for a collision kind (identity wiring)
    pub fn default_for(kind: CollisionKind) -> Self {
        match kind {
            CollisionKind::CollisionEnter => Self::CollisionEnter,
            CollisionKind::CollisionStay => Self::CollisionStay,
            CollisionKind::CollisionExit => Self::CollisionExit,
            CollisionKind::TriggerEnter => Self::TriggerEnter,
            CollisionKind::TriggerStay => Self::TriggerStay,
            CollisionKind::TriggerExit => Self::TriggerExit,
        }
    }
}

/// Physics collision volume component
///
/// At most one collider per object; a box collider and a sphere collider
/// cannot coexist on the same object.
#[derive(Debug, Clone)]
pub struct Collider {
    pub(crate) shape: ShapeGeometry,

    /// Overlap-only volume: reports trigger events and never blocks
    pub is_trigger: bool,

    pub(crate) shape_key: Option<ShapeKey>,

    callbacks: HashMap<CollisionKind, BehaviorHook>,
}

impl Collider {
    fn new(shape: ShapeGeometry) -> Self {
        // Six default callbacks, wired to the owner's behavior hooks
        let callbacks = CollisionKind::all()
            .into_iter()
            .map(|kind| (kind, BehaviorHook::default_for(kind)))
            .collect();
        Self {
            shape,
            is_trigger: false,
            shape_key: None,
            callbacks,
        }
    }

    /// Create a box collider from half extents
    pub fn new_box(half_extents: Vec3) -> Self {
        Self::new(ShapeGeometry::Box { half_extents })
    }

    /// Create a sphere collider from a radius
    pub fn new_sphere(radius: f32) -> Self {
        Self::new(ShapeGeometry::Sphere { radius })
    }

    /// The unit-cube fallback synthesized when a physics body arrives on an
    /// object with no collider
    pub fn default_box() -> Self {
        Self::new_box(Vec3::new(0.5, 0.5, 0.5))
    }

    /// Builder-style trigger flag
    pub fn as_trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// The collision geometry
    pub fn shape(&self) -> &ShapeGeometry {
        &self.shape
    }

    /// The simulation shape handle, if creation succeeded
    pub fn shape_key(&self) -> Option<ShapeKey> {
        self.shape_key
    }

    /// Whether the collider currently has a simulation shape
    pub fn has_shape(&self) -> bool {
        self.shape_key.is_some()
    }

    /// The hook registered for a collision kind, if any
    pub fn callback(&self, kind: CollisionKind) -> Option<BehaviorHook> {
        self.callbacks.get(&kind).copied()
    }

    /// Re-route a collision kind to a different owner hook
    pub fn set_callback(&mut self, kind: CollisionKind, hook: BehaviorHook) {
        self.callbacks.insert(kind, hook);
    }

    /// Drop the callback entry for a kind (used in tests to model a
    /// mis-registered collider)
    pub fn clear_callback(&mut self, kind: CollisionKind) {
        self.callbacks.remove(&kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_six_default_callbacks_registered() {
        let collider = Collider::new_sphere(1.0);
        for kind in CollisionKind::all() {
            assert_eq!(collider.callback(kind), Some(BehaviorHook::default_for(kind)));
        }
    }

    #[test]
    fn test_callback_rerouting() {
        let mut collider = Collider::default_box();
        collider.set_callback(CollisionKind::TriggerEnter, BehaviorHook::CollisionEnter);
        assert_eq!(
            collider.callback(CollisionKind::TriggerEnter),
            Some(BehaviorHook::CollisionEnter)
        );
    }

    #[test]
    fn test_new_collider_has_no_simulation_shape() {
        let collider = Collider::new_box(Vec3::new(1.0, 1.0, 1.0));
        assert!(!collider.has_shape());
        assert!(!collider.is_trigger);
        assert!(Collider::new_sphere(2.0).as_trigger().is_trigger);
    }
}
