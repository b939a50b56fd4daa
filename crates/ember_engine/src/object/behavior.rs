//! Object behaviors: the overridable lifecycle and collision hooks
//!
//! A behavior is the "subclass" seam of a game object. The scene invokes the
//! hooks; authors override only what they need. Collision hooks receive the
//! key of the *other* collider so authors never touch the physics simulation
//! directly.

use crate::events::{Event, EventQueue};
use crate::scene::Scene;

use super::component::ComponentKey;
use super::components::Transform;
use super::game_object::ObjectKey;

/// Overridable lifecycle and collision hooks for a game object
///
/// All hooks default to no-ops.
#[allow(unused_variables)]
pub trait ObjectBehavior {
    /// One-time setup, re-run after re-activation
    fn on_start(&mut self, ctx: &mut ObjectContext<'_>) {}

    /// Per-frame update
    fn on_update(&mut self, ctx: &mut ObjectContext<'_>, dt: f32) {}

    /// Per-frame update after every `on_update` has run
    fn on_late_update(&mut self, ctx: &mut ObjectContext<'_>, dt: f32) {}

    /// Fixed-timestep update, once per physics tick
    fn on_fixed_update(&mut self, ctx: &mut ObjectContext<'_>, fixed_dt: f32) {}

    /// Destruction hook, run when destruction is requested
    fn on_destroy(&mut self, ctx: &mut ObjectContext<'_>) {}

    /// Rigid contact began with `other`
    fn on_collision_enter(&mut self, ctx: &mut ObjectContext<'_>, other: ComponentKey) {}

    /// Rigid contact persisted with `other`
    fn on_collision_stay(&mut self, ctx: &mut ObjectContext<'_>, other: ComponentKey) {}

    /// Rigid contact ended with `other`
    fn on_collision_exit(&mut self, ctx: &mut ObjectContext<'_>, other: ComponentKey) {}

    /// Trigger overlap began with `other`
    fn on_trigger_enter(&mut self, ctx: &mut ObjectContext<'_>, other: ComponentKey) {}

    /// Trigger overlap persisted with `other`
    fn on_trigger_stay(&mut self, ctx: &mut ObjectContext<'_>, other: ComponentKey) {}

    /// Trigger overlap ended with `other`
    fn on_trigger_exit(&mut self, ctx: &mut ObjectContext<'_>, other: ComponentKey) {}
}

/// The behavior's window into the world during a hook invocation
pub struct ObjectContext<'a> {
    /// The scene the object lives in
    pub scene: &'a mut Scene,
    /// The bus queue for raising deferred events
    pub events: &'a mut EventQueue,
    object: ObjectKey,
}

impl<'a> ObjectContext<'a> {
    pub(crate) fn new(scene: &'a mut Scene, events: &'a mut EventQueue, object: ObjectKey) -> Self {
        Self {
            scene,
            events,
            object,
        }
    }

    /// The object this hook is running for
    pub fn object(&self) -> ObjectKey {
        self.object
    }

    /// The object's transform
    pub fn transform(&self) -> Option<&Transform> {
        self.scene.transform_of(self.object)
    }

    /// Mutable access to the object's transform
    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        self.scene.transform_of_mut(self.object)
    }

    /// Request deferred destruction of this object
    pub fn destroy(&mut self) {
        self.scene.destroy_object(self.object, self.events);
    }

    /// Raise a deferred event on the bus
    pub fn queue_event(&mut self, event: Event) {
        self.events.queue_event(event);
    }

    /// The object owning some other component (e.g. a collision partner)
    pub fn owner_of(&self, component: ComponentKey) -> Option<ObjectKey> {
        self.scene.component_ref(component).map(|c| c.owner())
    }
}
