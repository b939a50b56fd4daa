//! Collider/physics-body bridge
//!
//! Keeps exactly one correctly-typed rigid actor per object, keeps every
//! collider shape attached to that actor, and performs the detach/mutate/
//! reattach dance the simulation requires for geometry changes.
//!
//! Per-object actor state machine:
//! - no collider -> no actor
//! - collider, no physics body -> static actor
//! - physics body present -> dynamic actor; attaching or removing the body
//!   recreates the actor around the surviving shapes, preserving geometry

use slotmap::{SecondaryMap, SlotMap};

use crate::foundation::math::{Quat, Vec3};
use crate::object::components::{Collider, PhysicsBody, Transform};
use crate::object::{Component, ComponentKey, ComponentKind, GameObject, ObjectKey};

use super::sim::{ActorKey, ActorKind, BodyProps, PhysicsSim, ShapeGeometry};

/// Split borrows of the scene state the bridge mutates
pub(crate) struct PhysicsBinding<'a> {
    pub sim: &'a mut PhysicsSim,
    pub components: &'a mut SlotMap<ComponentKey, Component>,
    pub objects: &'a SlotMap<ObjectKey, GameObject>,
    pub object_actors: &'a mut SecondaryMap<ObjectKey, ActorKey>,
    pub actor_colliders: &'a mut SecondaryMap<ActorKey, ComponentKey>,
}

impl PhysicsBinding<'_> {
    fn object_name(&self, object: ObjectKey) -> &str {
        self.objects.get(object).map_or("<gone>", GameObject::name)
    }

    fn find_kind(&self, object: ObjectKey, kind: ComponentKind) -> Option<ComponentKey> {
        let object = self.objects.get(object)?;
        object
            .components
            .iter()
            .copied()
            .find(|&key| self.components.get(key).map(|c| c.kind) == Some(kind))
    }

    fn transform_pose(&self, object: ObjectKey) -> (Vec3, Quat) {
        self.find_kind(object, ComponentKind::Transform)
            .and_then(|key| self.components.get(key))
            .and_then(|component| component.get::<Transform>())
            .map_or((Vec3::zeros(), Quat::identity()), |transform| {
                (transform.position, transform.rotation)
            })
    }

    fn has_body(&self, object: ObjectKey) -> bool {
        self.find_kind(object, ComponentKind::PhysicsBody).is_some()
    }

    fn collider_mut(&mut self, key: ComponentKey) -> Option<&mut Collider> {
        self.components
            .get_mut(key)
            .and_then(|component| component.get_mut::<Collider>())
    }

    /// Wire a freshly constructed collider into the simulation
    ///
    /// Creates the object's actor on first contact with the physics world.
    /// Shape creation/attachment failures are logged and leave the collider
    /// shape-less; later passes simply skip it.
    pub fn collider_added(&mut self, object: ObjectKey, collider: ComponentKey) {
        let (position, rotation) = self.transform_pose(object);
        let actor = match self.object_actors.get(object) {
            Some(&actor) => actor,
            None => {
                let actor = self
                    .sim
                    .create_actor(ActorKind::Static, position, rotation);
                self.object_actors.insert(object, actor);
                actor
            }
        };

        let Some((geometry, is_trigger)) = self
            .collider_mut(collider)
            .map(|c| (*c.shape(), c.is_trigger))
        else {
            return;
        };
        let shape = self.sim.create_shape(geometry, is_trigger);
        if let Err(err) = self.sim.attach_shape(actor, shape) {
            log::error!(
                "attach_shape failed for collider on {:?}: {err}",
                self.object_name(object)
            );
            self.sim.release_shape(shape);
            return;
        }
        if let Some(c) = self.collider_mut(collider) {
            c.shape_key = Some(shape);
        }
        self.actor_colliders.insert(actor, collider);
    }

    /// Unwire a collider about to be removed from its object
    pub fn collider_removed(&mut self, object: ObjectKey, collider: ComponentKey) {
        let shape = self.collider_mut(collider).and_then(|c| c.shape_key.take());
        if let Some(shape) = shape {
            // release_shape detaches first if needed
            self.sim.release_shape(shape);
        }
        let Some(&actor) = self.object_actors.get(object) else {
            return;
        };
        if self.actor_colliders.get(actor) == Some(&collider) {
            self.actor_colliders.remove(actor);
        }
        // The actor survives only while something still needs it
        if self.sim.actor_shapes(actor).is_empty() && !self.has_body(object) {
            self.sim.release_actor(actor);
            self.object_actors.remove(object);
        }
    }

    /// Promote the object's actor to dynamic after a physics body attached
    ///
    /// The caller guarantees a collider exists (synthesizing a default box
    /// beforehand if necessary).
    pub fn body_added(&mut self, object: ObjectKey, body: ComponentKey) {
        let props = self
            .components
            .get(body)
            .and_then(|component| component.get::<PhysicsBody>())
            .map(PhysicsBody::props)
            .unwrap_or_default();
        self.rebuild_actor(object, ActorKind::Dynamic, Some(props));
    }

    /// Demote the object's actor back to static after its body was removed
    pub fn body_removed(&mut self, object: ObjectKey) {
        if self.object_actors.contains_key(object) {
            self.rebuild_actor(object, ActorKind::Static, None);
        }
    }

    /// Push the current body settings of an object into its actor
    pub fn apply_body_settings(&mut self, object: ObjectKey, props: BodyProps) {
        if let Some(&actor) = self.object_actors.get(object) {
            if let Err(err) = self.sim.set_body_props(actor, props) {
                log::error!(
                    "set_body_props failed for {:?}: {err}",
                    self.object_name(object)
                );
            }
        }
    }

    /// Replace a collider's geometry: detach, mutate in place, reattach
    ///
    /// The simulation forbids mutating the geometry of an attached shape, so
    /// the swap always goes through this path.
    pub fn set_geometry(&mut self, object: ObjectKey, collider: ComponentKey, geometry: ShapeGeometry) {
        let shape = self.collider_mut(collider).and_then(|c| c.shape_key);
        if let (Some(shape), Some(&actor)) = (shape, self.object_actors.get(object)) {
            let was_attached = self.sim.detach_shape(actor, shape).is_ok();
            if let Err(err) = self.sim.set_geometry(shape, geometry) {
                log::error!(
                    "set_geometry failed for collider on {:?}: {err}",
                    self.object_name(object)
                );
            }
            if was_attached {
                if let Err(err) = self.sim.attach_shape(actor, shape) {
                    log::error!(
                        "reattach after geometry change failed on {:?}: {err}",
                        self.object_name(object)
                    );
                }
            }
        }
        if let Some(c) = self.collider_mut(collider) {
            c.shape = geometry;
        }
    }

    /// Recreate a collider's simulation shape (e.g. trigger flag changed)
    pub fn rebuild_shape(&mut self, object: ObjectKey, collider: ComponentKey) {
        self.detach_collider(object, collider);
        if let Some(c) = self.collider_mut(collider) {
            if let Some(shape) = c.shape_key.take() {
                self.sim.release_shape(shape);
            }
        }
        self.collider_added(object, collider);
    }

    /// Detach a collider's shape without releasing it (deactivation)
    pub fn detach_collider(&mut self, object: ObjectKey, collider: ComponentKey) {
        let shape = self.collider_mut(collider).and_then(|c| c.shape_key);
        if let (Some(shape), Some(&actor)) = (shape, self.object_actors.get(object)) {
            let _ = self.sim.detach_shape(actor, shape);
        }
    }

    /// Reattach a collider's shape after re-activation
    pub fn ensure_attached(&mut self, object: ObjectKey, collider: ComponentKey) {
        let Some(shape) = self.collider_mut(collider).and_then(|c| c.shape_key) else {
            // Shape creation failed earlier; retry from scratch
            self.collider_added(object, collider);
            return;
        };
        if self.sim.shape_actor(shape).is_some() {
            return;
        }
        if let Some(&actor) = self.object_actors.get(object) {
            if let Err(err) = self.sim.attach_shape(actor, shape) {
                log::error!(
                    "reattach failed for collider on {:?}: {err}",
                    self.object_name(object)
                );
            }
        }
    }

    /// Release every simulation resource owned by a removed object
    pub fn object_removed(&mut self, object: ObjectKey) {
        let Some(actor) = self.object_actors.remove(object) else {
            return;
        };
        for shape in self.sim.actor_shapes(actor) {
            self.sim.release_shape(shape);
        }
        self.actor_colliders.remove(actor);
        self.sim.release_actor(actor);
    }

    /// Tear down and recreate the actor with a new mobility kind
    ///
    /// Shapes are detached, carried over, and reattached unchanged, so
    /// geometry survives the swap exactly.
    fn rebuild_actor(&mut self, object: ObjectKey, kind: ActorKind, props: Option<BodyProps>) {
        let Some(&old) = self.object_actors.get(object) else {
            let (position, rotation) = self.transform_pose(object);
            let actor = self.sim.create_actor(kind, position, rotation);
            if let Some(props) = props {
                let _ = self.sim.set_body_props(actor, props);
            }
            self.object_actors.insert(object, actor);
            return;
        };

        let (position, rotation) = self
            .sim
            .actor_pose(old)
            .unwrap_or_else(|| self.transform_pose(object));
        let shapes = self.sim.actor_shapes(old);
        for &shape in &shapes {
            let _ = self.sim.detach_shape(old, shape);
        }
        let bound_collider = self.actor_colliders.remove(old);
        self.sim.release_actor(old);

        let actor = self.sim.create_actor(kind, position, rotation);
        for &shape in &shapes {
            if let Err(err) = self.sim.attach_shape(actor, shape) {
                log::error!(
                    "reattach during actor rebuild failed on {:?}: {err}",
                    self.object_name(object)
                );
            }
        }
        if let Some(props) = props {
            let _ = self.sim.set_body_props(actor, props);
        }
        self.object_actors.insert(object, actor);
        if let Some(collider) = bound_collider {
            self.actor_colliders.insert(actor, collider);
        }
    }
}
