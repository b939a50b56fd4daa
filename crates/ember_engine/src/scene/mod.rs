//! Scene: the single authoritative owner of the object graph
//!
//! The scene owns the object list and the component arena, and maintains two
//! derived caches over them: a per-kind component index and a debug-draw
//! registry. Both hold handles, not data; readers skip stale handles at any
//! access point, and the caches are pruned eagerly only while applying a
//! drained removal event.
//!
//! The scene also owns the physics simulation and is the delivery target for
//! its contact/trigger events, resolved back to colliders through the
//! actor-to-collider map.

pub mod serialization;

use std::collections::HashMap;

use slotmap::{SecondaryMap, SlotMap};

use crate::events::{Event, EventListener, EventQueue};
use crate::foundation::math::{Quat, Vec3};
use crate::object::components::{
    BehaviorHook, Camera, Collider, CollisionKind, PhysicsBody, Transform,
};
use crate::object::registry::{self, DEFAULT_TYPE};
use crate::object::{
    Component, ComponentData, ComponentKey, ComponentKind, ComponentView, GameObject,
    ObjectBehavior, ObjectContext, ObjectKey, ObjectRegistry,
};
use crate::physics::bridge::PhysicsBinding;
use crate::physics::{
    ActorKey, ActorKind, ContactEvent, PhysicsSim, ShapeGeometry,
};

/// Editor vs play mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Editing: the fly camera is the default view
    Edit,
    /// Playing: the first active camera component is the view
    Play,
}

/// The editor's free-flying camera, owned by the scene itself
pub struct FlyCamera {
    /// Projection state
    pub camera: Camera,
    /// World pose
    pub transform: Transform,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            transform: Transform::from_position(Vec3::new(0.0, 2.0, 10.0)),
        }
    }
}

/// Wireframe geometry for debug rendering
#[derive(Debug, Clone, Copy)]
pub enum WireGeometry {
    /// Box outline
    Box {
        /// Half extents along each axis
        half_extents: Vec3,
    },
    /// Sphere outline
    Sphere {
        /// Sphere radius
        radius: f32,
    },
    /// Camera frustum outline
    Frustum {
        /// Vertical field of view in radians
        fov_y: f32,
        /// Aspect ratio
        aspect: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
}

/// One debug wireframe to draw this frame
#[derive(Debug, Clone, Copy)]
pub struct WireFrame {
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// Outline geometry
    pub geometry: WireGeometry,
}

/// World container: object list, component arena, derived indices, physics
pub struct Scene {
    objects: SlotMap<ObjectKey, GameObject>,
    components: SlotMap<ComponentKey, Component>,
    type_index: HashMap<ComponentKind, Vec<ComponentKey>>,
    debug_draw: Vec<ComponentKey>,
    registry: ObjectRegistry,
    /// Editor camera, available regardless of scene content
    pub fly_camera: FlyCamera,
    play_mode: PlayMode,
    physics: PhysicsSim,
    object_actors: SecondaryMap<ObjectKey, ActorKey>,
    actor_colliders: SecondaryMap<ActorKey, ComponentKey>,
    pending_removals: Vec<ObjectKey>,
    next_object_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with standard gravity
    pub fn new() -> Self {
        Self::with_gravity(Vec3::new(0.0, -9.81, 0.0))
    }

    /// Create an empty scene with the given gravity vector
    pub fn with_gravity(gravity: Vec3) -> Self {
        let mut object_registry = ObjectRegistry::new();
        if let Err(err) = registry::register_builtin_types(&mut object_registry) {
            log::error!("builtin type registration failed: {err}");
        }
        Self {
            objects: SlotMap::with_key(),
            components: SlotMap::with_key(),
            type_index: HashMap::new(),
            debug_draw: Vec::new(),
            registry: object_registry,
            fly_camera: FlyCamera::default(),
            play_mode: PlayMode::Edit,
            physics: PhysicsSim::new(gravity),
            object_actors: SecondaryMap::new(),
            actor_colliders: SecondaryMap::new(),
            pending_removals: Vec::new(),
            next_object_id: 1,
        }
    }

    // ---------------------------------------------------------------- objects

    /// Create a plain object with only a transform
    pub fn create_object(&mut self, name: &str) -> ObjectKey {
        self.create_object_with_tag(name, DEFAULT_TYPE)
    }

    /// Create an object carrying an explicit type tag
    pub fn create_object_with_tag(&mut self, name: &str, type_tag: &str) -> ObjectKey {
        let id = self.next_object_id;
        self.next_object_id += 1;
        let key = self.objects.insert(GameObject::new(name, id, type_tag));
        self.add_component(key, ComponentData::Transform(Transform::identity()));
        key
    }

    /// Create an object of a registered type by name
    ///
    /// Unknown names are logged and yield `None` (the editor surfaces this as
    /// a disabled menu entry, deserialization as a degraded load).
    pub fn spawn(&mut self, type_tag: &str, name: &str) -> Option<ObjectKey> {
        let Some(factory) = self.registry.factory(type_tag) else {
            log::warn!("spawn: no object type registered under {type_tag:?}");
            return None;
        };
        Some(factory(self, name))
    }

    /// Borrow an object
    pub fn object(&self, key: ObjectKey) -> Option<&GameObject> {
        self.objects.get(key)
    }

    /// Mutably borrow an object
    pub fn object_mut(&mut self, key: ObjectKey) -> Option<&mut GameObject> {
        self.objects.get_mut(key)
    }

    /// Iterate all objects
    pub fn objects(&self) -> impl Iterator<Item = (ObjectKey, &GameObject)> {
        self.objects.iter()
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// First object with the given display name
    pub fn find_object(&self, name: &str) -> Option<ObjectKey> {
        self.objects
            .iter()
            .find(|(_, object)| object.name() == name)
            .map(|(key, _)| key)
    }

    /// Install an object's behavior
    pub fn set_behavior(&mut self, key: ObjectKey, behavior: Box<dyn ObjectBehavior>) {
        if let Some(object) = self.objects.get_mut(key) {
            object.set_behavior(behavior);
        }
    }

    /// Activate or deactivate an object
    ///
    /// Re-activation re-arms the object's start hook, mirroring the component
    /// rule.
    pub fn set_object_active(&mut self, key: ObjectKey, active: bool) {
        if let Some(object) = self.objects.get_mut(key) {
            if active && !object.active {
                object.started = false;
            }
            object.active = active;
        }
    }

    /// Request deferred destruction of an object
    ///
    /// Runs the destroy hook, queues an [`Event::ObjectRemoved`] on the bus,
    /// and flips the object inactive. The object leaves the arena when the
    /// event has been drained and pending removals are applied, so nothing is
    /// destroyed mid-iteration.
    pub fn destroy_object(&mut self, key: ObjectKey, events: &mut EventQueue) {
        let Some(object) = self.objects.get_mut(key) else {
            return;
        };
        if object.pending_destroy {
            return;
        }
        object.pending_destroy = true;

        if object.behavior.is_some() {
            self.dispatch_destroy(key, events);
        } else if let Some(object) = self.objects.get_mut(key) {
            if object.behavior_in_flight {
                // Self-destruction from inside a running hook; the destroy
                // hook runs when the behavior is returned
                object.needs_destroy_hook = true;
            }
        }

        events.queue_event(Event::ObjectRemoved { object: key });
        if let Some(object) = self.objects.get_mut(key) {
            object.active = false;
        }
    }

    // ------------------------------------------------------------- components

    /// Add a component to an object
    ///
    /// - If the kind already exists and does not allow multiples, the existing
    ///   key is returned unchanged (a merge, not an error).
    /// - A collider whose shape family differs from the object's existing
    ///   collider is rejected with `None` before construction.
    /// - A physics body arriving on an object without a collider first
    ///   synthesizes a default box collider (logged).
    ///
    /// On success the component is constructed, appended to the object, wired
    /// into the physics simulation where applicable, and registered into the
    /// per-kind index and the debug-draw registry.
    pub fn add_component(&mut self, object: ObjectKey, data: ComponentData) -> Option<ComponentKey> {
        let kind = data.kind();
        if !self.objects.contains_key(object) {
            log::warn!("add_component: stale object handle for {}", kind.name());
            return None;
        }

        if !kind.can_have_multiple() {
            if let Some(existing) = self.find_kind(object, kind) {
                if let ComponentData::Collider(incoming) = &data {
                    let conflicting = self
                        .get::<Collider>(existing)
                        .is_some_and(|current| !current.shape().same_family(incoming.shape()));
                    if conflicting {
                        log::warn!(
                            "object {:?} already has a collider of a different shape; \
                             refusing to add a {} collider",
                            self.object_name(object),
                            incoming.shape().family_name()
                        );
                        return None;
                    }
                }
                return Some(existing);
            }
        }

        if kind == ComponentKind::PhysicsBody
            && self.find_kind(object, ComponentKind::Collider).is_none()
        {
            log::warn!(
                "object {:?} has a physics body but no collider; synthesizing a default box",
                self.object_name(object)
            );
            self.add_component(object, ComponentData::Collider(Collider::default_box()));
        }

        let key = self.components.insert(Component::new(object, data));
        if let Some(entry) = self.objects.get_mut(object) {
            entry.components.push(key);
        }

        // Post-construction wiring before the component becomes queryable
        match kind {
            ComponentKind::Collider => self.binding().collider_added(object, key),
            ComponentKind::PhysicsBody => self.binding().body_added(object, key),
            _ => {}
        }

        self.register_component(key);
        Some(key)
    }

    /// Remove a component by key
    ///
    /// A no-op when the key is stale or the kind is non-removable. Removal
    /// drops the component from the arena, so every other holder's key stops
    /// resolving at once; the indices are pruned lazily.
    pub fn remove_component(&mut self, key: ComponentKey) {
        let Some(component) = self.components.get(key) else {
            return;
        };
        let kind = component.kind();
        let object = component.owner();
        if !kind.is_removable() {
            log::warn!(
                "component {} on {:?} is not removable",
                kind.name(),
                self.object_name(object)
            );
            return;
        }

        match kind {
            ComponentKind::Collider => self.binding().collider_removed(object, key),
            ComponentKind::PhysicsBody => {
                // Unhook the settings component first, then demote the actor
                if let Some(entry) = self.objects.get_mut(object) {
                    entry.components.retain(|&existing| existing != key);
                }
                self.components.remove(key);
                self.binding().body_removed(object);
                return;
            }
            _ => {}
        }

        if let Some(entry) = self.objects.get_mut(object) {
            entry.components.retain(|&existing| existing != key);
        }
        self.components.remove(key);
    }

    /// Borrow a component record
    pub fn component_ref(&self, key: ComponentKey) -> Option<&Component> {
        self.components.get(key)
    }

    /// Mutably borrow a component record
    pub fn component_mut(&mut self, key: ComponentKey) -> Option<&mut Component> {
        self.components.get_mut(key)
    }

    /// Typed payload access
    pub fn get<T: ComponentView>(&self, key: ComponentKey) -> Option<&T> {
        self.components.get(key).and_then(Component::get)
    }

    /// Typed mutable payload access
    pub fn get_mut<T: ComponentView>(&mut self, key: ComponentKey) -> Option<&mut T> {
        self.components.get_mut(key).and_then(Component::get_mut)
    }

    /// Key of the first component of `T` on an object
    pub fn find_component<T: ComponentView>(&self, object: ObjectKey) -> Option<ComponentKey> {
        self.find_kind(object, T::KIND)
    }

    /// Whether an object owns a component of `T`
    pub fn has_component<T: ComponentView>(&self, object: ObjectKey) -> bool {
        self.find_kind(object, T::KIND).is_some()
    }

    /// The object's transform payload
    pub fn transform_of(&self, object: ObjectKey) -> Option<&Transform> {
        self.find_kind(object, ComponentKind::Transform)
            .and_then(|key| self.get(key))
    }

    /// Mutable access to the object's transform payload
    pub fn transform_of_mut(&mut self, object: ObjectKey) -> Option<&mut Transform> {
        self.find_kind(object, ComponentKind::Transform)
            .and_then(|key| self.get_mut(key))
    }

    /// Live component keys of a kind, skipping stale index entries
    ///
    /// Stale entries are skipped, not erased; eager pruning happens only when
    /// a removal event is applied.
    pub fn components_of_kind(&self, kind: ComponentKind) -> Vec<ComponentKey> {
        self.type_index
            .get(&kind)
            .map(|keys| {
                keys.iter()
                    .copied()
                    .filter(|&key| self.components.contains_key(key))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Live component keys for a payload type
    pub fn components_of<T: ComponentView>(&self) -> Vec<ComponentKey> {
        self.components_of_kind(T::KIND)
    }

    /// Activate or deactivate a component
    ///
    /// Deactivating a collider detaches its shape from the simulation;
    /// re-activation reattaches it through the start pass, which also re-runs
    /// the component's one-time setup.
    pub fn set_component_active(&mut self, key: ComponentKey, active: bool) {
        let Some(component) = self.components.get_mut(key) else {
            return;
        };
        let was_active = component.is_active();
        component.set_active(active);
        if component.kind() == ComponentKind::Collider && was_active && !active {
            let object = component.owner();
            self.binding().detach_collider(object, key);
        }
    }

    // ------------------------------------------------------- collider setters

    /// Resize a box collider, preserving attachment
    pub fn set_box_size(&mut self, key: ComponentKey, half_extents: Vec3) {
        self.mutate_collider_geometry(key, ShapeGeometry::Box { half_extents });
    }

    /// Resize a sphere collider, preserving attachment
    pub fn set_sphere_radius(&mut self, key: ComponentKey, radius: f32) {
        self.mutate_collider_geometry(key, ShapeGeometry::Sphere { radius });
    }

    fn mutate_collider_geometry(&mut self, key: ComponentKey, geometry: ShapeGeometry) {
        let Some(component) = self.components.get(key) else {
            return;
        };
        let object = component.owner();
        let Some(collider) = component.get::<Collider>() else {
            log::warn!("collider geometry setter called on a non-collider component");
            return;
        };
        if !collider.shape().same_family(&geometry) {
            log::warn!(
                "cannot turn a {} collider into a {} collider on {:?}",
                collider.shape().family_name(),
                geometry.family_name(),
                self.object_name(object)
            );
            return;
        }
        self.binding().set_geometry(object, key, geometry);
    }

    /// Toggle a collider's trigger flag, rebuilding its simulation shape
    pub fn set_collider_trigger(&mut self, key: ComponentKey, is_trigger: bool) {
        let Some(component) = self.components.get_mut(key) else {
            return;
        };
        let object = component.owner();
        let Some(collider) = component.get_mut::<Collider>() else {
            return;
        };
        if collider.is_trigger == is_trigger {
            return;
        }
        collider.is_trigger = is_trigger;
        self.binding().rebuild_shape(object, key);
    }

    /// Re-push an object's body settings into its actor after mutation
    pub fn apply_body_settings(&mut self, object: ObjectKey) {
        let props = self
            .find_kind(object, ComponentKind::PhysicsBody)
            .and_then(|key| self.get::<PhysicsBody>(key))
            .map(PhysicsBody::props);
        if let Some(props) = props {
            self.binding().apply_body_settings(object, props);
        }
    }

    /// Set the linear velocity of an object's dynamic actor
    pub fn set_body_velocity(&mut self, object: ObjectKey, velocity: Vec3) {
        if let Some(&actor) = self.object_actors.get(object) {
            let _ = self.physics.set_velocity(actor, velocity);
        }
    }

    /// The mobility kind of an object's rigid actor, if it has one
    pub fn actor_kind_of(&self, object: ObjectKey) -> Option<ActorKind> {
        self.object_actors
            .get(object)
            .and_then(|&actor| self.physics.actor_kind(actor))
    }

    /// Read access to the physics simulation
    pub fn physics(&self) -> &PhysicsSim {
        &self.physics
    }

    // --------------------------------------------------------------- registry

    /// The reflective object-type registry
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    /// Mutable access to the registry for installing game types
    pub fn registry_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.registry
    }

    // ------------------------------------------------------------------ modes

    /// The current play mode
    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    /// Switch play mode directly (the engine raises the bus event)
    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
    }

    /// The camera to render with
    ///
    /// Editor mode yields the fly camera; play mode (or an explicit primary
    /// request) yields the first active camera component in registration
    /// order (first match, not best match).
    pub fn camera(&self, primary: bool) -> Option<(&Camera, &Transform)> {
        if self.play_mode == PlayMode::Play || primary {
            let keys = self.type_index.get(&ComponentKind::Camera)?;
            for &key in keys {
                let Some(component) = self.components.get(key) else {
                    continue;
                };
                if !component.is_active() {
                    continue;
                }
                let Some(owner) = self.objects.get(component.owner()) else {
                    continue;
                };
                if !owner.is_active() {
                    continue;
                }
                if let (Some(camera), Some(transform)) =
                    (component.get::<Camera>(), self.transform_of(component.owner()))
                {
                    return Some((camera, transform));
                }
            }
            return None;
        }
        Some((&self.fly_camera.camera, &self.fly_camera.transform))
    }

    // ------------------------------------------------------------- debug draw

    /// Wireframes for every active debug-drawable component
    ///
    /// Stale registry entries are skipped; they disappear for good when the
    /// owning object's removal event is applied.
    pub fn collect_wireframes(&self) -> Vec<WireFrame> {
        let mut frames = Vec::new();
        for &key in &self.debug_draw {
            let Some(component) = self.components.get(key) else {
                continue;
            };
            if !component.is_active() {
                continue;
            }
            let Some(transform) = self.transform_of(component.owner()) else {
                continue;
            };
            let geometry = match component.data() {
                ComponentData::Collider(collider) => match *collider.shape() {
                    ShapeGeometry::Box { half_extents } => WireGeometry::Box { half_extents },
                    ShapeGeometry::Sphere { radius } => WireGeometry::Sphere { radius },
                },
                ComponentData::Camera(camera) => WireGeometry::Frustum {
                    fov_y: camera.fov_y,
                    aspect: camera.aspect,
                    near: camera.near,
                    far: camera.far,
                },
                _ => continue,
            };
            frames.push(WireFrame {
                position: transform.position,
                rotation: transform.rotation,
                geometry,
            });
        }
        frames
    }

    // -------------------------------------------------------- frame lifecycle

    /// Run start hooks for active-but-not-yet-started components and objects
    pub fn start_pending(&mut self, events: &mut EventQueue) {
        let object_keys: Vec<ObjectKey> = self.objects.keys().collect();
        for object in object_keys {
            if !self.objects.get(object).is_some_and(GameObject::is_active) {
                continue;
            }
            let component_keys = self.objects[object].components.clone();
            for key in component_keys {
                let needs_start = self
                    .components
                    .get(key)
                    .is_some_and(|c| c.is_active() && !c.is_started());
                if !needs_start {
                    continue;
                }
                if let Some(component) = self.components.get_mut(key) {
                    component.mark_started();
                }
                self.start_component(object, key);
            }
            let needs_start = self
                .objects
                .get(object)
                .is_some_and(|o| o.is_active() && !o.started && o.behavior.is_some());
            if needs_start {
                self.objects[object].started = true;
                self.with_behavior(object, events, |behavior, ctx| behavior.on_start(ctx));
            }
        }
    }

    /// Per-frame update over active objects
    pub fn update(&mut self, dt: f32, events: &mut EventQueue) {
        let object_keys: Vec<ObjectKey> = self.objects.keys().collect();
        for object in object_keys {
            if self.objects.get(object).is_some_and(GameObject::is_active) {
                self.with_behavior(object, events, |behavior, ctx| behavior.on_update(ctx, dt));
            }
        }
    }

    /// Per-frame late update; also refreshes camera matrices
    pub fn late_update(&mut self, dt: f32, events: &mut EventQueue) {
        let object_keys: Vec<ObjectKey> = self.objects.keys().collect();
        for object in object_keys {
            if self.objects.get(object).is_some_and(GameObject::is_active) {
                self.with_behavior(object, events, |behavior, ctx| {
                    behavior.on_late_update(ctx, dt);
                });
            }
        }

        for key in self.components_of_kind(ComponentKind::Camera) {
            let Some(component) = self.components.get(key) else {
                continue;
            };
            if !component.is_active() {
                continue;
            }
            let owner = component.owner();
            let Some(transform) = self.transform_of(owner).cloned() else {
                continue;
            };
            if let Some(camera) = self.get_mut::<Camera>(key) {
                camera.refresh(&transform);
            }
        }
        let FlyCamera { camera, transform } = &mut self.fly_camera;
        camera.refresh(transform);
    }

    /// Fixed-timestep update over active objects, once per physics tick
    pub fn fixed_update(&mut self, fixed_dt: f32, events: &mut EventQueue) {
        let object_keys: Vec<ObjectKey> = self.objects.keys().collect();
        for object in object_keys {
            if self.objects.get(object).is_some_and(GameObject::is_active) {
                self.with_behavior(object, events, |behavior, ctx| {
                    behavior.on_fixed_update(ctx, fixed_dt);
                });
            }
        }
    }

    /// Step the physics simulation one fixed tick and route its events
    ///
    /// Contact events are returned by the step and routed strictly after it,
    /// so the actor-to-collider map is never mutated while the simulation is
    /// mid-step.
    pub fn step_physics(&mut self, fixed_dt: f32, events: &mut EventQueue) {
        let bindings: Vec<(ObjectKey, ActorKey)> = self
            .object_actors
            .iter()
            .map(|(object, &actor)| (object, actor))
            .collect();

        // Editor/gameplay moves of static objects are teleports
        for &(object, actor) in &bindings {
            if self.physics.actor_kind(actor) == Some(ActorKind::Static) {
                if let Some((position, rotation)) = self
                    .transform_of(object)
                    .map(|t| (t.position, t.rotation))
                {
                    let _ = self.physics.set_actor_pose(actor, position, rotation);
                }
            }
        }

        let contact_events = self.physics.step(fixed_dt);

        // Dynamic actors own their pose; copy it back to the transforms
        for &(object, actor) in &bindings {
            if self.physics.actor_kind(actor) == Some(ActorKind::Dynamic) {
                if let Some((position, rotation)) = self.physics.actor_pose(actor) {
                    if let Some(transform) = self.transform_of_mut(object) {
                        transform.position = position;
                        transform.rotation = rotation;
                    }
                }
            }
        }

        for contact in contact_events {
            self.route_contact(&contact, events);
        }
    }

    fn route_contact(&mut self, contact: &ContactEvent, events: &mut EventQueue) {
        let kind = CollisionKind::from_parts(contact.category, contact.phase);
        let collider_a = self.actor_colliders.get(contact.actor_a).copied();
        let collider_b = self.actor_colliders.get(contact.actor_b).copied();
        let (Some(collider_a), Some(collider_b)) = (collider_a, collider_b) else {
            log::warn!("contact event references an unbound actor, skipping {kind:?}");
            return;
        };
        self.execute_collision_callback(collider_a, kind, collider_b, events);
        self.execute_collision_callback(collider_b, kind, collider_a, events);
    }

    /// Route a resolved collision to the owning object's registered callback
    ///
    /// The single entry point for simulation-to-component event delivery. A
    /// collider without a callback entry for `kind` is a programmer error: it
    /// is logged and execution continues.
    pub fn execute_collision_callback(
        &mut self,
        collider: ComponentKey,
        kind: CollisionKind,
        other: ComponentKey,
        events: &mut EventQueue,
    ) {
        let Some(component) = self.components.get(collider) else {
            return;
        };
        let owner = component.owner();
        let Some(hook) = component.get::<Collider>().and_then(|c| c.callback(kind)) else {
            log::error!(
                "collider on {:?} has no callback registered for {:?}",
                self.object_name(owner),
                kind
            );
            return;
        };
        self.with_behavior(owner, events, |behavior, ctx| match hook {
            BehaviorHook::CollisionEnter => behavior.on_collision_enter(ctx, other),
            BehaviorHook::CollisionStay => behavior.on_collision_stay(ctx, other),
            BehaviorHook::CollisionExit => behavior.on_collision_exit(ctx, other),
            BehaviorHook::TriggerEnter => behavior.on_trigger_enter(ctx, other),
            BehaviorHook::TriggerStay => behavior.on_trigger_stay(ctx, other),
            BehaviorHook::TriggerExit => behavior.on_trigger_exit(ctx, other),
        });
    }

    // ---------------------------------------------------------------- removal

    /// Apply destructions whose removal events have been drained
    ///
    /// Erases each object and its components, releases their physics
    /// resources, and then prunes the derived caches of stale handles; the
    /// only place eager pruning happens.
    pub fn apply_pending_removals(&mut self) {
        if self.pending_removals.is_empty() {
            return;
        }
        let removals = std::mem::take(&mut self.pending_removals);
        for object in removals {
            if !self.objects.contains_key(object) {
                continue;
            }
            let component_keys = self.objects[object].components.clone();
            // Detached shapes (deactivated colliders) are not reachable
            // through the actor; release them by component
            for &key in &component_keys {
                let shape = self.get::<Collider>(key).and_then(Collider::shape_key);
                if let Some(shape) = shape {
                    self.physics.release_shape(shape);
                }
            }
            self.binding().object_removed(object);
            for key in component_keys {
                self.components.remove(key);
            }
            self.objects.remove(object);
        }

        let components = &self.components;
        for keys in self.type_index.values_mut() {
            keys.retain(|&key| components.contains_key(key));
        }
        self.debug_draw.retain(|&key| components.contains_key(key));
    }

    /// Drop every object and reset the physics world, keeping the registry
    pub fn reset(&mut self) {
        self.objects.clear();
        self.components.clear();
        self.type_index.clear();
        self.debug_draw.clear();
        self.pending_removals.clear();
        self.object_actors.clear();
        self.actor_colliders.clear();
        self.physics = PhysicsSim::new(self.physics.gravity());
        self.next_object_id = 1;
    }

    pub(crate) fn set_next_object_id(&mut self, next: u64) {
        self.next_object_id = next;
    }

    // ---------------------------------------------------------------- helpers

    fn object_name(&self, object: ObjectKey) -> &str {
        self.objects.get(object).map_or("<gone>", GameObject::name)
    }

    fn find_kind(&self, object: ObjectKey, kind: ComponentKind) -> Option<ComponentKey> {
        let object = self.objects.get(object)?;
        object
            .components
            .iter()
            .copied()
            .find(|&key| self.components.get(key).map(Component::kind) == Some(kind))
    }

    fn register_component(&mut self, key: ComponentKey) {
        let Some(component) = self.components.get(key) else {
            return;
        };
        let kind = component.kind();
        self.type_index.entry(kind).or_default().push(key);
        if kind.debug_drawable() {
            self.debug_draw.push(key);
        }
    }

    fn start_component(&mut self, object: ObjectKey, key: ComponentKey) {
        let kind = match self.components.get(key) {
            Some(component) => component.kind(),
            None => return,
        };
        match kind {
            ComponentKind::Camera => {
                if let Some(transform) = self.transform_of(object).cloned() {
                    if let Some(camera) = self.get_mut::<Camera>(key) {
                        camera.refresh(&transform);
                    }
                }
            }
            ComponentKind::Collider => self.binding().ensure_attached(object, key),
            ComponentKind::PhysicsBody => self.apply_body_settings(object),
            ComponentKind::Transform | ComponentKind::Visualizer => {}
        }
    }

    fn binding(&mut self) -> PhysicsBinding<'_> {
        PhysicsBinding {
            sim: &mut self.physics,
            components: &mut self.components,
            objects: &self.objects,
            object_actors: &mut self.object_actors,
            actor_colliders: &mut self.actor_colliders,
        }
    }

    fn with_behavior<F>(&mut self, object: ObjectKey, events: &mut EventQueue, f: F)
    where
        F: FnOnce(&mut dyn ObjectBehavior, &mut ObjectContext<'_>),
    {
        let mut behavior = match self.objects.get_mut(object) {
            Some(entry) => match entry.behavior.take() {
                Some(behavior) => {
                    entry.behavior_in_flight = true;
                    behavior
                }
                None => return,
            },
            None => return,
        };

        {
            let mut ctx = ObjectContext::new(self, events, object);
            f(behavior.as_mut(), &mut ctx);
        }

        let mut run_destroy_hook = false;
        if let Some(entry) = self.objects.get_mut(object) {
            entry.behavior = Some(behavior);
            entry.behavior_in_flight = false;
            if entry.needs_destroy_hook {
                entry.needs_destroy_hook = false;
                run_destroy_hook = true;
            }
        }
        if run_destroy_hook {
            self.dispatch_destroy(object, events);
        }
    }

    fn dispatch_destroy(&mut self, object: ObjectKey, events: &mut EventQueue) {
        self.with_behavior(object, events, |behavior, ctx| behavior.on_destroy(ctx));
    }
}

impl EventListener for Scene {
    fn on_event(&mut self, event: &Event, _events: &mut EventQueue) {
        match event {
            Event::ObjectRemoved { object } => {
                if self.objects.contains_key(*object) {
                    self.pending_removals.push(*object);
                }
            }
            Event::SceneCreate => self.reset(),
            Event::SceneLoad { path } => {
                if let Err(err) = serialization::load_scene(self, path) {
                    log::error!("scene load from {path:?} failed: {err}");
                }
            }
            Event::SceneSave { path } => {
                if let Err(err) = serialization::save_scene(self, path) {
                    log::error!("scene save to {path:?} failed: {err}");
                }
            }
            Event::WindowResized { width, height } => {
                let aspect = *width as f32 / (*height).max(1) as f32;
                self.fly_camera.camera.set_aspect(aspect);
                for key in self.components_of_kind(ComponentKind::Camera) {
                    if let Some(camera) = self.get_mut::<Camera>(key) {
                        camera.set_aspect(aspect);
                    }
                }
            }
            Event::SceneViewResized { width, height } => {
                let aspect = *width as f32 / (*height).max(1) as f32;
                self.fly_camera.camera.set_aspect(aspect);
            }
            Event::PlayModeChanged { mode } => self.play_mode = *mode,
            Event::Quit => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::components::Visualizer;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        log: Rc<RefCell<Vec<&'static str>>>,
        destroy_on_update: bool,
    }

    impl Recorder {
        fn new(log: &Rc<RefCell<Vec<&'static str>>>) -> Box<Self> {
            Box::new(Self {
                log: log.clone(),
                destroy_on_update: false,
            })
        }

        fn destroying(log: &Rc<RefCell<Vec<&'static str>>>) -> Box<Self> {
            Box::new(Self {
                log: log.clone(),
                destroy_on_update: true,
            })
        }
    }

    impl ObjectBehavior for Recorder {
        fn on_start(&mut self, _ctx: &mut ObjectContext<'_>) {
            self.log.borrow_mut().push("start");
        }

        fn on_update(&mut self, ctx: &mut ObjectContext<'_>, _dt: f32) {
            self.log.borrow_mut().push("update");
            if self.destroy_on_update {
                ctx.destroy();
            }
        }

        fn on_destroy(&mut self, _ctx: &mut ObjectContext<'_>) {
            self.log.borrow_mut().push("destroy");
        }

        fn on_collision_enter(&mut self, _ctx: &mut ObjectContext<'_>, _other: ComponentKey) {
            self.log.borrow_mut().push("collision_enter");
        }

        fn on_trigger_enter(&mut self, _ctx: &mut ObjectContext<'_>, _other: ComponentKey) {
            self.log.borrow_mut().push("trigger_enter");
        }
    }

    fn queue() -> EventQueue {
        EventQueue::default()
    }

    #[test]
    fn test_single_kind_add_is_a_merge() {
        let mut scene = Scene::new();
        let object = scene.create_object("A");

        let first = scene
            .add_component(object, ComponentData::Camera(Camera::default()))
            .unwrap();
        let arena_count = scene.components_of_kind(ComponentKind::Camera).len();

        // Second add returns the existing instance; nothing new is constructed
        let second = scene
            .add_component(object, ComponentData::Camera(Camera::default()))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(
            scene.components_of_kind(ComponentKind::Camera).len(),
            arena_count
        );
    }

    #[test]
    fn test_visualizers_allow_multiples() {
        let mut scene = Scene::new();
        let object = scene.create_object("A");
        let first = scene
            .add_component(object, ComponentData::Visualizer(Visualizer::new("hull")))
            .unwrap();
        let second = scene
            .add_component(object, ComponentData::Visualizer(Visualizer::new("detail")))
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(scene.components_of::<Visualizer>().len(), 2);
    }

    #[test]
    fn test_collider_shape_exclusion() {
        let mut scene = Scene::new();
        let object = scene.create_object("A");
        let box_key = scene
            .add_component(
                object,
                ComponentData::Collider(Collider::new_box(Vec3::new(1.0, 1.0, 1.0))),
            )
            .unwrap();

        // A sphere cannot coexist with the box
        assert!(scene
            .add_component(object, ComponentData::Collider(Collider::new_sphere(1.0)))
            .is_none());

        let colliders = scene.components_of::<Collider>();
        assert_eq!(colliders, vec![box_key]);
        assert!(matches!(
            scene.get::<Collider>(box_key).unwrap().shape(),
            ShapeGeometry::Box { .. }
        ));

        // Same family merges instead
        let merged = scene
            .add_component(
                object,
                ComponentData::Collider(Collider::new_box(Vec3::new(9.0, 9.0, 9.0))),
            )
            .unwrap();
        assert_eq!(merged, box_key);
    }

    #[test]
    fn test_transform_is_not_removable() {
        let mut scene = Scene::new();
        let object = scene.create_object("A");
        let transform_key = scene.find_component::<Transform>(object).unwrap();
        let before = scene.object(object).unwrap().components().len();

        scene.remove_component(transform_key);

        assert_eq!(scene.object(object).unwrap().components().len(), before);
        assert!(scene.transform_of(object).is_some());
    }

    #[test]
    fn test_physics_body_synthesizes_default_collider() {
        let mut scene = Scene::new();
        let object = scene.create_object("Crate");

        scene
            .add_component(object, ComponentData::PhysicsBody(PhysicsBody::new()))
            .unwrap();

        // Exactly one collider, a box, and a dynamic actor
        let collider_count = scene
            .object(object)
            .unwrap()
            .components()
            .iter()
            .filter(|&&key| {
                scene
                    .component_ref(key)
                    .is_some_and(|c| c.kind() == ComponentKind::Collider)
            })
            .count();
        assert_eq!(collider_count, 1);
        let collider_key = scene.find_component::<Collider>(object).unwrap();
        assert!(matches!(
            scene.get::<Collider>(collider_key).unwrap().shape(),
            ShapeGeometry::Box { .. }
        ));
        assert_eq!(scene.actor_kind_of(object), Some(ActorKind::Dynamic));
    }

    #[test]
    fn test_body_promotion_preserves_geometry() {
        let mut scene = Scene::new();
        let object = scene.create_object("Ball");
        let collider_key = scene
            .add_component(object, ComponentData::Collider(Collider::new_sphere(2.0)))
            .unwrap();
        assert_eq!(scene.actor_kind_of(object), Some(ActorKind::Static));

        scene
            .add_component(object, ComponentData::PhysicsBody(PhysicsBody::new()))
            .unwrap();
        assert_eq!(scene.actor_kind_of(object), Some(ActorKind::Dynamic));

        // Geometry survived the actor swap exactly
        let shape_key = scene.get::<Collider>(collider_key).unwrap().shape_key().unwrap();
        assert_eq!(
            scene.physics().geometry(shape_key),
            Some(ShapeGeometry::Sphere { radius: 2.0 })
        );
        assert_eq!(
            *scene.get::<Collider>(collider_key).unwrap().shape(),
            ShapeGeometry::Sphere { radius: 2.0 }
        );
    }

    #[test]
    fn test_body_removal_demotes_to_static() {
        let mut scene = Scene::new();
        let object = scene.create_object("Crate");
        let body_key = scene
            .add_component(object, ComponentData::PhysicsBody(PhysicsBody::new()))
            .unwrap();
        assert_eq!(scene.actor_kind_of(object), Some(ActorKind::Dynamic));

        scene.remove_component(body_key);
        assert_eq!(scene.actor_kind_of(object), Some(ActorKind::Static));
        assert!(!scene.has_component::<PhysicsBody>(object));
    }

    #[test]
    fn test_removal_event_prunes_derived_caches() {
        let mut scene = Scene::new();
        let mut events = queue();
        let object = scene.create_object("Doomed");
        scene.add_component(object, ComponentData::Collider(Collider::new_sphere(1.0)));
        scene.add_component(object, ComponentData::Camera(Camera::default()));
        let survivor = scene.create_object("Survivor");
        scene.add_component(survivor, ComponentData::Camera(Camera::default()));

        scene.destroy_object(object, &mut events);
        assert_eq!(events.len(), 1);

        // Still present until the event is drained
        assert!(scene.object(object).is_some());
        assert!(!scene.object(object).unwrap().is_active());

        scene.on_event(&Event::ObjectRemoved { object }, &mut events);
        scene.apply_pending_removals();

        assert!(scene.object(object).is_none());
        assert_eq!(scene.components_of_kind(ComponentKind::Collider).len(), 0);
        assert_eq!(scene.components_of_kind(ComponentKind::Camera).len(), 1);
        // Eager prune removed the stale entries, not just hid them
        for keys in scene.type_index.values() {
            for &key in keys {
                assert!(scene.components.contains_key(key));
            }
        }
        for &key in &scene.debug_draw {
            assert!(scene.components.contains_key(key));
        }
        // The doomed object's actor and shape were released with it
        assert_eq!(scene.physics().actor_count(), 0);
        assert_eq!(scene.physics().shape_count(), 0);
    }

    #[test]
    fn test_component_restart_on_reactivation() {
        let mut scene = Scene::new();
        let mut events = queue();
        let object = scene.create_object("A");
        let camera_key = scene
            .add_component(object, ComponentData::Camera(Camera::default()))
            .unwrap();

        scene.start_pending(&mut events);
        assert!(scene.component_ref(camera_key).unwrap().is_started());

        scene.set_component_active(camera_key, false);
        scene.set_component_active(camera_key, true);
        assert!(!scene.component_ref(camera_key).unwrap().is_started());

        scene.start_pending(&mut events);
        assert!(scene.component_ref(camera_key).unwrap().is_started());
    }

    #[test]
    fn test_behavior_restart_on_object_reactivation() {
        let mut scene = Scene::new();
        let mut events = queue();
        let log = Rc::new(RefCell::new(Vec::new()));
        let object = scene.create_object("A");
        scene.set_behavior(object, Recorder::new(&log));

        scene.start_pending(&mut events);
        scene.set_object_active(object, false);
        scene.start_pending(&mut events);
        scene.set_object_active(object, true);
        scene.start_pending(&mut events);

        assert_eq!(*log.borrow(), vec!["start", "start"]);
    }

    #[test]
    fn test_collision_routed_to_behavior() {
        let mut scene = Scene::new();
        let mut events = queue();
        let log = Rc::new(RefCell::new(Vec::new()));

        let ground = scene.create_object("Ground");
        scene.add_component(
            ground,
            ComponentData::Collider(Collider::new_box(Vec3::new(10.0, 1.0, 10.0))),
        );

        let ball = scene.create_object("Ball");
        if let Some(transform) = scene.transform_of_mut(ball) {
            transform.position = Vec3::new(0.0, 1.0, 0.0);
        }
        scene.add_component(ball, ComponentData::Collider(Collider::new_sphere(0.5)));
        scene.add_component(ball, ComponentData::PhysicsBody(PhysicsBody::new()));
        scene.set_behavior(ball, Recorder::new(&log));

        scene.step_physics(0.02, &mut events);
        assert!(log.borrow().contains(&"collision_enter"));
    }

    #[test]
    fn test_trigger_routed_to_behavior() {
        let mut scene = Scene::new();
        let mut events = queue();
        let log = Rc::new(RefCell::new(Vec::new()));

        let zone = scene.create_object("Zone");
        scene.add_component(
            zone,
            ComponentData::Collider(Collider::new_box(Vec3::new(3.0, 3.0, 3.0)).as_trigger()),
        );

        let probe = scene.create_object("Probe");
        scene.add_component(probe, ComponentData::Collider(Collider::new_sphere(0.5)));
        scene.add_component(
            probe,
            ComponentData::PhysicsBody(PhysicsBody::new().with_gravity(false)),
        );
        scene.set_behavior(probe, Recorder::new(&log));

        scene.step_physics(0.02, &mut events);
        assert!(log.borrow().contains(&"trigger_enter"));
        assert!(!log.borrow().contains(&"collision_enter"));
    }

    #[test]
    fn test_missing_callback_is_logged_not_fatal() {
        let mut scene = Scene::new();
        let mut events = queue();
        let log = Rc::new(RefCell::new(Vec::new()));

        let ground = scene.create_object("Ground");
        scene.add_component(
            ground,
            ComponentData::Collider(Collider::new_box(Vec3::new(10.0, 1.0, 10.0))),
        );

        let ball = scene.create_object("Ball");
        let ball_collider = scene
            .add_component(ball, ComponentData::Collider(Collider::new_sphere(0.5)))
            .unwrap();
        scene.add_component(ball, ComponentData::PhysicsBody(PhysicsBody::new()));
        scene.set_behavior(ball, Recorder::new(&log));
        scene
            .get_mut::<Collider>(ball_collider)
            .unwrap()
            .clear_callback(CollisionKind::CollisionEnter);

        scene.step_physics(0.02, &mut events);
        assert!(!log.borrow().contains(&"collision_enter"));
    }

    #[test]
    fn test_camera_selection_by_mode() {
        let mut scene = Scene::new();

        // Editor mode falls back to the fly camera
        let (_, fly_transform) = scene.camera(false).unwrap();
        assert_eq!(fly_transform.position, scene.fly_camera.transform.position);

        // Play mode with no cameras yields nothing
        scene.set_play_mode(PlayMode::Play);
        assert!(scene.camera(false).is_none());

        scene.set_play_mode(PlayMode::Edit);
        let holder = scene.spawn("Camera", "Main").unwrap();
        if let Some(transform) = scene.transform_of_mut(holder) {
            transform.position = Vec3::new(7.0, 0.0, 0.0);
        }

        // Primary request returns the component camera even in editor mode
        let (_, transform) = scene.camera(true).unwrap();
        assert_eq!(transform.position, Vec3::new(7.0, 0.0, 0.0));

        scene.set_play_mode(PlayMode::Play);
        let (_, transform) = scene.camera(false).unwrap();
        assert_eq!(transform.position, Vec3::new(7.0, 0.0, 0.0));
    }

    #[test]
    fn test_deactivated_collider_detaches_and_restart_reattaches() {
        let mut scene = Scene::new();
        let mut events = queue();
        let object = scene.create_object("A");
        let collider_key = scene
            .add_component(object, ComponentData::Collider(Collider::new_sphere(1.0)))
            .unwrap();
        let shape_key = scene.get::<Collider>(collider_key).unwrap().shape_key().unwrap();
        assert!(scene.physics().shape_actor(shape_key).is_some());

        scene.set_component_active(collider_key, false);
        assert!(scene.physics().shape_actor(shape_key).is_none());

        scene.set_component_active(collider_key, true);
        scene.start_pending(&mut events);
        assert!(scene.physics().shape_actor(shape_key).is_some());
    }

    #[test]
    fn test_self_destruction_runs_destroy_hook_after_update() {
        let mut scene = Scene::new();
        let mut events = queue();
        let log = Rc::new(RefCell::new(Vec::new()));
        let object = scene.create_object("Ephemeral");
        scene.set_behavior(object, Recorder::destroying(&log));

        scene.start_pending(&mut events);
        scene.update(0.016, &mut events);

        assert_eq!(*log.borrow(), vec!["start", "update", "destroy"]);
        assert_eq!(events.len(), 1);
        assert!(scene.object(object).is_some());

        scene.on_event(&Event::ObjectRemoved { object }, &mut events);
        scene.apply_pending_removals();
        assert!(scene.object(object).is_none());
    }

    #[test]
    fn test_spawn_unknown_type_yields_none() {
        let mut scene = Scene::new();
        assert!(scene.spawn("NoSuchType", "X").is_none());
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn test_set_box_size_preserves_attachment() {
        let mut scene = Scene::new();
        let object = scene.create_object("A");
        let collider_key = scene
            .add_component(
                object,
                ComponentData::Collider(Collider::new_box(Vec3::new(1.0, 1.0, 1.0))),
            )
            .unwrap();
        let shape_key = scene.get::<Collider>(collider_key).unwrap().shape_key().unwrap();

        scene.set_box_size(collider_key, Vec3::new(4.0, 4.0, 4.0));

        assert_eq!(
            scene.physics().geometry(shape_key),
            Some(ShapeGeometry::Box {
                half_extents: Vec3::new(4.0, 4.0, 4.0)
            })
        );
        assert!(scene.physics().shape_actor(shape_key).is_some());

        // Family changes are refused
        scene.set_sphere_radius(collider_key, 3.0);
        assert!(matches!(
            scene.get::<Collider>(collider_key).unwrap().shape(),
            ShapeGeometry::Box { .. }
        ));
    }
}
