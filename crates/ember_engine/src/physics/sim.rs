//! Rigid-body simulation with contact/trigger reporting
//!
//! The simulation is split into two phases per step: integration of dynamic
//! actors, then overlap detection between attached shapes. Overlapping pairs
//! are compared against the previous step's pairs to classify each event as
//! enter, stay, or exit.
//!
//! Events are *returned* from [`PhysicsSim::step`], never delivered through a
//! reentrant callback, so callers resolve handles and mutate their own maps
//! strictly between steps.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::foundation::math::{Quat, Vec3};

new_key_type! {
    /// Opaque handle to a rigid actor
    pub struct ActorKey;

    /// Opaque handle to a collision shape
    pub struct ShapeKey;
}

/// Simulation-level failures
///
/// All of these are recoverable: the caller logs and continues with the
/// shape/actor left in its previous state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhysicsError {
    /// The actor handle does not resolve to a live actor
    #[error("unknown actor handle")]
    UnknownActor,

    /// The shape handle does not resolve to a live shape
    #[error("unknown shape handle")]
    UnknownShape,

    /// Geometry of an attached shape cannot be mutated in place
    #[error("shape is attached to an actor; detach before mutating geometry")]
    ShapeAttached,

    /// The shape is already attached to an actor
    #[error("shape is already attached to an actor")]
    AlreadyAttached,

    /// The shape is not attached to the given actor
    #[error("shape is not attached to the given actor")]
    NotAttached,
}

bitflags::bitflags! {
    /// World axes along which a dynamic actor may not translate
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FreezeAxes: u8 {
        /// Lock translation along X
        const X = 0b001;
        /// Lock translation along Y
        const Y = 0b010;
        /// Lock translation along Z
        const Z = 0b100;
    }
}

/// Settings applied to a dynamic actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyProps {
    /// Mass in kilograms
    pub mass: f32,
    /// Linear velocity damping factor
    pub drag: f32,
    /// Whether gravity applies
    pub use_gravity: bool,
    /// Frozen translation axes
    pub frozen: FreezeAxes,
}

impl Default for BodyProps {
    fn default() -> Self {
        Self {
            mass: 1.0,
            drag: 0.0,
            use_gravity: true,
            frozen: FreezeAxes::empty(),
        }
    }
}

/// Collision geometry of a shape
///
/// Boxes are treated as axis-aligned; actor rotation is not applied to box
/// extents during overlap tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeGeometry {
    /// Axis-aligned box
    Box {
        /// Half extents along each axis
        half_extents: Vec3,
    },
    /// Sphere
    Sphere {
        /// Sphere radius
        radius: f32,
    },
}

impl ShapeGeometry {
    /// Whether two geometries are the same shape family (box vs sphere)
    pub fn same_family(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Box { .. }, Self::Box { .. }) | (Self::Sphere { .. }, Self::Sphere { .. })
        )
    }

    /// Stable name used in logs
    pub fn family_name(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Sphere { .. } => "sphere",
        }
    }
}

/// Actor mobility kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    /// Immovable; never integrated
    Static,
    /// Integrated each step under gravity/drag/constraints
    Dynamic,
}

struct Actor {
    kind: ActorKind,
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
    props: BodyProps,
    shapes: Vec<ShapeKey>,
}

struct Shape {
    geometry: ShapeGeometry,
    is_trigger: bool,
    attached_to: Option<ActorKey>,
}

/// Event category: rigid contact vs trigger overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactCategory {
    /// Both shapes are solid
    Contact,
    /// At least one shape is a trigger volume
    Trigger,
}

/// Event phase relative to the previous step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    /// The pair started overlapping this step
    Enter,
    /// The pair kept overlapping
    Stay,
    /// The pair stopped overlapping this step
    Exit,
}

/// A contact/trigger notification for one step
#[derive(Debug, Clone, Copy)]
pub struct ContactEvent {
    /// Contact vs trigger
    pub category: ContactCategory,
    /// Enter/stay/exit
    pub phase: ContactPhase,
    /// First actor of the pair
    pub actor_a: ActorKey,
    /// Second actor of the pair
    pub actor_b: ActorKey,
    /// First shape of the pair
    pub shape_a: ShapeKey,
    /// Second shape of the pair
    pub shape_b: ShapeKey,
}

/// Unordered shape pair, stored smaller key first for set identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct ShapePair(ShapeKey, ShapeKey);

impl ShapePair {
    fn new(a: ShapeKey, b: ShapeKey) -> Self {
        if a < b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

enum WorldVolume {
    Aabb { min: Vec3, max: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl WorldVolume {
    fn overlaps(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Aabb { min: a0, max: a1 }, Self::Aabb { min: b0, max: b1 }) => {
                a0.x <= b1.x && a1.x >= b0.x
                    && a0.y <= b1.y && a1.y >= b0.y
                    && a0.z <= b1.z && a1.z >= b0.z
            }
            (Self::Sphere { center: ca, radius: ra }, Self::Sphere { center: cb, radius: rb }) => {
                let radius_sum = ra + rb;
                (ca - cb).magnitude_squared() <= radius_sum * radius_sum
            }
            (Self::Aabb { min, max }, Self::Sphere { center, radius })
            | (Self::Sphere { center, radius }, Self::Aabb { min, max }) => {
                // Closest point on the box to the sphere center
                let closest = Vec3::new(
                    center.x.clamp(min.x, max.x),
                    center.y.clamp(min.y, max.y),
                    center.z.clamp(min.z, max.z),
                );
                (center - closest).magnitude_squared() <= radius * radius
            }
        }
    }
}

/// The rigid-body simulation
pub struct PhysicsSim {
    actors: SlotMap<ActorKey, Actor>,
    shapes: SlotMap<ShapeKey, Shape>,
    gravity: Vec3,
    overlaps: HashSet<ShapePair>,
}

impl PhysicsSim {
    /// Create a simulation with the given gravity vector
    pub fn new(gravity: Vec3) -> Self {
        Self {
            actors: SlotMap::with_key(),
            shapes: SlotMap::with_key(),
            gravity,
            overlaps: HashSet::new(),
        }
    }

    /// The configured gravity vector
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Create an actor at the given pose
    pub fn create_actor(&mut self, kind: ActorKind, position: Vec3, rotation: Quat) -> ActorKey {
        self.actors.insert(Actor {
            kind,
            position,
            rotation,
            velocity: Vec3::zeros(),
            props: BodyProps::default(),
            shapes: Vec::new(),
        })
    }

    /// Release an actor, detaching any shapes still attached to it
    pub fn release_actor(&mut self, actor: ActorKey) {
        let Some(removed) = self.actors.remove(actor) else {
            return;
        };
        for shape_key in removed.shapes {
            if let Some(shape) = self.shapes.get_mut(shape_key) {
                shape.attached_to = None;
            }
            self.forget_pairs_of(shape_key);
        }
    }

    /// Create a detached collision shape
    pub fn create_shape(&mut self, geometry: ShapeGeometry, is_trigger: bool) -> ShapeKey {
        self.shapes.insert(Shape {
            geometry,
            is_trigger,
            attached_to: None,
        })
    }

    /// Release a shape, detaching it from its actor first
    pub fn release_shape(&mut self, shape: ShapeKey) {
        let Some(removed) = self.shapes.remove(shape) else {
            return;
        };
        if let Some(actor_key) = removed.attached_to {
            if let Some(actor) = self.actors.get_mut(actor_key) {
                actor.shapes.retain(|&key| key != shape);
            }
        }
        self.forget_pairs_of(shape);
    }

    /// Attach a shape to an actor
    pub fn attach_shape(&mut self, actor: ActorKey, shape: ShapeKey) -> Result<(), PhysicsError> {
        if !self.actors.contains_key(actor) {
            return Err(PhysicsError::UnknownActor);
        }
        let entry = self.shapes.get_mut(shape).ok_or(PhysicsError::UnknownShape)?;
        if entry.attached_to.is_some() {
            return Err(PhysicsError::AlreadyAttached);
        }
        entry.attached_to = Some(actor);
        self.actors[actor].shapes.push(shape);
        Ok(())
    }

    /// Detach a shape from an actor
    ///
    /// Overlap pairs involving the shape are forgotten without emitting exit
    /// events; component-level transitions are silent at the simulation level.
    pub fn detach_shape(&mut self, actor: ActorKey, shape: ShapeKey) -> Result<(), PhysicsError> {
        let entry = self.shapes.get_mut(shape).ok_or(PhysicsError::UnknownShape)?;
        if entry.attached_to != Some(actor) {
            return Err(PhysicsError::NotAttached);
        }
        entry.attached_to = None;
        if let Some(owner) = self.actors.get_mut(actor) {
            owner.shapes.retain(|&key| key != shape);
        }
        self.forget_pairs_of(shape);
        Ok(())
    }

    /// Replace a detached shape's geometry
    ///
    /// Refused while the shape is attached; callers must detach, mutate, and
    /// reattach.
    pub fn set_geometry(
        &mut self,
        shape: ShapeKey,
        geometry: ShapeGeometry,
    ) -> Result<(), PhysicsError> {
        let entry = self.shapes.get_mut(shape).ok_or(PhysicsError::UnknownShape)?;
        if entry.attached_to.is_some() {
            return Err(PhysicsError::ShapeAttached);
        }
        entry.geometry = geometry;
        Ok(())
    }

    /// A shape's current geometry
    pub fn geometry(&self, shape: ShapeKey) -> Option<ShapeGeometry> {
        self.shapes.get(shape).map(|entry| entry.geometry)
    }

    /// The actor a shape is attached to, if any
    pub fn shape_actor(&self, shape: ShapeKey) -> Option<ActorKey> {
        self.shapes.get(shape).and_then(|entry| entry.attached_to)
    }

    /// Shapes currently attached to an actor
    pub fn actor_shapes(&self, actor: ActorKey) -> Vec<ShapeKey> {
        self.actors
            .get(actor)
            .map(|entry| entry.shapes.clone())
            .unwrap_or_default()
    }

    /// An actor's mobility kind
    pub fn actor_kind(&self, actor: ActorKey) -> Option<ActorKind> {
        self.actors.get(actor).map(|entry| entry.kind)
    }

    /// Apply dynamic-body settings to an actor
    pub fn set_body_props(&mut self, actor: ActorKey, props: BodyProps) -> Result<(), PhysicsError> {
        let entry = self.actors.get_mut(actor).ok_or(PhysicsError::UnknownActor)?;
        entry.props = props;
        Ok(())
    }

    /// Teleport an actor to a pose
    pub fn set_actor_pose(
        &mut self,
        actor: ActorKey,
        position: Vec3,
        rotation: Quat,
    ) -> Result<(), PhysicsError> {
        let entry = self.actors.get_mut(actor).ok_or(PhysicsError::UnknownActor)?;
        entry.position = position;
        entry.rotation = rotation;
        Ok(())
    }

    /// An actor's current pose
    pub fn actor_pose(&self, actor: ActorKey) -> Option<(Vec3, Quat)> {
        self.actors
            .get(actor)
            .map(|entry| (entry.position, entry.rotation))
    }

    /// Set a dynamic actor's linear velocity
    pub fn set_velocity(&mut self, actor: ActorKey, velocity: Vec3) -> Result<(), PhysicsError> {
        let entry = self.actors.get_mut(actor).ok_or(PhysicsError::UnknownActor)?;
        entry.velocity = velocity;
        Ok(())
    }

    /// An actor's linear velocity
    pub fn velocity(&self, actor: ActorKey) -> Option<Vec3> {
        self.actors.get(actor).map(|entry| entry.velocity)
    }

    /// Number of live actors
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Number of live shapes
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Advance the simulation by one fixed tick and report contact events
    ///
    /// Events are ordered deterministically (by shape pair) with enter/stay
    /// events before exits.
    pub fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        self.integrate(dt);

        // Gather world-space volumes of attached shapes
        let mut volumes: Vec<(ShapeKey, ActorKey, bool, bool, WorldVolume)> = Vec::new();
        for (shape_key, shape) in &self.shapes {
            let Some(actor_key) = shape.attached_to else {
                continue;
            };
            let Some(actor) = self.actors.get(actor_key) else {
                continue;
            };
            let volume = match shape.geometry {
                ShapeGeometry::Box { half_extents } => WorldVolume::Aabb {
                    min: actor.position - half_extents,
                    max: actor.position + half_extents,
                },
                ShapeGeometry::Sphere { radius } => WorldVolume::Sphere {
                    center: actor.position,
                    radius,
                },
            };
            volumes.push((
                shape_key,
                actor_key,
                actor.kind == ActorKind::Static,
                shape.is_trigger,
                volume,
            ));
        }

        // Pairwise overlap tests; static-static pairs are never reported
        let mut current: HashSet<ShapePair> = HashSet::new();
        let mut pair_meta: HashMap<ShapePair, (ActorKey, ActorKey, ContactCategory)> =
            HashMap::new();
        for (i, (key_a, actor_a, static_a, trigger_a, volume_a)) in volumes.iter().enumerate() {
            for (key_b, actor_b, static_b, trigger_b, volume_b) in volumes.iter().skip(i + 1) {
                if actor_a == actor_b || (*static_a && *static_b) {
                    continue;
                }
                if !volume_a.overlaps(volume_b) {
                    continue;
                }
                let pair = ShapePair::new(*key_a, *key_b);
                let category = if *trigger_a || *trigger_b {
                    ContactCategory::Trigger
                } else {
                    ContactCategory::Contact
                };
                current.insert(pair);
                pair_meta.insert(pair, (*actor_a, *actor_b, category));
            }
        }

        let mut events = Vec::new();

        let mut active: Vec<ShapePair> = current.iter().copied().collect();
        active.sort_unstable();
        for pair in active {
            let (actor_a, actor_b, category) = pair_meta[&pair];
            let phase = if self.overlaps.contains(&pair) {
                ContactPhase::Stay
            } else {
                ContactPhase::Enter
            };
            events.push(ContactEvent {
                category,
                phase,
                actor_a,
                actor_b,
                shape_a: pair.0,
                shape_b: pair.1,
            });
        }

        let mut ended: Vec<ShapePair> = self.overlaps.difference(&current).copied().collect();
        ended.sort_unstable();
        for pair in ended {
            // Detached/released shapes were already pruned; both sides resolve
            let (Some(actor_a), Some(actor_b)) =
                (self.shape_actor(pair.0), self.shape_actor(pair.1))
            else {
                continue;
            };
            let trigger = self.is_trigger(pair.0) || self.is_trigger(pair.1);
            events.push(ContactEvent {
                category: if trigger {
                    ContactCategory::Trigger
                } else {
                    ContactCategory::Contact
                },
                phase: ContactPhase::Exit,
                actor_a,
                actor_b,
                shape_a: pair.0,
                shape_b: pair.1,
            });
        }

        self.overlaps = current;
        events
    }

    fn integrate(&mut self, dt: f32) {
        for actor in self.actors.values_mut() {
            if actor.kind != ActorKind::Dynamic {
                continue;
            }
            if actor.props.use_gravity {
                actor.velocity += self.gravity * dt;
            }
            if actor.props.drag > 0.0 {
                actor.velocity /= 1.0 + actor.props.drag * dt;
            }
            if actor.props.frozen.contains(FreezeAxes::X) {
                actor.velocity.x = 0.0;
            }
            if actor.props.frozen.contains(FreezeAxes::Y) {
                actor.velocity.y = 0.0;
            }
            if actor.props.frozen.contains(FreezeAxes::Z) {
                actor.velocity.z = 0.0;
            }
            actor.position += actor.velocity * dt;
        }
    }

    fn is_trigger(&self, shape: ShapeKey) -> bool {
        self.shapes.get(shape).is_some_and(|entry| entry.is_trigger)
    }

    fn forget_pairs_of(&mut self, shape: ShapeKey) {
        self.overlaps
            .retain(|pair| pair.0 != shape && pair.1 != shape);
    }
}
