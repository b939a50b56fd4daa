//! Component identity, activation, and the closed payload set
//!
//! Components are stored in a scene-owned arena keyed by generational
//! [`ComponentKey`] handles. Every consumer that used to hold a weak
//! reference (type index, physics bridge, editor panels) holds a key instead
//! and validates it against the arena on each access; a key whose component
//! has been removed simply stops resolving.

use slotmap::new_key_type;

use super::components::{Camera, Collider, PhysicsBody, Transform, Visualizer};
use super::ObjectKey;

new_key_type! {
    /// Stable generational handle to a component in the scene arena
    pub struct ComponentKey;
}

/// The closed set of component kinds
///
/// The kind is resolved once at construction and drives all polymorphic
/// dispatch; there is no open-ended registration of new component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Position/rotation/scale; every object owns exactly one
    Transform,
    /// Perspective camera
    Camera,
    /// Renderable mesh + material state
    Visualizer,
    /// Physics collision volume
    Collider,
    /// Dynamic rigid-body settings
    PhysicsBody,
}

impl ComponentKind {
    /// Whether an object may own more than one component of this kind
    pub fn can_have_multiple(self) -> bool {
        matches!(self, Self::Visualizer)
    }

    /// Whether the kind may be removed from its object after construction
    pub fn is_removable(self) -> bool {
        !matches!(self, Self::Transform)
    }

    /// Whether components of this kind appear in the debug-draw registry
    pub fn debug_drawable(self) -> bool {
        matches!(self, Self::Camera | Self::Collider)
    }

    /// Stable name used in logs and scene files
    pub fn name(self) -> &'static str {
        match self {
            Self::Transform => "Transform",
            Self::Camera => "Camera",
            Self::Visualizer => "Visualizer",
            Self::Collider => "Collider",
            Self::PhysicsBody => "PhysicsBody",
        }
    }
}

/// Tagged union over the closed component set
#[derive(Debug, Clone)]
pub enum ComponentData {
    /// Position/rotation/scale
    Transform(Transform),
    /// Perspective camera
    Camera(Camera),
    /// Renderable mesh + material state
    Visualizer(Visualizer),
    /// Physics collision volume
    Collider(Collider),
    /// Dynamic rigid-body settings
    PhysicsBody(PhysicsBody),
}

impl ComponentData {
    /// The kind tag for this payload
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Transform(_) => ComponentKind::Transform,
            Self::Camera(_) => ComponentKind::Camera,
            Self::Visualizer(_) => ComponentKind::Visualizer,
            Self::Collider(_) => ComponentKind::Collider,
            Self::PhysicsBody(_) => ComponentKind::PhysicsBody,
        }
    }
}

/// A component instance: owner back-reference, activation state, payload
///
/// The owner key is set at construction and never rebound; it stays valid for
/// the component's entire lifetime because objects never trade components.
pub struct Component {
    pub(crate) owner: ObjectKey,
    pub(crate) kind: ComponentKind,
    pub(crate) active: bool,
    pub(crate) started: bool,
    pub(crate) data: ComponentData,
}

impl Component {
    pub(crate) fn new(owner: ObjectKey, data: ComponentData) -> Self {
        Self {
            owner,
            kind: data.kind(),
            active: true,
            started: false,
            data,
        }
    }

    /// The object owning this component
    pub fn owner(&self) -> ObjectKey {
        self.owner
    }

    /// The kind tag resolved at construction
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Whether the component participates in lifecycle dispatch
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the start hook has run since the last activation
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Transition activation
    ///
    /// Transitioning to active re-arms the start hook: re-activation behaves
    /// like first activation for one-time setup, so `start` runs again before
    /// the next update once the owning object is active.
    pub fn set_active(&mut self, active: bool) {
        if active && !self.active {
            self.started = false;
        }
        self.active = active;
    }

    pub(crate) fn mark_started(&mut self) {
        self.started = true;
    }

    /// The raw payload
    pub fn data(&self) -> &ComponentData {
        &self.data
    }

    /// Mutable access to the raw payload
    pub fn data_mut(&mut self) -> &mut ComponentData {
        &mut self.data
    }

    /// Typed view of the payload; `None` when the kind does not match
    pub fn get<T: ComponentView>(&self) -> Option<&T> {
        T::view(&self.data)
    }

    /// Typed mutable view of the payload
    pub fn get_mut<T: ComponentView>(&mut self) -> Option<&mut T> {
        T::view_mut(&mut self.data)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Typed access into [`ComponentData`] for the closed payload set
///
/// Implemented only by the five payload types; the trait is sealed so the
/// component set stays closed.
pub trait ComponentView: sealed::Sealed + Sized {
    /// The kind tag for this payload type
    const KIND: ComponentKind;

    /// Borrow the payload if the data holds this variant
    fn view(data: &ComponentData) -> Option<&Self>;

    /// Mutably borrow the payload if the data holds this variant
    fn view_mut(data: &mut ComponentData) -> Option<&mut Self>;
}

macro_rules! impl_component_view {
    ($payload:ty, $variant:ident) => {
        impl sealed::Sealed for $payload {}

        impl ComponentView for $payload {
            const KIND: ComponentKind = ComponentKind::$variant;

            fn view(data: &ComponentData) -> Option<&Self> {
                match data {
                    ComponentData::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn view_mut(data: &mut ComponentData) -> Option<&mut Self> {
                match data {
                    ComponentData::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_component_view!(Transform, Transform);
impl_component_view!(Camera, Camera);
impl_component_view!(Visualizer, Visualizer);
impl_component_view!(Collider, Collider);
impl_component_view!(PhysicsBody, PhysicsBody);
