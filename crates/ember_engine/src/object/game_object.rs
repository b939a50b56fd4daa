//! Game object: a named aggregate of components
//!
//! Objects are owned by the scene's object arena; everything else refers to
//! them through [`ObjectKey`] handles.

use slotmap::new_key_type;

use super::behavior::ObjectBehavior;
use super::component::ComponentKey;

new_key_type! {
    /// Stable generational handle to a game object
    pub struct ObjectKey;
}

/// A mutable world entity owning an ordered set of components
///
/// Every object owns exactly one transform component, created with the object
/// and never removable. Destruction is deferred: `Scene::destroy_object`
/// queues a removal event and flips the object inactive; the object leaves
/// the arena only when pending removals are applied at the frame boundary.
pub struct GameObject {
    pub(crate) name: String,
    pub(crate) id: u64,
    pub(crate) type_tag: String,
    pub(crate) active: bool,
    pub(crate) started: bool,
    pub(crate) pending_destroy: bool,
    pub(crate) needs_destroy_hook: bool,
    pub(crate) behavior_in_flight: bool,
    pub(crate) components: Vec<ComponentKey>,
    pub(crate) behavior: Option<Box<dyn ObjectBehavior>>,
}

impl GameObject {
    pub(crate) fn new(name: impl Into<String>, id: u64, type_tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id,
            type_tag: type_tag.into(),
            active: true,
            started: false,
            pending_destroy: false,
            needs_destroy_hook: false,
            behavior_in_flight: false,
            components: Vec::new(),
            behavior: None,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the object
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Stable identifier, unique within the scene, used by editor panels
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Registered type name used for reflective re-instantiation
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Whether the object participates in lifecycle dispatch
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether destruction has been requested but not yet applied
    pub fn is_pending_destroy(&self) -> bool {
        self.pending_destroy
    }

    /// Keys of the owned components, in attachment order
    pub fn components(&self) -> &[ComponentKey] {
        &self.components
    }

    /// Install the object's behavior, replacing any previous one
    pub fn set_behavior(&mut self, behavior: Box<dyn ObjectBehavior>) {
        self.behavior = Some(behavior);
        self.started = false;
    }

    /// Whether a behavior is installed
    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }
}
