//! Reflective object-type registry
//!
//! Concrete object types register a name-to-factory mapping; the editor's
//! "Add GameObject" menu and scene deserialization create objects by
//! registered name. Duplicate registration is an error, not a silent
//! overwrite. Registration is explicit (there is no static-initialization
//! self-registration); built-ins are installed by
//! [`register_builtin_types`].

use thiserror::Error;

use crate::scene::Scene;

use super::component::ComponentData;
use super::components::{Camera, Visualizer};
use super::game_object::ObjectKey;

/// Factory creating a fully-wired object of a registered type
pub type ObjectFactory = fn(&mut Scene, &str) -> ObjectKey;

/// Registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The type name is already registered
    #[error("object type {0:?} is already registered")]
    DuplicateType(String),
}

/// Name-to-factory registry for reflective object creation
///
/// Registration order is preserved so editor menus list types stably.
#[derive(Default)]
pub struct ObjectRegistry {
    factories: Vec<(String, ObjectFactory)>,
}

impl ObjectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a type name
    pub fn register(&mut self, name: &str, factory: ObjectFactory) -> Result<(), RegistryError> {
        if self.factories.iter().any(|(existing, _)| existing == name) {
            return Err(RegistryError::DuplicateType(name.to_string()));
        }
        self.factories.push((name.to_string(), factory));
        Ok(())
    }

    /// Look up the factory for a type name
    pub fn factory(&self, name: &str) -> Option<ObjectFactory> {
        self.factories
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, factory)| *factory)
    }

    /// Registered type names, in registration order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(name, _)| name.as_str())
    }
}

/// The default object type: a bare object with only a transform
pub const DEFAULT_TYPE: &str = "GameObject";

fn create_plain(scene: &mut Scene, name: &str) -> ObjectKey {
    scene.create_object(name)
}

fn create_camera(scene: &mut Scene, name: &str) -> ObjectKey {
    let object = scene.create_object_with_tag(name, "Camera");
    scene.add_component(object, ComponentData::Camera(Camera::default()));
    object
}

fn create_cube(scene: &mut Scene, name: &str) -> ObjectKey {
    let object = scene.create_object_with_tag(name, "Cube");
    scene.add_component(object, ComponentData::Visualizer(Visualizer::new("cube")));
    object
}

/// Install the engine's built-in object types
pub fn register_builtin_types(registry: &mut ObjectRegistry) -> Result<(), RegistryError> {
    registry.register(DEFAULT_TYPE, create_plain)?;
    registry.register("Camera", create_camera)?;
    registry.register("Cube", create_cube)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_registration_is_an_error() {
        let mut registry = ObjectRegistry::new();
        registry.register("Turret", create_plain).unwrap();
        assert_eq!(
            registry.register("Turret", create_camera),
            Err(RegistryError::DuplicateType("Turret".to_string()))
        );
        // The original registration survives
        assert!(registry.factory("Turret").is_some());
        assert_eq!(registry.type_names().count(), 1);
    }

    #[test]
    fn test_type_names_preserve_registration_order() {
        let mut registry = ObjectRegistry::new();
        register_builtin_types(&mut registry).unwrap();
        let names: Vec<&str> = registry.type_names().collect();
        assert_eq!(names, vec!["GameObject", "Camera", "Cube"]);
    }

    #[test]
    fn test_unknown_type_has_no_factory() {
        let registry = ObjectRegistry::new();
        assert!(registry.factory("Missing").is_none());
    }
}
