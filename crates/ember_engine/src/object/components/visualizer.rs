//! Visualizer component: renderable mesh + material state
//!
//! The rendering backend only reads this state once per frame; the component
//! never calls into it.

use serde::{Deserialize, Serialize};

/// Renderable state for a game object
///
/// Objects may own several visualizers (e.g. a hull mesh plus a detail mesh).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualizer {
    /// Mesh asset name resolved by the rendering backend
    pub mesh: String,

    /// RGBA base color
    pub color: [f32; 4],

    /// Whether this visualizer should be rendered
    pub visible: bool,
}

impl Visualizer {
    /// Create a visualizer for the named mesh with a white base color
    pub fn new(mesh: impl Into<String>) -> Self {
        Self {
            mesh: mesh.into(),
            color: [1.0, 1.0, 1.0, 1.0],
            visible: true,
        }
    }

    /// Builder-style base color override
    pub fn with_color(mut self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.color = [r, g, b, a];
        self
    }

    /// Set visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Check if this visualizer should be rendered
    pub fn should_render(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_toggle() {
        let mut visualizer = Visualizer::new("crate").with_color(1.0, 0.5, 0.0, 1.0);
        assert!(visualizer.should_render());
        visualizer.set_visible(false);
        assert!(!visualizer.should_render());
    }
}
