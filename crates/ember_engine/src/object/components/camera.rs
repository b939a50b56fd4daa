//! Perspective camera component
//!
//! Holds projection parameters and cached view/projection matrices. The
//! matrices are refreshed from the owning object's transform during the
//! scene's late-update pass, so the renderer only ever reads them.

use crate::foundation::math::{utils, Mat4, Point3, Vec3};

use super::Transform;

/// Perspective camera attached to a game object
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view in radians
    pub fov_y: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to the near clipping plane
    pub near: f32,

    /// Distance to the far clipping plane
    pub far: f32,

    view: Mat4,
    projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60.0, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Camera {
    /// Create a perspective camera
    ///
    /// `fov_degrees` is converted to radians internally.
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov_y: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
            view: Mat4::identity(),
            projection: Mat4::identity(),
        };
        camera.refresh(&Transform::identity());
        camera
    }

    /// Update the aspect ratio (viewport resize)
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// Recompute the cached matrices from the owning transform
    pub fn refresh(&mut self, transform: &Transform) {
        let eye = Point3::from(transform.position);
        let target = Point3::from(transform.position + transform.forward());
        let up = transform.up();
        self.view = Mat4::look_at_rh(&eye, &target, &up);
        self.projection = Mat4::new_perspective(self.aspect, self.fov_y, self.near, self.far);
    }

    /// The cached view matrix
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    /// The cached projection matrix
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// Transform a world-space point into view space
    pub fn world_to_view(&self, point: Vec3) -> Vec3 {
        self.view.transform_point(&Point3::from(point)).coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_refresh_tracks_transform() {
        let mut camera = Camera::perspective(60.0, 1.0, 0.1, 100.0);
        let transform = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));
        camera.refresh(&transform);

        // A point at the origin sits 5 units down the view axis
        let viewed = camera.world_to_view(Vec3::zeros());
        assert_relative_eq!(viewed.z, -5.0, epsilon = 1.0e-5);
    }

    #[test]
    fn test_set_aspect_rejects_degenerate_values() {
        let mut camera = Camera::default();
        let before = camera.aspect;
        camera.set_aspect(0.0);
        assert_relative_eq!(camera.aspect, before);
        camera.set_aspect(2.0);
        assert_relative_eq!(camera.aspect, 2.0);
    }
}
