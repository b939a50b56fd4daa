//! Transform component: position, rotation, and scale
//!
//! Every game object owns exactly one, created at construction and never
//! removable.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat4, Quat, Vec3};

/// Position, rotation, and scale in world space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Local forward direction (-Z rotated into world space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::new(0.0, 0.0, -1.0)
    }

    /// Local up direction (+Y rotated into world space)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::new(0.0, 1.0, 0.0)
    }

    /// Move by a world-space offset
    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Rotate around an axis by an angle in radians
    pub fn rotate_axis(&mut self, axis: &Vec3, angle: f32) {
        if let Some(axis) = nalgebra::Unit::try_new(*axis, 1.0e-6) {
            self.rotation = Quat::from_axis_angle(&axis, angle) * self.rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::foundation::math::constants;

    #[test]
    fn test_identity_matrix() {
        let transform = Transform::identity();
        assert_relative_eq!(transform.to_matrix(), Mat4::identity());
    }

    #[test]
    fn test_forward_rotates_with_transform() {
        let mut transform = Transform::identity();
        assert_relative_eq!(transform.forward(), Vec3::new(0.0, 0.0, -1.0));

        // Quarter turn around +Y swings forward onto -X
        transform.rotate_axis(&Vec3::new(0.0, 1.0, 0.0), constants::PI * 0.5);
        assert_relative_eq!(
            transform.forward(),
            Vec3::new(-1.0, 0.0, 0.0),
            epsilon = 1.0e-5
        );
    }

    #[test]
    fn test_translate_accumulates() {
        let mut transform = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));
        transform.translate(Vec3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(transform.position, Vec3::new(1.0, 2.0, 0.0));
    }
}
