//! # Cull Camera
//!
//! Eye placement and perspective parameters consumed by the cull traversal.
//! Only the parts of a camera that shape the view frustum live here; the
//! projection matrix itself belongs to the graphics backend.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Perspective camera used to seed the root view state
///
/// # Coordinate System
/// Right-handed, Y-up. The default camera sits at `(0, 0, 1)` looking at the
/// origin, i.e. down the negative Z axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Eye position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in degrees
    pub fovy_degrees: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera at `position` looking at the origin
    pub fn perspective(position: Vec3, fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fovy_degrees,
            aspect,
            near,
            far,
        }
    }

    /// Set the point the camera looks at
    pub fn look_at(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    /// Set the camera up vector
    pub fn with_up(mut self, up: Vec3) -> Self {
        self.up = up;
        self
    }

    /// Normalized view direction, `None` when position and target coincide
    pub fn look_vector(&self) -> Option<Vec3> {
        (self.target - self.position).try_normalize(f32::EPSILON)
    }

    /// Validate the camera parameters
    pub fn validate(&self) -> Result<(), String> {
        if !(self.fovy_degrees > 0.0 && self.fovy_degrees < 180.0) {
            return Err(format!("Field of view must be in (0, 180), got {}", self.fovy_degrees));
        }
        if self.aspect <= 0.0 {
            return Err(format!("Aspect ratio must be positive, got {}", self.aspect));
        }
        if self.near <= 0.0 || self.near >= self.far {
            return Err(format!("Clipping planes must satisfy 0 < near < far, got {} / {}", self.near, self.far));
        }
        let Some(look) = self.look_vector() else {
            return Err("Camera position and target coincide".to_string());
        };
        if look.cross(&self.up).norm() <= f32::EPSILON {
            return Err("Up vector is parallel to the view direction".to_string());
        }
        Ok(())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 0.0, 1.0), 60.0, 1.0, 1.0, 1000.0)
    }
}
