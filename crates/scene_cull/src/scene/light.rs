//! Light sources recorded by the traversal

use crate::foundation::math::{Vec3, Vec4};

/// A light applied once per frame before any geometry is drawn
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Backend light slot
    pub number: u32,
    /// Homogeneous position; `w == 0` marks a directional light
    pub position: Vec4,
    /// Ambient color
    pub ambient: Vec4,
    /// Diffuse color
    pub diffuse: Vec4,
    /// Specular color
    pub specular: Vec4,
}

impl Light {
    /// Create a white positional light at the local origin
    pub fn new(number: u32) -> Self {
        Self {
            number,
            position: Vec4::new(0.0, 0.0, 0.0, 1.0),
            ambient: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vec4::new(1.0, 1.0, 1.0, 1.0),
            specular: Vec4::new(1.0, 1.0, 1.0, 1.0),
        }
    }

    /// Set the light position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Vec4::new(position.x, position.y, position.z, 1.0);
        self
    }
}
