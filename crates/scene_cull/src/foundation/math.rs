//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene graph and the cull
//! traversal. Matrices follow nalgebra's column-vector convention, so a
//! child-to-world chain is written `parent * local`.

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Transform a position (w = 1) by a 4x4 matrix
    ///
    /// Performs the homogeneous divide when the matrix is projective.
    pub fn transform_point(matrix: &Mat4, point: &Vec3) -> Vec3 {
        let p = matrix * point.push(1.0);
        if p.w != 0.0 && p.w != 1.0 {
            Vec3::new(p.x / p.w, p.y / p.w, p.z / p.w)
        } else {
            p.xyz()
        }
    }

    /// Transform a direction (w = 0) by a 4x4 matrix
    pub fn transform_vector(matrix: &Mat4, vector: &Vec3) -> Vec3 {
        (matrix * vector.push(0.0)).xyz()
    }

    /// Largest axis scale of the upper 3x3 block
    ///
    /// Used to grow bounding sphere radii under non-uniform scaling.
    pub fn max_scale(matrix: &Mat4) -> f32 {
        let sx = matrix.fixed_view::<3, 1>(0, 0).norm();
        let sy = matrix.fixed_view::<3, 1>(0, 1).norm();
        let sz = matrix.fixed_view::<3, 1>(0, 2).norm();
        sx.max(sy).max(sz)
    }
}
