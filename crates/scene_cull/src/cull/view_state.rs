//! Per-level view snapshot and the culling predicates
//!
//! A `ViewState` expresses the eye and the four side planes of the view
//! frustum in the local space of one transform level, so bounds can be
//! tested without transforming them to world space.

use std::rc::Rc;

use bitflags::bitflags;

use crate::foundation::math::{utils, Mat4, Vec3};
use crate::scene::{BoundingBox, BoundingSphere};

bitflags! {
    /// Culling tests enabled for a view state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CullingMode: u8 {
        /// Test against the four side planes
        const VIEW_FRUSTUM = 0b01;
        /// Reject bounds that are small relative to their eye distance
        const SMALL_FEATURE = 0b10;
    }
}

impl Default for CullingMode {
    fn default() -> Self {
        Self::all()
    }
}

/// Outward unit normals of the four side planes
///
/// Every plane passes through the eye point, so a point `p` is outside a
/// plane when `(p - eye) · normal > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumNormals {
    /// Top plane normal
    pub top: Vec3,
    /// Bottom plane normal
    pub bottom: Vec3,
    /// Left plane normal
    pub left: Vec3,
    /// Right plane normal
    pub right: Vec3,
}

impl FrustumNormals {
    /// Side planes for a perspective view
    ///
    /// `fovy_degrees` is the full vertical angle. The horizontal planes are
    /// tilted by `sin(fovy / 2) * aspect` along the look vector.
    pub fn from_perspective(look: &Vec3, up: &Vec3, fovy_degrees: f32, aspect: f32) -> Self {
        let half = utils::deg_to_rad(fovy_degrees * 0.5);
        let (s, c) = half.sin_cos();

        let side = look.cross(up).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::x);
        let up = side.cross(look);

        Self {
            top: normalized(-look * s + up * c),
            bottom: normalized(-look * s - up * c),
            left: normalized(-side * c - look * (s * aspect)),
            right: normalized(side * c - look * (s * aspect)),
        }
    }

    /// The four normals, top / bottom / left / right
    pub fn as_array(&self) -> [Vec3; 4] {
        [self.top, self.bottom, self.left, self.right]
    }

    fn map(&self, mut f: impl FnMut(&Vec3) -> Vec3) -> Self {
        Self {
            top: f(&self.top),
            bottom: f(&self.bottom),
            left: f(&self.left),
            right: f(&self.right),
        }
    }
}

fn normalized(v: Vec3) -> Vec3 {
    v.try_normalize(f32::EPSILON).unwrap_or(v)
}

/// View snapshot for one level of the transform stack
#[derive(Debug, Clone)]
pub struct ViewState {
    pub(crate) matrix: Option<Rc<Mat4>>,
    pub(crate) inverse: Option<Mat4>,
    /// Eye position in local space
    pub eye_point: Vec3,
    /// Look-at point in local space
    pub center_point: Vec3,
    /// Normalized view direction in local space
    pub look_vector: Vec3,
    /// Up vector in local space
    pub up_vector: Vec3,
    /// Side planes in local space
    pub frustum: FrustumNormals,
    /// Enabled culling tests
    pub culling: CullingMode,
    /// Radius / distance threshold for small-feature culling
    pub small_feature_ratio: f32,
}

impl ViewState {
    /// Root view state for a camera, with no accumulated transform
    pub fn root(eye: Vec3, center: Vec3, up: Vec3, fovy_degrees: f32, aspect: f32) -> Self {
        let look = normalized(center - eye);
        Self {
            matrix: None,
            inverse: None,
            eye_point: eye,
            center_point: center,
            look_vector: look,
            up_vector: up,
            frustum: FrustumNormals::from_perspective(&look, &up, fovy_degrees, aspect),
            culling: CullingMode::default(),
            small_feature_ratio: 0.002,
        }
    }

    /// View state for a child level whose local-to-root matrix is `matrix`
    ///
    /// The eye, center and plane normals of `root` are re-expressed through
    /// `inverse`. Normals travel as eye-relative points so they survive the
    /// translation part of the inverse.
    pub(crate) fn derived(root: &ViewState, matrix: Rc<Mat4>, inverse: Mat4) -> Self {
        let eye_point = utils::transform_point(&inverse, &root.eye_point);
        let center_point = utils::transform_point(&inverse, &root.center_point);
        let frustum = root
            .frustum
            .map(|n| normalized(utils::transform_point(&inverse, &(root.eye_point + n)) - eye_point));

        Self {
            matrix: Some(matrix),
            eye_point,
            center_point,
            look_vector: normalized(center_point - eye_point),
            up_vector: utils::transform_vector(&inverse, &root.up_vector),
            frustum,
            culling: root.culling,
            small_feature_ratio: root.small_feature_ratio,
            inverse: Some(inverse),
        }
    }

    /// Accumulated local-to-root matrix, `None` for identity
    pub fn matrix(&self) -> Option<&Rc<Mat4>> {
        self.matrix.as_ref()
    }

    /// Inverse of the accumulated matrix, `None` for identity
    pub fn inverse(&self) -> Option<&Mat4> {
        self.inverse.as_ref()
    }

    /// Whether a sphere can be skipped
    ///
    /// Culls invalid spheres, spheres whose radius is below
    /// `distance * ratio` when small-feature culling is on, and spheres lying
    /// entirely outside any one side plane when frustum culling is on.
    pub fn is_culled_sphere(&self, sphere: &BoundingSphere) -> bool {
        if !sphere.is_valid() {
            return true;
        }

        let delta = sphere.center - self.eye_point;
        if self.culling.contains(CullingMode::SMALL_FEATURE)
            && sphere.radius < delta.norm() * self.small_feature_ratio
        {
            return true;
        }

        self.culling.contains(CullingMode::VIEW_FRUSTUM)
            && self
                .frustum
                .as_array()
                .iter()
                .any(|normal| delta.dot(normal) > sphere.radius)
    }

    /// Whether a box can be skipped
    ///
    /// Culls invalid boxes, and boxes whose eight corners all lie outside one
    /// single side plane. A box outside the frustum only across a
    /// combination of planes is kept.
    pub fn is_culled_box(&self, bb: &BoundingBox) -> bool {
        if !bb.is_valid() {
            return true;
        }
        if !self.culling.contains(CullingMode::VIEW_FRUSTUM) {
            return false;
        }

        let corners = bb.corners();
        self.frustum.as_array().iter().any(|normal| {
            corners
                .iter()
                .all(|corner| (corner - self.eye_point).dot(normal) > 0.0)
        })
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::root(Vec3::new(0.0, 0.0, 1.0), Vec3::zeros(), Vec3::y(), 60.0, 1.0)
    }
}
