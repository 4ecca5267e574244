//! Scene graph node variants
//!
//! Nodes are stored in the `Scene` arena and refer to each other by id.
//! Interior variants (Scene root, Group, Transform, LOD, Switch, LightSource)
//! own an ordered child list; Geode and Billboard are leaves holding
//! drawables directly.

use std::cell::Cell;

use super::bounds::BoundingSphere;
use super::graph::{DrawableId, NodeId};
use super::light::Light;
use crate::foundation::math::{Mat4, Vec3};

/// Per-child distance ranges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lod {
    /// `[min, max)` eye distance for each child, index-aligned with children
    pub ranges: Vec<(f32, f32)>,
    /// Explicit center; the node's bound center is used when unset
    pub center: Option<Vec3>,
}

impl Lod {
    /// Select the child to draw for an eye position in the LOD's local space
    ///
    /// The eye distance is scaled by `bias` before the lookup. Returns the
    /// first child whose range contains it, or `None` when no range does.
    pub fn evaluate(&self, eye_local: &Vec3, bias: f32, center: &Vec3) -> Option<usize> {
        let distance = (eye_local - center).norm() * bias;
        self.ranges
            .iter()
            .position(|&(min, max)| min <= distance && distance < max)
    }
}

/// Per-child on/off mask
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Switch {
    /// Enabled flag for each child, index-aligned with children
    pub values: Vec<bool>,
}

/// How billboard drawables turn toward the eye
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BillboardMode {
    /// Rotate about a fixed local axis only
    AxialRotation {
        /// Rotation axis in the billboard's local space
        axis: Vec3,
    },
    /// Rotate freely so local +Z points at the eye, keeping +Y up
    PointRotEye,
}

impl Default for BillboardMode {
    fn default() -> Self {
        Self::AxialRotation { axis: Vec3::new(0.0, 1.0, 0.0) }
    }
}

/// A drawable placed at a local position inside a billboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillboardEntry {
    /// Drawable to orient
    pub drawable: DrawableId,
    /// Pivot in the billboard's local space
    pub position: Vec3,
}

/// Leaf whose drawables are re-oriented toward the eye every traversal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Billboard {
    /// Orientation rule
    pub mode: BillboardMode,
    /// Drawables with their pivots
    pub entries: Vec<BillboardEntry>,
}

impl Billboard {
    /// Local matrix turning a drawable at `local_pos` to face `eye_local`
    ///
    /// The result is `translate(local_pos) * rotation` with the rotation's
    /// columns `[right | up | forward]`; local +Z ends up facing the eye.
    /// Falls back to a pure translation when the eye lies on the rotation
    /// axis or on the pivot.
    pub fn calc_transform(&self, eye_local: &Vec3, local_pos: &Vec3) -> Mat4 {
        let to_eye = eye_local - local_pos;
        let basis = match self.mode {
            BillboardMode::AxialRotation { axis } => axis.try_normalize(f32::EPSILON).and_then(|up| {
                let projected = to_eye - up * up.dot(&to_eye);
                let forward = projected.try_normalize(f32::EPSILON)?;
                Some((up.cross(&forward), up, forward))
            }),
            BillboardMode::PointRotEye => to_eye.try_normalize(f32::EPSILON).map(|forward| {
                let right = Vec3::y()
                    .cross(&forward)
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vec3::x);
                (right, forward.cross(&right), forward)
            }),
        };

        let Some((right, up, forward)) = basis else {
            return Mat4::new_translation(local_pos);
        };
        Mat4::new(
            right.x, up.x, forward.x, local_pos.x,
            right.y, up.y, forward.y, local_pos.y,
            right.z, up.z, forward.z, local_pos.z,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

/// Node variant with its variant-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Top of a scene; behaves as a Group
    Scene,
    /// Plain ordered collection of children
    Group,
    /// Group with a local-to-parent matrix
    Transform(Mat4),
    /// Group drawing at most one child chosen by eye distance
    Lod(Lod),
    /// Group with a per-child enable mask
    Switch(Switch),
    /// Group carrying a light
    LightSource(Light),
    /// Leaf of camera-facing drawables
    Billboard(Billboard),
    /// Leaf holding an ordered list of drawables
    Geode(Vec<DrawableId>),
}

impl NodeKind {
    /// Whether the variant may own child nodes
    pub fn is_group(&self) -> bool {
        !matches!(self, Self::Billboard(_) | Self::Geode(_))
    }
}

/// Scene graph node
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    pub(crate) kind: NodeKind,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parents: Vec<NodeId>,
    pub(crate) bound: Cell<Option<BoundingSphere>>,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
            parents: Vec::new(),
            bound: Cell::new(None),
        }
    }

    /// Debug name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Variant payload
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Ordered children
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent links; a node added twice under one parent appears twice
    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    /// Children entered under the active-children traversal mode
    pub fn active_children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().enumerate().filter_map(move |(i, &child)| match &self.kind {
            NodeKind::Switch(switch) => switch.values.get(i).copied().unwrap_or(false).then_some(child),
            _ => Some(child),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::utils;
    use approx::assert_relative_eq;

    #[test]
    fn test_lod_selects_range_containing_distance() {
        let lod = Lod { ranges: vec![(0.0, 10.0), (10.0, 100.0)], center: None };
        let center = Vec3::zeros();
        assert_eq!(lod.evaluate(&Vec3::new(0.0, 0.0, 5.0), 1.0, &center), Some(0));
        assert_eq!(lod.evaluate(&Vec3::new(0.0, 0.0, 50.0), 1.0, &center), Some(1));
        assert_eq!(lod.evaluate(&Vec3::new(0.0, 0.0, 500.0), 1.0, &center), None);
    }

    #[test]
    fn test_lod_bias_scales_distance() {
        let lod = Lod { ranges: vec![(0.0, 10.0), (10.0, 100.0)], center: None };
        let eye = Vec3::new(0.0, 0.0, 8.0);
        assert_eq!(lod.evaluate(&eye, 1.0, &Vec3::zeros()), Some(0));
        assert_eq!(lod.evaluate(&eye, 2.0, &Vec3::zeros()), Some(1));
    }

    #[test]
    fn test_axial_billboard_faces_eye() {
        let billboard = Billboard::default();
        let pos = Vec3::new(1.0, 0.0, 0.0);
        let m = billboard.calc_transform(&Vec3::new(1.0, 3.0, 10.0), &pos);

        let forward = utils::transform_vector(&m, &Vec3::z());
        assert_relative_eq!(forward, Vec3::z(), epsilon = 1e-6);
        assert_relative_eq!(utils::transform_point(&m, &Vec3::zeros()), pos);
    }

    #[test]
    fn test_point_billboard_faces_eye() {
        let billboard = Billboard { mode: BillboardMode::PointRotEye, entries: Vec::new() };
        let eye = Vec3::new(10.0, 0.0, 0.0);
        let m = billboard.calc_transform(&eye, &Vec3::zeros());

        let forward = utils::transform_vector(&m, &Vec3::z());
        assert_relative_eq!(forward, Vec3::x(), epsilon = 1e-6);
    }

    #[test]
    fn test_billboard_degenerate_eye_falls_back_to_translation() {
        let billboard = Billboard::default();
        let pos = Vec3::new(0.0, 2.0, 0.0);
        let m = billboard.calc_transform(&Vec3::new(0.0, 9.0, 0.0), &pos);
        assert_relative_eq!(m, Mat4::new_translation(&pos));
    }
}
