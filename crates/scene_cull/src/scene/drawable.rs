//! Drawables: the leaf primitives binned by the traversal

use std::cell::Cell;

use super::bounds::BoundingBox;
use super::graph::{GeoStateId, NodeId};
use crate::foundation::math::Vec3;

/// Leaf-level renderable primitive
///
/// Only the vertex positions are kept; they exist to derive the bounding
/// box. Issuing the actual draw is left to whatever consumes the replay.
#[derive(Debug, Clone)]
pub struct Drawable {
    name: String,
    vertices: Vec<Vec3>,
    geo_state: Option<GeoStateId>,
    bound: Cell<Option<BoundingBox>>,
    pub(crate) owners: Vec<NodeId>,
}

impl Drawable {
    /// Create a drawable from vertex positions
    pub fn new(name: impl Into<String>, vertices: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            vertices,
            geo_state: None,
            bound: Cell::new(None),
            owners: Vec::new(),
        }
    }

    /// Create a drawable whose vertices are the corners of a box
    pub fn from_box(name: impl Into<String>, bb: &BoundingBox) -> Self {
        let vertices = if bb.is_valid() { bb.corners().to_vec() } else { Vec::new() };
        Self::new(name, vertices)
    }

    /// Attach a render state
    pub fn with_geo_state(mut self, state: GeoStateId) -> Self {
        self.geo_state = Some(state);
        self
    }

    /// Debug name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render state, if any
    pub fn geo_state(&self) -> Option<GeoStateId> {
        self.geo_state
    }

    /// Replace the render state
    pub fn set_geo_state(&mut self, state: Option<GeoStateId>) {
        self.geo_state = state;
    }

    /// Vertex positions
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Replace the vertex positions and drop the cached bound
    pub(crate) fn set_vertices(&mut self, vertices: Vec<Vec3>) {
        self.vertices = vertices;
        self.bound.set(None);
    }

    /// Bounding box of the vertices, computed on first use
    ///
    /// A drawable without vertices has an invalid bound and is always culled.
    pub fn bound(&self) -> BoundingBox {
        if let Some(bb) = self.bound.get() {
            return bb;
        }
        let bb = BoundingBox::from_points(&self.vertices);
        self.bound.set(Some(bb));
        bb
    }

    /// Geodes and billboards holding this drawable
    pub fn owners(&self) -> &[NodeId] {
        &self.owners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bound_is_recomputed_after_edit() {
        let mut drawable = Drawable::new("tri", vec![Vec3::zeros(), Vec3::new(1.0, 1.0, 0.0)]);
        assert_relative_eq!(drawable.bound().max, Vec3::new(1.0, 1.0, 0.0));

        drawable.set_vertices(vec![Vec3::new(-2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 3.0)]);
        assert_relative_eq!(drawable.bound().min, Vec3::new(-2.0, 0.0, 0.0));
        assert_relative_eq!(drawable.bound().max, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_empty_drawable_has_invalid_bound() {
        assert!(!Drawable::new("empty", Vec::new()).bound().is_valid());
    }
}
