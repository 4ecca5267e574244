//! Scene arena
//!
//! Nodes, drawables and render states live in slot maps and refer to each
//! other by key. A node may have several parents, so the graph is a DAG;
//! a subtree is released once its last parent link is removed. Cycles are
//! not detected: building one is a caller error and overflows the stack on
//! the next bound computation or traversal.

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use super::bounds::{BoundingBox, BoundingSphere};
use super::drawable::Drawable;
use super::light::Light;
use super::node::{Billboard, BillboardEntry, BillboardMode, Lod, Node, NodeKind, Switch};
use super::state::GeoState;
use crate::foundation::math::{Mat4, Vec3};

new_key_type! {
    /// Handle to a node in a `Scene`
    pub struct NodeId;
    /// Handle to a drawable in a `Scene`
    pub struct DrawableId;
    /// Handle to a render state in a `Scene`
    pub struct GeoStateId;
}

/// Scene editing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// Node id is stale or from another scene
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),

    /// Drawable id is stale or from another scene
    #[error("Unknown drawable: {0:?}")]
    UnknownDrawable(DrawableId),

    /// GeoState id is stale or from another scene
    #[error("Unknown geo state: {0:?}")]
    UnknownGeoState(GeoStateId),

    /// The node variant cannot hold children, or not of the requested kind
    #[error("Node {0:?} does not accept this operation")]
    WrongKind(NodeId),

    /// The child is not linked under the parent
    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild {
        /// Parent node
        parent: NodeId,
        /// Missing child
        child: NodeId,
    },

    /// Child index past the end of the child list
    #[error("Child index {index} out of range for node {node:?}")]
    ChildIndexOutOfRange {
        /// Node being edited
        node: NodeId,
        /// Offending index
        index: usize,
    },
}

/// Arena holding a scene graph and the data it references
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    drawables: SlotMap<DrawableId, Drawable>,
    states: SlotMap<GeoStateId, GeoState>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a detached node
    pub fn add_node(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeId {
        self.nodes.insert(Node::new(name, kind))
    }

    /// Insert a scene root
    pub fn add_scene_root(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(name, NodeKind::Scene)
    }

    /// Insert a group
    pub fn add_group(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(name, NodeKind::Group)
    }

    /// Insert a transform
    pub fn add_transform(&mut self, name: impl Into<String>, matrix: Mat4) -> NodeId {
        self.add_node(name, NodeKind::Transform(matrix))
    }

    /// Insert an LOD with no children
    pub fn add_lod(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(name, NodeKind::Lod(Lod::default()))
    }

    /// Insert a switch with no children
    pub fn add_switch(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(name, NodeKind::Switch(Switch::default()))
    }

    /// Insert a light source
    pub fn add_light_source(&mut self, name: impl Into<String>, light: Light) -> NodeId {
        self.add_node(name, NodeKind::LightSource(light))
    }

    /// Insert an empty billboard
    pub fn add_billboard(&mut self, name: impl Into<String>, mode: BillboardMode) -> NodeId {
        self.add_node(name, NodeKind::Billboard(Billboard { mode, entries: Vec::new() }))
    }

    /// Insert an empty geode
    pub fn add_geode(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(name, NodeKind::Geode(Vec::new()))
    }

    /// Insert a drawable
    pub fn add_drawable(&mut self, drawable: Drawable) -> DrawableId {
        self.drawables.insert(drawable)
    }

    /// Insert a render state
    pub fn add_geo_state(&mut self, state: GeoState) -> GeoStateId {
        self.states.insert(state)
    }

    /// Look up a node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a drawable
    pub fn drawable(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.get(id)
    }

    /// Look up a render state
    pub fn geo_state(&self, id: GeoStateId) -> Option<&GeoState> {
        self.states.get(id)
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Append `child` under `parent`
    ///
    /// LOD children start with an empty range (never selected) and switch
    /// children start enabled.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains_key(child) {
            return Err(SceneError::UnknownNode(child));
        }
        let node = self.nodes.get_mut(parent).ok_or(SceneError::UnknownNode(parent))?;
        if !node.kind.is_group() {
            return Err(SceneError::WrongKind(parent));
        }

        node.children.push(child);
        match &mut node.kind {
            NodeKind::Lod(lod) => lod.ranges.push((f32::INFINITY, f32::INFINITY)),
            NodeKind::Switch(switch) => switch.values.push(true),
            _ => {}
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parents.push(parent);
        }
        self.dirty_bound(parent);
        Ok(())
    }

    /// Append `child` under an LOD with its `[min, max)` range
    pub fn add_lod_child(&mut self, lod: NodeId, child: NodeId, min: f32, max: f32) -> Result<(), SceneError> {
        self.lod_mut(lod)?;
        self.add_child(lod, child)?;
        let lod_data = self.lod_mut(lod)?;
        if let Some(range) = lod_data.ranges.last_mut() {
            *range = (min, max);
        }
        Ok(())
    }

    /// Replace the range of an existing LOD child
    pub fn set_lod_range(&mut self, lod: NodeId, index: usize, min: f32, max: f32) -> Result<(), SceneError> {
        let range = self
            .lod_mut(lod)?
            .ranges
            .get_mut(index)
            .ok_or(SceneError::ChildIndexOutOfRange { node: lod, index })?;
        *range = (min, max);
        Ok(())
    }

    /// Pin the LOD distance center instead of using the bound center
    pub fn set_lod_center(&mut self, lod: NodeId, center: Vec3) -> Result<(), SceneError> {
        self.lod_mut(lod)?.center = Some(center);
        Ok(())
    }

    /// Enable or disable a switch child
    pub fn set_switch_value(&mut self, switch: NodeId, index: usize, enabled: bool) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(switch).ok_or(SceneError::UnknownNode(switch))?;
        let NodeKind::Switch(data) = &mut node.kind else {
            return Err(SceneError::WrongKind(switch));
        };
        let value = data
            .values
            .get_mut(index)
            .ok_or(SceneError::ChildIndexOutOfRange { node: switch, index })?;
        *value = enabled;
        Ok(())
    }

    /// Replace a transform's matrix
    pub fn set_matrix(&mut self, transform: NodeId, matrix: Mat4) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(transform).ok_or(SceneError::UnknownNode(transform))?;
        let NodeKind::Transform(current) = &mut node.kind else {
            return Err(SceneError::WrongKind(transform));
        };
        *current = matrix;
        self.dirty_bound(transform);
        Ok(())
    }

    /// Append a drawable to a geode
    pub fn add_geode_drawable(&mut self, geode: NodeId, drawable: DrawableId) -> Result<(), SceneError> {
        let entry = self.drawables.get_mut(drawable).ok_or(SceneError::UnknownDrawable(drawable))?;
        let node = self.nodes.get_mut(geode).ok_or(SceneError::UnknownNode(geode))?;
        let NodeKind::Geode(drawables) = &mut node.kind else {
            return Err(SceneError::WrongKind(geode));
        };
        drawables.push(drawable);
        entry.owners.push(geode);
        self.dirty_bound(geode);
        Ok(())
    }

    /// Append a drawable to a billboard at a local pivot
    pub fn add_billboard_drawable(
        &mut self,
        billboard: NodeId,
        drawable: DrawableId,
        position: Vec3,
    ) -> Result<(), SceneError> {
        let entry = self.drawables.get_mut(drawable).ok_or(SceneError::UnknownDrawable(drawable))?;
        let node = self.nodes.get_mut(billboard).ok_or(SceneError::UnknownNode(billboard))?;
        let NodeKind::Billboard(data) = &mut node.kind else {
            return Err(SceneError::WrongKind(billboard));
        };
        data.entries.push(BillboardEntry { drawable, position });
        entry.owners.push(billboard);
        self.dirty_bound(billboard);
        Ok(())
    }

    /// Replace a drawable's render state
    pub fn set_drawable_geo_state(&mut self, drawable: DrawableId, state: Option<GeoStateId>) -> Result<(), SceneError> {
        if let Some(id) = state {
            if !self.states.contains_key(id) {
                return Err(SceneError::UnknownGeoState(id));
            }
        }
        let entry = self.drawables.get_mut(drawable).ok_or(SceneError::UnknownDrawable(drawable))?;
        entry.set_geo_state(state);
        Ok(())
    }

    /// Replace a drawable's vertices, invalidating every bound above it
    pub fn set_drawable_vertices(&mut self, drawable: DrawableId, vertices: Vec<Vec3>) -> Result<(), SceneError> {
        let entry = self.drawables.get_mut(drawable).ok_or(SceneError::UnknownDrawable(drawable))?;
        entry.set_vertices(vertices);
        let owners = entry.owners.clone();
        for owner in owners {
            self.dirty_bound(owner);
        }
        Ok(())
    }

    /// Remove one `parent -> child` link
    ///
    /// When that was the child's last parent the child and any descendants
    /// left without parents are released. Drawables and render states stay
    /// in the scene.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(parent).ok_or(SceneError::UnknownNode(parent))?;
        let index = node
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(SceneError::NotAChild { parent, child })?;
        node.children.remove(index);
        match &mut node.kind {
            NodeKind::Lod(lod) if index < lod.ranges.len() => {
                lod.ranges.remove(index);
            }
            NodeKind::Switch(switch) if index < switch.values.len() => {
                switch.values.remove(index);
            }
            _ => {}
        }
        self.dirty_bound(parent);
        self.unlink_parent(child, parent);
        Ok(())
    }

    fn unlink_parent(&mut self, child: NodeId, parent: NodeId) {
        let Some(node) = self.nodes.get_mut(child) else { return };
        if let Some(pos) = node.parents.iter().position(|&p| p == parent) {
            node.parents.remove(pos);
        }
        if node.parents.is_empty() {
            self.release(child);
        }
    }

    fn release(&mut self, id: NodeId) {
        let Some(node) = self.nodes.remove(id) else { return };
        log::trace!("Releasing node '{}'", node.name());

        let held: Vec<DrawableId> = match &node.kind {
            NodeKind::Geode(drawables) => drawables.clone(),
            NodeKind::Billboard(billboard) => billboard.entries.iter().map(|e| e.drawable).collect(),
            _ => Vec::new(),
        };
        for drawable in held {
            if let Some(entry) = self.drawables.get_mut(drawable) {
                entry.owners.retain(|&owner| owner != id);
            }
        }
        for child in node.children {
            self.unlink_parent(child, id);
        }
    }

    /// Drop the cached bound of `id` and of every ancestor
    pub fn dirty_bound(&self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else { return };
        node.bound.set(None);
        for &parent in &node.parents {
            self.dirty_bound(parent);
        }
    }

    /// Bounding sphere of a node in its parent's space, computed on demand
    pub fn bound(&self, id: NodeId) -> BoundingSphere {
        let Some(node) = self.nodes.get(id) else {
            return BoundingSphere::invalid();
        };
        if let Some(bound) = node.bound.get() {
            return bound;
        }
        let bound = self.compute_bound(node);
        node.bound.set(Some(bound));
        bound
    }

    fn compute_bound(&self, node: &Node) -> BoundingSphere {
        match &node.kind {
            NodeKind::Geode(drawables) => {
                let mut bb = BoundingBox::empty();
                for drawable in drawables.iter().filter_map(|&d| self.drawables.get(d)) {
                    bb.expand_by_box(&drawable.bound());
                }
                BoundingSphere::from_box(&bb)
            }
            NodeKind::Billboard(billboard) => {
                let spheres: Vec<BoundingSphere> = billboard
                    .entries
                    .iter()
                    .filter_map(|entry| {
                        let bb = self.drawables.get(entry.drawable)?.bound();
                        // Rotation about the pivot can swing the box anywhere
                        // within this radius.
                        let reach = bb.is_valid().then(|| bb.center().norm() + bb.radius())?;
                        Some(BoundingSphere::new(entry.position, reach))
                    })
                    .collect();
                BoundingSphere::enclosing(spheres.iter())
            }
            NodeKind::Transform(matrix) => self.children_bound(node).transformed(matrix),
            _ => self.children_bound(node),
        }
    }

    fn children_bound(&self, node: &Node) -> BoundingSphere {
        let spheres: Vec<BoundingSphere> = node.children.iter().map(|&c| self.bound(c)).collect();
        BoundingSphere::enclosing(spheres.iter())
    }

    fn lod_mut(&mut self, lod: NodeId) -> Result<&mut Lod, SceneError> {
        let node = self.nodes.get_mut(lod).ok_or(SceneError::UnknownNode(lod))?;
        match &mut node.kind {
            NodeKind::Lod(data) => Ok(data),
            _ => Err(SceneError::WrongKind(lod)),
        }
    }
}
