//! # Render Visitor
//!
//! Single top-down pass over a `Scene` that culls against the transform
//! stack and sorts surviving drawables into the opaque and transparent bins.
//!
//! ## Per-variant behavior
//!
//! - **Scene / Group / Switch**: cull on the node bound, then visit children
//!   (Switch masks apply under `TraversalMode::ActiveChildren`)
//! - **Transform**: cull, push the matrix, visit children, pop
//! - **LOD**: cull, then visit only the child selected for the local eye
//! - **Billboard**: cull on the node bound, then bin every drawable under a
//!   per-drawable camera-facing matrix (drawables are not tested one by one)
//! - **Geode**: cull, then test and bin each drawable
//! - **LightSource**: record the light with the current matrix, then visit
//!   children
//!
//! A visitor instance is reusable across frames; `cull` resets it first.

use std::rc::Rc;

use super::bins::{LightEntry, MatrixGeoSet, OpaqueBin, TransparentBin};
use super::camera::Camera;
use super::stack::TraversalStateStack;
use super::view_state::{CullingMode, ViewState};
use crate::core::config::{ApplicationConfig, CullSettings, DepthSortMode, TraversalMode};
use crate::foundation::math::{utils, Mat4, Vec3};
use crate::scene::{
    Billboard, BoundingBox, BoundingSphere, Drawable, DrawableId, GeoState, GeoStateId, Light, Lod, Node,
    NodeId, NodeKind, Scene,
};

/// Counters gathered during one traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Nodes entered
    pub nodes_visited: usize,
    /// Nodes rejected by bound, LOD range or singular transform
    pub nodes_culled: usize,
    /// Drawables rejected by their own bound
    pub drawables_culled: usize,
    /// Drawables placed in a bin
    pub drawables_binned: usize,
    /// Transform levels entered
    pub matrix_pushes: usize,
    /// Transform levels left
    pub matrix_pops: usize,
}

/// Cull traversal producing the opaque bin, transparent bin and light list
#[derive(Debug, Clone)]
pub struct RenderVisitor {
    settings: CullSettings,
    camera: Camera,
    stack: TraversalStateStack,
    opaque: OpaqueBin,
    transparent: TransparentBin,
    lights: Vec<LightEntry>,
    global_state: Option<GeoStateId>,
    stats: CullStats,
}

impl RenderVisitor {
    /// Create a visitor with the given settings and the default camera
    pub fn new(settings: CullSettings) -> Self {
        let mut visitor = Self {
            settings,
            camera: Camera::default(),
            stack: TraversalStateStack::default(),
            opaque: OpaqueBin::new(),
            transparent: TransparentBin::new(),
            lights: Vec::new(),
            global_state: None,
            stats: CullStats::default(),
        };
        visitor.sync_culling();
        visitor.calculate_clipping_planes();
        visitor
    }

    /// Use `camera` for subsequent traversals
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.set_camera(&camera);
        self
    }

    /// Create a visitor from loaded application settings
    pub fn from_config(config: &ApplicationConfig) -> Self {
        Self::new(config.culling.clone()).with_camera(config.camera.clone())
    }

    /// Clear the bins, light list, transform stack and statistics
    pub fn reset(&mut self) {
        self.stack.clear();
        self.opaque.clear();
        self.transparent.clear();
        self.lights.clear();
        self.stats = CullStats::default();
    }

    /// Settings in effect
    pub fn settings(&self) -> &CullSettings {
        &self.settings
    }

    /// Camera in effect
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Set the state applied before anything else during replay
    pub fn set_global_state(&mut self, state: Option<GeoStateId>) {
        self.global_state = state;
    }

    /// State applied before anything else during replay
    pub fn global_state(&self) -> Option<GeoStateId> {
        self.global_state
    }

    /// Replace the camera and recompute the root frustum
    pub fn set_camera(&mut self, camera: &Camera) {
        self.camera = camera.clone();
        self.calculate_clipping_planes();
    }

    /// Set the perspective parameters
    pub fn set_perspective(&mut self, fovy_degrees: f32, aspect: f32, near: f32, far: f32) {
        self.camera.fovy_degrees = fovy_degrees;
        self.camera.aspect = aspect;
        self.camera.near = near;
        self.camera.far = far;
        self.calculate_clipping_planes();
    }

    /// Place the eye
    pub fn set_look_at(&mut self, eye: Vec3, center: Vec3, up: Vec3) {
        self.camera.position = eye;
        self.camera.target = center;
        self.camera.up = up;
        self.calculate_clipping_planes();
    }

    /// Enable or disable a culling test
    pub fn set_culling_active(&mut self, mode: CullingMode, active: bool) {
        if mode.contains(CullingMode::VIEW_FRUSTUM) {
            self.settings.view_frustum_culling = active;
        }
        if mode.contains(CullingMode::SMALL_FEATURE) {
            self.settings.small_feature_culling = active;
        }
        self.sync_culling();
    }

    /// Whether every test in `mode` is enabled
    pub fn culling_active(&self, mode: CullingMode) -> bool {
        self.culling_mode().contains(mode)
    }

    /// Enabled culling tests
    pub fn culling_mode(&self) -> CullingMode {
        let mut mode = CullingMode::empty();
        mode.set(CullingMode::VIEW_FRUSTUM, self.settings.view_frustum_culling);
        mode.set(CullingMode::SMALL_FEATURE, self.settings.small_feature_culling);
        mode
    }

    /// Set the small-feature ratio threshold
    pub fn set_small_feature_ratio(&mut self, ratio: f32) {
        self.settings.small_feature_ratio = ratio;
        self.sync_culling();
    }

    /// Select the transparent depth metric
    pub fn set_depth_sort_mode(&mut self, mode: DepthSortMode) {
        self.settings.depth_sort = mode;
    }

    /// Transparent depth metric
    pub fn depth_sort_mode(&self) -> DepthSortMode {
        self.settings.depth_sort
    }

    /// Set the LOD bias
    pub fn set_lod_bias(&mut self, bias: f32) {
        self.settings.lod_bias = bias;
    }

    /// LOD bias
    pub fn lod_bias(&self) -> f32 {
        self.settings.lod_bias
    }

    /// Set the traversal mode
    pub fn set_traversal_mode(&mut self, mode: TraversalMode) {
        self.settings.traversal_mode = mode;
    }

    /// Enable per-drawable trace output
    pub fn set_debug_logging(&mut self, enabled: bool) {
        self.settings.debug_logging = enabled;
    }

    /// Accumulated matrix at the current level, `None` for identity
    pub fn current_matrix(&self) -> Option<&Rc<Mat4>> {
        self.stack.current_matrix()
    }

    /// Inverse of the accumulated matrix, `None` for identity
    pub fn inverse_current_matrix(&self) -> Option<&Mat4> {
        self.stack.current().inverse()
    }

    /// Eye position at the current level
    pub fn eye_local(&self) -> Vec3 {
        self.stack.current().eye_point
    }

    /// Look-at point at the current level
    pub fn center_local(&self) -> Vec3 {
        self.stack.current().center_point
    }

    /// View direction at the current level
    pub fn look_vector_local(&self) -> Vec3 {
        self.stack.current().look_vector
    }

    /// View state at the current level
    pub fn view_state(&self) -> &ViewState {
        self.stack.current()
    }

    /// Transform stack
    pub fn stack(&self) -> &TraversalStateStack {
        &self.stack
    }

    /// Sphere test at the current level
    pub fn is_culled_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.stack.current().is_culled_sphere(sphere)
    }

    /// Box test at the current level
    pub fn is_culled_box(&self, bb: &BoundingBox) -> bool {
        self.stack.current().is_culled_box(bb)
    }

    /// Opaque bin from the last traversal
    pub fn opaque_bin(&self) -> &OpaqueBin {
        &self.opaque
    }

    /// Transparent bin from the last traversal
    pub fn transparent_bin(&self) -> &TransparentBin {
        &self.transparent
    }

    /// Lights recorded by the last traversal, in discovery order
    pub fn lights(&self) -> &[LightEntry] {
        &self.lights
    }

    /// Counters from the last traversal
    pub fn stats(&self) -> CullStats {
        CullStats {
            matrix_pushes: self.stack.push_count(),
            matrix_pops: self.stack.pop_count(),
            ..self.stats
        }
    }

    /// Reset, then traverse the graph below `root`
    pub fn cull(&mut self, scene: &Scene, root: NodeId) {
        self.reset();
        self.traverse(scene, root);

        debug_assert!(self.stack.is_empty(), "transform stack unbalanced after traversal");
        let stats = self.stats();
        log::debug!(
            "Cull pass: {} nodes visited, {} culled, {} opaque / {} transparent drawables, {} lights",
            stats.nodes_visited,
            stats.nodes_culled,
            self.opaque.len(),
            self.transparent.len(),
            self.lights.len()
        );
    }

    /// Traverse the graph below `node` without resetting
    ///
    /// Lets several roots accumulate into the same bins.
    pub fn traverse(&mut self, scene: &Scene, id: NodeId) {
        let Some(node) = scene.node(id) else {
            log::debug!("Skipping unknown node {:?}", id);
            return;
        };
        self.stats.nodes_visited += 1;

        match node.kind() {
            NodeKind::Scene | NodeKind::Group | NodeKind::Switch(_) => {
                if !self.node_culled(scene, id) {
                    self.traverse_children(scene, node);
                }
            }
            NodeKind::Transform(matrix) => {
                if !self.node_culled(scene, id) {
                    self.apply_transform(scene, node, matrix);
                }
            }
            NodeKind::Lod(lod) => {
                if !self.node_culled(scene, id) {
                    self.apply_lod(scene, id, lod);
                }
            }
            NodeKind::LightSource(light) => self.apply_light_source(scene, node, light),
            NodeKind::Billboard(billboard) => {
                if !self.node_culled(scene, id) {
                    self.apply_billboard(scene, billboard);
                }
            }
            NodeKind::Geode(drawables) => {
                if !self.node_culled(scene, id) {
                    self.apply_geode(scene, drawables);
                }
            }
        }
    }

    fn node_culled(&mut self, scene: &Scene, id: NodeId) -> bool {
        let culled = self.is_culled_sphere(&scene.bound(id));
        if culled {
            self.stats.nodes_culled += 1;
            if self.settings.debug_logging {
                log::trace!("Culled node {:?}", id);
            }
        }
        culled
    }

    fn traverse_children(&mut self, scene: &Scene, node: &Node) {
        match self.settings.traversal_mode {
            TraversalMode::ActiveChildren => {
                for child in node.active_children() {
                    self.traverse(scene, child);
                }
            }
            TraversalMode::AllChildren => {
                for &child in node.children() {
                    self.traverse(scene, child);
                }
            }
        }
    }

    fn apply_transform(&mut self, scene: &Scene, node: &Node, matrix: &Mat4) {
        if let Err(err) = self.stack.push_matrix(matrix) {
            log::debug!("Culling transform '{}': {}", node.name(), err);
            self.stats.nodes_culled += 1;
            return;
        }
        self.traverse_children(scene, node);
        self.stack.pop_matrix();
    }

    fn apply_lod(&mut self, scene: &Scene, id: NodeId, lod: &Lod) {
        let center = lod.center.unwrap_or_else(|| scene.bound(id).center);
        let selected = lod
            .evaluate(&self.eye_local(), self.settings.lod_bias, &center)
            .and_then(|index| scene.node(id)?.children().get(index).copied());

        match selected {
            Some(child) => self.traverse(scene, child),
            None => self.stats.nodes_culled += 1,
        }
    }

    fn apply_light_source(&mut self, scene: &Scene, node: &Node, light: &Light) {
        self.lights.push(LightEntry {
            matrix: self.current_matrix().cloned(),
            light: light.clone(),
        });
        self.traverse_children(scene, node);
    }

    fn apply_geode(&mut self, scene: &Scene, drawables: &[DrawableId]) {
        let matrix = self.current_matrix().cloned();
        for &id in drawables {
            let Some(drawable) = scene.drawable(id) else { continue };
            if self.is_culled_box(&drawable.bound()) {
                self.stats.drawables_culled += 1;
                continue;
            }
            self.classify(scene, id, drawable, matrix.clone());
        }
    }

    fn apply_billboard(&mut self, scene: &Scene, billboard: &Billboard) {
        let eye_local = self.eye_local();
        for entry in &billboard.entries {
            let Some(drawable) = scene.drawable(entry.drawable) else { continue };

            let local = billboard.calc_transform(&eye_local, &entry.position);
            let matrix = match self.current_matrix() {
                Some(current) => current.as_ref() * local,
                None => local,
            };
            self.classify(scene, entry.drawable, drawable, Some(Rc::new(matrix)));
        }
    }

    fn classify(&mut self, scene: &Scene, id: DrawableId, drawable: &Drawable, matrix: Option<Rc<Mat4>>) {
        let state = drawable.geo_state();
        let transparent = state
            .and_then(|s| scene.geo_state(s))
            .is_some_and(GeoState::is_transparent);

        if transparent {
            let local_center = drawable.bound().center();
            let center = matrix
                .as_deref()
                .map_or(local_center, |m| utils::transform_point(m, &local_center));
            let depth = self.depth_of(&center);
            if self.settings.debug_logging {
                log::trace!("Transparent '{}' center {:?} depth {}", drawable.name(), center, depth);
            }
            self.transparent.insert(depth, MatrixGeoSet::new(matrix, id));
        } else {
            self.opaque.insert(state, MatrixGeoSet::new(matrix, id));
        }
        self.stats.drawables_binned += 1;
    }

    /// Sort key of a world-space point under the current depth metric
    pub fn depth_of(&self, center: &Vec3) -> f32 {
        let root = self.stack.root();
        let delta = center - root.eye_point;
        match self.settings.depth_sort {
            DepthSortMode::LookVectorDistance => root.look_vector.dot(&delta),
            DepthSortMode::ObjectEyePointDistance => delta.norm_squared(),
        }
    }

    /// Nearest and farthest binned geometry along the root look vector
    ///
    /// Projects the box corners of every binned drawable. `None` when both
    /// bins are empty.
    pub fn calc_near_far(&self, scene: &Scene) -> Option<(f32, f32)> {
        if self.opaque.is_empty() && self.transparent.is_empty() {
            return None;
        }

        let root = self.stack.root();
        let entries = self
            .opaque
            .iter()
            .map(|(_, entry)| entry)
            .chain(self.transparent.iter().map(|e| &e.entry));

        let mut near = f32::MAX;
        let mut far = f32::MIN;
        for entry in entries {
            let Some(drawable) = scene.drawable(entry.drawable) else { continue };
            for corner in drawable.bound().corners() {
                let world = entry
                    .matrix
                    .as_deref()
                    .map_or(corner, |m| utils::transform_point(m, &corner));
                let d = (world - root.eye_point).dot(&root.look_vector);
                near = near.min(d);
                far = far.max(d);
            }
        }
        Some((near, far))
    }

    fn calculate_clipping_planes(&mut self) {
        let camera = &self.camera;
        let root = ViewState::root(camera.position, camera.target, camera.up, camera.fovy_degrees, camera.aspect);
        self.stack.set_root(root);
        log::trace!("Root frustum normals: {:?}", self.stack.root().frustum);
    }

    fn sync_culling(&mut self) {
        self.stack.set_culling(self.culling_mode(), self.settings.small_feature_ratio);
    }
}

impl Default for RenderVisitor {
    fn default() -> Self {
        Self::new(CullSettings::default())
    }
}
