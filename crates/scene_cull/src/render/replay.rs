//! Replay of the cull bins into a command stream
//!
//! Order of emission:
//! 1. the global state, once
//! 2. every recorded light, in discovery order
//! 3. the opaque bin, group by group
//! 4. the transparent bin, farthest first
//! 5. a closing `PopMatrix` if a matrix is still loaded
//!
//! Matrix and state commands are only emitted when the value differs from
//! the one already current. Matrices compare by `Rc` identity, states by
//! arena handle.

use std::rc::Rc;

use super::commands::{RenderCommand, RenderSink, RenderStats};
use crate::cull::{MatrixGeoSet, RenderVisitor};
use crate::foundation::math::Mat4;
use crate::scene::{GeoState, GeoStateId, Scene};

struct Replay<'a, S: RenderSink + ?Sized> {
    scene: &'a Scene,
    global: Option<&'a GeoState>,
    global_id: Option<GeoStateId>,
    sink: &'a mut S,
    matrix: Option<Rc<Mat4>>,
    state: Option<GeoStateId>,
    stats: RenderStats,
    trace: bool,
}

impl<'a, S: RenderSink + ?Sized> Replay<'a, S> {
    fn load_matrix(&mut self, matrix: Option<&Rc<Mat4>>) {
        if MatrixGeoSet::same_matrix(self.matrix.as_ref(), matrix) {
            return;
        }
        if self.matrix.is_some() {
            self.sink.submit(RenderCommand::PopMatrix);
        }
        if let Some(m) = matrix {
            self.sink.submit(RenderCommand::PushMatrix(**m));
        }
        self.matrix = matrix.cloned();
        self.stats.matrix_changes += 1;
    }

    /// Drawables without a state and drawables keyed to the global state
    /// share one baseline, reported as `None`
    fn baseline_of(&self, state: Option<GeoStateId>) -> Option<GeoStateId> {
        if state == self.global_id {
            None
        } else {
            state
        }
    }

    fn load_state(&mut self, state: Option<GeoStateId>) {
        let next_key = self.baseline_of(state);
        let current_key = self.baseline_of(self.state);
        if next_key == current_key {
            return;
        }
        let scene = self.scene;
        let previous = current_key.and_then(|id| scene.geo_state(id));
        let changes = match next_key.and_then(|id| scene.geo_state(id)) {
            Some(next) => next.apply(self.global, previous),
            None => {
                let baseline = GeoState::resolve_global(self.global);
                let from = previous.map_or(baseline, |p| p.resolve(self.global));
                baseline.changes_from(&from)
            }
        };

        self.sink.submit(RenderCommand::ApplyState { state, changes });
        self.state = state;
        self.stats.state_changes += 1;
    }

    fn draw(&mut self, entry: &MatrixGeoSet, state: Option<GeoStateId>) {
        self.load_matrix(entry.matrix.as_ref());
        self.load_state(state);
        if self.trace {
            log::trace!("Draw {:?} state {:?}", entry.drawable, state);
        }
        self.sink.submit(RenderCommand::Draw { drawable: entry.drawable });
        self.stats.draws += 1;
    }
}

impl RenderVisitor {
    /// Replay the bins filled by the last traversal into `sink`
    ///
    /// Reads the visitor and scene only; calling it twice emits the same
    /// stream twice.
    pub fn render<S: RenderSink + ?Sized>(&self, scene: &Scene, sink: &mut S) -> RenderStats {
        let global = self.global_state().and_then(|id| scene.geo_state(id));
        sink.submit(RenderCommand::ApplyGlobalState {
            state: self.global_state(),
            values: GeoState::resolve_global(global),
        });

        let mut replay = Replay {
            scene,
            global,
            global_id: self.global_state(),
            sink,
            matrix: None,
            state: self.global_state(),
            stats: RenderStats::default(),
            trace: self.settings().debug_logging,
        };

        for entry in self.lights() {
            replay.load_matrix(entry.matrix.as_ref());
            replay.sink.submit(RenderCommand::ApplyLight { light: entry.light.clone() });
            replay.stats.lights += 1;
        }

        for (state, entry) in self.opaque_bin().iter() {
            replay.draw(entry, state);
        }

        for depth_entry in self.transparent_bin().iter_back_to_front() {
            let state = scene
                .drawable(depth_entry.entry.drawable)
                .and_then(|drawable| drawable.geo_state());
            replay.draw(&depth_entry.entry, state);
        }

        if replay.matrix.is_some() {
            replay.sink.submit(RenderCommand::PopMatrix);
        }

        let stats = replay.stats;
        log::debug!(
            "Replay: {} draws, {} state changes, {} matrix changes, {} lights",
            stats.draws,
            stats.state_changes,
            stats.matrix_changes,
            stats.lights
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::CommandBuffer;
    use crate::scene::{BoundingBox, Drawable, DrawableId, Light, StateChange, TextureId};

    fn box_at(scene: &mut Scene, name: &str, center: Vec3, state: Option<GeoStateId>) -> DrawableId {
        let bb = BoundingBox::from_center_extents(center, Vec3::repeat(0.5));
        let mut drawable = Drawable::from_box(name, &bb);
        drawable.set_geo_state(state);
        scene.add_drawable(drawable)
    }

    #[test]
    fn test_lights_precede_draws_and_matrix_is_closed() {
        let mut scene = Scene::new();
        let root = scene.add_scene_root("root");
        let light = scene.add_light_source("sun", Light::new(0));
        let xform = scene.add_transform("xform", Mat4::new_translation(&Vec3::new(0.0, 0.0, -10.0)));
        let geode = scene.add_geode("geode");
        let d = box_at(&mut scene, "d", Vec3::zeros(), None);
        scene.add_geode_drawable(geode, d).unwrap();
        scene.add_child(xform, geode).unwrap();
        scene.add_child(light, xform).unwrap();
        scene.add_child(root, light).unwrap();

        let mut visitor = RenderVisitor::default();
        visitor.cull(&scene, root);
        let mut buffer = CommandBuffer::new();
        let stats = visitor.render(&scene, &mut buffer);

        assert!(matches!(buffer.commands[0], RenderCommand::ApplyGlobalState { state: None, .. }));
        assert!(matches!(buffer.commands[1], RenderCommand::ApplyLight { .. }));
        assert!(matches!(buffer.commands[2], RenderCommand::PushMatrix(_)));
        assert_eq!(buffer.commands[3], RenderCommand::Draw { drawable: d });
        assert_eq!(buffer.commands.last(), Some(&RenderCommand::PopMatrix));
        assert_eq!(stats, RenderStats { state_changes: 0, matrix_changes: 1, draws: 1, lights: 1 });
    }

    #[test]
    fn test_return_to_stateless_drawable_restores_global() {
        let mut scene = Scene::new();
        let global = scene.add_geo_state(GeoState::new("global").with_lighting(false));
        let textured = scene.add_geo_state(GeoState::new("textured").with_texture(TextureId(7)).with_lighting(true));
        let root = scene.add_scene_root("root");
        let geode = scene.add_geode("geode");
        let a = box_at(&mut scene, "a", Vec3::new(0.0, 0.0, -10.0), Some(textured));
        let b = box_at(&mut scene, "b", Vec3::new(1.0, 0.0, -10.0), None);
        scene.add_geode_drawable(geode, a).unwrap();
        scene.add_geode_drawable(geode, b).unwrap();
        scene.add_child(root, geode).unwrap();

        let mut visitor = RenderVisitor::default();
        visitor.set_global_state(Some(global));
        visitor.cull(&scene, root);
        let mut buffer = CommandBuffer::new();
        let stats = visitor.render(&scene, &mut buffer);

        let applied: Vec<_> = buffer
            .commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::ApplyState { state, changes } => Some((*state, changes.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            applied,
            vec![
                (
                    Some(textured),
                    vec![StateChange::Lighting(true), StateChange::Texture(Some(TextureId(7)))]
                ),
                (None, vec![StateChange::Lighting(false), StateChange::Texture(None)]),
            ]
        );
        assert_eq!(stats.state_changes, 2);
        assert_eq!(stats.matrix_changes, 0);
    }

    #[test]
    fn test_drawables_keyed_to_global_state_skip_state_changes() {
        let mut scene = Scene::new();
        let global = scene.add_geo_state(GeoState::new("global").with_lighting(false));
        let textured = scene.add_geo_state(GeoState::new("textured").with_texture(TextureId(3)));
        let root = scene.add_scene_root("root");
        let geode = scene.add_geode("geode");
        let a = box_at(&mut scene, "a", Vec3::new(0.0, 0.0, -10.0), Some(global));
        let b = box_at(&mut scene, "b", Vec3::new(1.0, 0.0, -10.0), None);
        scene.add_geode_drawable(geode, a).unwrap();
        scene.add_geode_drawable(geode, b).unwrap();
        scene.add_child(root, geode).unwrap();

        let mut visitor = RenderVisitor::default();
        visitor.set_global_state(Some(global));
        visitor.cull(&scene, root);
        let mut buffer = CommandBuffer::new();
        let stats = visitor.render(&scene, &mut buffer);

        assert_eq!(buffer.commands.len(), 3);
        assert!(matches!(buffer.commands[0], RenderCommand::ApplyGlobalState { state: Some(g), .. } if g == global));
        assert_eq!(buffer.commands[1], RenderCommand::Draw { drawable: a });
        assert_eq!(buffer.commands[2], RenderCommand::Draw { drawable: b });
        assert_eq!(stats.state_changes, 0);

        // Leaving a real state for the global one restores the baseline once
        let t = box_at(&mut scene, "t", Vec3::new(-1.0, 0.0, -10.0), Some(textured));
        let c = box_at(&mut scene, "c", Vec3::new(2.0, 0.0, -10.0), Some(global));
        let second = scene.add_geode("second");
        scene.add_geode_drawable(second, t).unwrap();
        scene.add_geode_drawable(second, c).unwrap();
        scene.remove_child(root, geode).unwrap();
        scene.add_child(root, second).unwrap();

        visitor.cull(&scene, root);
        buffer.clear();
        let stats = visitor.render(&scene, &mut buffer);

        let applied: Vec<_> = buffer
            .commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::ApplyState { state, changes } => Some((*state, changes.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            applied,
            vec![
                (Some(textured), vec![StateChange::Texture(Some(TextureId(3)))]),
                (Some(global), vec![StateChange::Texture(None)]),
            ]
        );
        assert_eq!(stats.state_changes, 2);
    }

    #[test]
    fn test_render_is_repeatable() {
        let mut scene = Scene::new();
        let root = scene.add_scene_root("root");
        let geode = scene.add_geode("geode");
        let d = box_at(&mut scene, "d", Vec3::new(0.0, 0.0, -5.0), None);
        scene.add_geode_drawable(geode, d).unwrap();
        scene.add_child(root, geode).unwrap();

        let mut visitor = RenderVisitor::default();
        visitor.cull(&scene, root);
        let mut first = CommandBuffer::new();
        let mut second = CommandBuffer::new();
        visitor.render(&scene, &mut first);
        visitor.render(&scene, &mut second);
        assert_eq!(first.commands, second.commands);
    }
}
