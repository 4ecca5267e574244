//! Cull Demo
//!
//! Builds a procedural city block and orbits a camera around it, running a
//! cull traversal and a replay every frame:
//! - A grid of towers under per-tower transforms, sharing a few render states
//! - Glass panes routed to the transparent bin
//! - A landmark with two levels of detail
//! - A row of billboard trees
//! - A street light and a switched-off debug marker
//!
//! Usage: `cull_demo [config.toml|config.ron]`

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene_cull::foundation::logging;
use scene_cull::prelude::*;
use scene_cull::scene::{MaterialId, TextureId};
use thiserror::Error;

// City layout
const GRID_SIZE: i32 = 6;
const BLOCK_SPACING: f32 = 8.0;
const GLASS_PANES: usize = 12;
const TREE_COUNT: usize = 8;

// Camera orbit
const FRAMES: usize = 12;
const ORBIT_RADIUS: f32 = 45.0;
const ORBIT_HEIGHT: f32 = 12.0;

#[derive(Error, Debug)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scene construction error: {0}")]
    Scene(#[from] SceneError),
}

struct CityScene {
    scene: Scene,
    root: NodeId,
}

fn unit_box(scene: &mut Scene, name: &str, center: Vec3, half_extents: Vec3, state: GeoStateId) -> DrawableId {
    let bb = BoundingBox::from_center_extents(center, half_extents);
    scene.add_drawable(Drawable::from_box(name, &bb).with_geo_state(state))
}

fn build_city(rng: &mut StdRng) -> Result<CityScene, DemoError> {
    let mut scene = Scene::new();
    let root = scene.add_scene_root("city");

    let concrete = scene.add_geo_state(GeoState::new("concrete").with_material(MaterialId(1)));
    let brick = scene.add_geo_state(GeoState::new("brick").with_texture(TextureId(2)).with_material(MaterialId(2)));
    let steel = scene.add_geo_state(GeoState::new("steel").with_material(MaterialId(3)));
    let glass = scene.add_geo_state(GeoState::transparent("glass").with_lighting(false));
    let foliage = scene.add_geo_state(GeoState::new("foliage").with_texture(TextureId(4)));
    let states = [concrete, brick, steel];

    // Towers
    let towers = scene.add_group("towers");
    scene.add_child(root, towers)?;
    let offset = (GRID_SIZE - 1) as f32 * BLOCK_SPACING * 0.5;
    for gx in 0..GRID_SIZE {
        for gz in 0..GRID_SIZE {
            let position = Vec3::new(gx as f32 * BLOCK_SPACING - offset, 0.0, gz as f32 * BLOCK_SPACING - offset);
            let height = rng.gen_range(2.0..12.0);
            let placement = Mat4::new_translation(&position) * Mat4::from_axis_angle(&Vec3::y_axis(), rng.gen_range(0.0..PI));
            let xform = scene.add_transform(format!("tower_{gx}_{gz}"), placement);
            scene.add_child(towers, xform)?;

            let geode = scene.add_geode(format!("tower_geode_{gx}_{gz}"));
            let state = states[rng.gen_range(0..states.len())];
            let body = unit_box(&mut scene, "body", Vec3::new(0.0, height, 0.0), Vec3::new(1.5, height, 1.5), state);
            let roof = unit_box(&mut scene, "roof", Vec3::new(0.0, height * 2.0 + 0.25, 0.0), Vec3::new(1.7, 0.25, 1.7), steel);
            scene.add_geode_drawable(geode, body)?;
            scene.add_geode_drawable(geode, roof)?;
            scene.add_child(xform, geode)?;
        }
    }

    // Glass panes
    let panes = scene.add_geode("glass_panes");
    scene.add_child(root, panes)?;
    for i in 0..GLASS_PANES {
        let center = Vec3::new(rng.gen_range(-20.0..20.0), rng.gen_range(1.0..6.0), rng.gen_range(-20.0..20.0));
        let pane = unit_box(&mut scene, &format!("pane_{i}"), center, Vec3::new(1.0, 1.0, 0.05), glass);
        scene.add_geode_drawable(panes, pane)?;
    }

    // Landmark with two levels of detail
    let landmark = scene.add_lod("landmark");
    scene.add_child(root, landmark)?;
    let detailed = scene.add_geode("landmark_detailed");
    for (i, y) in [1.0, 3.0, 5.0, 7.0].into_iter().enumerate() {
        let tier = unit_box(&mut scene, &format!("tier_{i}"), Vec3::new(0.0, y, 0.0), Vec3::new(3.0 - i as f32 * 0.6, 1.0, 3.0 - i as f32 * 0.6), concrete);
        scene.add_geode_drawable(detailed, tier)?;
    }
    let coarse = scene.add_geode("landmark_coarse");
    let block = unit_box(&mut scene, "landmark_block", Vec3::new(0.0, 4.0, 0.0), Vec3::new(3.0, 4.0, 3.0), concrete);
    scene.add_geode_drawable(coarse, block)?;
    scene.add_lod_child(landmark, detailed, 0.0, 40.0)?;
    scene.add_lod_child(landmark, coarse, 40.0, 200.0)?;

    // Trees
    let trees = scene.add_billboard("trees", BillboardMode::default());
    scene.add_child(root, trees)?;
    for i in 0..TREE_COUNT {
        let sprite = unit_box(&mut scene, &format!("tree_{i}"), Vec3::new(0.0, 1.5, 0.0), Vec3::new(1.0, 1.5, 0.01), foliage);
        let x = (i as f32 - TREE_COUNT as f32 * 0.5) * 3.0;
        scene.add_billboard_drawable(trees, sprite, Vec3::new(x, 0.0, offset + BLOCK_SPACING))?;
    }

    // Street light
    let lamp_post = scene.add_transform("lamp_post", Mat4::new_translation(&Vec3::new(4.0, 0.0, 4.0)));
    scene.add_child(root, lamp_post)?;
    let lamp = scene.add_light_source("lamp", Light::new(0).with_position(Vec3::new(0.0, 6.0, 0.0)));
    scene.add_child(lamp_post, lamp)?;
    let pole = scene.add_geode("pole");
    let pole_box = unit_box(&mut scene, "pole", Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.1, 3.0, 0.1), steel);
    scene.add_geode_drawable(pole, pole_box)?;
    scene.add_child(lamp, pole)?;

    // Debug marker, hidden by default
    let debug = scene.add_switch("debug");
    scene.add_child(root, debug)?;
    let marker = scene.add_geode("origin_marker");
    let marker_box = unit_box(&mut scene, "marker", Vec3::zeros(), Vec3::repeat(0.25), steel);
    scene.add_geode_drawable(marker, marker_box)?;
    scene.add_child(debug, marker)?;
    scene.set_switch_value(debug, 0, false)?;

    log::info!("Built city scene with {} nodes", scene.node_count());
    Ok(CityScene { scene, root })
}

fn main() -> Result<(), DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => ApplicationConfig::load_from_file(path)?,
        None => ApplicationConfig::default(),
    };
    config.validate()?;
    logging::init_with_level(&config.logging.level);

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let city = build_city(&mut rng)?;

    let mut visitor = RenderVisitor::from_config(&config);
    let mut commands = CommandBuffer::new();
    let target = Vec3::new(0.0, 2.0, 0.0);

    for frame in 0..FRAMES {
        let angle = frame as f32 / FRAMES as f32 * 2.0 * PI;
        let radius = ORBIT_RADIUS * if frame % 2 == 0 { 1.0 } else { 0.6 };
        let eye = Vec3::new(radius * angle.cos(), ORBIT_HEIGHT, radius * angle.sin());
        visitor.set_look_at(eye, target, Vec3::y());

        visitor.cull(&city.scene, city.root);
        let near_far = visitor.calc_near_far(&city.scene);

        commands.clear();
        let render_stats = visitor.render(&city.scene, &mut commands);
        let cull_stats = visitor.stats();

        log::info!(
            "Frame {:2}: visited {:3} culled {:3} | opaque {:3} transparent {:2} | draws {:3} state changes {:2} matrix changes {:3} | near/far {:?}",
            frame,
            cull_stats.nodes_visited,
            cull_stats.nodes_culled + cull_stats.drawables_culled,
            visitor.opaque_bin().len(),
            visitor.transparent_bin().len(),
            render_stats.draws,
            render_stats.state_changes,
            render_stats.matrix_changes,
            near_far
        );
    }

    Ok(())
}
