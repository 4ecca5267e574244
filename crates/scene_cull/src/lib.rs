//! # Scene Cull
//!
//! Scene-graph cull traversal with state-sorted replay.
//!
//! ## Features
//!
//! - **Arena Scene Graph**: Groups, transforms, LODs, switches, lights,
//!   billboards and geodes with shared children and cached bounds
//! - **Local-Space Culling**: View frustum and small-feature tests against a
//!   stack of transformed view states
//! - **Render Bins**: Opaque drawables grouped by render state, transparent
//!   drawables sorted back to front
//! - **Replay**: Minimal matrix and state changes emitted into a pluggable sink
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_cull::prelude::*;
//!
//! let mut scene = Scene::new();
//! let root = scene.add_scene_root("root");
//! let geode = scene.add_geode("crate");
//! let bb = BoundingBox::from_center_extents(Vec3::new(0.0, 0.0, -10.0), Vec3::repeat(1.0));
//! let drawable = scene.add_drawable(Drawable::from_box("crate", &bb));
//! scene.add_geode_drawable(geode, drawable)?;
//! scene.add_child(root, geode)?;
//!
//! let mut visitor = RenderVisitor::new(CullSettings::default());
//! visitor.cull(&scene, root);
//!
//! let mut commands = CommandBuffer::new();
//! let stats = visitor.render(&scene, &mut commands);
//! assert_eq!(stats.draws, 1);
//! # Ok::<(), SceneError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod cull;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::{ApplicationConfig, CullSettings, DepthSortMode, LoggingConfig, TraversalMode},
        cull::{Camera, CullStats, CullingMode, RenderVisitor},
        foundation::math::{Mat4, Vec3, Vec4},
        render::{CommandBuffer, RenderCommand, RenderSink, RenderStats},
        scene::{
            BillboardMode, BoundingBox, BoundingSphere, Drawable, DrawableId, GeoState, GeoStateId, Light,
            NodeId, Scene, SceneError,
        },
    };
}
