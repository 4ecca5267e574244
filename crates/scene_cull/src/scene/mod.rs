//! Scene graph
//!
//! Arena-backed scene description consumed by the cull traversal:
//!
//! ```text
//! Scene (arena)
//!   ├── nodes      Scene / Group / Transform / LOD / Switch / LightSource
//!   │              Billboard / Geode
//!   ├── drawables  vertices + optional GeoState
//!   └── states     GeoState render-state bundles
//! ```
//!
//! The traversal only reads the scene. Edits happen between frames and
//! invalidate cached bounds up the parent chain.

mod bounds;
mod drawable;
mod graph;
mod light;
mod node;
mod state;

pub use bounds::{BoundingBox, BoundingSphere};
pub use drawable::Drawable;
pub use graph::{DrawableId, GeoStateId, NodeId, Scene, SceneError};
pub use light::Light;
pub use node::{Billboard, BillboardEntry, BillboardMode, Lod, Node, NodeKind, Switch};
pub use state::{BlendMode, FaceCulling, GeoState, MaterialId, ResolvedState, StateChange, TextureId};
