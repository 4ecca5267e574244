//! # Cull Module
//!
//! Top-down traversal that discards invisible geometry and sorts the rest
//! for replay.
//!
//! ## Pipeline
//!
//! ```text
//! Camera ──▶ root ViewState ──▶ TraversalStateStack
//!                                     │ push / pop per Transform
//!                                     ▼
//!                    RenderVisitor (sphere and box tests in local space)
//!                                     │
//!                 ┌───────────────────┼──────────────────┐
//!                 ▼                   ▼                  ▼
//!            OpaqueBin          TransparentBin       light list
//!        (grouped by state)   (sorted by depth)   (discovery order)
//! ```
//!
//! Bounds are never transformed to world space. Each pushed level carries
//! the eye and frustum normals expressed in that level's local space.

mod bins;
mod camera;
mod stack;
mod view_state;
mod visitor;


pub use bins::{DepthEntry, LightEntry, MatrixGeoSet, OpaqueBin, StateGroup, TransparentBin};
pub use camera::Camera;
pub use stack::{StackError, TraversalStateStack};
pub use view_state::{CullingMode, FrustumNormals, ViewState};
pub use visitor::{CullStats, RenderVisitor};
