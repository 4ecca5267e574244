//! Transform stack mirroring the scene graph's Transform nesting

use std::rc::Rc;

use thiserror::Error;

use super::view_state::{CullingMode, ViewState};
use crate::foundation::math::Mat4;

/// Stack errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StackError {
    /// The accumulated matrix has no inverse
    #[error("Accumulated transform is singular")]
    SingularTransform,
}

/// Push/pop stack of view states
///
/// The root level holds the camera in world space and is never popped.
/// Each pushed level owns its accumulated matrix through an `Rc`, which bin
/// entries clone so the matrix outlives the level.
#[derive(Debug, Clone, Default)]
pub struct TraversalStateStack {
    root: ViewState,
    levels: Vec<ViewState>,
    pushes: usize,
    pops: usize,
}

impl TraversalStateStack {
    /// Create a stack with the given root view
    pub fn new(root: ViewState) -> Self {
        Self { root, levels: Vec::new(), pushes: 0, pops: 0 }
    }

    /// World-space view state
    pub fn root(&self) -> &ViewState {
        &self.root
    }

    /// Replace the root view, keeping culling flags and ratio
    pub fn set_root(&mut self, root: ViewState) {
        self.root = ViewState {
            culling: self.root.culling,
            small_feature_ratio: self.root.small_feature_ratio,
            ..root
        };
    }

    /// Culling configuration applied to the root and to every later push
    pub fn set_culling(&mut self, culling: CullingMode, small_feature_ratio: f32) {
        self.root.culling = culling;
        self.root.small_feature_ratio = small_feature_ratio;
    }

    /// View state of the innermost level
    pub fn current(&self) -> &ViewState {
        self.levels.last().unwrap_or(&self.root)
    }

    /// Accumulated matrix of the innermost level, `None` for identity
    pub fn current_matrix(&self) -> Option<&Rc<Mat4>> {
        self.current().matrix()
    }

    /// Number of pushed levels
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// True when only the root remains
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Successful pushes since the last `clear`
    pub fn push_count(&self) -> usize {
        self.pushes
    }

    /// Pops since the last `clear`
    pub fn pop_count(&self) -> usize {
        self.pops
    }

    /// Enter a transform
    ///
    /// Composes `current * local` (child-to-parent accumulation) and
    /// re-expresses the root view in the new local space. Nothing is pushed
    /// when the composed matrix cannot be inverted.
    pub fn push_matrix(&mut self, local: &Mat4) -> Result<(), StackError> {
        let composed = match self.current_matrix() {
            Some(current) => current.as_ref() * local,
            None => *local,
        };
        let inverse = composed.try_inverse().ok_or(StackError::SingularTransform)?;

        let level = ViewState::derived(&self.root, Rc::new(composed), inverse);
        self.levels.push(level);
        self.pushes += 1;
        Ok(())
    }

    /// Leave the innermost transform, returning its view state
    pub fn pop_matrix(&mut self) -> Option<ViewState> {
        let level = self.levels.pop();
        if level.is_some() {
            self.pops += 1;
        } else {
            log::warn!("pop_matrix called on an empty traversal stack");
        }
        level
    }

    /// Drop every pushed level and reset the counters
    pub fn clear(&mut self) {
        self.levels.clear();
        self.pushes = 0;
        self.pops = 0;
    }
}
