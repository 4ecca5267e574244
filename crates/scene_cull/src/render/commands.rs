//! Replay command stream
//!
//! The replay phase never talks to a graphics API. It emits `RenderCommand`
//! values into a `RenderSink`, and the backend on the other side decides what
//! a matrix load or a state write means.
//!
//! # Design Philosophy
//!
//! The sink is a passive consumer:
//! - Matrices arrive fully accumulated (no transform logic in the backend)
//! - States arrive as attribute deltas against what is already current
//! - Draws carry only the drawable handle

use crate::foundation::math::Mat4;
use crate::scene::{DrawableId, GeoStateId, Light, ResolvedState, StateChange};

/// One operation of the replay stream
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Establish the baseline state, emitted once at the start
    ApplyGlobalState {
        /// Global state handle, `None` for built-in defaults
        state: Option<GeoStateId>,
        /// Fully resolved baseline values
        values: ResolvedState,
    },

    /// Enable a light under the current matrix
    ApplyLight {
        /// Light parameters
        light: Light,
    },

    /// Save the current matrix and multiply by an accumulated transform
    PushMatrix(Mat4),

    /// Restore the matrix saved by the matching `PushMatrix`
    PopMatrix,

    /// Switch render state
    ApplyState {
        /// New state, `None` for the global baseline
        state: Option<GeoStateId>,
        /// Attribute writes needed to reach it
        changes: Vec<StateChange>,
    },

    /// Issue a drawable
    Draw {
        /// Drawable handle
        drawable: DrawableId,
    },
}

/// Consumer of the replay stream
pub trait RenderSink {
    /// Accept the next command
    fn submit(&mut self, command: RenderCommand);
}

/// In-memory sink recording every command
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    /// Commands in submission order
    pub commands: Vec<RenderCommand>,
}

impl CommandBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self { commands: Vec::with_capacity(capacity) }
    }

    /// Drawables in the order they were issued
    pub fn draw_order(&self) -> Vec<DrawableId> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                RenderCommand::Draw { drawable } => Some(*drawable),
                _ => None,
            })
            .collect()
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing was submitted
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop every command, keeping the allocation
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl RenderSink for CommandBuffer {
    fn submit(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }
}

/// Counters from one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// `ApplyState` commands emitted
    pub state_changes: usize,
    /// Matrix transitions between consecutive items
    pub matrix_changes: usize,
    /// Draws issued
    pub draws: usize,
    /// Lights applied
    pub lights: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_command_buffer_records_draw_order() {
        let mut ids: SlotMap<DrawableId, ()> = SlotMap::with_key();
        let (a, b) = (ids.insert(()), ids.insert(()));

        let mut buffer = CommandBuffer::with_capacity(4);
        buffer.submit(RenderCommand::PushMatrix(Mat4::identity()));
        buffer.submit(RenderCommand::Draw { drawable: b });
        buffer.submit(RenderCommand::PopMatrix);
        buffer.submit(RenderCommand::Draw { drawable: a });

        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.draw_order(), vec![b, a]);

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
