use bevy::prelude::*;
use std::collections::VecDeque;

use crate::constants::modeling::DEFAULT_UNDO_HISTORY;
use crate::modeling::half_edge::HalfEdgeMesh;

/// Bounded undo/redo stacks of committed mesh snapshots.
///
/// Every commit swaps a whole validated mesh in, so the previous mesh is
/// the undo record. No per-operation inverse is needed.
#[derive(Debug, Clone)]
pub struct MeshHistory {
    undo_stack: VecDeque<HalfEdgeMesh>,
    redo_stack: VecDeque<HalfEdgeMesh>,
    capacity: usize,
}

impl Default for MeshHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_UNDO_HISTORY)
    }
}

impl MeshHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(capacity),
            redo_stack: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the bound, dropping the oldest entries if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
        while self.redo_stack.len() > self.capacity {
            self.redo_stack.pop_front();
        }
    }

    /// Record the mesh as it was before a commit.
    pub fn push(&mut self, previous: HalfEdgeMesh) {
        // A new edit invalidates anything that was undone
        self.redo_stack.clear();

        if self.undo_stack.len() >= self.capacity {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(previous);
    }

    /// Step back. `current` moves onto the redo stack.
    pub fn undo(&mut self, current: HalfEdgeMesh) -> Option<HalfEdgeMesh> {
        let previous = self.undo_stack.pop_back()?;
        if self.redo_stack.len() >= self.capacity {
            self.redo_stack.pop_front();
        }
        self.redo_stack.push_back(current);
        Some(previous)
    }

    /// Step forward again. `current` moves back onto the undo stack.
    pub fn redo(&mut self, current: HalfEdgeMesh) -> Option<HalfEdgeMesh> {
        let next = self.redo_stack.pop_back()?;
        if self.undo_stack.len() >= self.capacity {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Message to step the mesh history back
#[derive(Message, Clone, Copy, Debug)]
pub struct UndoMeshEdit;

/// Message to step the mesh history forward
#[derive(Message, Clone, Copy, Debug)]
pub struct RedoMeshEdit;

pub struct HistoryPlugin;

impl Plugin for HistoryPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<UndoMeshEdit>()
            .add_message::<RedoMeshEdit>()
            .add_systems(PreUpdate, handle_undo_redo_input);
    }
}

/// Ctrl+Z / Ctrl+Shift+Z / Ctrl+Y. Hosts without keyboard input simply
/// never get the resource.
fn handle_undo_redo_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut undo_events: MessageWriter<UndoMeshEdit>,
    mut redo_events: MessageWriter<RedoMeshEdit>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };
    let ctrl = keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);

    if ctrl && keyboard.just_pressed(KeyCode::KeyZ) {
        if keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight) {
            redo_events.write(RedoMeshEdit);
        } else {
            undo_events.write(UndoMeshEdit);
        }
    }

    // Alternative: Ctrl+Y for redo
    if ctrl && keyboard.just_pressed(KeyCode::KeyY) {
        redo_events.write(RedoMeshEdit);
    }
}
