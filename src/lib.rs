//! # Bevy Mesh Modeler
//!
//! Half-edge mesh modeling for Bevy: primitive construction, edge-loop
//! discovery, loop-cut planning, element selection and pointer-driven
//! vertex dragging.
//!
//! ## Quick Start
//!
//! ```no_run
//! use bevy::prelude::*;
//! use bevy_mesh_modeler::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(MinimalPlugins)
//!         .add_plugins(MeshModelerPlugin)
//!         .add_systems(Startup, |mut load: MessageWriter<LoadPrimitive>| {
//!             load.write(LoadPrimitive(PrimitiveShape::unit_sphere()));
//!         })
//!         .run();
//! }
//! ```
//!
//! The plugin does not render. The host sends pointer and tool messages
//! (`PickMessage`, `DragMessage`, `HoverEdgeMessage`, ...) and reads
//! `VertexPositionsChanged`, `LoopCutPreview`, `SelectionChanged` and
//! `MeshReplaced` to keep its buffers and overlays current.
//!
//! ## Keys
//!
//! - `1` / `2` / `3`: vertex, edge or face selection
//! - `Escape`: cancel the active drag
//! - Arrows: nudge the selection
//! - `Ctrl+Z` / `Ctrl+Shift+Z` / `Ctrl+Y`: undo and redo

pub mod commands;
pub mod constants;
pub mod error;
pub mod modeling;
pub mod settings;

// Re-export the main plugin and session
pub use modeling::{MeshModelState, MeshModelerPlugin};

pub use error::{MeshError, MeshResult};

pub mod prelude {
    pub use crate::commands::{HistoryPlugin, MeshHistory, RedoMeshEdit, UndoMeshEdit};
    pub use crate::error::{MeshError, MeshResult};
    pub use crate::modeling::drag::{ElementDragController, GestureHost, OrbitControl};
    pub use crate::modeling::edge_loop::{EdgeLoop, edge_loop_through, find_edge_loops};
    pub use crate::modeling::half_edge::{FaceId, HalfEdgeId, HalfEdgeMesh, VertexId};
    pub use crate::modeling::loop_cut::{LoopCutPlan, plan_loop_cut};
    pub use crate::modeling::marker::{MeshData, TriangleBuffers};
    pub use crate::modeling::primitives::PrimitiveShape;
    pub use crate::modeling::selection::{ElementSelection, PickedElement, SelectionMode};
    pub use crate::modeling::viewport::{CameraState, PointerSample, ProjectionKind};
    pub use crate::modeling::{
        DragMessage, HoverEdgeMessage, LoadPrimitive, LoopCutPreview, MeshModelState,
        MeshModelerPlugin, MeshReplaceReason, MeshReplaced, NudgeSelection, PickMessage,
        SelectionChanged, SelectionModeMessage, VertexPositionsChanged,
    };
    pub use crate::settings::ModelingSettings;
}
