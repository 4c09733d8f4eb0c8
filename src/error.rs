//! Error types for mesh construction, topology queries and edit math.
//!
//! Construction and topology errors are unrecoverable for the mesh instance
//! they concern and always reach the caller. `DegenerateGeometry` is raised
//! by per-frame drag/cut math and is expected to be swallowed by the gesture
//! that produced it (the frame is skipped, the gesture continues).

use thiserror::Error;

use crate::modeling::half_edge::VertexId;

/// Errors produced by the modeling core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Invalid primitive parameters or malformed polygon input.
    #[error("construction failed: {0}")]
    Construction(String),

    /// A face cycle fails to close, or an id points at nothing.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// Zero-length edge, ray parallel to a plane, zero-area face.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// An undirected edge bordered by more than two faces.
    #[error("non-manifold edge ({a}, {b}) borders {faces} faces")]
    NonManifoldEdge {
        /// Lower vertex id of the edge.
        a: VertexId,
        /// Higher vertex id of the edge.
        b: VertexId,
        /// Number of faces found on the edge.
        faces: usize,
    },

    /// Settings text could not be parsed.
    #[error("settings error: {0}")]
    Settings(String),
}

impl MeshError {
    /// Whether the error only affects the current frame of a gesture.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MeshError::DegenerateGeometry(_))
    }
}

/// Result alias used throughout the crate.
pub type MeshResult<T> = Result<T, MeshError>;
