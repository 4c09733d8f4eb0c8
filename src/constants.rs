//! Centralized constants for the modeling engine
//!
//! Default values shared by the settings resource, primitive factory and
//! picking code.

/// Defaults for mesh construction, picking and editing
pub mod modeling {
    /// Latitude bands of the default sphere
    pub const DEFAULT_SPHERE_RINGS: u32 = 8;
    /// Longitude segments of the default sphere
    pub const DEFAULT_SPHERE_SEGMENTS: u32 = 16;
    /// Radial segments of the default cylinder
    pub const DEFAULT_CYLINDER_SEGMENTS: u32 = 16;
    /// Subdivisions per side of the default plane
    pub const DEFAULT_PLANE_SUBDIVISIONS: u32 = 1;

    /// Picking radius around vertices, in local units
    pub const VERTEX_PICK_RADIUS: f32 = 0.08;
    /// Picking radius around edges, in local units
    pub const EDGE_PICK_RADIUS: f32 = 0.05;

    /// Loop-cut parameter used before the pointer moves along the edge
    pub const DEFAULT_LOOP_CUT_T: f32 = 0.5;
    /// Keyboard nudge distance in local units
    pub const NUDGE_STEP: f32 = 0.1;

    /// Maximum number of undo history entries
    pub const DEFAULT_UNDO_HISTORY: usize = 50;
}
