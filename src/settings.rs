use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::modeling::*;
use crate::error::{MeshError, MeshResult};
use crate::modeling::primitives::PrimitiveShape;

/// Default segment counts for new primitives
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PrimitiveDefaults {
    pub sphere_rings: u32,
    pub sphere_segments: u32,
    pub cylinder_segments: u32,
    pub plane_subdivisions: u32,
}

impl Default for PrimitiveDefaults {
    fn default() -> Self {
        Self {
            sphere_rings: DEFAULT_SPHERE_RINGS,
            sphere_segments: DEFAULT_SPHERE_SEGMENTS,
            cylinder_segments: DEFAULT_CYLINDER_SEGMENTS,
            plane_subdivisions: DEFAULT_PLANE_SUBDIVISIONS,
        }
    }
}

impl PrimitiveDefaults {
    /// `shape` with its segment counts replaced by these. Sizes are kept.
    /// Cubes have no segments and come back unchanged.
    pub fn apply(&self, shape: PrimitiveShape) -> PrimitiveShape {
        match shape {
            PrimitiveShape::Cube { .. } => shape,
            PrimitiveShape::Plane { size, .. } => PrimitiveShape::Plane {
                size,
                subdivisions: self.plane_subdivisions,
            },
            PrimitiveShape::Sphere { radius, .. } => PrimitiveShape::Sphere {
                radius,
                rings: self.sphere_rings,
                segments: self.sphere_segments,
            },
            PrimitiveShape::Cylinder { radius, height, .. } => PrimitiveShape::Cylinder {
                radius,
                height,
                radial_segments: self.cylinder_segments,
            },
        }
    }
}

/// Modeling settings that persist to disk
#[derive(Resource, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelingSettings {
    /// Vertex picking radius in local units
    #[serde(default = "default_vertex_pick_radius")]
    pub vertex_pick_radius: f32,
    /// Edge picking radius in local units
    #[serde(default = "default_edge_pick_radius")]
    pub edge_pick_radius: f32,
    /// When true, face picking also hits faces turned away from the camera
    #[serde(default)]
    pub xray_selection: bool,
    /// Loop-cut parameter before the pointer moves along the edge
    #[serde(default = "default_loop_cut_t")]
    pub default_loop_cut_t: f32,
    /// Distance moved by one keyboard nudge
    #[serde(default = "default_nudge_step")]
    pub nudge_step: f32,
    /// Maximum number of undo history entries
    #[serde(default = "default_undo_history_size")]
    pub undo_history_size: usize,
    #[serde(default)]
    pub primitives: PrimitiveDefaults,
}

fn default_vertex_pick_radius() -> f32 {
    VERTEX_PICK_RADIUS
}

fn default_edge_pick_radius() -> f32 {
    EDGE_PICK_RADIUS
}

fn default_loop_cut_t() -> f32 {
    DEFAULT_LOOP_CUT_T
}

fn default_nudge_step() -> f32 {
    NUDGE_STEP
}

fn default_undo_history_size() -> usize {
    DEFAULT_UNDO_HISTORY
}

impl Default for ModelingSettings {
    fn default() -> Self {
        Self {
            vertex_pick_radius: VERTEX_PICK_RADIUS,
            edge_pick_radius: EDGE_PICK_RADIUS,
            xray_selection: false,
            default_loop_cut_t: DEFAULT_LOOP_CUT_T,
            nudge_step: NUDGE_STEP,
            undo_history_size: DEFAULT_UNDO_HISTORY,
            primitives: PrimitiveDefaults::default(),
        }
    }
}

impl ModelingSettings {
    /// Parse settings text. Missing fields take their defaults.
    pub fn from_ron_str(content: &str) -> MeshResult<Self> {
        ron::from_str(content).map_err(|e| MeshError::Settings(e.to_string()))
    }

    pub fn to_ron_string(&self) -> MeshResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| MeshError::Settings(e.to_string()))
    }

    /// Load settings from disk, or return defaults if missing or unreadable
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_ron_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring settings at {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to disk
    pub fn save(&self, path: &Path) -> MeshResult<()> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                MeshError::Settings(format!("failed to create {parent:?}: {e}"))
            })?;
        }

        let content = self.to_ron_string()?;
        fs::write(path, content)
            .map_err(|e| MeshError::Settings(format!("failed to write {path:?}: {e}")))?;
        info!("Settings saved to: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = ModelingSettings::from_ron_str("(xray_selection: true, primitives: (sphere_rings: 4))").unwrap();
        assert!(settings.xray_selection);
        assert_eq!(settings.primitives.sphere_rings, 4);
        assert_eq!(settings.primitives.sphere_segments, DEFAULT_SPHERE_SEGMENTS);
        assert_eq!(settings.undo_history_size, DEFAULT_UNDO_HISTORY);
        assert_eq!(settings.vertex_pick_radius, VERTEX_PICK_RADIUS);
    }

    #[test]
    fn primitive_defaults_replace_segment_counts() {
        let defaults = PrimitiveDefaults {
            sphere_rings: 3,
            sphere_segments: 5,
            ..default()
        };
        assert_eq!(
            defaults.apply(PrimitiveShape::unit_sphere()),
            PrimitiveShape::Sphere {
                radius: 0.5,
                rings: 3,
                segments: 5,
            }
        );
        let cube = PrimitiveShape::default();
        assert_eq!(defaults.apply(cube), cube);
    }

    #[test]
    fn text_round_trip() {
        let settings = ModelingSettings {
            nudge_step: 0.25,
            undo_history_size: 7,
            ..default()
        };
        let text = settings.to_ron_string().unwrap();
        assert_eq!(ModelingSettings::from_ron_str(&text).unwrap(), settings);
    }

    #[test]
    fn malformed_text_is_a_settings_error() {
        assert!(matches!(
            ModelingSettings::from_ron_str("(undo_history_size: \"lots\")"),
            Err(MeshError::Settings(_))
        ));
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("mesh_modeler_settings_{}", std::process::id()));
        let path = dir.join("modeling.ron");
        assert_eq!(ModelingSettings::load(&path), ModelingSettings::default());

        let custom = ModelingSettings {
            xray_selection: true,
            ..default()
        };
        custom.save(&path).unwrap();
        assert_eq!(ModelingSettings::load(&path), custom);

        fs::write(&path, "garbage").unwrap();
        assert_eq!(ModelingSettings::load(&path), ModelingSettings::default());
        let _ = fs::remove_dir_all(&dir);
    }
}
