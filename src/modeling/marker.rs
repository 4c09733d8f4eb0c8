//! Serializable polygon data for edited meshes.
//!
//! `MeshData` is the persisted form of a [`HalfEdgeMesh`]: plain positions
//! plus per-face index lists, nothing derived. Pairing, face cycles and the
//! vertex cache are rebuilt on load through [`HalfEdgeMesh::from_polygons`],
//! so a stored mesh is re-validated every time it comes back.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::half_edge::{HalfEdgeMesh, VertexId};
use crate::error::{MeshError, MeshResult};

/// Serializable component storing the polygons of an edited mesh.
#[derive(Component, Serialize, Deserialize, Clone, Debug, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    /// Vertex indices per face, counter-clockwise from outside.
    pub faces: Vec<Vec<u32>>,
}

impl MeshData {
    /// Capture the polygons of a mesh.
    pub fn from_mesh(mesh: &HalfEdgeMesh) -> MeshResult<Self> {
        let faces = mesh
            .face_ids()
            .map(|face| mesh.face_vertices(face))
            .collect::<MeshResult<Vec<_>>>()?;
        Ok(Self {
            positions: mesh.positions().map(|p| p.to_array()).collect(),
            faces,
        })
    }

    /// Rebuild the half-edge mesh.
    pub fn to_mesh(&self) -> MeshResult<HalfEdgeMesh> {
        let positions: Vec<Vec3> = self.positions.iter().map(|p| Vec3::from(*p)).collect();
        HalfEdgeMesh::from_polygons(&positions, &self.faces)
    }

    pub fn to_ron(&self) -> MeshResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| MeshError::Construction(format!("failed to serialize mesh data: {e}")))
    }

    pub fn from_ron(text: &str) -> MeshResult<Self> {
        ron::from_str(text)
            .map_err(|e| MeshError::Construction(format!("failed to parse mesh data: {e}")))
    }
}

/// GPU-ready triangle lists for the rendering layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleBuffers {
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex normals: area-weighted average of the adjacent faces.
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl TriangleBuffers {
    /// Fan-triangulate every face and compute smooth vertex normals.
    pub fn from_mesh(mesh: &HalfEdgeMesh) -> MeshResult<Self> {
        let triangles = mesh.triangulate()?;
        let positions: Vec<Vec3> = mesh.positions().collect();
        let mut normals = vec![Vec3::ZERO; positions.len()];

        for tri in &triangles {
            let [a, b, c] = tri.map(|v: VertexId| positions[v as usize]);
            // Unnormalized cross product weights by triangle area
            let n = (b - a).cross(c - a);
            for &v in tri {
                normals[v as usize] += n;
            }
        }

        Ok(Self {
            positions: positions.iter().map(|p| p.to_array()).collect(),
            normals: normals
                .into_iter()
                .map(|n| n.normalize_or_zero().to_array())
                .collect(),
            indices: triangles.into_iter().flatten().collect(),
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modeling::half_edge::tests::make_quad_cube;
    use crate::modeling::primitives::cylinder;

    #[test]
    fn mesh_data_rebuilds_identical_topology() {
        let mesh = cylinder(1.0, 2.0, 5).unwrap();
        let data = MeshData::from_mesh(&mesh).unwrap();
        assert_eq!(data.faces.len(), 15);
        let restored = data.to_mesh().unwrap();
        assert_eq!(restored, mesh);
    }

    #[test]
    fn ron_text_survives_a_trip() {
        let data = MeshData::from_mesh(&make_quad_cube()).unwrap();
        let text = data.to_ron().unwrap();
        assert!(text.contains("faces"));
        assert_eq!(MeshData::from_ron(&text).unwrap(), data);
    }

    #[test]
    fn broken_data_is_rejected_on_load() {
        let data = MeshData {
            positions: vec![[0.0; 3], [1.0, 0.0, 0.0]],
            faces: vec![vec![0, 1, 2]],
        };
        assert!(matches!(data.to_mesh(), Err(MeshError::Construction(_))));
        assert!(MeshData::from_ron("not ron at all (").is_err());
    }

    #[test]
    fn cube_buffers_have_outward_normals() {
        let mesh = make_quad_cube();
        let buffers = TriangleBuffers::from_mesh(&mesh).unwrap();
        assert_eq!(buffers.triangle_count(), 12);
        assert_eq!(buffers.positions.len(), 8);
        for (p, n) in buffers.positions.iter().zip(&buffers.normals) {
            let p = Vec3::from(*p);
            let n = Vec3::from(*n);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.dot(p) > 0.0);
        }
    }
}
