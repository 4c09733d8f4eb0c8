//! Half-edge mesh data structure for topology queries and editing.
//!
//! `HalfEdgeMesh` is the primary editing structure. Every cross-reference is a
//! `u32` handle into one of three dense arenas, so there are no ownership
//! cycles: a half-edge names its destination vertex, its owning face, its
//! neighbours in the face cycle and (unless it lies on the boundary) its pair.
//!
//! Invariants upheld by every constructor and checked by [`HalfEdgeMesh::validate`]:
//!
//! 1. `half_edges[he.next].prev == he` and `half_edges[he.prev].next == he`.
//! 2. `half_edges[he.pair].pair == he`, and the two span the same edge in
//!    opposite directions.
//! 3. Walking `next` from any half-edge of a face returns to it after exactly
//!    `degree(face)` steps.
//! 4. No undirected edge borders more than two faces.

use bevy::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::error::{MeshError, MeshResult};

/// Index into the half-edge arena.
pub type HalfEdgeId = u32;
/// Index into the vertex arena.
pub type VertexId = u32;
/// Index into the face arena.
pub type FaceId = u32;
/// Undirected edge identity: `(min(a, b), max(a, b))`.
pub type EdgeKey = (VertexId, VertexId);

/// Canonical key for the undirected edge between `a` and `b`.
pub fn edge_key(a: VertexId, b: VertexId) -> EdgeKey {
    if a <= b { (a, b) } else { (b, a) }
}

/// A single directed half-edge owned by exactly one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfEdge {
    /// Vertex this half-edge points to.
    pub dest: VertexId,
    /// Oppositely directed half-edge on the neighbouring face (`None` on the boundary).
    pub pair: Option<HalfEdgeId>,
    /// Face whose cycle this half-edge belongs to.
    pub face: FaceId,
    /// Next half-edge around the face (counter-clockwise).
    pub next: HalfEdgeId,
    /// Previous half-edge around the face.
    pub prev: HalfEdgeId,
}

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct HVertex {
    pub position: Vec3,
    /// Cached outgoing half-edge. Lookup aid only; may be stale after bulk
    /// mutation until [`HalfEdgeMesh::rebuild_vertex_cache`] runs.
    pub half_edge: Option<HalfEdgeId>,
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HFace {
    /// Arbitrary start of the face's CCW cycle.
    pub half_edge: HalfEdgeId,
    /// Number of sides, recorded when the face was built. Bounds cycle walks.
    pub degree: u32,
}

/// Half-edge mesh with index-based arena storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: Vec<HVertex>,
    pub(crate) half_edges: Vec<HalfEdge>,
    pub(crate) faces: Vec<HFace>,
}

impl HalfEdgeMesh {
    /// Build a mesh from positions and per-face vertex index lists.
    ///
    /// Faces must be listed counter-clockwise as seen from outside. Pairs are
    /// linked through an `edge_key` map as faces are walked; a third face on
    /// the same edge is rejected as non-manifold, and a second half-edge
    /// running the same direction as the first is rejected as inconsistent
    /// winding.
    pub fn from_polygons(positions: &[Vec3], polygons: &[Vec<VertexId>]) -> MeshResult<Self> {
        if let Some(i) = positions.iter().position(|p| !p.is_finite()) {
            return Err(MeshError::Construction(format!(
                "vertex {i} has a non-finite position"
            )));
        }

        let vertex_count = positions.len();
        let mut mesh = HalfEdgeMesh {
            vertices: positions
                .iter()
                .map(|&position| HVertex {
                    position,
                    half_edge: None,
                })
                .collect(),
            half_edges: Vec::with_capacity(polygons.iter().map(Vec::len).sum()),
            faces: Vec::with_capacity(polygons.len()),
        };

        // First half-edge seen per undirected edge, with its origin vertex
        let mut edge_map: HashMap<EdgeKey, (HalfEdgeId, VertexId)> = HashMap::new();

        for (fi, polygon) in polygons.iter().enumerate() {
            let n = polygon.len();
            if n < 3 {
                return Err(MeshError::Construction(format!(
                    "face {fi} has {n} vertices, need at least 3"
                )));
            }
            if let Some(&bad) = polygon.iter().find(|&&v| v as usize >= vertex_count) {
                return Err(MeshError::Construction(format!(
                    "face {fi} references missing vertex {bad}"
                )));
            }

            let mut seen = HashSet::with_capacity(n);
            if let Some(&twice) = polygon.iter().find(|&&v| !seen.insert(v)) {
                return Err(MeshError::Construction(format!(
                    "face {fi} visits vertex {twice} more than once"
                )));
            }

            let face_id = fi as FaceId;
            let base = mesh.half_edges.len() as HalfEdgeId;
            let n32 = n as u32;

            for i in 0..n32 {
                let from = polygon[i as usize];
                let to = polygon[((i + 1) % n32) as usize];

                let he_id = base + i;
                mesh.half_edges.push(HalfEdge {
                    dest: to,
                    pair: None,
                    face: face_id,
                    next: base + (i + 1) % n32,
                    prev: base + (i + n32 - 1) % n32,
                });

                let key = edge_key(from, to);
                match edge_map.entry(key) {
                    Entry::Vacant(slot) => {
                        slot.insert((he_id, from));
                    }
                    Entry::Occupied(slot) => {
                        let (first, first_from) = *slot.get();
                        if mesh.half_edges[first as usize].pair.is_some() {
                            return Err(MeshError::NonManifoldEdge {
                                a: key.0,
                                b: key.1,
                                faces: 3,
                            });
                        }
                        if first_from == from {
                            return Err(MeshError::InvalidTopology(format!(
                                "faces {} and {fi} both traverse edge {from}->{to}; winding is inconsistent",
                                mesh.half_edges[first as usize].face
                            )));
                        }
                        mesh.half_edges[first as usize].pair = Some(he_id);
                        mesh.half_edges[he_id as usize].pair = Some(first);
                    }
                }
            }

            mesh.faces.push(HFace {
                half_edge: base,
                degree: n32,
            });
        }

        mesh.rebuild_vertex_cache();
        Ok(mesh)
    }

    // -------------------------------------------------------------------
    // Arena access
    // -------------------------------------------------------------------

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn half_edge_count(&self) -> usize {
        self.half_edges.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of undirected edges (a paired edge counts once).
    pub fn edge_count(&self) -> usize {
        self.unique_edges().len()
    }

    pub fn vertex(&self, id: VertexId) -> MeshResult<&HVertex> {
        self.vertices
            .get(id as usize)
            .ok_or_else(|| MeshError::InvalidTopology(format!("missing vertex {id}")))
    }

    pub fn half_edge(&self, id: HalfEdgeId) -> MeshResult<&HalfEdge> {
        self.half_edges
            .get(id as usize)
            .ok_or_else(|| MeshError::InvalidTopology(format!("missing half-edge {id}")))
    }

    pub fn face(&self, id: FaceId) -> MeshResult<&HFace> {
        self.faces
            .get(id as usize)
            .ok_or_else(|| MeshError::InvalidTopology(format!("missing face {id}")))
    }

    pub fn vertex_position(&self, id: VertexId) -> MeshResult<Vec3> {
        self.vertex(id).map(|v| v.position)
    }

    /// Move a vertex. Topology is untouched, so no invariant can break.
    pub fn set_vertex_position(&mut self, id: VertexId, position: Vec3) -> MeshResult<()> {
        let vertex = self
            .vertices
            .get_mut(id as usize)
            .ok_or_else(|| MeshError::InvalidTopology(format!("missing vertex {id}")))?;
        vertex.position = position;
        Ok(())
    }

    /// All vertex positions in id order.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.iter().map(|v| v.position)
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        0..self.vertices.len() as VertexId
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        0..self.faces.len() as FaceId
    }

    pub fn half_edge_ids(&self) -> impl Iterator<Item = HalfEdgeId> {
        0..self.half_edges.len() as HalfEdgeId
    }

    // -------------------------------------------------------------------
    // Edge queries
    // -------------------------------------------------------------------

    /// Vertex a half-edge starts from (the destination of its `prev`).
    pub fn origin(&self, he: HalfEdgeId) -> MeshResult<VertexId> {
        let prev = self.half_edge(he)?.prev;
        Ok(self.half_edge(prev)?.dest)
    }

    /// `(origin, destination)` of a half-edge.
    pub fn edge_endpoints(&self, he: HalfEdgeId) -> MeshResult<(VertexId, VertexId)> {
        Ok((self.origin(he)?, self.half_edge(he)?.dest))
    }

    /// Faces bordering the edge of `he`: its own face, plus the pair's face.
    pub fn faces_of_edge(&self, he: HalfEdgeId) -> MeshResult<Vec<FaceId>> {
        let edge = self.half_edge(he)?;
        let mut faces = vec![edge.face];
        if let Some(pair) = edge.pair {
            faces.push(self.half_edge(pair)?.face);
        }
        Ok(faces)
    }

    /// Undirected key of the edge under `he`.
    pub fn edge_key_of(&self, he: HalfEdgeId) -> MeshResult<EdgeKey> {
        let (a, b) = self.edge_endpoints(he)?;
        Ok(edge_key(a, b))
    }

    /// Lower id of `he` and its pair; one stable id per undirected edge.
    pub fn canonical_edge(&self, he: HalfEdgeId) -> MeshResult<HalfEdgeId> {
        Ok(match self.half_edge(he)?.pair {
            Some(pair) if pair < he => pair,
            _ => he,
        })
    }

    /// Canonical half-edge of every undirected edge, in id order.
    pub fn unique_edges(&self) -> Vec<HalfEdgeId> {
        self.half_edges
            .iter()
            .enumerate()
            .filter(|(i, he)| he.pair.is_none_or(|pair| *i as u32 <= pair))
            .map(|(i, _)| i as HalfEdgeId)
            .collect()
    }

    pub fn is_boundary(&self, he: HalfEdgeId) -> MeshResult<bool> {
        Ok(self.half_edge(he)?.pair.is_none())
    }

    pub fn edge_midpoint(&self, he: HalfEdgeId) -> MeshResult<Vec3> {
        let (a, b) = self.edge_endpoints(he)?;
        Ok((self.vertex_position(a)? + self.vertex_position(b)?) * 0.5)
    }

    // -------------------------------------------------------------------
    // Face queries
    // -------------------------------------------------------------------

    /// Ordered `(origin vertex, half-edge)` pairs around a face.
    ///
    /// Fails with `InvalidTopology` if the cycle does not close within
    /// `degree + 1` steps, wanders into another face, or references a
    /// missing id. Corrupt data therefore can never cause an endless walk.
    pub fn face_loop(&self, face: FaceId) -> MeshResult<Vec<(VertexId, HalfEdgeId)>> {
        let HFace { half_edge: start, degree } = *self.face(face)?;
        let limit = degree as usize + 1;
        let mut result = Vec::with_capacity(degree as usize);
        let mut current = start;

        for _ in 0..limit {
            let he = self.half_edge(current)?;
            if he.face != face {
                return Err(MeshError::InvalidTopology(format!(
                    "half-edge {current} in the cycle of face {face} belongs to face {}",
                    he.face
                )));
            }
            result.push((self.origin(current)?, current));
            current = he.next;
            if current == start {
                if result.len() != degree as usize {
                    return Err(MeshError::InvalidTopology(format!(
                        "face {face} closed after {} steps, expected {degree}",
                        result.len()
                    )));
                }
                return Ok(result);
            }
        }

        Err(MeshError::InvalidTopology(format!(
            "face {face} cycle did not close within {limit} steps"
        )))
    }

    pub fn face_degree(&self, face: FaceId) -> MeshResult<usize> {
        Ok(self.face(face)?.degree as usize)
    }

    pub fn face_half_edges(&self, face: FaceId) -> MeshResult<Vec<HalfEdgeId>> {
        Ok(self.face_loop(face)?.into_iter().map(|(_, he)| he).collect())
    }

    pub fn face_vertices(&self, face: FaceId) -> MeshResult<Vec<VertexId>> {
        Ok(self.face_loop(face)?.into_iter().map(|(v, _)| v).collect())
    }

    /// Average of the face's corner positions.
    pub fn face_center(&self, face: FaceId) -> MeshResult<Vec3> {
        let verts = self.face_vertices(face)?;
        let mut sum = Vec3::ZERO;
        for &v in &verts {
            sum += self.vertex_position(v)?;
        }
        Ok(sum / verts.len() as f32)
    }

    /// Unit normal by Newell's method, so non-planar n-gons still get a
    /// sensible direction. Zero for degenerate faces.
    pub fn face_normal(&self, face: FaceId) -> MeshResult<Vec3> {
        let verts = self.face_vertices(face)?;
        let mut normal = Vec3::ZERO;
        for (i, &v) in verts.iter().enumerate() {
            let current = self.vertex_position(v)?;
            let next = self.vertex_position(verts[(i + 1) % verts.len()])?;
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
        }
        Ok(normal.normalize_or_zero())
    }

    // -------------------------------------------------------------------
    // Vertex cache
    // -------------------------------------------------------------------

    /// Reassign every vertex's cached outgoing half-edge from a full scan.
    ///
    /// Boundary half-edges win over interior ones so that a one-ring walk
    /// starting from the cache covers the whole fan on open meshes.
    pub fn rebuild_vertex_cache(&mut self) {
        for vertex in &mut self.vertices {
            vertex.half_edge = None;
        }
        for id in 0..self.half_edges.len() {
            let he = self.half_edges[id];
            let Some(origin) = self.half_edges.get(he.prev as usize).map(|p| p.dest) else {
                continue;
            };
            let Some(vertex) = self.vertices.get_mut(origin as usize) else {
                continue;
            };
            let replace = match vertex.half_edge {
                None => true,
                Some(_) => he.pair.is_none(),
            };
            if replace {
                vertex.half_edge = Some(id as HalfEdgeId);
            }
        }
    }

    /// An outgoing half-edge of `vertex`, trusting the cache only after
    /// checking it still starts at `vertex`. `None` for isolated vertices.
    pub fn vertex_outgoing(&self, vertex: VertexId) -> MeshResult<Option<HalfEdgeId>> {
        if let Some(cached) = self.vertex(vertex)?.half_edge {
            if self.half_edge(cached).is_ok() && self.origin(cached)? == vertex {
                return Ok(Some(cached));
            }
        }
        for id in self.half_edge_ids() {
            if self.origin(id)? == vertex {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    // -------------------------------------------------------------------
    // Validation & export
    // -------------------------------------------------------------------

    /// Check all structural invariants, reporting the first violation.
    pub fn validate(&self) -> MeshResult<()> {
        let mut owned_per_face = vec![0usize; self.faces.len()];
        let mut faces_per_edge: HashMap<EdgeKey, usize> = HashMap::new();

        for (i, he) in self.half_edges.iter().enumerate() {
            let id = i as HalfEdgeId;
            if he.dest as usize >= self.vertices.len() {
                return Err(MeshError::InvalidTopology(format!(
                    "half-edge {id} points at missing vertex {}",
                    he.dest
                )));
            }
            if self.half_edge(he.next)?.prev != id || self.half_edge(he.prev)?.next != id {
                return Err(MeshError::InvalidTopology(format!(
                    "half-edge {id} next/prev links are not mutual"
                )));
            }
            let Some(count) = owned_per_face.get_mut(he.face as usize) else {
                return Err(MeshError::InvalidTopology(format!(
                    "half-edge {id} belongs to missing face {}",
                    he.face
                )));
            };
            *count += 1;

            let (from, to) = self.edge_endpoints(id)?;
            if let Some(pair) = he.pair {
                let twin = self.half_edge(pair)?;
                if pair == id || twin.pair != Some(id) {
                    return Err(MeshError::InvalidTopology(format!(
                        "half-edge {id} pair {pair} does not point back"
                    )));
                }
                if self.edge_endpoints(pair)? != (to, from) {
                    return Err(MeshError::InvalidTopology(format!(
                        "half-edge {id} and its pair {pair} span different edges"
                    )));
                }
            }
            *faces_per_edge.entry(edge_key(from, to)).or_default() += 1;
        }

        for (&(a, b), &faces) in &faces_per_edge {
            if faces > 2 {
                return Err(MeshError::NonManifoldEdge { a, b, faces });
            }
        }

        for face in self.face_ids() {
            let cycle = self.face_loop(face)?;
            if owned_per_face[face as usize] != cycle.len() {
                return Err(MeshError::InvalidTopology(format!(
                    "face {face} owns {} half-edges but its cycle has {}",
                    owned_per_face[face as usize],
                    cycle.len()
                )));
            }
            let distinct: HashSet<VertexId> = cycle.iter().map(|&(v, _)| v).collect();
            if distinct.len() != cycle.len() {
                return Err(MeshError::InvalidTopology(format!(
                    "face {face} visits a vertex more than once"
                )));
            }
        }

        Ok(())
    }

    /// Fan-triangulate every face (quads become two triangles) for GPU upload.
    pub fn triangulate(&self) -> MeshResult<Vec<[VertexId; 3]>> {
        let mut triangles = Vec::with_capacity(self.half_edges.len());
        for face in self.face_ids() {
            let verts = self.face_vertices(face)?;
            for i in 1..verts.len() - 1 {
                triangles.push([verts[0], verts[i], verts[i + 1]]);
            }
        }
        Ok(triangles)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn unit_cube_positions() -> Vec<Vec3> {
        vec![
            Vec3::new(-0.5, -0.5, -0.5), // 0
            Vec3::new(0.5, -0.5, -0.5),  // 1
            Vec3::new(0.5, 0.5, -0.5),   // 2
            Vec3::new(-0.5, 0.5, -0.5),  // 3
            Vec3::new(-0.5, -0.5, 0.5),  // 4
            Vec3::new(0.5, -0.5, 0.5),   // 5
            Vec3::new(0.5, 0.5, 0.5),    // 6
            Vec3::new(-0.5, 0.5, 0.5),   // 7
        ]
    }

    /// Six CCW quads, viewed from outside.
    pub(crate) fn make_quad_cube() -> HalfEdgeMesh {
        let faces = vec![
            vec![4, 5, 6, 7], // front (z+)
            vec![1, 0, 3, 2], // back (z-)
            vec![5, 1, 2, 6], // right (x+)
            vec![0, 4, 7, 3], // left (x-)
            vec![7, 6, 2, 3], // top (y+)
            vec![0, 1, 5, 4], // bottom (y-)
        ];
        HalfEdgeMesh::from_polygons(&unit_cube_positions(), &faces).unwrap()
    }

    fn make_two_triangles() -> HalfEdgeMesh {
        //   0--1
        //   |/ |
        //   2--3
        let positions = vec![
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ];
        HalfEdgeMesh::from_polygons(&positions, &[vec![0, 2, 1], vec![1, 2, 3]]).unwrap()
    }

    #[test]
    fn pairing_is_symmetric() {
        let mesh = make_quad_cube();
        for (i, he) in mesh.half_edges.iter().enumerate() {
            let pair = he.pair.expect("closed cube has no boundary");
            assert_eq!(mesh.half_edges[pair as usize].pair, Some(i as u32));
            let (a, b) = mesh.edge_endpoints(i as u32).unwrap();
            assert_eq!(mesh.edge_endpoints(pair).unwrap(), (b, a));
        }
    }

    #[test]
    fn face_cycles_close_after_degree_steps() {
        let mesh = make_quad_cube();
        for face in mesh.face_ids() {
            let start = mesh.faces[face as usize].half_edge;
            let mut current = start;
            for _ in 0..mesh.face_degree(face).unwrap() {
                current = mesh.half_edges[current as usize].next;
            }
            assert_eq!(current, start, "face {face} did not close");
        }
    }

    #[test]
    fn cube_counts() {
        let mesh = make_quad_cube();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.half_edge_count(), 24);
        assert_eq!(mesh.edge_count(), 12);
        mesh.validate().unwrap();
    }

    #[test]
    fn face_loop_lists_origins_in_winding_order() {
        let mesh = make_quad_cube();
        assert_eq!(mesh.face_vertices(0).unwrap(), vec![4, 5, 6, 7]);
        let normal = mesh.face_normal(0).unwrap();
        assert!((normal - Vec3::Z).length() < 1e-6);
        assert!(mesh.face_center(4).unwrap().abs_diff_eq(Vec3::new(0.0, 0.5, 0.0), 1e-6));
    }

    #[test]
    fn boundary_edges_have_one_face() {
        let mesh = make_two_triangles();
        let mut shared = 0;
        for he in mesh.half_edge_ids() {
            let faces = mesh.faces_of_edge(he).unwrap();
            if mesh.is_boundary(he).unwrap() {
                assert_eq!(faces.len(), 1);
            } else {
                assert_eq!(faces.len(), 2);
                shared += 1;
            }
        }
        assert_eq!(shared, 2);
        assert_eq!(mesh.edge_count(), 5);
    }

    #[test]
    fn corrupt_cycle_is_reported_not_looped() {
        let mut mesh = make_quad_cube();
        // Short-circuit face 0 into a 2-cycle
        let start = mesh.faces[0].half_edge;
        let second = mesh.half_edges[start as usize].next;
        mesh.half_edges[second as usize].next = start;
        assert!(matches!(mesh.face_loop(0), Err(MeshError::InvalidTopology(_))));
        assert!(mesh.validate().is_err());

        let mut mesh = make_quad_cube();
        // Point face 1's cycle into face 0 so it never returns
        let start = mesh.faces[1].half_edge;
        mesh.half_edges[start as usize].next = mesh.faces[0].half_edge;
        assert!(matches!(mesh.face_loop(1), Err(MeshError::InvalidTopology(_))));
    }

    #[test]
    fn missing_ids_are_errors() {
        let mesh = make_two_triangles();
        assert!(mesh.face_loop(99).is_err());
        assert!(mesh.edge_endpoints(99).is_err());
        assert!(mesh.vertex_position(99).is_err());
    }

    #[test]
    fn third_face_on_an_edge_is_non_manifold() {
        let positions = vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::NEG_Y,
            Vec3::Z,
        ];
        let faces = vec![vec![0, 1, 2], vec![1, 0, 3], vec![0, 1, 4]];
        let err = HalfEdgeMesh::from_polygons(&positions, &faces).unwrap_err();
        assert!(matches!(err, MeshError::NonManifoldEdge { a: 0, b: 1, .. }));
    }

    #[test]
    fn inconsistent_winding_is_rejected() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::NEG_Y];
        let faces = vec![vec![0, 1, 2], vec![0, 1, 3]];
        assert!(matches!(
            HalfEdgeMesh::from_polygons(&positions, &faces),
            Err(MeshError::InvalidTopology(_))
        ));
    }

    #[test]
    fn malformed_polygons_are_construction_errors() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        for faces in [vec![vec![0, 1]], vec![vec![0, 1, 7]], vec![vec![0, 1, 1]]] {
            assert!(matches!(
                HalfEdgeMesh::from_polygons(&positions, &faces),
                Err(MeshError::Construction(_))
            ));
        }
        let bad = vec![Vec3::ZERO, Vec3::X, Vec3::new(f32::NAN, 0.0, 0.0)];
        assert!(HalfEdgeMesh::from_polygons(&bad, &[vec![0, 1, 2]]).is_err());
    }

    #[test]
    fn polygon_revisiting_a_vertex_is_rejected() {
        let positions = vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Y,
        ];
        // Vertex 1 appears twice but never on consecutive corners
        let err = HalfEdgeMesh::from_polygons(&positions, &[vec![0, 1, 2, 1, 3]]).unwrap_err();
        assert!(matches!(err, MeshError::Construction(_)));
    }

    #[test]
    fn validate_rejects_face_revisiting_a_vertex() {
        // Hand-linked single face 0-1-2-1-3: every link is mutual and no
        // edge has more than two uses, only the repeated vertex is wrong
        let polygon = [0u32, 1, 2, 1, 3];
        let n = polygon.len();
        let mesh = HalfEdgeMesh {
            vertices: [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y]
                .into_iter()
                .map(|position| HVertex {
                    position,
                    half_edge: None,
                })
                .collect(),
            half_edges: (0..n)
                .map(|i| HalfEdge {
                    dest: polygon[(i + 1) % n],
                    pair: None,
                    face: 0,
                    next: ((i + 1) % n) as HalfEdgeId,
                    prev: ((i + n - 1) % n) as HalfEdgeId,
                })
                .collect(),
            faces: vec![HFace {
                half_edge: 0,
                degree: n as u32,
            }],
        };
        assert!(matches!(mesh.validate(), Err(MeshError::InvalidTopology(_))));
    }

    #[test]
    fn vertex_cache_is_rebuilt_after_bulk_mutation() {
        let mut mesh = make_quad_cube();
        for v in &mut mesh.vertices {
            v.half_edge = Some(0);
        }
        // Stale cache is detected and bypassed
        let out = mesh.vertex_outgoing(6).unwrap().unwrap();
        assert_eq!(mesh.origin(out).unwrap(), 6);

        mesh.rebuild_vertex_cache();
        for v in mesh.vertex_ids() {
            let cached = mesh.vertices[v as usize].half_edge.unwrap();
            assert_eq!(mesh.origin(cached).unwrap(), v);
        }
    }

    #[test]
    fn boundary_half_edges_win_the_cache() {
        let mesh = make_two_triangles();
        for v in mesh.vertex_ids() {
            let cached = mesh.vertices[v as usize].half_edge.unwrap();
            assert!(mesh.is_boundary(cached).unwrap(), "vertex {v}");
        }
    }

    #[test]
    fn validate_catches_broken_pairs() {
        let mut mesh = make_quad_cube();
        mesh.half_edges[0].pair = Some(3);
        assert!(matches!(mesh.validate(), Err(MeshError::InvalidTopology(_))));
    }

    #[test]
    fn quads_triangulate_into_two_triangles() {
        let mesh = make_quad_cube();
        let tris = mesh.triangulate().unwrap();
        assert_eq!(tris.len(), 12);
        assert_eq!(tris[0], [4, 5, 6]);
        assert_eq!(tris[1], [4, 6, 7]);
    }
}
