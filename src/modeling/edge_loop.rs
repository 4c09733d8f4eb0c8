//! Edge loop detection for the mesh modeling tool.
//!
//! Edge loops are chains of edges that run straight through quads: enter a
//! quad on one edge, leave through the opposite edge, cross into the
//! neighbouring face and repeat. The walk is done over per-face loop records
//! linked radially across shared edges, so every step is O(1) and a full
//! scan of the mesh is O(E).

use std::collections::{HashMap, HashSet};

use super::half_edge::{EdgeKey, FaceId, HalfEdgeId, HalfEdgeMesh};
use crate::error::MeshResult;

/// A maximal chain of edges found by walking across faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLoop {
    /// Canonical half-edge of every edge, in walk order.
    pub edges: Vec<HalfEdgeId>,
    /// `faces[i]` is the face crossed between `edges[i]` and `edges[i + 1]`
    /// (wrapping to `edges[0]` for the last face of a closed loop).
    pub faces: Vec<FaceId>,
    /// The walk came back to its first edge.
    pub closed: bool,
}

impl EdgeLoop {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains_edge(&self, canonical: HalfEdgeId) -> bool {
        self.edges.contains(&canonical)
    }
}

/// One half-edge as seen from inside its face.
#[derive(Debug, Clone, Copy)]
struct LoopRecord {
    half_edge: HalfEdgeId,
    face: FaceId,
    degree: usize,
    next: usize,
    /// Record for the same edge on the neighbouring face.
    radial: Option<usize>,
}

/// Face records plus the radial links between them.
struct RadialIndex {
    records: Vec<LoopRecord>,
    by_half_edge: HashMap<HalfEdgeId, usize>,
    by_edge: HashMap<EdgeKey, Vec<usize>>,
    keys: Vec<EdgeKey>,
}

impl RadialIndex {
    fn build(mesh: &HalfEdgeMesh) -> MeshResult<Self> {
        let mut records = Vec::with_capacity(mesh.half_edge_count());
        let mut by_half_edge = HashMap::with_capacity(mesh.half_edge_count());
        let mut by_edge: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
        let mut keys = Vec::with_capacity(mesh.half_edge_count());

        for face in mesh.face_ids() {
            let cycle = mesh.face_half_edges(face)?;
            let base = records.len();
            let n = cycle.len();
            for (i, &he) in cycle.iter().enumerate() {
                let key = mesh.edge_key_of(he)?;
                let index = base + i;
                records.push(LoopRecord {
                    half_edge: he,
                    face,
                    degree: n,
                    next: base + (i + 1) % n,
                    radial: None,
                });
                by_half_edge.insert(he, index);
                by_edge.entry(key).or_default().push(index);
                keys.push(key);
            }
        }

        // Only manifold edges get radial links; anything with three or more
        // owners stays unlinked and never carries a walk.
        for group in by_edge.values() {
            if let [a, b] = group[..] {
                records[a].radial = Some(b);
                records[b].radial = Some(a);
            }
        }

        Ok(Self {
            records,
            by_half_edge,
            by_edge,
            keys,
        })
    }

    fn owners(&self, record: usize) -> usize {
        self.by_edge
            .get(&self.keys[record])
            .map_or(0, |group| group.len())
    }

    /// The record on the far side of the face: two steps in a quad, one
    /// step in any other polygon.
    fn across(&self, record: usize) -> usize {
        let r = &self.records[record];
        if r.degree == 4 {
            self.records[r.next].next
        } else {
            r.next
        }
    }
}

/// Result of walking in one direction from the start edge.
struct Walk {
    edges: Vec<EdgeKey>,
    faces: Vec<FaceId>,
    closed: bool,
}

fn walk(index: &RadialIndex, from: usize, start: EdgeKey, visited: &mut HashSet<EdgeKey>) -> Walk {
    let mut out = Walk {
        edges: Vec::new(),
        faces: Vec::new(),
        closed: false,
    };
    let mut current = from;

    loop {
        let face = index.records[current].face;
        let candidate = index.across(current);
        let key = index.keys[candidate];

        if key == start {
            out.faces.push(face);
            out.closed = true;
            return out;
        }
        // Boundary and non-manifold edges end the walk without joining it
        if visited.contains(&key) || index.owners(candidate) != 2 {
            return out;
        }
        let Some(other_side) = index.records[candidate].radial else {
            return out;
        };

        visited.insert(key);
        out.edges.push(key);
        out.faces.push(face);
        current = other_side;
    }
}

fn grow_loop(
    mesh: &HalfEdgeMesh,
    index: &RadialIndex,
    start_record: usize,
    visited: &mut HashSet<EdgeKey>,
) -> MeshResult<Option<EdgeLoop>> {
    let start = index.keys[start_record];
    visited.insert(start);

    let forward = walk(index, start_record, start, visited);
    let mut keys = Vec::new();
    let mut faces = Vec::new();

    if !forward.closed {
        if let Some(other_side) = index.records[start_record].radial {
            let mut backward = walk(index, other_side, start, visited);
            if backward.closed {
                // The last face would lead back to the start edge a second time
                backward.faces.pop();
            }
            keys.extend(backward.edges.into_iter().rev());
            faces.extend(backward.faces.into_iter().rev());
        }
    }
    keys.push(start);
    keys.extend(forward.edges);
    faces.extend(forward.faces);

    if keys.len() <= 1 {
        return Ok(None);
    }

    let mut edges = Vec::with_capacity(keys.len());
    for key in keys {
        let Some(&record) = index.by_edge.get(&key).and_then(|group| group.first()) else {
            continue;
        };
        edges.push(mesh.canonical_edge(index.records[record].half_edge)?);
    }

    Ok(Some(EdgeLoop {
        edges,
        faces,
        closed: forward.closed,
    }))
}

/// Find every maximal edge loop in the mesh.
///
/// Each manifold edge is walked at most once, so an edge shows up in at most
/// one loop. Loops of a single edge are dropped.
pub fn find_edge_loops(mesh: &HalfEdgeMesh) -> MeshResult<Vec<EdgeLoop>> {
    let index = RadialIndex::build(mesh)?;
    let mut visited: HashSet<EdgeKey> = HashSet::new();
    let mut loops = Vec::new();

    for he in mesh.unique_edges() {
        let Some(&record) = index.by_half_edge.get(&he) else {
            continue;
        };
        if index.owners(record) != 2 || visited.contains(&index.keys[record]) {
            continue;
        }
        if let Some(found) = grow_loop(mesh, &index, record, &mut visited)? {
            loops.push(found);
        }
    }

    Ok(loops)
}

/// Walk only the loop running through `he`.
///
/// Returns `None` when the loop would be a single edge or when `he` does
/// not border exactly two faces.
pub fn edge_loop_through(mesh: &HalfEdgeMesh, he: HalfEdgeId) -> MeshResult<Option<EdgeLoop>> {
    mesh.half_edge(he)?;
    let index = RadialIndex::build(mesh)?;
    let Some(&record) = index.by_half_edge.get(&he) else {
        return Ok(None);
    };
    if index.owners(record) != 2 {
        return Ok(None);
    }
    let mut visited = HashSet::new();
    grow_loop(mesh, &index, record, &mut visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modeling::half_edge::tests::make_quad_cube;
    use crate::modeling::primitives::{cylinder, plane, uv_sphere};
    use bevy::prelude::*;

    #[test]
    fn cube_has_three_closed_rings() {
        let mesh = make_quad_cube();
        let loops = find_edge_loops(&mesh).unwrap();
        assert_eq!(loops.len(), 3);
        for l in &loops {
            assert!(l.closed);
            assert_eq!(l.edges.len(), 4);
            assert_eq!(l.faces.len(), 4);
        }
    }

    #[test]
    fn every_edge_is_in_at_most_one_loop() {
        let mesh = uv_sphere(1.0, 6, 8).unwrap();
        let loops = find_edge_loops(&mesh).unwrap();
        let mut seen = HashSet::new();
        for l in &loops {
            for &e in &l.edges {
                assert!(seen.insert(e), "edge {e} appears twice");
            }
        }
    }

    #[test]
    fn loop_through_vertical_cube_edge() {
        let mesh = make_quad_cube();
        // Front face half-edge 1 runs 5 -> 6
        assert_eq!(mesh.edge_endpoints(1).unwrap(), (5, 6));
        let l = edge_loop_through(&mesh, 1).unwrap().unwrap();
        assert!(l.closed);
        assert_eq!(l.edges.len(), 4);
        assert_eq!(l.edges[0], mesh.canonical_edge(1).unwrap());
        for &e in &l.edges {
            let (a, b) = mesh.edge_endpoints(e).unwrap();
            let dir = mesh.vertex_position(b).unwrap() - mesh.vertex_position(a).unwrap();
            assert!(dir.x.abs() < 1e-6 && dir.z.abs() < 1e-6, "edge {e} is not vertical");
        }
        // Crossed faces are the four side faces, never top or bottom
        let mut faces = l.faces.clone();
        faces.sort_unstable();
        assert_eq!(faces, vec![0, 1, 2, 3]);
    }

    #[test]
    fn open_loop_on_plane_stops_before_border() {
        let mesh = plane(Vec2::splat(3.0), 3).unwrap();
        let interior = mesh
            .unique_edges()
            .into_iter()
            .find(|&he| {
                !mesh.is_boundary(he).unwrap() && {
                    let (a, b) = mesh.edge_endpoints(he).unwrap();
                    let pa = mesh.vertex_position(a).unwrap();
                    let pb = mesh.vertex_position(b).unwrap();
                    (pa.x - pb.x).abs() < 1e-6
                }
            })
            .unwrap();
        let l = edge_loop_through(&mesh, interior).unwrap().unwrap();
        assert!(!l.closed);
        assert_eq!(l.edges.len(), 2);
        assert_eq!(l.faces.len(), 1);
        for &e in &l.edges {
            assert!(!mesh.is_boundary(e).unwrap(), "border edge {e} joined the loop");
        }
        assert!(l.contains_edge(mesh.canonical_edge(interior).unwrap()));
    }

    #[test]
    fn plane_loops_hold_only_interior_edges() {
        let mesh = plane(Vec2::splat(3.0), 3).unwrap();
        let loops = find_edge_loops(&mesh).unwrap();
        // Three rows and three columns, each crossing the two interior lines
        assert_eq!(loops.len(), 6);
        for l in &loops {
            assert_eq!(l.edges.len(), 2);
            for &e in &l.edges {
                assert!(!mesh.is_boundary(e).unwrap());
            }
        }
    }

    #[test]
    fn boundary_edge_starts_no_loop() {
        let mesh = plane(Vec2::splat(3.0), 3).unwrap();
        let border = mesh
            .half_edge_ids()
            .find(|&he| mesh.is_boundary(he).unwrap())
            .unwrap();
        assert_eq!(edge_loop_through(&mesh, border).unwrap(), None);
    }

    #[test]
    fn lone_quad_has_no_loops() {
        let mesh = plane(Vec2::ONE, 1).unwrap();
        // No edge borders two faces, so nothing can root a loop
        assert!(find_edge_loops(&mesh).unwrap().is_empty());
    }

    #[test]
    fn cylinder_side_ring_is_closed() {
        let mesh = cylinder(1.0, 2.0, 6).unwrap();
        let side_edge = mesh
            .unique_edges()
            .into_iter()
            .find(|&he| {
                let (a, b) = mesh.edge_endpoints(he).unwrap();
                let pa = mesh.vertex_position(a).unwrap();
                let pb = mesh.vertex_position(b).unwrap();
                let (ra, rb) = (Vec2::new(pa.x, pa.z), Vec2::new(pb.x, pb.z));
                ra.distance(rb) < 1e-6 && ra.length() > 0.5
            })
            .unwrap();
        let l = edge_loop_through(&mesh, side_edge).unwrap().unwrap();
        assert!(l.closed);
        assert_eq!(l.edges.len(), 6);
    }

    #[test]
    fn missing_edge_is_an_error() {
        let mesh = make_quad_cube();
        assert!(edge_loop_through(&mesh, 999).is_err());
    }
}
