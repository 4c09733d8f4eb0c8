//! Element selection and ray picking for the mesh modeling tool.
//!
//! The selection is a short-lived value next to the mesh: one active element
//! type and an ordered set of ids. The mesh never knows about it. Picking
//! works on local-space rays (see [`super::viewport::world_to_local_ray`]).

use bevy::prelude::*;
use std::collections::BTreeSet;

use super::edge_loop::EdgeLoop;
use super::half_edge::{FaceId, HalfEdgeId, HalfEdgeMesh, VertexId};
use crate::error::MeshResult;

/// Which kind of mesh element clicks and drags act on.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum SelectionMode {
    #[default]
    Vertex,
    Edge,
    Face,
}

impl SelectionMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            SelectionMode::Vertex => "Vertex",
            SelectionMode::Edge => "Edge",
            SelectionMode::Face => "Face",
        }
    }
}

/// Selected element ids for the active mode.
///
/// Edge ids are stored as canonical half-edges (see
/// [`HalfEdgeMesh::canonical_edge`]), so either half of an edge selects it.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct ElementSelection {
    mode: SelectionMode,
    ids: BTreeSet<u32>,
}

impl ElementSelection {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            ids: BTreeSet::new(),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Switch element type. Ids of the old type are meaningless under the new
    /// one, so a real change clears the set.
    pub fn set_mode(&mut self, mode: SelectionMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.ids.clear();
        true
    }

    /// Plain click replaces the selection; shift-click toggles `id`.
    pub fn click(&mut self, mesh: &HalfEdgeMesh, id: u32, shift: bool) -> MeshResult<bool> {
        let id = canonical_id(mesh, self.mode, id)?;
        if shift {
            if !self.ids.remove(&id) {
                self.ids.insert(id);
            }
            return Ok(true);
        }
        if self.ids.len() == 1 && self.ids.contains(&id) {
            return Ok(false);
        }
        self.ids.clear();
        self.ids.insert(id);
        Ok(true)
    }

    /// Add `ids`. Nothing is added if any of them is missing from `mesh`.
    pub fn extend(
        &mut self,
        mesh: &HalfEdgeMesh,
        ids: impl IntoIterator<Item = u32>,
    ) -> MeshResult<bool> {
        let ids = ids
            .into_iter()
            .map(|id| canonical_id(mesh, self.mode, id))
            .collect::<MeshResult<Vec<_>>>()?;
        let before = self.ids.len();
        self.ids.extend(ids);
        Ok(self.ids.len() != before)
    }

    /// Select every edge of `edge_loop`, switching to edge mode if needed.
    pub fn select_loop(&mut self, edge_loop: &EdgeLoop, additive: bool) -> bool {
        let mut changed = self.set_mode(SelectionMode::Edge);
        if !additive {
            let wanted: BTreeSet<u32> = edge_loop.edges.iter().copied().collect();
            if wanted != self.ids {
                self.ids = wanted;
                changed = true;
            }
            return changed;
        }
        let before = self.ids.len();
        self.ids.extend(edge_loop.edges.iter().copied());
        self.ids.len() != before || changed
    }

    pub fn clear(&mut self) -> bool {
        let changed = !self.ids.is_empty();
        self.ids.clear();
        changed
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop ids that no longer exist in `mesh` (after undo or a mesh swap).
    /// Surviving edge ids are re-canonicalized against the new pairs.
    pub fn retain_valid(&mut self, mesh: &HalfEdgeMesh) -> bool {
        let kept: BTreeSet<u32> = self
            .ids
            .iter()
            .filter_map(|&id| canonical_id(mesh, self.mode, id).ok())
            .collect();
        let changed = kept != self.ids;
        self.ids = kept;
        changed
    }
}

/// Normalize an element id for storage in a selection of `mode`.
pub fn canonical_id(mesh: &HalfEdgeMesh, mode: SelectionMode, id: u32) -> MeshResult<u32> {
    match mode {
        SelectionMode::Vertex => mesh.vertex(id).map(|_| id),
        SelectionMode::Edge => mesh.canonical_edge(id),
        SelectionMode::Face => mesh.face(id).map(|_| id),
    }
}

// ---------------------------------------------------------------------------
// Picking
// ---------------------------------------------------------------------------

/// The element under the pointer, in whichever mode was active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickedElement {
    Vertex(VertexId),
    /// Canonical half-edge.
    Edge(HalfEdgeId),
    Face(FaceId),
}

impl PickedElement {
    /// Element handle for an id stored in a selection of `mode`.
    pub fn from_mode(mode: SelectionMode, id: u32) -> Self {
        match mode {
            SelectionMode::Vertex => PickedElement::Vertex(id),
            SelectionMode::Edge => PickedElement::Edge(id),
            SelectionMode::Face => PickedElement::Face(id),
        }
    }

    pub fn id(&self) -> u32 {
        match *self {
            PickedElement::Vertex(id) | PickedElement::Edge(id) | PickedElement::Face(id) => id,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        match self {
            PickedElement::Vertex(_) => SelectionMode::Vertex,
            PickedElement::Edge(_) => SelectionMode::Edge,
            PickedElement::Face(_) => SelectionMode::Face,
        }
    }

    /// Local-space anchor for the element: the vertex itself, the edge
    /// midpoint, or the face centroid.
    pub fn local_position(&self, mesh: &HalfEdgeMesh) -> MeshResult<Vec3> {
        match *self {
            PickedElement::Vertex(v) => mesh.vertex_position(v),
            PickedElement::Edge(he) => mesh.edge_midpoint(he),
            PickedElement::Face(f) => mesh.face_center(f),
        }
    }
}

/// Result of a face pick operation.
#[derive(Debug, Clone, Copy)]
pub struct FaceHit {
    pub face: FaceId,
    pub point: Vec3,
    pub distance: f32,
}

/// Result of a vertex pick operation.
#[derive(Debug, Clone, Copy)]
pub struct VertexHit {
    pub vertex: VertexId,
    /// Perpendicular distance from the ray.
    pub offset: f32,
}

/// Result of an edge pick operation.
#[derive(Debug, Clone, Copy)]
pub struct EdgeHit {
    /// Canonical half-edge.
    pub half_edge: HalfEdgeId,
    pub offset: f32,
}

/// Moller-Trumbore ray-triangle intersection.
///
/// Returns the distance along the ray if the ray hits the triangle.
fn ray_triangle_intersection(ray_origin: Vec3, ray_dir: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray_dir.cross(edge2);
    let a = edge1.dot(h);

    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray_origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray_dir.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    (t > EPSILON).then_some(t)
}

/// Pick the closest face hit by a local-space ray.
///
/// Faces are tested through their fan triangulation. When `xray` is false,
/// only faces turned toward the ray are picked.
pub fn pick_face(mesh: &HalfEdgeMesh, ray: Ray3d, xray: bool) -> MeshResult<Option<FaceHit>> {
    let dir = *ray.direction;
    let mut closest: Option<FaceHit> = None;

    for face in mesh.face_ids() {
        if !xray && mesh.face_normal(face)?.dot(dir) >= 0.0 {
            continue;
        }
        let verts = mesh.face_vertices(face)?;
        let v0 = mesh.vertex_position(verts[0])?;
        for pair in verts[1..].windows(2) {
            let v1 = mesh.vertex_position(pair[0])?;
            let v2 = mesh.vertex_position(pair[1])?;
            let Some(t) = ray_triangle_intersection(ray.origin, dir, v0, v1, v2) else {
                continue;
            };
            if closest.is_none_or(|hit| t < hit.distance) {
                closest = Some(FaceHit {
                    face,
                    point: ray.get_point(t),
                    distance: t,
                });
            }
        }
    }

    Ok(closest)
}

/// Distance along the ray of the point nearest `p`, and the gap between them.
fn ray_point_offset(ray: Ray3d, p: Vec3) -> (f32, f32) {
    let along = (p - ray.origin).dot(*ray.direction);
    (along, p.distance(ray.get_point(along)))
}

/// Pick the vertex nearest the ray within `radius` (local units).
///
/// Vertices behind the ray origin are ignored.
pub fn pick_vertex(mesh: &HalfEdgeMesh, ray: Ray3d, radius: f32) -> Option<VertexHit> {
    let mut closest: Option<(VertexHit, f32)> = None;

    for (vi, pos) in mesh.positions().enumerate() {
        let (along, offset) = ray_point_offset(ray, pos);
        if along < 0.0 || offset > radius {
            continue;
        }
        let better = closest.is_none_or(|(hit, depth)| {
            offset < hit.offset - f32::EPSILON || (offset <= hit.offset + f32::EPSILON && along < depth)
        });
        if better {
            closest = Some((
                VertexHit {
                    vertex: vi as VertexId,
                    offset,
                },
                along,
            ));
        }
    }

    closest.map(|(hit, _)| hit)
}

/// Closest approach between a ray and the segment `a..b`.
///
/// Returns `(distance along the ray, gap)`.
fn ray_segment_offset(ray: Ray3d, a: Vec3, b: Vec3) -> (f32, f32) {
    let d1 = b - a;
    let d2 = *ray.direction;
    let r = a - ray.origin;
    let len_sq = d1.length_squared();
    if len_sq < 1e-10 {
        return ray_point_offset(ray, a);
    }

    let along_edge = d1.dot(d2);
    let denom = len_sq - along_edge * along_edge;
    let s = if denom.abs() < 1e-10 {
        0.0
    } else {
        ((along_edge * d2.dot(r) - d1.dot(r)) / denom).clamp(0.0, 1.0)
    };
    ray_point_offset(ray, a + d1 * s)
}

/// Pick the edge whose segment passes nearest the ray within `radius`.
/// Returns the canonical half-edge index.
pub fn pick_edge(mesh: &HalfEdgeMesh, ray: Ray3d, radius: f32) -> MeshResult<Option<EdgeHit>> {
    let mut closest: Option<(EdgeHit, f32)> = None;

    for he in mesh.unique_edges() {
        let (from, to) = mesh.edge_endpoints(he)?;
        let a = mesh.vertex_position(from)?;
        let b = mesh.vertex_position(to)?;
        let (along, offset) = ray_segment_offset(ray, a, b);
        if along < 0.0 || offset > radius {
            continue;
        }
        let better = closest.is_none_or(|(hit, depth)| {
            offset < hit.offset - f32::EPSILON || (offset <= hit.offset + f32::EPSILON && along < depth)
        });
        if better {
            closest = Some((
                EdgeHit {
                    half_edge: he,
                    offset,
                },
                along,
            ));
        }
    }

    Ok(closest.map(|(hit, _)| hit))
}

/// Pick the element of the given mode under a local-space ray.
pub fn pick_element(
    mesh: &HalfEdgeMesh,
    ray: Ray3d,
    mode: SelectionMode,
    radius: f32,
    xray: bool,
) -> MeshResult<Option<PickedElement>> {
    Ok(match mode {
        SelectionMode::Vertex => pick_vertex(mesh, ray, radius).map(|hit| PickedElement::Vertex(hit.vertex)),
        SelectionMode::Edge => pick_edge(mesh, ray, radius)?.map(|hit| PickedElement::Edge(hit.half_edge)),
        SelectionMode::Face => pick_face(mesh, ray, xray)?.map(|hit| PickedElement::Face(hit.face)),
    })
}
