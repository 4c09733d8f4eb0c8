//! Loop-cut planning: where a cut through a hovered edge loop would land.
//!
//! Nothing here mutates the mesh. The planner walks the loop through the
//! hovered edge and, for every quad it crosses, interpolates one point on
//! each of the two loop edges of that quad at the same parameter `t`. The
//! "origin side" of each edge is carried around the loop from the hovered
//! edge's origin vertex, so `t = 0.25` stays a quarter of the way from the
//! same side everywhere instead of flipping with each edge's direction.

use bevy::prelude::*;

use super::edge_loop::{EdgeLoop, edge_loop_through};
use super::half_edge::{FaceId, HalfEdgeId, HalfEdgeMesh, VertexId};
use crate::error::{MeshError, MeshResult};

/// Cut geometry for one quad crossed by the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCut {
    pub face: FaceId,
    /// Point on the edge nearer the hovered edge.
    pub cut_a: Vec3,
    /// Point on the opposite edge.
    pub cut_b: Vec3,
    /// Canonical id of the edge carrying `cut_a`.
    pub edge_a: HalfEdgeId,
    /// Canonical id of the edge carrying `cut_b`.
    pub edge_b: HalfEdgeId,
}

/// Everything a renderer needs to preview a loop cut.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopCutPlan {
    pub edge_loop: EdgeLoop,
    pub t: f32,
    /// One entry per quad crossed, in loop order.
    pub cuts: Vec<FaceCut>,
    /// Cut points in loop order, one per edge touching a cut quad.
    pub preview: Vec<Vec3>,
    /// The preview polyline closes on itself.
    pub closed: bool,
}

/// An edge of the loop with its endpoints ordered from the carried origin side.
#[derive(Debug, Clone, Copy)]
struct Oriented {
    from: VertexId,
    to: VertexId,
}

/// Half-edge of `face` lying on the same undirected edge as `canonical`.
fn half_edge_in_face(
    mesh: &HalfEdgeMesh,
    face: FaceId,
    canonical: HalfEdgeId,
) -> MeshResult<HalfEdgeId> {
    let key = mesh.edge_key_of(canonical)?;
    for he in mesh.face_half_edges(face)? {
        if mesh.edge_key_of(he)? == key {
            return Ok(he);
        }
    }
    Err(MeshError::InvalidTopology(format!(
        "face {face} does not contain edge {canonical}"
    )))
}

/// Carry the origin side from `known` across `face` onto `other`.
///
/// If the carried side of `known` is its origin inside this face, the
/// matching side of `other` is its destination, and the other way round.
/// In a quad that pairs up the two ends joined by the side edges.
fn carry_across(
    mesh: &HalfEdgeMesh,
    face: FaceId,
    known: HalfEdgeId,
    side: Oriented,
    other: HalfEdgeId,
) -> MeshResult<Oriented> {
    let h = half_edge_in_face(mesh, face, known)?;
    let o = half_edge_in_face(mesh, face, other)?;
    let (o_origin, o_dest) = mesh.edge_endpoints(o)?;
    if mesh.origin(h)? == side.from {
        Ok(Oriented {
            from: o_dest,
            to: o_origin,
        })
    } else {
        Ok(Oriented {
            from: o_origin,
            to: o_dest,
        })
    }
}

fn point_at(mesh: &HalfEdgeMesh, side: Oriented, t: f32) -> MeshResult<Vec3> {
    let a = mesh.vertex_position(side.from)?;
    let b = mesh.vertex_position(side.to)?;
    Ok(a.lerp(b, t))
}

/// Plan a loop cut through `hovered` at parameter `t`.
///
/// `t` is clamped to `[0, 1]` and measured from the hovered edge's origin.
/// Returns `Ok(None)` when no loop runs through the edge.
pub fn plan_loop_cut(
    mesh: &HalfEdgeMesh,
    hovered: HalfEdgeId,
    t: f32,
) -> MeshResult<Option<LoopCutPlan>> {
    if !t.is_finite() {
        return Err(MeshError::DegenerateGeometry(format!(
            "loop cut parameter {t} is not finite"
        )));
    }
    let t = t.clamp(0.0, 1.0);

    let Some(edge_loop) = edge_loop_through(mesh, hovered)? else {
        return Ok(None);
    };
    let n = edge_loop.edges.len();
    let canonical = mesh.canonical_edge(hovered)?;
    let Some(start) = edge_loop.edges.iter().position(|&e| e == canonical) else {
        return Ok(None);
    };

    let (from, to) = mesh.edge_endpoints(hovered)?;
    let mut sides: Vec<Option<Oriented>> = vec![None; n];
    sides[start] = Some(Oriented { from, to });

    // Faces in the order they are visited, each with its (known, other) edge
    // indices. A closed loop is covered entirely by walking forward.
    let mut visits: Vec<(usize, usize, usize)> = Vec::with_capacity(edge_loop.faces.len());
    if edge_loop.closed {
        for step in 0..n {
            let i = (start + step) % n;
            visits.push((i, i, (i + 1) % n));
        }
    } else {
        for i in start..edge_loop.faces.len() {
            visits.push((i, i, i + 1));
        }
        for i in (0..start).rev() {
            visits.push((i, i + 1, i));
        }
    }

    let mut cuts: Vec<(usize, FaceCut)> = Vec::new();
    let mut cut_edge = vec![false; n];
    for (face_index, known, other) in visits {
        let Some(side) = sides[known] else {
            continue;
        };
        let face = edge_loop.faces[face_index];
        let next_side = carry_across(
            mesh,
            face,
            edge_loop.edges[known],
            side,
            edge_loop.edges[other],
        )?;
        if sides[other].is_none() {
            sides[other] = Some(next_side);
        }

        if mesh.face_degree(face)? != 4 {
            continue;
        }
        cut_edge[known] = true;
        cut_edge[other] = true;
        cuts.push((
            face_index,
            FaceCut {
                face,
                cut_a: point_at(mesh, side, t)?,
                cut_b: point_at(mesh, next_side, t)?,
                edge_a: edge_loop.edges[known],
                edge_b: edge_loop.edges[other],
            },
        ));
    }
    cuts.sort_by_key(|(face_index, _)| *face_index);
    let closed = edge_loop.closed && cuts.len() == edge_loop.faces.len();
    let mut cuts: Vec<FaceCut> = cuts.into_iter().map(|(_, cut)| cut).collect();

    let mut preview = Vec::with_capacity(n + 2);
    for (i, side) in sides.iter().enumerate() {
        if let (true, Some(side)) = (cut_edge[i], side) {
            preview.push(point_at(mesh, *side, t)?);
        }
    }

    // An open loop stops before the border; the quads beyond its two end
    // edges are cut as well.
    if !edge_loop.closed {
        let head = end_cut(mesh, &edge_loop, 0, sides[0], t)?;
        let tail = end_cut(mesh, &edge_loop, n - 1, sides[n - 1], t)?
            .filter(|tail| head.is_none_or(|head| head.face != tail.face));
        if let Some(head) = head {
            if !cut_edge[0] {
                preview.insert(0, head.cut_a);
            }
            preview.insert(0, head.cut_b);
            cuts.insert(0, head);
        }
        if let Some(tail) = tail {
            if !cut_edge[n - 1] {
                preview.push(tail.cut_a);
            }
            preview.push(tail.cut_b);
            cuts.push(tail);
        }
    }

    Ok(Some(LoopCutPlan {
        edge_loop,
        t,
        cuts,
        preview,
        closed,
    }))
}

/// Cut through the quad on the far side of loop edge `index`, the one the
/// loop itself does not cross.
fn end_cut(
    mesh: &HalfEdgeMesh,
    edge_loop: &EdgeLoop,
    index: usize,
    side: Option<Oriented>,
    t: f32,
) -> MeshResult<Option<FaceCut>> {
    let Some(side) = side else {
        return Ok(None);
    };
    let edge = edge_loop.edges[index];
    let Some(face) = mesh
        .faces_of_edge(edge)?
        .into_iter()
        .find(|face| !edge_loop.faces.contains(face))
    else {
        return Ok(None);
    };
    if mesh.face_degree(face)? != 4 {
        return Ok(None);
    }

    let inside = half_edge_in_face(mesh, face, edge)?;
    let opposite = mesh.half_edge(mesh.half_edge(inside)?.next)?.next;
    let far = carry_across(mesh, face, edge, side, opposite)?;
    Ok(Some(FaceCut {
        face,
        cut_a: point_at(mesh, side, t)?,
        cut_b: point_at(mesh, far, t)?,
        edge_a: edge,
        edge_b: mesh.canonical_edge(opposite)?,
    }))
}

/// Parameter along `he` (0 at its origin, 1 at its destination) of the point
/// closest to a local-space ray. Drives `t` from the pointer while hovering.
pub fn edge_parameter_from_ray(mesh: &HalfEdgeMesh, he: HalfEdgeId, ray: Ray3d) -> MeshResult<f32> {
    let (from, to) = mesh.edge_endpoints(he)?;
    let p0 = mesh.vertex_position(from)?;
    let p1 = mesh.vertex_position(to)?;

    let d1 = p1 - p0;
    let a = d1.length_squared();
    if a <= f32::EPSILON {
        return Err(MeshError::DegenerateGeometry(format!(
            "edge {he} has zero length"
        )));
    }

    let d2 = *ray.direction;
    let r = p0 - ray.origin;
    let b = d1.dot(d2);
    let c = d1.dot(r);
    let e = d2.dot(d2);
    let f = d2.dot(r);
    let denom = a * e - b * b;

    let s = if denom.abs() <= f32::EPSILON * a * e {
        // Parallel: project the ray origin onto the edge
        -c / a
    } else {
        (b * f - c * e) / denom
    };
    Ok(s.clamp(0.0, 1.0))
}
