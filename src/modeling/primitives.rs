//! Canonical primitive meshes built straight into half-edge form.
//!
//! Every builder emits explicit per-face index lists in CCW winding (viewed
//! from outside, or from +Y for the plane) and hands them to
//! [`HalfEdgeMesh::from_polygons`], which pairs half-edges through the
//! `edge_key` map and rebuilds the vertex cache. Sphere and cylinder close
//! their caps with triangle fans around a pole / center vertex.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

use super::half_edge::{HalfEdgeMesh, VertexId};
use crate::constants::modeling::{
    DEFAULT_CYLINDER_SEGMENTS, DEFAULT_SPHERE_RINGS, DEFAULT_SPHERE_SEGMENTS,
};
use crate::error::{MeshError, MeshResult};

/// A named primitive plus its construction parameters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum PrimitiveShape {
    Cube {
        size: Vec3,
    },
    Plane {
        size: Vec2,
        subdivisions: u32,
    },
    Sphere {
        radius: f32,
        /// Latitude bands, pole to pole.
        rings: u32,
        /// Longitude segments around the axis.
        segments: u32,
    },
    Cylinder {
        radius: f32,
        height: f32,
        radial_segments: u32,
    },
}

impl Default for PrimitiveShape {
    fn default() -> Self {
        PrimitiveShape::Cube { size: Vec3::ONE }
    }
}

impl PrimitiveShape {
    pub fn display_name(&self) -> &'static str {
        match self {
            PrimitiveShape::Cube { .. } => "Cube",
            PrimitiveShape::Plane { .. } => "Plane",
            PrimitiveShape::Sphere { .. } => "Sphere",
            PrimitiveShape::Cylinder { .. } => "Cylinder",
        }
    }

    pub fn unit_sphere() -> Self {
        PrimitiveShape::Sphere {
            radius: 0.5,
            rings: DEFAULT_SPHERE_RINGS,
            segments: DEFAULT_SPHERE_SEGMENTS,
        }
    }

    pub fn unit_cylinder() -> Self {
        PrimitiveShape::Cylinder {
            radius: 0.5,
            height: 1.0,
            radial_segments: DEFAULT_CYLINDER_SEGMENTS,
        }
    }

    /// Build the half-edge mesh for this shape.
    pub fn build(&self) -> MeshResult<HalfEdgeMesh> {
        match *self {
            PrimitiveShape::Cube { size } => cube(size),
            PrimitiveShape::Plane { size, subdivisions } => plane(size, subdivisions),
            PrimitiveShape::Sphere {
                radius,
                rings,
                segments,
            } => uv_sphere(radius, rings, segments),
            PrimitiveShape::Cylinder {
                radius,
                height,
                radial_segments,
            } => cylinder(radius, height, radial_segments),
        }
    }
}

fn require_positive(name: &str, value: f32) -> MeshResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MeshError::Construction(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn require_count(name: &str, value: u32, min: u32) -> MeshResult<()> {
    if value >= min {
        Ok(())
    } else {
        Err(MeshError::Construction(format!(
            "{name} must be at least {min}, got {value}"
        )))
    }
}

/// `base + a * b` as a vertex or face count, refusing sizes past the `u32` id space.
fn element_count(name: &str, base: u32, a: u32, b: u32) -> MeshResult<u32> {
    a.checked_mul(b)
        .and_then(|product| product.checked_add(base))
        .ok_or_else(|| {
            MeshError::Construction(format!("{name} overflows the id range ({a} x {b})"))
        })
}

/// Axis-aligned box centered on the origin: 8 vertices, 6 quads.
pub fn cube(size: Vec3) -> MeshResult<HalfEdgeMesh> {
    require_positive("cube width", size.x)?;
    require_positive("cube height", size.y)?;
    require_positive("cube depth", size.z)?;

    let h = size * 0.5;
    let positions = vec![
        Vec3::new(-h.x, -h.y, -h.z), // 0
        Vec3::new(h.x, -h.y, -h.z),  // 1
        Vec3::new(h.x, h.y, -h.z),   // 2
        Vec3::new(-h.x, h.y, -h.z),  // 3
        Vec3::new(-h.x, -h.y, h.z),  // 4
        Vec3::new(h.x, -h.y, h.z),   // 5
        Vec3::new(h.x, h.y, h.z),    // 6
        Vec3::new(-h.x, h.y, h.z),   // 7
    ];
    let faces = vec![
        vec![4, 5, 6, 7], // front (z+)
        vec![1, 0, 3, 2], // back (z-)
        vec![5, 1, 2, 6], // right (x+)
        vec![0, 4, 7, 3], // left (x-)
        vec![7, 6, 2, 3], // top (y+)
        vec![0, 1, 5, 4], // bottom (y-)
    ];
    HalfEdgeMesh::from_polygons(&positions, &faces)
}

/// Grid of quads in the XZ plane facing +Y, centered on the origin.
pub fn plane(size: Vec2, subdivisions: u32) -> MeshResult<HalfEdgeMesh> {
    require_positive("plane width", size.x)?;
    require_positive("plane depth", size.y)?;
    require_count("plane subdivisions", subdivisions, 1)?;

    let n = subdivisions;
    let stride = element_count("plane row", 1, n, 1)?;
    let vertex_count = element_count("plane vertices", 0, stride, stride)?;
    let face_count = element_count("plane faces", 0, n, n)?;
    let mut positions = Vec::with_capacity(vertex_count as usize);
    for j in 0..=n {
        for i in 0..=n {
            let u = i as f32 / n as f32;
            let v = j as f32 / n as f32;
            positions.push(Vec3::new(
                (u - 0.5) * size.x,
                0.0,
                (v - 0.5) * size.y,
            ));
        }
    }

    let index = |i: u32, j: u32| -> VertexId { j * stride + i };
    let mut faces = Vec::with_capacity(face_count as usize);
    for j in 0..n {
        for i in 0..n {
            faces.push(vec![
                index(i, j),
                index(i, j + 1),
                index(i + 1, j + 1),
                index(i + 1, j),
            ]);
        }
    }

    HalfEdgeMesh::from_polygons(&positions, &faces)
}

/// UV sphere: quad bands between latitude rings, triangle fans at the poles.
///
/// Vertex 0 is the north pole, the last vertex the south pole.
pub fn uv_sphere(radius: f32, rings: u32, segments: u32) -> MeshResult<HalfEdgeMesh> {
    require_positive("sphere radius", radius)?;
    require_count("sphere rings", rings, 2)?;
    require_count("sphere segments", segments, 3)?;

    let ring_count = rings - 1;
    let vertex_count = element_count("sphere vertices", 2, ring_count, segments)?;
    let face_count = element_count("sphere faces", 0, rings, segments)?;
    let mut positions = Vec::with_capacity(vertex_count as usize);
    positions.push(Vec3::new(0.0, radius, 0.0));
    for k in 1..rings {
        let phi = PI * k as f32 / rings as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for j in 0..segments {
            let theta = TAU * j as f32 / segments as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            positions.push(Vec3::new(
                radius * sin_phi * cos_theta,
                radius * cos_phi,
                radius * sin_phi * sin_theta,
            ));
        }
    }
    let south = positions.len() as VertexId;
    positions.push(Vec3::new(0.0, -radius, 0.0));

    let ring = |k: u32, j: u32| -> VertexId { 1 + k * segments + j % segments };
    let mut faces = Vec::with_capacity(face_count as usize);

    for j in 0..segments {
        faces.push(vec![0, ring(0, j + 1), ring(0, j)]);
    }
    for k in 0..ring_count - 1 {
        for j in 0..segments {
            faces.push(vec![
                ring(k, j),
                ring(k, j + 1),
                ring(k + 1, j + 1),
                ring(k + 1, j),
            ]);
        }
    }
    for j in 0..segments {
        faces.push(vec![south, ring(ring_count - 1, j), ring(ring_count - 1, j + 1)]);
    }

    HalfEdgeMesh::from_polygons(&positions, &faces)
}

/// Capped cylinder along Y: one quad per radial segment on the side, plus a
/// triangle fan around a center vertex on each cap.
///
/// Layout: bottom ring, top ring, bottom center, top center.
pub fn cylinder(radius: f32, height: f32, radial_segments: u32) -> MeshResult<HalfEdgeMesh> {
    require_positive("cylinder radius", radius)?;
    require_positive("cylinder height", height)?;
    require_count("cylinder radial segments", radial_segments, 3)?;

    let n = radial_segments;
    let vertex_count = element_count("cylinder vertices", 2, 2, n)?;
    let face_count = element_count("cylinder faces", 0, 3, n)?;
    let half = height * 0.5;
    let mut positions = Vec::with_capacity(vertex_count as usize);
    for y in [-half, half] {
        for j in 0..n {
            let theta = TAU * j as f32 / n as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            positions.push(Vec3::new(radius * cos_theta, y, radius * sin_theta));
        }
    }
    let bottom_center = positions.len() as VertexId;
    positions.push(Vec3::new(0.0, -half, 0.0));
    let top_center = positions.len() as VertexId;
    positions.push(Vec3::new(0.0, half, 0.0));

    let bottom = |j: u32| -> VertexId { j % n };
    let top = |j: u32| -> VertexId { n + j % n };
    let mut faces = Vec::with_capacity(face_count as usize);
    for j in 0..n {
        faces.push(vec![bottom(j), top(j), top(j + 1), bottom(j + 1)]);
    }
    for j in 0..n {
        faces.push(vec![top_center, top(j + 1), top(j)]);
    }
    for j in 0..n {
        faces.push(vec![bottom_center, bottom(j), bottom(j + 1)]);
    }

    HalfEdgeMesh::from_polygons(&positions, &faces)
}
