//! Pointer-drag transform of vertices, edges and faces.
//!
//! A drag projects the pointer onto a camera-facing plane through the picked
//! element and moves the affected vertices by the offset from the start
//! point. Offsets always apply to the positions captured at drag start, so
//! a long drag never accumulates drift and cancelling is a plain restore.

use bevy::math::Affine3A;
use bevy::prelude::*;
use std::collections::BTreeSet;

use super::half_edge::{HalfEdgeMesh, VertexId};
use super::selection::{ElementSelection, PickedElement};
use super::viewport::CameraState;
use crate::error::{MeshError, MeshResult};

/// The camera-side resources a drag borrows for its whole lifetime.
///
/// Every exit path (end, cancel, lost capture) hands both back.
pub trait GestureHost {
    fn set_orbit_enabled(&mut self, enabled: bool);
    fn set_pointer_captured(&mut self, captured: bool);
}

/// Orbit and pointer-capture flags read by the camera controller.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrbitControl {
    pub orbit_enabled: bool,
    pub pointer_captured: bool,
}

impl Default for OrbitControl {
    fn default() -> Self {
        Self {
            orbit_enabled: true,
            pointer_captured: false,
        }
    }
}

impl GestureHost for OrbitControl {
    fn set_orbit_enabled(&mut self, enabled: bool) {
        self.orbit_enabled = enabled;
    }

    fn set_pointer_captured(&mut self, captured: bool) {
        self.pointer_captured = captured;
    }
}

/// Everything recorded when a drag starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDrag {
    pub picked: PickedElement,
    /// Vertex ids moved by this drag, ascending.
    pub affected: Vec<VertexId>,
    /// Positions of `affected` at drag start, same order.
    pub snapshot: Vec<Vec3>,
    pub plane_origin: Vec3,
    pub plane: InfinitePlane3d,
    /// Where the start ray met the plane.
    pub anchor: Vec3,
    /// Inverse of the object's world transform at drag start.
    pub world_to_local: Affine3A,
    /// Local offset currently applied on top of `snapshot`.
    pub offset: Vec3,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

/// Vertices a drag on `picked` would move.
///
/// A non-empty selection of the picked element's type wins; otherwise the
/// picked element alone is dragged. Edges contribute both endpoints and
/// faces all their corners.
pub fn affected_vertices(
    mesh: &HalfEdgeMesh,
    selection: &ElementSelection,
    picked: PickedElement,
) -> MeshResult<Vec<VertexId>> {
    let ids: Vec<u32> = if selection.mode() == picked.mode() && !selection.is_empty() {
        selection.ids().collect()
    } else {
        vec![picked.id()]
    };

    let mut vertices = BTreeSet::new();
    for id in ids {
        match picked {
            PickedElement::Vertex(_) => {
                mesh.vertex(id)?;
                vertices.insert(id);
            }
            PickedElement::Edge(_) => {
                let (a, b) = mesh.edge_endpoints(id)?;
                vertices.insert(a);
                vertices.insert(b);
            }
            PickedElement::Face(_) => {
                vertices.extend(mesh.face_vertices(id)?);
            }
        }
    }
    Ok(vertices.into_iter().collect())
}

/// Add a local-space offset to a set of vertices.
pub fn translate_vertices(mesh: &mut HalfEdgeMesh, vertices: &[VertexId], delta: Vec3) -> MeshResult<()> {
    for &v in vertices {
        let p = mesh.vertex_position(v)?;
        mesh.set_vertex_position(v, p + delta)?;
    }
    Ok(())
}

/// Turns one pointer gesture at a time into vertex moves.
#[derive(Debug, Clone, Default)]
pub struct ElementDragController {
    state: DragState,
}

impl ElementDragController {
    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        match &self.state {
            DragState::Dragging(drag) => Some(drag),
            DragState::Idle => None,
        }
    }

    /// Begin a drag. `ray` is the world-space pointer ray at press time.
    ///
    /// Returns `false` and changes nothing while another drag is running.
    /// Fails without touching the host if the picked element is missing.
    pub fn start(
        &mut self,
        mesh: &HalfEdgeMesh,
        selection: &ElementSelection,
        picked: PickedElement,
        camera: &CameraState,
        ray: Ray3d,
        object: &GlobalTransform,
        host: &mut impl GestureHost,
    ) -> MeshResult<bool> {
        if self.is_dragging() {
            return Ok(false);
        }

        let affected = affected_vertices(mesh, selection, picked)?;
        let snapshot = affected
            .iter()
            .map(|&v| mesh.vertex_position(v))
            .collect::<MeshResult<Vec<_>>>()?;

        let plane_origin = object.transform_point(picked.local_position(mesh)?);
        let plane = InfinitePlane3d {
            normal: camera.view_direction,
        };
        let anchor = ray
            .intersect_plane(plane_origin, plane)
            .map_or(plane_origin, |distance| ray.get_point(distance));

        info!("Drag started: {} vertices", affected.len());
        self.state = DragState::Dragging(ActiveDrag {
            picked,
            affected,
            snapshot,
            plane_origin,
            plane,
            anchor,
            world_to_local: object.affine().inverse(),
            offset: Vec3::ZERO,
        });
        host.set_orbit_enabled(false);
        host.set_pointer_captured(true);
        Ok(true)
    }

    /// Follow the pointer. Returns the local offset now applied, or `None`
    /// when no drag is active.
    ///
    /// A ray that misses the drag plane is `DegenerateGeometry`; positions
    /// stay as they were and the drag continues.
    pub fn update(&mut self, mesh: &mut HalfEdgeMesh, ray: Ray3d) -> MeshResult<Option<Vec3>> {
        let DragState::Dragging(drag) = &mut self.state else {
            return Ok(None);
        };
        let distance = ray
            .intersect_plane(drag.plane_origin, drag.plane)
            .ok_or_else(|| {
                MeshError::DegenerateGeometry("pointer ray does not meet the drag plane".to_string())
            })?;
        let world_delta = ray.get_point(distance) - drag.anchor;
        let local_delta = drag.world_to_local.transform_vector3(world_delta);
        if !local_delta.is_finite() {
            return Err(MeshError::DegenerateGeometry(
                "object transform is not invertible".to_string(),
            ));
        }
        apply_offset(mesh, drag, local_delta)?;
        Ok(Some(local_delta))
    }

    /// Shift the dragged vertices by a further local `delta`.
    pub fn translate_local(&mut self, mesh: &mut HalfEdgeMesh, delta: Vec3) -> MeshResult<Option<Vec3>> {
        let DragState::Dragging(drag) = &mut self.state else {
            return Ok(None);
        };
        let offset = drag.offset + delta;
        apply_offset(mesh, drag, offset)?;
        Ok(Some(offset))
    }

    /// Finish the drag, keeping the current positions. Returns the drag so
    /// the caller can commit it.
    pub fn end(&mut self, host: &mut impl GestureHost) -> Option<ActiveDrag> {
        let DragState::Dragging(drag) = std::mem::take(&mut self.state) else {
            return None;
        };
        release(host);
        info!("Drag finished: {} vertices moved by {}", drag.affected.len(), drag.offset);
        Some(drag)
    }

    /// Abort the drag and put every affected vertex back where it started.
    pub fn cancel(&mut self, mesh: &mut HalfEdgeMesh, host: &mut impl GestureHost) -> MeshResult<bool> {
        let DragState::Dragging(drag) = std::mem::take(&mut self.state) else {
            return Ok(false);
        };
        release(host);
        for (&v, &p) in drag.affected.iter().zip(&drag.snapshot) {
            mesh.set_vertex_position(v, p)?;
        }
        info!("Drag cancelled");
        Ok(true)
    }
}

fn apply_offset(mesh: &mut HalfEdgeMesh, drag: &mut ActiveDrag, offset: Vec3) -> MeshResult<()> {
    for (&v, &p) in drag.affected.iter().zip(&drag.snapshot) {
        mesh.set_vertex_position(v, p + offset)?;
    }
    drag.offset = offset;
    Ok(())
}

fn release(host: &mut impl GestureHost) {
    host.set_pointer_captured(false);
    host.set_orbit_enabled(true);
}
