//! Camera and pointer inputs, and the rays built from them.
//!
//! The renderer hands over a plain [`CameraState`] every frame instead of a
//! `Camera` component, so picking and dragging stay testable without a
//! window. Rays come out in world space; [`world_to_local_ray`] moves them
//! into an object's local space for picking against its mesh.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Projection used by the viewport camera.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum ProjectionKind {
    /// Vertical field of view in radians.
    Perspective { fov_y: f32 },
    /// World-space height of the visible area.
    Orthographic { height: f32 },
}

impl Default for ProjectionKind {
    fn default() -> Self {
        ProjectionKind::Perspective {
            fov_y: std::f32::consts::FRAC_PI_4,
        }
    }
}

/// Camera state as reported by the rendering layer for the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub view_direction: Dir3,
    pub up: Dir3,
    pub projection: ProjectionKind,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            view_direction: Dir3::NEG_Z,
            up: Dir3::Y,
            projection: ProjectionKind::default(),
        }
    }
}

impl CameraState {
    /// Read position and orientation off a camera's transform.
    pub fn from_global_transform(transform: &GlobalTransform, projection: ProjectionKind) -> Self {
        Self {
            position: transform.translation(),
            view_direction: transform.forward(),
            up: transform.up(),
            projection,
        }
    }

    /// Right and corrected up vectors, or `None` if up is parallel to the view.
    fn basis(&self) -> Option<(Vec3, Vec3)> {
        let forward = *self.view_direction;
        let right = forward.cross(*self.up).try_normalize()?;
        let up = right.cross(forward);
        Some((right, up))
    }

    /// World-space ray through a pointer position.
    ///
    /// `None` when the canvas has no area or the camera basis is degenerate.
    pub fn ray_from_pointer(&self, pointer: &PointerSample) -> Option<Ray3d> {
        let ndc = pointer.ndc()?;
        let aspect = pointer.canvas_size.x / pointer.canvas_size.y;
        let (right, up) = self.basis()?;
        let forward = *self.view_direction;

        match self.projection {
            ProjectionKind::Perspective { fov_y } => {
                let tan_half = (fov_y * 0.5).tan();
                let dir = forward + right * (ndc.x * tan_half * aspect) + up * (ndc.y * tan_half);
                Some(Ray3d::new(self.position, Dir3::new(dir).ok()?))
            }
            ProjectionKind::Orthographic { height } => {
                let half = height * 0.5;
                let origin = self.position + right * (ndc.x * half * aspect) + up * (ndc.y * half);
                Some(Ray3d::new(origin, self.view_direction))
            }
        }
    }
}

/// A pointer event in canvas pixels (origin top-left, y down).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSample {
    pub screen: Vec2,
    pub canvas_size: Vec2,
    pub shift: bool,
}

impl PointerSample {
    pub fn new(screen: Vec2, canvas_size: Vec2) -> Self {
        Self {
            screen,
            canvas_size,
            shift: false,
        }
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    /// Normalized device coordinates: x right, y up, both in `[-1, 1]`.
    pub fn ndc(&self) -> Option<Vec2> {
        if self.canvas_size.x <= 0.0 || self.canvas_size.y <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            2.0 * self.screen.x / self.canvas_size.x - 1.0,
            1.0 - 2.0 * self.screen.y / self.canvas_size.y,
        ))
    }
}

/// Transform a world-space ray into the mesh's local space.
pub fn world_to_local_ray(transform: &GlobalTransform, ray: Ray3d) -> Option<Ray3d> {
    let inv = transform.affine().inverse();
    let local_origin = inv.transform_point3(ray.origin);
    let local_target = inv.transform_point3(ray.origin + *ray.direction);
    let local_dir = Dir3::new(local_target - local_origin).ok()?;
    Some(Ray3d::new(local_origin, local_dir))
}
