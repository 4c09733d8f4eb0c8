//! Mesh modeling session: half-edge editing driven by pointer gestures.
//!
//! The core modules work on plain [`HalfEdgeMesh`] values and can be used
//! without an `App`. [`MeshModelState`] ties them into one editing session
//! (committed mesh, working clone during a drag, selection, drag controller,
//! history) and [`MeshModelerPlugin`] exposes that session through messages.
//! Nothing here renders; the host reads the state and the output messages.

pub mod drag;
pub mod edge_loop;
pub mod half_edge;
mod input;
pub mod loop_cut;
pub mod marker;
pub mod primitives;
pub mod selection;
pub mod viewport;

use bevy::prelude::*;

use crate::commands::{HistoryPlugin, MeshHistory};
use crate::error::{MeshError, MeshResult};
use crate::settings::ModelingSettings;

use drag::{ElementDragController, GestureHost, OrbitControl, affected_vertices, translate_vertices};
use edge_loop::edge_loop_through;
use half_edge::{HalfEdgeId, HalfEdgeMesh, VertexId};
use input::{
    handle_drag, handle_hover_edge, handle_load_primitive, handle_modeling_keys, handle_nudge,
    handle_pick, handle_selection_mode, handle_undo_redo, sync_settings,
};
use loop_cut::{LoopCutPlan, edge_parameter_from_ray, plan_loop_cut};
use marker::MeshData;
use primitives::PrimitiveShape;
use selection::{ElementSelection, PickedElement, SelectionMode, pick_edge, pick_element};
use viewport::{CameraState, PointerSample, world_to_local_ray};

// ---------------------------------------------------------------------------
// Input messages
// ---------------------------------------------------------------------------

/// Switch the active element type.
#[derive(Message, Clone, Copy, Debug)]
pub struct SelectionModeMessage(pub SelectionMode);

/// Pointer click in the viewport.
#[derive(Message, Clone, Copy, Debug)]
pub struct PickMessage {
    pub pointer: PointerSample,
    pub camera: CameraState,
    /// Select the whole edge loop through the clicked edge.
    pub loop_select: bool,
}

/// Pointer-drag gesture phases.
#[derive(Message, Clone, Copy, Debug)]
pub enum DragMessage {
    Start {
        pointer: PointerSample,
        camera: CameraState,
    },
    Move {
        pointer: PointerSample,
        camera: CameraState,
    },
    End,
    /// Escape pressed mid-drag.
    Cancel,
    /// The host lost pointer capture (window blur, pointer left).
    CaptureLost,
}

/// Pointer moved while the loop-cut tool is active.
#[derive(Message, Clone, Copy, Debug)]
pub struct HoverEdgeMessage {
    pub pointer: PointerSample,
    pub camera: CameraState,
}

/// Replace the edited mesh with a fresh primitive.
///
/// The shape's sizes are used as sent. Segment counts come from
/// [`ModelingSettings::primitives`](crate::settings::ModelingSettings::primitives).
#[derive(Message, Clone, Copy, Debug)]
pub struct LoadPrimitive(pub PrimitiveShape);

/// Move the selection (or the active drag) by a local offset.
#[derive(Message, Clone, Copy, Debug)]
pub struct NudgeSelection(pub Vec3);

// ---------------------------------------------------------------------------
// Output messages
// ---------------------------------------------------------------------------

/// New positions for the listed vertices.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct VertexPositionsChanged {
    pub vertices: Vec<VertexId>,
    pub positions: Vec<Vec3>,
}

impl VertexPositionsChanged {
    fn read(mesh: &HalfEdgeMesh, vertices: Vec<VertexId>) -> MeshResult<Self> {
        let positions = vertices
            .iter()
            .map(|&v| mesh.vertex_position(v))
            .collect::<MeshResult<Vec<_>>>()?;
        Ok(Self {
            vertices,
            positions,
        })
    }
}

/// Loop-cut preview for the hovered edge. `None` clears the preview.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct LoopCutPreview {
    pub plan: Option<LoopCutPlan>,
}

#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub struct SelectionChanged {
    pub mode: SelectionMode,
    pub ids: Vec<u32>,
}

impl From<&ElementSelection> for SelectionChanged {
    fn from(selection: &ElementSelection) -> Self {
        Self {
            mode: selection.mode(),
            ids: selection.ids().collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshReplaceReason {
    Load,
    Undo,
    Redo,
    /// A commit failed validation and the last good mesh is showing again.
    Reverted,
}

/// The whole mesh changed; rebuild render buffers from [`MeshModelState::mesh`].
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshReplaced {
    pub reason: MeshReplaceReason,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Persistent state for the mesh modeling session.
///
/// Edits follow copy-on-write: a drag mutates `preview`, a clone of the
/// committed mesh, and only a clone that passes validation is swapped in.
#[derive(Resource, Default)]
pub struct MeshModelState {
    mesh: HalfEdgeMesh,
    /// Working clone while a drag is in progress.
    preview: Option<HalfEdgeMesh>,
    pub selection: ElementSelection,
    pub drag: ElementDragController,
    pub history: MeshHistory,
    /// World transform of the edited object.
    pub object_transform: GlobalTransform,
    /// Edge under the pointer in the last hover, if any.
    pub hovered_edge: Option<HalfEdgeId>,
}

impl MeshModelState {
    pub fn new(mesh: HalfEdgeMesh) -> Self {
        Self {
            mesh,
            ..default()
        }
    }

    /// The mesh as currently displayed: the working clone during a drag,
    /// otherwise the committed mesh.
    pub fn mesh(&self) -> &HalfEdgeMesh {
        self.preview.as_ref().unwrap_or(&self.mesh)
    }

    pub fn committed(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Serializable copy of the committed mesh.
    pub fn mesh_data(&self) -> MeshResult<MeshData> {
        MeshData::from_mesh(&self.mesh)
    }

    /// Validate `next`, swap it in and record the old mesh for undo.
    /// An empty mesh is never recorded.
    fn commit(&mut self, next: HalfEdgeMesh) -> MeshResult<()> {
        next.validate()?;
        let previous = std::mem::replace(&mut self.mesh, next);
        if previous.face_count() > 0 {
            self.history.push(previous);
        }
        Ok(())
    }

    /// Replace the whole mesh (load, import). Any drag is cancelled first.
    pub fn replace_mesh(&mut self, mesh: HalfEdgeMesh, host: &mut impl GestureHost) -> MeshResult<()> {
        self.cancel_drag(host)?;
        self.commit(mesh)?;
        self.selection.retain_valid(&self.mesh);
        self.hovered_edge = None;
        Ok(())
    }

    pub fn load_primitive(&mut self, shape: PrimitiveShape, host: &mut impl GestureHost) -> MeshResult<()> {
        let mesh = shape.build()?;
        self.replace_mesh(mesh, host)?;
        info!(
            "Loaded {} ({} vertices, {} faces)",
            shape.display_name(),
            self.mesh.vertex_count(),
            self.mesh.face_count()
        );
        Ok(())
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) -> bool {
        self.selection.set_mode(mode)
    }

    fn local_ray(&self, world: Ray3d) -> Option<Ray3d> {
        world_to_local_ray(&self.object_transform, world)
    }

    fn pick_radius(mode: SelectionMode, settings: &ModelingSettings) -> f32 {
        match mode {
            SelectionMode::Edge => settings.edge_pick_radius,
            SelectionMode::Vertex | SelectionMode::Face => settings.vertex_pick_radius,
        }
    }

    /// Element of the active mode under a world-space ray.
    pub fn pick_under(&self, world: Ray3d, settings: &ModelingSettings) -> MeshResult<Option<PickedElement>> {
        let Some(local) = self.local_ray(world) else {
            return Ok(None);
        };
        let mode = self.selection.mode();
        pick_element(
            self.mesh(),
            local,
            mode,
            Self::pick_radius(mode, settings),
            settings.xray_selection,
        )
    }

    /// Apply a click. Returns whether the selection changed.
    ///
    /// A click on empty space clears the selection unless shift is held.
    pub fn click(
        &mut self,
        world: Ray3d,
        shift: bool,
        loop_select: bool,
        settings: &ModelingSettings,
    ) -> MeshResult<bool> {
        let Some(picked) = self.pick_under(world, settings)? else {
            return Ok(!shift && self.selection.clear());
        };

        if let (true, PickedElement::Edge(he)) = (loop_select, picked) {
            if let Some(edge_loop) = edge_loop_through(self.mesh(), he)? {
                info!("Selected edge loop ({} edges)", edge_loop.len());
                return Ok(self.selection.select_loop(&edge_loop, shift));
            }
        }
        self.selection.click(&self.mesh, picked.id(), shift)
    }

    /// Start dragging whatever is under the pointer. Returns `false` when
    /// nothing was hit or a drag is already running.
    pub fn begin_drag(
        &mut self,
        world: Ray3d,
        camera: &CameraState,
        settings: &ModelingSettings,
        host: &mut impl GestureHost,
    ) -> MeshResult<bool> {
        if self.is_dragging() {
            return Ok(false);
        }
        let Some(picked) = self.pick_under(world, settings)? else {
            return Ok(false);
        };
        let working = self.mesh.clone();
        let started = self.drag.start(
            &working,
            &self.selection,
            picked,
            camera,
            world,
            &self.object_transform,
            host,
        )?;
        if started {
            self.preview = Some(working);
        }
        Ok(started)
    }

    /// Follow the pointer. Returns the vertices that moved.
    pub fn drag_to(&mut self, world: Ray3d) -> MeshResult<Option<Vec<VertexId>>> {
        let Some(working) = self.preview.as_mut() else {
            return Ok(None);
        };
        if self.drag.update(working, world)?.is_none() {
            return Ok(None);
        }
        Ok(self.drag.active().map(|drag| drag.affected.clone()))
    }

    /// Finish the drag and commit the working clone.
    ///
    /// A drag that never moved commits nothing. If the clone fails
    /// validation it is dropped and the committed mesh stays as it was.
    pub fn end_drag(&mut self, host: &mut impl GestureHost) -> MeshResult<Option<Vec<VertexId>>> {
        let Some(finished) = self.drag.end(host) else {
            return Ok(None);
        };
        let Some(working) = self.preview.take() else {
            return Ok(None);
        };
        if finished.offset == Vec3::ZERO {
            return Ok(None);
        }
        self.commit(working)?;
        Ok(Some(finished.affected))
    }

    /// Abort the drag. Returns the vertices that snapped back.
    pub fn cancel_drag(&mut self, host: &mut impl GestureHost) -> MeshResult<Option<Vec<VertexId>>> {
        let affected = self.drag.active().map(|drag| drag.affected.clone());
        let cancelled = match self.preview.as_mut() {
            Some(working) => self.drag.cancel(working, host)?,
            None => false,
        };
        self.preview = None;
        Ok(affected.filter(|_| cancelled))
    }

    /// Move by a local offset: the active drag if there is one, otherwise
    /// the selection as a single committed edit.
    pub fn nudge(&mut self, delta: Vec3) -> MeshResult<Vec<VertexId>> {
        if let Some(working) = self.preview.as_mut() {
            self.drag.translate_local(working, delta)?;
            return Ok(self
                .drag
                .active()
                .map(|drag| drag.affected.clone())
                .unwrap_or_default());
        }

        let Some(first) = self.selection.ids().next() else {
            return Ok(Vec::new());
        };
        let picked = PickedElement::from_mode(self.selection.mode(), first);
        let affected = affected_vertices(&self.mesh, &self.selection, picked)?;
        let mut working = self.mesh.clone();
        translate_vertices(&mut working, &affected, delta)?;
        self.commit(working)?;
        Ok(affected)
    }

    /// Step back one commit. Ignored during a drag.
    pub fn undo(&mut self) -> bool {
        if self.is_dragging() {
            return false;
        }
        let Some(previous) = self.history.undo(self.mesh.clone()) else {
            return false;
        };
        self.mesh = previous;
        self.selection.retain_valid(&self.mesh);
        true
    }

    /// Re-apply an undone commit. Ignored during a drag.
    pub fn redo(&mut self) -> bool {
        if self.is_dragging() {
            return false;
        }
        let Some(next) = self.history.redo(self.mesh.clone()) else {
            return false;
        };
        self.mesh = next;
        self.selection.retain_valid(&self.mesh);
        true
    }

    /// Loop-cut plan for the edge under a world-space ray.
    ///
    /// `t` follows the pointer along the hovered edge; if it cannot be
    /// derived the configured default is used.
    pub fn hover(&mut self, world: Ray3d, settings: &ModelingSettings) -> MeshResult<Option<LoopCutPlan>> {
        self.hovered_edge = None;
        let Some(local) = self.local_ray(world) else {
            return Ok(None);
        };
        let Some(hit) = pick_edge(self.mesh(), local, settings.edge_pick_radius)? else {
            return Ok(None);
        };
        let t = match edge_parameter_from_ray(self.mesh(), hit.half_edge, local) {
            Ok(t) => t,
            Err(e) if e.is_recoverable() => settings.default_loop_cut_t,
            Err(e) => return Err(e),
        };
        self.hovered_edge = Some(hit.half_edge);
        plan_loop_cut(self.mesh(), hit.half_edge, t)
    }
}

/// World-space ray for a pointer sample, or a recoverable error when the
/// canvas or camera cannot produce one.
fn pointer_ray(pointer: &PointerSample, camera: &CameraState) -> MeshResult<Ray3d> {
    camera.ray_from_pointer(pointer).ok_or_else(|| {
        MeshError::DegenerateGeometry(format!("no ray through pointer at {}", pointer.screen))
    })
}

pub struct MeshModelerPlugin;

impl Plugin for MeshModelerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MeshModelState>()
            .init_resource::<ModelingSettings>()
            .init_resource::<OrbitControl>()
            .register_type::<MeshData>()
            .add_plugins(HistoryPlugin)
            .add_message::<SelectionModeMessage>()
            .add_message::<PickMessage>()
            .add_message::<DragMessage>()
            .add_message::<HoverEdgeMessage>()
            .add_message::<LoadPrimitive>()
            .add_message::<NudgeSelection>()
            .add_message::<VertexPositionsChanged>()
            .add_message::<LoopCutPreview>()
            .add_message::<SelectionChanged>()
            .add_message::<MeshReplaced>()
            .add_systems(PreUpdate, handle_modeling_keys)
            .add_systems(
                Update,
                (
                    sync_settings,
                    handle_load_primitive,
                    handle_selection_mode,
                    handle_pick,
                    handle_drag,
                    handle_nudge,
                    handle_hover_edge,
                    handle_undo_redo,
                )
                    .chain(),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modeling::half_edge::tests::make_quad_cube;
    use super::viewport::ProjectionKind;

    fn camera() -> CameraState {
        CameraState::default()
    }

    fn ray_through(target: Vec3) -> Ray3d {
        let origin = camera().position;
        Ray3d::new(origin, Dir3::new(target - origin).unwrap())
    }

    fn cube_state() -> MeshModelState {
        MeshModelState::new(make_quad_cube())
    }

    #[test]
    fn committed_drag_can_be_undone() {
        let mut state = cube_state();
        let settings = ModelingSettings::default();
        let mut host = OrbitControl::default();
        let original = state.committed().clone();

        assert!(state
            .begin_drag(ray_through(Vec3::splat(0.5)), &camera(), &settings, &mut host)
            .unwrap());
        assert!(state.is_dragging());
        let moved = state.drag_to(ray_through(Vec3::new(1.5, 0.5, 0.5))).unwrap().unwrap();
        assert_eq!(moved, vec![6]);
        // Committed mesh is untouched until the drag ends
        assert_eq!(state.committed(), &original);
        assert_ne!(state.mesh(), &original);

        assert_eq!(state.end_drag(&mut host).unwrap(), Some(vec![6]));
        assert!(state.committed().vertex_position(6).unwrap().abs_diff_eq(Vec3::new(1.5, 0.5, 0.5), 1e-4));
        assert!(host.orbit_enabled);

        assert!(state.undo());
        assert_eq!(state.committed(), &original);
        assert!(state.redo());
        assert_ne!(state.committed(), &original);
    }

    #[test]
    fn cancelled_drag_leaves_no_trace() {
        let mut state = cube_state();
        let settings = ModelingSettings::default();
        let mut host = OrbitControl::default();
        let original = state.committed().clone();

        state
            .begin_drag(ray_through(Vec3::splat(0.5)), &camera(), &settings, &mut host)
            .unwrap();
        state.drag_to(ray_through(Vec3::new(1.0, 1.0, 0.5))).unwrap();
        assert_eq!(state.cancel_drag(&mut host).unwrap(), Some(vec![6]));
        assert_eq!(state.mesh(), &original);
        assert!(!state.history.can_undo());
        assert_eq!(host, OrbitControl::default());
    }

    #[test]
    fn drag_on_empty_space_does_nothing() {
        let mut state = cube_state();
        let mut host = OrbitControl::default();
        let started = state
            .begin_drag(
                ray_through(Vec3::new(3.0, 3.0, 0.5)),
                &camera(),
                &ModelingSettings::default(),
                &mut host,
            )
            .unwrap();
        assert!(!started);
        assert!(host.orbit_enabled);
    }

    #[test]
    fn stationary_drag_commits_nothing() {
        let mut state = cube_state();
        let mut host = OrbitControl::default();
        state
            .begin_drag(
                ray_through(Vec3::splat(0.5)),
                &camera(),
                &ModelingSettings::default(),
                &mut host,
            )
            .unwrap();
        assert_eq!(state.end_drag(&mut host).unwrap(), None);
        assert!(!state.history.can_undo());
    }

    #[test]
    fn face_drag_moves_whole_selection() {
        let mut state = cube_state();
        let settings = ModelingSettings::default();
        let mut host = OrbitControl::default();
        state.set_selection_mode(SelectionMode::Face);
        assert!(state.click(ray_through(Vec3::new(0.1, 0.1, 0.5)), false, false, &settings).unwrap());
        assert_eq!(state.selection.ids().collect::<Vec<_>>(), vec![0]);

        state
            .begin_drag(ray_through(Vec3::new(0.1, 0.1, 0.5)), &camera(), &settings, &mut host)
            .unwrap();
        let moved = state.drag_to(ray_through(Vec3::new(0.1, 0.6, 0.5))).unwrap().unwrap();
        assert_eq!(moved, vec![4, 5, 6, 7]);
        state.end_drag(&mut host).unwrap();
        state.committed().validate().unwrap();
    }

    #[test]
    fn click_on_nothing_clears_unless_shift() {
        let mut state = cube_state();
        let settings = ModelingSettings::default();
        state.selection.click(&state.mesh, 3, false).unwrap();
        let miss = ray_through(Vec3::new(4.0, 4.0, 0.0));
        assert!(!state.click(miss, true, false, &settings).unwrap());
        assert_eq!(state.selection.len(), 1);
        assert!(state.click(miss, false, false, &settings).unwrap());
        assert!(state.selection.is_empty());
    }

    #[test]
    fn loop_click_selects_ring() {
        let mut state = cube_state();
        let settings = ModelingSettings::default();
        state.set_selection_mode(SelectionMode::Edge);
        assert!(state.click(ray_through(Vec3::new(0.48, 0.0, 0.5)), false, true, &settings).unwrap());
        assert_eq!(state.selection.len(), 4);
        assert!(state.selection.contains(1));
    }

    #[test]
    fn nudge_commits_selection_move() {
        let mut state = cube_state();
        state.selection.extend(&state.mesh, [0, 1]).unwrap();
        let moved = state.nudge(Vec3::new(0.0, 0.25, 0.0)).unwrap();
        assert_eq!(moved, vec![0, 1]);
        assert_eq!(state.committed().vertex_position(0).unwrap(), Vec3::new(-0.5, -0.25, -0.5));
        assert!(state.undo());
        assert_eq!(state.committed().vertex_position(0).unwrap(), Vec3::splat(-0.5));

        state.selection.clear();
        assert!(state.nudge(Vec3::Y).unwrap().is_empty());
    }

    #[test]
    fn hover_plans_cut_through_hovered_edge() {
        let mut state = cube_state();
        let plan = state
            .hover(ray_through(Vec3::new(0.48, 0.0, 0.5)), &ModelingSettings::default())
            .unwrap()
            .unwrap();
        assert_eq!(state.hovered_edge, Some(1));
        assert_eq!(plan.cuts.len(), 4);
        assert!(plan.closed);

        let nothing = state
            .hover(ray_through(Vec3::new(3.0, 0.0, 0.5)), &ModelingSettings::default())
            .unwrap();
        assert!(nothing.is_none());
        assert_eq!(state.hovered_edge, None);
    }

    #[test]
    fn loading_primitive_trims_selection_and_is_undoable() {
        let mut state = cube_state();
        let mut host = OrbitControl::default();
        state.selection.extend(&state.mesh, [2, 7]).unwrap();
        state
            .load_primitive(
                PrimitiveShape::Plane {
                    size: Vec2::ONE,
                    subdivisions: 1,
                },
                &mut host,
            )
            .unwrap();
        assert_eq!(state.committed().vertex_count(), 4);
        assert_eq!(state.selection.ids().collect::<Vec<_>>(), vec![2]);
        assert!(state.undo());
        assert_eq!(state.committed().vertex_count(), 8);
    }

    #[test]
    fn bad_primitive_keeps_current_mesh() {
        let mut state = cube_state();
        let mut host = OrbitControl::default();
        let err = state
            .load_primitive(
                PrimitiveShape::Cylinder {
                    radius: 1.0,
                    height: 1.0,
                    radial_segments: 2,
                },
                &mut host,
            )
            .unwrap_err();
        assert!(matches!(err, MeshError::Construction(_)));
        assert_eq!(state.committed().vertex_count(), 8);
    }

    // -----------------------------------------------------------------------
    // Plugin
    // -----------------------------------------------------------------------

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MeshModelerPlugin);
        app.world_mut()
            .write_message(LoadPrimitive(PrimitiveShape::Cube { size: Vec3::ONE }));
        app.update();
        app
    }

    fn read_all<M: Message + Clone>(app: &App) -> Vec<M> {
        let messages = app.world().resource::<Messages<M>>();
        let mut cursor = messages.get_cursor();
        cursor.read(messages).cloned().collect()
    }

    fn pointer_at(target: Vec3) -> PointerSample {
        // Project through the default camera: 45 degree vertical fov, 800x600
        let camera = camera();
        let ProjectionKind::Perspective { fov_y } = camera.projection else {
            unreachable!()
        };
        let canvas = Vec2::new(800.0, 600.0);
        let to = target - camera.position;
        let depth = -to.z;
        let tan_half = (fov_y * 0.5).tan();
        let ndc = Vec2::new(
            to.x / (depth * tan_half * canvas.x / canvas.y),
            to.y / (depth * tan_half),
        );
        PointerSample::new(
            Vec2::new((ndc.x + 1.0) * 0.5 * canvas.x, (1.0 - ndc.y) * 0.5 * canvas.y),
            canvas,
        )
    }

    #[test]
    fn plugin_loads_primitive() {
        let app = app();
        let state = app.world().resource::<MeshModelState>();
        assert_eq!(state.committed().vertex_count(), 8);
        assert!(!state.history.can_undo());
        let replaced = read_all::<MeshReplaced>(&app);
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].reason, MeshReplaceReason::Load);
    }

    #[test]
    fn plugin_drag_round_trip_with_undo() {
        let mut app = app();
        app.world_mut().write_message(DragMessage::Start {
            pointer: pointer_at(Vec3::splat(0.5)),
            camera: camera(),
        });
        app.world_mut().write_message(DragMessage::Move {
            pointer: pointer_at(Vec3::new(1.5, 0.5, 0.5)),
            camera: camera(),
        });
        app.update();
        assert!(!app.world().resource::<OrbitControl>().orbit_enabled);

        let changed = read_all::<VertexPositionsChanged>(&app);
        let last = changed.last().unwrap();
        assert_eq!(last.vertices, vec![6]);
        assert!(last.positions[0].abs_diff_eq(Vec3::new(1.5, 0.5, 0.5), 1e-3));

        app.world_mut().write_message(DragMessage::End);
        app.update();
        assert!(app.world().resource::<OrbitControl>().orbit_enabled);
        let moved = app
            .world()
            .resource::<MeshModelState>()
            .committed()
            .vertex_position(6)
            .unwrap();
        assert!(moved.abs_diff_eq(Vec3::new(1.5, 0.5, 0.5), 1e-3));

        app.world_mut().write_message(crate::commands::UndoMeshEdit);
        app.update();
        let restored = app
            .world()
            .resource::<MeshModelState>()
            .committed()
            .vertex_position(6)
            .unwrap();
        assert_eq!(restored, Vec3::splat(0.5));
    }

    #[test]
    fn plugin_capture_loss_cancels_drag() {
        let mut app = app();
        app.world_mut().write_message(DragMessage::Start {
            pointer: pointer_at(Vec3::splat(0.5)),
            camera: camera(),
        });
        app.world_mut().write_message(DragMessage::Move {
            pointer: pointer_at(Vec3::new(1.0, 1.0, 0.5)),
            camera: camera(),
        });
        app.world_mut().write_message(DragMessage::CaptureLost);
        app.update();

        let state = app.world().resource::<MeshModelState>();
        assert!(!state.is_dragging());
        assert_eq!(state.mesh().vertex_position(6).unwrap(), Vec3::splat(0.5));
        assert_eq!(*app.world().resource::<OrbitControl>(), OrbitControl::default());
    }

    #[test]
    fn plugin_reports_selection_and_hover() {
        let mut app = app();
        app.world_mut()
            .write_message(SelectionModeMessage(SelectionMode::Face));
        app.world_mut().write_message(PickMessage {
            pointer: pointer_at(Vec3::new(0.1, 0.1, 0.5)),
            camera: camera(),
            loop_select: false,
        });
        app.world_mut().write_message(HoverEdgeMessage {
            pointer: pointer_at(Vec3::new(0.49, 0.0, 0.5)),
            camera: camera(),
        });
        app.update();

        let selection = read_all::<SelectionChanged>(&app);
        let last = selection.last().unwrap();
        assert_eq!(last.mode, SelectionMode::Face);
        assert_eq!(last.ids, vec![0]);

        let preview = read_all::<LoopCutPreview>(&app);
        let plan = preview.last().unwrap().plan.as_ref().unwrap();
        assert_eq!(plan.cuts.len(), 4);
    }
}
