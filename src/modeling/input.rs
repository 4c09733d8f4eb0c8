//! Systems that feed pointer, keyboard and tool messages into the modeling session.

use bevy::prelude::*;

use crate::commands::{RedoMeshEdit, UndoMeshEdit};
use crate::error::MeshError;
use crate::settings::ModelingSettings;

use super::drag::OrbitControl;
use super::selection::SelectionMode;
use super::{
    DragMessage, HoverEdgeMessage, LoadPrimitive, LoopCutPreview, MeshModelState, MeshReplaceReason,
    MeshReplaced, NudgeSelection, PickMessage, SelectionChanged, SelectionModeMessage,
    VertexPositionsChanged, pointer_ray,
};

/// Recoverable failures skip the frame quietly; anything else is worth a warning.
fn report(context: &str, error: MeshError) {
    if error.is_recoverable() {
        debug!("{}: {}", context, error);
    } else {
        warn!("{}: {}", context, error);
    }
}

/// Keep the history bound in step with the settings resource.
pub fn sync_settings(settings: Res<ModelingSettings>, mut state: ResMut<MeshModelState>) {
    if settings.is_changed() {
        state.history.set_capacity(settings.undo_history_size);
    }
}

/// Digit keys switch element type, Escape cancels a drag, arrows nudge.
pub fn handle_modeling_keys(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    settings: Res<ModelingSettings>,
    mut mode_events: MessageWriter<SelectionModeMessage>,
    mut drag_events: MessageWriter<DragMessage>,
    mut nudge_events: MessageWriter<NudgeSelection>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };
    let ctrl = keyboard.pressed(KeyCode::ControlLeft) || keyboard.pressed(KeyCode::ControlRight);
    if ctrl {
        return;
    }

    if keyboard.just_pressed(KeyCode::Digit1) {
        mode_events.write(SelectionModeMessage(SelectionMode::Vertex));
    }
    if keyboard.just_pressed(KeyCode::Digit2) {
        mode_events.write(SelectionModeMessage(SelectionMode::Edge));
    }
    if keyboard.just_pressed(KeyCode::Digit3) {
        mode_events.write(SelectionModeMessage(SelectionMode::Face));
    }

    if keyboard.just_pressed(KeyCode::Escape) {
        drag_events.write(DragMessage::Cancel);
    }

    let step = settings.nudge_step;
    let mut delta = Vec3::ZERO;
    if keyboard.just_pressed(KeyCode::ArrowUp) {
        delta.y += step;
    }
    if keyboard.just_pressed(KeyCode::ArrowDown) {
        delta.y -= step;
    }
    if keyboard.just_pressed(KeyCode::ArrowRight) {
        delta.x += step;
    }
    if keyboard.just_pressed(KeyCode::ArrowLeft) {
        delta.x -= step;
    }
    if delta != Vec3::ZERO {
        nudge_events.write(NudgeSelection(delta));
    }
}

pub fn handle_load_primitive(
    mut events: MessageReader<LoadPrimitive>,
    mut state: ResMut<MeshModelState>,
    settings: Res<ModelingSettings>,
    mut orbit: ResMut<OrbitControl>,
    mut replaced: MessageWriter<MeshReplaced>,
    mut selection_changed: MessageWriter<SelectionChanged>,
) {
    for LoadPrimitive(shape) in events.read() {
        let shape = settings.primitives.apply(*shape);
        match state.load_primitive(shape, orbit.as_mut()) {
            Ok(()) => {
                replaced.write(MeshReplaced {
                    reason: MeshReplaceReason::Load,
                });
                selection_changed.write(SelectionChanged::from(&state.selection));
            }
            Err(e) => report("Primitive not loaded", e),
        }
    }
}

pub fn handle_selection_mode(
    mut events: MessageReader<SelectionModeMessage>,
    mut state: ResMut<MeshModelState>,
    mut selection_changed: MessageWriter<SelectionChanged>,
) {
    for SelectionModeMessage(mode) in events.read() {
        if state.set_selection_mode(*mode) {
            info!("Selection: {}", mode.display_name());
            selection_changed.write(SelectionChanged::from(&state.selection));
        }
    }
}

pub fn handle_pick(
    mut events: MessageReader<PickMessage>,
    mut state: ResMut<MeshModelState>,
    settings: Res<ModelingSettings>,
    mut selection_changed: MessageWriter<SelectionChanged>,
) {
    for event in events.read() {
        let ray = match pointer_ray(&event.pointer, &event.camera) {
            Ok(ray) => ray,
            Err(e) => {
                report("Click ignored", e);
                continue;
            }
        };
        match state.click(ray, event.pointer.shift, event.loop_select, &settings) {
            Ok(true) => {
                selection_changed.write(SelectionChanged::from(&state.selection));
            }
            Ok(false) => {}
            Err(e) => report("Click ignored", e),
        }
    }
}

pub fn handle_drag(
    mut events: MessageReader<DragMessage>,
    mut state: ResMut<MeshModelState>,
    settings: Res<ModelingSettings>,
    mut orbit: ResMut<OrbitControl>,
    mut positions: MessageWriter<VertexPositionsChanged>,
    mut replaced: MessageWriter<MeshReplaced>,
) {
    for event in events.read() {
        match *event {
            DragMessage::Start { pointer, camera } => {
                let result = pointer_ray(&pointer, &camera)
                    .and_then(|ray| state.begin_drag(ray, &camera, &settings, orbit.as_mut()));
                if let Err(e) = result {
                    report("Drag not started", e);
                }
            }
            DragMessage::Move { pointer, camera } => {
                let result = pointer_ray(&pointer, &camera).and_then(|ray| state.drag_to(ray));
                match result {
                    Ok(Some(moved)) => match VertexPositionsChanged::read(state.mesh(), moved) {
                        Ok(message) => {
                            positions.write(message);
                        }
                        Err(e) => report("Drag frame skipped", e),
                    },
                    Ok(None) => {}
                    Err(e) => report("Drag frame skipped", e),
                }
            }
            DragMessage::End => match state.end_drag(orbit.as_mut()) {
                Ok(Some(moved)) => match VertexPositionsChanged::read(state.mesh(), moved) {
                    Ok(message) => {
                        positions.write(message);
                    }
                    Err(e) => report("Drag result not reported", e),
                },
                Ok(None) => {}
                Err(e) => {
                    report("Drag discarded", e);
                    replaced.write(MeshReplaced {
                        reason: MeshReplaceReason::Reverted,
                    });
                }
            },
            DragMessage::Cancel | DragMessage::CaptureLost => {
                match state.cancel_drag(orbit.as_mut()) {
                    Ok(Some(restored)) => match VertexPositionsChanged::read(state.mesh(), restored) {
                        Ok(message) => {
                            positions.write(message);
                        }
                        Err(e) => report("Cancelled drag not reported", e),
                    },
                    Ok(None) => {}
                    Err(e) => {
                        report("Drag cancel failed", e);
                        replaced.write(MeshReplaced {
                            reason: MeshReplaceReason::Reverted,
                        });
                    }
                }
            }
        }
    }
}

pub fn handle_nudge(
    mut events: MessageReader<NudgeSelection>,
    mut state: ResMut<MeshModelState>,
    mut positions: MessageWriter<VertexPositionsChanged>,
) {
    for NudgeSelection(delta) in events.read() {
        let result = state
            .nudge(*delta)
            .and_then(|moved| VertexPositionsChanged::read(state.mesh(), moved));
        match result {
            Ok(message) if !message.vertices.is_empty() => {
                positions.write(message);
            }
            Ok(_) => {}
            Err(e) => report("Nudge ignored", e),
        }
    }
}

/// Preview a loop cut through the hovered edge, or clear the preview.
pub fn handle_hover_edge(
    mut events: MessageReader<HoverEdgeMessage>,
    mut state: ResMut<MeshModelState>,
    settings: Res<ModelingSettings>,
    mut preview: MessageWriter<LoopCutPreview>,
) {
    // Only the latest pointer position matters
    let Some(event) = events.read().last() else {
        return;
    };
    let result = pointer_ray(&event.pointer, &event.camera).and_then(|ray| state.hover(ray, &settings));
    match result {
        Ok(plan) => {
            preview.write(LoopCutPreview { plan });
        }
        Err(e) => {
            report("Loop cut preview cleared", e);
            preview.write(LoopCutPreview { plan: None });
        }
    }
}

pub fn handle_undo_redo(
    mut undo_events: MessageReader<UndoMeshEdit>,
    mut redo_events: MessageReader<RedoMeshEdit>,
    mut state: ResMut<MeshModelState>,
    mut replaced: MessageWriter<MeshReplaced>,
    mut selection_changed: MessageWriter<SelectionChanged>,
) {
    for _ in undo_events.read() {
        if state.undo() {
            info!("Undo mesh edit");
            replaced.write(MeshReplaced {
                reason: MeshReplaceReason::Undo,
            });
            selection_changed.write(SelectionChanged::from(&state.selection));
        }
    }
    for _ in redo_events.read() {
        if state.redo() {
            info!("Redo mesh edit");
            replaced.write(MeshReplaced {
                reason: MeshReplaceReason::Redo,
            });
            selection_changed.write(SelectionChanged::from(&state.selection));
        }
    }
}
