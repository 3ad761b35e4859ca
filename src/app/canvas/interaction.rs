use std::collections::HashSet;

use eframe::egui::{self, Key, Pos2, Rect, Response, Ui, Vec2, vec2};
use futures::executor::block_on;
use tracing::{debug, info};
use workflow_canvas::geometry::{BendpointSlot, VirtualBendpoints, select_in_rectangle, snap_point};
use workflow_canvas::interaction::{DragOutcome, DragPhase};
use workflow_canvas::workflow::{BendpointId, ObjectId, PortSide};

use super::super::{BendpointInsertion, Marquee, ViewModel};
use super::{INSERTION_HANDLE_RADIUS, InsertionHandle, port_bar_rect};

/// Pick radius around bendpoints, in screen pixels.
const BENDPOINT_HIT_RADIUS: f32 = 6.0;

#[derive(Clone, Copy, Debug)]
struct PointerFrame {
    pressed: bool,
    released: bool,
    moved: bool,
    latest: Option<Pos2>,
    press_origin: Option<Pos2>,
    bypass_grid: bool,
    extend_selection: bool,
    cancel: bool,
}

impl ViewModel {
    pub(in crate::app) fn handle_canvas_zoom(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.space.zoom_around(pointer, zoom_factor);
    }

    pub(in crate::app) fn handle_canvas_pan(&mut self, response: &Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.space.pan_by(response.drag_delta());
        }
    }

    /// Topmost movable object under `screen`.
    pub(in crate::app) fn hit_test(&self, screen: Pos2) -> Option<ObjectId> {
        let canvas = self.space.screen_to_canvas(screen);

        if let Some(node) = self
            .workflow
            .nodes()
            .iter()
            .rev()
            .find(|node| node.footprint(self.config.node_size).contains(canvas))
        {
            return Some(ObjectId::Node(node.id.clone()));
        }

        let radius = self
            .space
            .screen_delta_to_canvas(vec2(BENDPOINT_HIT_RADIUS, 0.0))
            .x;
        for connection in self.workflow.connections() {
            if let Some(index) = connection
                .bendpoints
                .iter()
                .position(|point| point.distance(canvas) <= radius)
            {
                return Some(ObjectId::Bendpoint(BendpointId {
                    connection: connection.id.clone(),
                    index,
                }));
            }
        }

        if let Some(side) = [PortSide::In, PortSide::Out].into_iter().find(|&side| {
            self.workflow
                .port_bars()
                .get(side)
                .is_some_and(|bar| port_bar_rect(bar, side).contains(canvas))
        }) {
            return Some(ObjectId::PortBar(side));
        }

        self.workflow
            .annotations()
            .iter()
            .rev()
            .find(|annotation| annotation.bounds.contains(canvas))
            .map(|annotation| ObjectId::Annotation(annotation.id.clone()))
    }

    fn insertion_handle_at(&self, screen: Pos2) -> Option<InsertionHandle> {
        self.insertion_handles().into_iter().find(|handle| {
            self.space.canvas_to_screen(handle.position).distance(screen) <= INSERTION_HANDLE_RADIUS + 2.0
        })
    }

    pub(in crate::app) fn handle_canvas_pointer(&mut self, ui: &Ui, response: &Response) {
        let pointer = ui.input(|input| PointerFrame {
            pressed: input.pointer.primary_pressed(),
            released: input.pointer.primary_released(),
            moved: input.pointer.delta() != Vec2::ZERO,
            latest: input.pointer.latest_pos(),
            press_origin: input.pointer.press_origin(),
            bypass_grid: input.modifiers.alt,
            extend_selection: input.modifiers.shift,
            cancel: input.key_pressed(Key::Escape) || !input.focused,
        });

        if pointer.cancel {
            self.cancel_gestures();
        }

        if pointer.pressed
            && response.hovered()
            && let Some(origin) = pointer.press_origin
        {
            self.begin_gesture(origin, pointer.extend_selection);
        }

        if let Some(position) = pointer.latest {
            if pointer.moved && self.drag.phase() != DragPhase::Idle {
                self.drag
                    .pointer_move(&self.space, position, pointer.bypass_grid, self.frame);
            }
            if let Some(marquee) = self.marquee.as_mut() {
                marquee.current = self.space.screen_to_canvas(position);
            }
            if pointer.moved
                && let Some(insertion) = self.insertion.as_mut()
            {
                let canvas = self.space.screen_to_canvas(position);
                let step = self.config.snap_step(pointer.bypass_grid);
                insertion
                    .candidates
                    .move_to(insertion.index, snap_point(canvas, step));
            }
        }

        if pointer.released {
            if let Some(position) = pointer.latest {
                self.finish_drag(position, pointer.bypass_grid);
            }
            self.finish_marquee();
            self.finish_insertion();
        }
    }

    fn cancel_gestures(&mut self) {
        if self.drag.phase() != DragPhase::Idle || self.marquee.is_some() || self.insertion.is_some() {
            debug!("pointer gesture cancelled");
        }
        self.drag.abort();
        self.marquee = None;
        self.insertion = None;
    }

    fn begin_gesture(&mut self, origin: Pos2, extend_selection: bool) {
        if let Some(handle) = self.insertion_handle_at(origin) {
            let Some(live_count) = self
                .workflow
                .connection(&handle.connection)
                .map(|connection| connection.bendpoints.len())
            else {
                return;
            };
            let mut candidates = VirtualBendpoints::new();
            candidates.insert(handle.index, handle.position, live_count);
            debug!(connection = %handle.connection, index = handle.index, "bendpoint insertion started");
            self.insertion = Some(BendpointInsertion {
                connection: handle.connection,
                index: handle.index,
                candidates,
            });
            return;
        }

        let Some(hit) = self.hit_test(origin) else {
            if !extend_selection {
                self.selection.clear();
            }
            let start = self.space.screen_to_canvas(origin);
            self.marquee = Some(Marquee {
                start,
                current: start,
            });
            return;
        };

        if !self.selection.contains(&hit) {
            if !extend_selection {
                self.selection.clear();
            }
            self.selection.insert(hit.clone());
        }

        let mut objects = vec![hit.clone()];
        objects.extend(self.selection.iter().filter(|object| **object != hit).cloned());
        if !self.drag.pointer_down(&self.workflow, origin, objects) && !self.workflow.accepts_moves() {
            self.status = Some("workflow is read-only or locked".to_owned());
        }
    }

    fn finish_drag(&mut self, position: Pos2, bypass_grid: bool) {
        if self.drag.phase() == DragPhase::Idle {
            return;
        }

        let outcome = block_on(self.drag.pointer_up(
            &self.space,
            position,
            bypass_grid,
            &mut self.commands,
        ));

        match outcome {
            Ok(DragOutcome::Committed(intent)) => {
                self.workflow.apply_move(&intent.objects, intent.delta);
                self.status = Some(format!(
                    "moved {} object(s) by ({:.0}, {:.0})",
                    intent.objects.len(),
                    intent.delta.x,
                    intent.delta.y
                ));
            }
            Ok(DragOutcome::Vetoed) => self.status = Some("move rejected".to_owned()),
            Ok(DragOutcome::Aborted) => self.status = Some("move cancelled".to_owned()),
            Ok(DragOutcome::Click | DragOutcome::Ignored) => {}
            Err(error) => {
                let detail = std::error::Error::source(&error)
                    .map(|source| format!(": {source}"))
                    .unwrap_or_default();
                self.status = Some(format!("{error}{detail}"));
            }
        }
    }

    /// Turns the virtual bendpoint into a real one, unless the connection's
    /// bendpoints changed underneath the gesture.
    fn finish_insertion(&mut self) {
        let Some(insertion) = self.insertion.take() else {
            return;
        };

        let live_count = self
            .workflow
            .connection(&insertion.connection)
            .map(|connection| connection.bendpoints.len());
        let slot = live_count.map(|count| insertion.candidates.slot(insertion.index, count));
        let Some(BendpointSlot::Virtual { position, .. }) = slot else {
            debug!(connection = %insertion.connection, "stale bendpoint insertion dropped");
            self.status = Some("connection changed, bendpoint dropped".to_owned());
            return;
        };

        if self
            .workflow
            .insert_bendpoint(&insertion.connection, insertion.index, position)
        {
            info!(connection = %insertion.connection, index = insertion.index, ?position, "bendpoint added");
            self.selection = HashSet::from([ObjectId::Bendpoint(BendpointId {
                connection: insertion.connection,
                index: insertion.index,
            })]);
            self.status = Some("bendpoint added".to_owned());
        }
    }

    fn finish_marquee(&mut self) {
        let Some(marquee) = self.marquee.take() else {
            return;
        };

        let hits = select_in_rectangle(&self.config, &self.workflow, marquee.start, marquee.current);
        debug!(
            nodes = hits.nodes_inside.len(),
            annotations = hits.annotations_inside.len(),
            bendpoints = hits.bendpoints_inside.len(),
            "rectangle selection"
        );
        self.selection
            .extend(hits.nodes_inside.into_iter().map(ObjectId::Node));
        self.selection
            .extend(hits.annotations_inside.into_iter().map(ObjectId::Annotation));
        self.selection
            .extend(hits.bendpoints_inside.into_iter().map(ObjectId::Bendpoint));
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use workflow_canvas::config::CanvasConfig;
    use workflow_canvas::workflow::demo_workflow;

    use super::*;

    fn model() -> ViewModel {
        ViewModel::new(demo_workflow(), CanvasConfig::default(), 1.0, StdRng::seed_from_u64(0))
    }

    #[test]
    fn annotations_are_hit_below_nodes() {
        let model = model();

        assert_eq!(
            model.hit_test(pos2(-20.0, -30.0)),
            Some(ObjectId::Annotation("inputs".to_owned()))
        );
        assert_eq!(model.hit_test(pos2(10.0, 10.0)), Some(ObjectId::Node("read".to_owned())));
        assert_eq!(model.hit_test(pos2(400.0, 400.0)), None);
    }

    #[test]
    fn pressing_an_annotation_starts_a_drag() {
        let mut model = model();

        model.begin_gesture(pos2(-20.0, -30.0), false);
        assert!(model.marquee.is_none());
        assert_eq!(model.drag.phase(), DragPhase::Pending);
        assert_eq!(model.drag.objects(), &[ObjectId::Annotation("inputs".to_owned())]);
    }

    #[test]
    fn dropping_a_handle_inserts_a_bendpoint() {
        let mut model = model();
        model.selection.insert(ObjectId::Node("lookup".to_owned()));

        let handles = model.insertion_handles();
        assert_eq!(handles.iter().map(|handle| handle.index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(handles.iter().all(|handle| handle.connection == "lookup-join"));

        let target = handles[1].clone();
        let press = model.space.canvas_to_screen(target.position);
        model.begin_gesture(press, false);
        assert!(model.insertion.is_some());
        assert!(model.insertion_handles().is_empty());

        model.finish_insertion();
        let bendpoints = &model.workflow.connection("lookup-join").unwrap().bendpoints;
        assert_eq!(bendpoints.len(), 3);
        assert_eq!(bendpoints[1], target.position);
    }

    #[test]
    fn stale_insertion_is_dropped() {
        let mut model = model();
        model.selection.insert(ObjectId::Node("lookup".to_owned()));

        let target = model.insertion_handles()[0].clone();
        let press = model.space.canvas_to_screen(target.position);
        model.begin_gesture(press, false);
        assert!(model.workflow.insert_bendpoint("lookup-join", 0, pos2(200.0, 300.0)));

        model.finish_insertion();
        assert!(model.insertion.is_none());
        assert_eq!(model.workflow.connection("lookup-join").unwrap().bendpoints.len(), 3);
        assert_eq!(model.status.as_deref(), Some("connection changed, bendpoint dropped"));
    }
}
