use std::collections::HashSet;

use eframe::egui::{
    Align2, Color32, FontId, Painter, Rect, Sense, Stroke, StrokeKind, Ui, Vec2, vec2,
};
use workflow_canvas::geometry::{
    BendpointSlot, build_connector_path, node_visible, placeholder_position,
    port_bar_port_position, port_shift,
};
use workflow_canvas::interaction::connector_moving_parts;
use workflow_canvas::workflow::{BendpointId, ObjectId, PortSide};

use super::super::ViewModel;
use super::super::render_utils::{
    CONNECTOR, METANODE_FILL, NODE_FILL, PORT_FILL, SELECTION, blend_color, draw_background,
    port_shape, segment_shape,
};
use super::{INSERTION_HANDLE_RADIUS, port_bar_rect};

const FIT_PADDING: f32 = 40.0;

/// What the current frame draws as "moving" and by how much.
struct Preview {
    moving: HashSet<ObjectId>,
    delta: Vec2,
}

impl Preview {
    fn offset(&self, object: &ObjectId) -> Vec2 {
        if self.moving.contains(object) {
            self.delta
        } else {
            Vec2::ZERO
        }
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.frame += 1;
        self.space.origin = rect.min;
        self.canvas_rect = rect;
        if self.fit_pending {
            self.fit_pending = false;
            if let Some(content) = self.workflow.content_bounds(self.config.node_size) {
                self.space.fit_to(content, rect.size(), FIT_PADDING);
            }
        }

        self.handle_canvas_zoom(ui, rect, &response);
        self.handle_canvas_pan(&response);
        self.handle_canvas_pointer(ui, &response);

        draw_background(&painter, rect, &self.space, self.config.grid_size, self.show_grid);

        let visible = self.space.visible_area(rect.size());
        let preview = Preview {
            moving: if self.drag.is_dragging() {
                self.drag.objects().iter().cloned().collect()
            } else {
                HashSet::new()
            },
            delta: self.drag.preview_delta(),
        };

        self.draw_annotations(&painter, visible, &preview);
        self.draw_port_bars(&painter, &preview);
        self.draw_connectors(&painter, visible, &preview);
        self.draw_nodes(&painter, visible, &preview);
        self.draw_marquee(&painter);

        if let Some(status) = &self.status {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                status,
                FontId::proportional(13.0),
                Color32::from_gray(60),
            );
        }

        if response.dragged() || self.drag.is_dragging() || self.marquee.is_some() {
            ui.ctx().request_repaint();
        }
    }

    fn selection_visible(&self, object: &ObjectId) -> bool {
        !self.drag.is_dragging() && self.selection.contains(object)
    }

    fn draw_annotations(&self, painter: &Painter, visible: Rect, preview: &Preview) {
        for annotation in self.workflow.annotations() {
            let object = ObjectId::Annotation(annotation.id.clone());
            let bounds = annotation.bounds.translate(preview.offset(&object));
            if !node_visible(bounds, visible) {
                continue;
            }

            let screen = self.space.canvas_rect_to_screen(bounds);
            let fill = if preview.moving.contains(&object) {
                Color32::from_rgba_unmultiplied(255, 216, 0, 40)
            } else {
                Color32::from_rgba_unmultiplied(255, 216, 0, 70)
            };
            painter.rect_filled(screen, 2.0, fill);
            let stroke = if self.selection_visible(&object) {
                Stroke::new(1.5, SELECTION)
            } else {
                Stroke::new(1.0, Color32::from_rgb(220, 190, 40))
            };
            painter.rect_stroke(screen, 2.0, stroke, StrokeKind::Inside);
        }
    }

    fn draw_port_bars(&self, painter: &Painter, preview: &Preview) {
        for side in [PortSide::In, PortSide::Out] {
            let Some(bar) = self.workflow.port_bars().get(side) else {
                continue;
            };
            let object = ObjectId::PortBar(side);
            let offset = preview.offset(&object);

            let body = self.space.canvas_rect_to_screen(port_bar_rect(bar, side).translate(offset));
            painter.rect_filled(body, 0.0, Color32::from_gray(200));
            if self.selection_visible(&object) {
                painter.rect_stroke(body, 0.0, Stroke::new(1.5, SELECTION), StrokeKind::Outside);
            }

            let size = self.space.canvas_length_to_screen(self.config.port_size);
            for index in 0..bar.ports {
                let center = port_bar_port_position(&self.config, bar, side, index) + offset;
                painter.add(port_shape(self.space.canvas_to_screen(center), size, false, PORT_FILL));
            }
        }
    }

    fn draw_connectors(&mut self, painter: &Painter, visible: Rect, preview: &Preview) {
        let stroke = Stroke::new(self.space.canvas_length_to_screen(1.5).max(1.0), CONNECTOR);
        let mut drawn = 0;

        for connection in self.workflow.connections() {
            let Some(request) = self.connector_request(connection) else {
                continue;
            };
            let inserting = self
                .insertion
                .as_ref()
                .filter(|insertion| insertion.connection == connection.id);

            let parts = connector_moving_parts(connection, &preview.moving);
            let in_motion = (!preview.moving.is_empty() && !parts.is_empty()) || inserting.is_some();
            if !in_motion && !self.culler.is_renderable(&self.config, &connection.id, &request, visible) {
                continue;
            }

            let mut request = request.with_preview(&parts, preview.delta);
            if let Some(insertion) = inserting {
                request = request.with_virtual_bendpoints(&insertion.candidates);
            }
            for segment in build_connector_path(&self.config, &request) {
                painter.add(segment_shape(&self.space, &segment, stroke));
            }
            drawn += 1;

            for (index, point) in connection.bendpoints.iter().enumerate() {
                let object = ObjectId::Bendpoint(BendpointId {
                    connection: connection.id.clone(),
                    index,
                });
                let color = if self.selection_visible(&object) {
                    SELECTION
                } else {
                    CONNECTOR
                };
                let center = self.space.canvas_to_screen(*point + preview.offset(&object));
                painter.circle_filled(center, 3.0, color);
            }
            if let Some(insertion) = inserting
                && let BendpointSlot::Virtual { position, .. } =
                    insertion.candidates.slot(insertion.index, connection.bendpoints.len())
            {
                painter.circle_filled(self.space.canvas_to_screen(position), 3.5, SELECTION);
            }
        }

        for handle in self.insertion_handles() {
            painter.circle_stroke(
                self.space.canvas_to_screen(handle.position),
                INSERTION_HANDLE_RADIUS,
                Stroke::new(1.0, SELECTION),
            );
        }

        self.culler
            .retain(self.workflow.connections().iter().map(|connection| connection.id.as_str()));
        self.visible_connector_count = drawn;
    }

    fn draw_nodes(&mut self, painter: &Painter, visible: Rect, preview: &Preview) {
        let node_size = self.config.node_size;
        let port_size = self.space.canvas_length_to_screen(self.config.port_size);
        let mut drawn = 0;

        for node in self.workflow.nodes() {
            let object = ObjectId::Node(node.id.clone());
            let position = node.position + preview.offset(&object);
            let footprint = Rect::from_min_size(position, vec2(node_size, node_size));
            if !node_visible(footprint, visible) {
                continue;
            }
            drawn += 1;

            let base = if node.is_metanode { METANODE_FILL } else { NODE_FILL };
            let fill = if preview.moving.contains(&object) {
                blend_color(base, Color32::WHITE, 0.35)
            } else {
                base
            };
            let screen = self.space.canvas_rect_to_screen(footprint);
            painter.rect_filled(screen, 4.0, fill);

            let selected = self.selection_visible(&object);
            if selected {
                painter.rect_stroke(screen.expand(3.0), 6.0, Stroke::new(1.5, SELECTION), StrokeKind::Outside);
            }

            for side in [PortSide::In, PortSide::Out] {
                let count = node.port_count(side);
                for index in 0..count {
                    let shift = port_shift(&self.config, index, count, node.is_metanode, side.is_out());
                    let flow_variable = !node.is_metanode && index == 0;
                    painter.add(port_shape(
                        self.space.canvas_to_screen(position + shift),
                        port_size,
                        flow_variable,
                        PORT_FILL,
                    ));
                }

                if selected {
                    let placeholder =
                        position + placeholder_position(&self.config, count, side.is_out(), node.is_metanode);
                    painter.circle_stroke(
                        self.space.canvas_to_screen(placeholder),
                        port_size / 2.0,
                        Stroke::new(1.0, Color32::from_gray(150)),
                    );
                }
            }

            if self.space.zoom() > 0.45 {
                painter.text(
                    self.space.canvas_to_screen(position + vec2(node_size / 2.0, node_size + 6.0)),
                    Align2::CENTER_TOP,
                    &node.label,
                    FontId::proportional(12.0 * self.space.zoom().min(1.5)),
                    Color32::from_gray(30),
                );
            }
        }

        self.visible_node_count = drawn;
    }

    fn draw_marquee(&self, painter: &Painter) {
        let Some(marquee) = self.marquee else {
            return;
        };

        let rect = Rect::from_two_pos(
            self.space.canvas_to_screen(marquee.start),
            self.space.canvas_to_screen(marquee.current),
        );
        painter.rect_filled(rect, 0.0, Color32::from_rgba_unmultiplied(84, 168, 245, 30));
        painter.rect_stroke(rect, 0.0, Stroke::new(1.0, SELECTION), StrokeKind::Inside);
    }
}
