use eframe::egui::{Pos2, Rect};

use super::{normalized_rect, rects_touch};
use crate::config::CanvasConfig;
use crate::workflow::{BendpointId, Workflow};

/// Result of a drag-to-select gesture, split per object category.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionHits {
    pub nodes_inside: Vec<String>,
    pub nodes_outside: Vec<String>,
    pub annotations_inside: Vec<String>,
    pub annotations_outside: Vec<String>,
    pub bendpoints_inside: Vec<BendpointId>,
    pub bendpoints_outside: Vec<BendpointId>,
}

impl SelectionHits {
    pub fn is_empty(&self) -> bool {
        self.nodes_inside.is_empty()
            && self.annotations_inside.is_empty()
            && self.bendpoints_inside.is_empty()
    }
}

fn contains_rect(outer: Rect, inner: Rect) -> bool {
    outer.min.x <= inner.min.x
        && outer.min.y <= inner.min.y
        && outer.max.x >= inner.max.x
        && outer.max.y >= inner.max.y
}

fn contains_point(rect: Rect, point: Pos2) -> bool {
    point.x >= rect.min.x && point.x <= rect.max.x && point.y >= rect.min.y && point.y <= rect.max.y
}

/// Hit-tests the workflow against the rectangle spanned by `corner_a` and
/// `corner_b` (canvas units, any diagonal).
///
/// Nodes count as inside on any overlap. Annotations also count on overlap,
/// except one that fully contains the rectangle: that is the annotation the
/// gesture started on. Bendpoints count when the point lies within bounds.
pub fn select_in_rectangle(
    config: &CanvasConfig,
    workflow: &Workflow,
    corner_a: Pos2,
    corner_b: Pos2,
) -> SelectionHits {
    let rect = normalized_rect(corner_a, corner_b);
    let mut hits = SelectionHits::default();

    for node in workflow.nodes() {
        if rects_touch(rect, node.footprint(config.node_size)) {
            hits.nodes_inside.push(node.id.clone());
        } else {
            hits.nodes_outside.push(node.id.clone());
        }
    }

    for annotation in workflow.annotations() {
        let inside = rects_touch(rect, annotation.bounds) && !contains_rect(annotation.bounds, rect);
        if inside {
            hits.annotations_inside.push(annotation.id.clone());
        } else {
            hits.annotations_outside.push(annotation.id.clone());
        }
    }

    for connection in workflow.connections() {
        for (index, point) in connection.bendpoints.iter().enumerate() {
            let id = BendpointId {
                connection: connection.id.clone(),
                index,
            };
            if contains_point(rect, *point) {
                hits.bendpoints_inside.push(id);
            } else {
                hits.bendpoints_outside.push(id);
            }
        }
    }

    hits
}
