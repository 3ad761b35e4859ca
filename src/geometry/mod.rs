//! Backend-agnostic diagram geometry.
//!
//! Every function here is a pure function of its inputs, so the SVG-style
//! and GPU-style renderers can consume identical results.

pub mod connector;
pub mod coordinates;
pub mod culling;
pub mod free_space;
pub mod ports;
pub mod selection;

use eframe::egui::{Pos2, Rect, pos2};

pub use connector::{
    BendpointSlot, ConnectorEnd, ConnectorRequest, EndpointBias, MovingParts, PathSegment,
    VirtualBendpoint, VirtualBendpoints, bezier, build_connector_path, segment_midpoints,
};
pub use coordinates::CoordinateSpace;
pub use culling::{ConnectorCuller, connector_bounds, is_renderable, node_visible};
pub use free_space::{
    Placement, around_point_with_fallback, find_free_space, paste_offset, visible_fraction,
};
pub use ports::{
    connection_request, placeholder_position, port_bar_port_position, port_position, port_shift,
};
pub use selection::{SelectionHits, select_in_rectangle};

/// Rounds `value` to the nearest multiple of `step`.
pub fn snap(value: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

pub fn snap_point(point: Pos2, step: f32) -> Pos2 {
    pos2(snap(point.x, step), snap(point.y, step))
}

/// Rectangle spanned by two arbitrary corners, with `min <= max` on both axes.
pub fn normalized_rect(a: Pos2, b: Pos2) -> Rect {
    Rect::from_min_max(pos2(a.x.min(b.x), a.y.min(b.y)), pos2(a.x.max(b.x), a.y.max(b.y)))
}

/// Closed-interval overlap test; touching edges count.
pub fn rects_touch(a: Rect, b: Rect) -> bool {
    a.min.x <= b.max.x && b.min.x <= a.max.x && a.min.y <= b.max.y && b.min.y <= a.max.y
}

/// Area shared by two rectangles, zero when they are disjoint or only touch.
pub fn overlap_area(a: Rect, b: Rect) -> f32 {
    let width = a.max.x.min(b.max.x) - a.min.x.max(b.min.x);
    let height = a.max.y.min(b.max.y) - a.min.y.max(b.min.y);
    if width <= 0.0 || height <= 0.0 {
        0.0
    } else {
        width * height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snap_rounds_to_grid() {
        assert_eq!(snap(12.4, 5.0), 10.0);
        assert_eq!(snap(12.5, 5.0), 15.0);
        assert_eq!(snap(-7.6, 5.0), -10.0);
        assert_eq!(snap(3.4, 1.0), 3.0);
        assert_eq!(snap(3.4, 0.0), 3.4);
    }

    #[test]
    fn normalized_rect_is_corner_independent() {
        let a = pos2(10.0, 40.0);
        let b = pos2(-5.0, 2.0);
        assert_eq!(normalized_rect(a, b), normalized_rect(b, a));
        assert_eq!(normalized_rect(a, b).min, pos2(-5.0, 2.0));
    }

    #[test]
    fn overlap_area_ignores_touching_edges() {
        let a = Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0));
        let b = Rect::from_min_max(pos2(10.0, 0.0), pos2(20.0, 10.0));
        let c = Rect::from_min_max(pos2(5.0, 5.0), pos2(20.0, 20.0));
        assert_eq!(overlap_area(a, b), 0.0);
        assert!(rects_touch(a, b));
        assert_eq!(overlap_area(a, c), 25.0);
    }
}
