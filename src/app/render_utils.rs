use eframe::egui::epaint::CubicBezierShape;
use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, pos2, vec2};
use workflow_canvas::geometry::{CoordinateSpace, PathSegment};

pub(super) const NODE_FILL: Color32 = Color32::from_rgb(236, 190, 84);
pub(super) const METANODE_FILL: Color32 = Color32::from_rgb(164, 176, 190);
pub(super) const PORT_FILL: Color32 = Color32::from_rgb(45, 49, 56);
pub(super) const SELECTION: Color32 = Color32::from_rgb(84, 168, 245);
pub(super) const CONNECTOR: Color32 = Color32::from_gray(70);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

/// Paper background plus grid lines every `grid_size` canvas units, thinned
/// out so lines never get closer than a few pixels.
pub(super) fn draw_background(
    painter: &Painter,
    rect: Rect,
    space: &CoordinateSpace,
    grid_size: f32,
    show_grid: bool,
) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(250, 250, 248));
    if !show_grid {
        return;
    }

    let mut step = grid_size.max(1.0);
    while space.canvas_length_to_screen(step) < 12.0 {
        step *= 5.0;
    }

    let visible = space.screen_rect_to_canvas(rect);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(120, 130, 140, 40));

    let mut x = (visible.left() / step).floor() * step;
    while x <= visible.right() {
        let screen_x = space.canvas_to_screen(pos2(x, 0.0)).x;
        painter.line_segment(
            [Pos2::new(screen_x, rect.top()), Pos2::new(screen_x, rect.bottom())],
            stroke,
        );
        x += step;
    }

    let mut y = (visible.top() / step).floor() * step;
    while y <= visible.bottom() {
        let screen_y = space.canvas_to_screen(pos2(0.0, y)).y;
        painter.line_segment(
            [Pos2::new(rect.left(), screen_y), Pos2::new(rect.right(), screen_y)],
            stroke,
        );
        y += step;
    }
}

pub(super) fn segment_shape(space: &CoordinateSpace, segment: &PathSegment, stroke: Stroke) -> Shape {
    let points = segment.points().map(|point| space.canvas_to_screen(point));
    CubicBezierShape::from_points_stroke(points, false, Color32::TRANSPARENT, stroke).into()
}

/// Port glyph centered on `center`: a triangle for data ports pointing along
/// the flow, a square for flow-variable ports.
pub(super) fn port_shape(center: Pos2, size: f32, is_flow_variable: bool, fill: Color32) -> Shape {
    let half = size / 2.0;
    if is_flow_variable {
        return Shape::rect_filled(Rect::from_center_size(center, vec2(size, size)), 0.0, fill);
    }

    Shape::convex_polygon(
        vec![
            center + vec2(-half, -half),
            center + vec2(half, 0.0),
            center + vec2(-half, half),
        ],
        fill,
        Stroke::NONE,
    )
}
