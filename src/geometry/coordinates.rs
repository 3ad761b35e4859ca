use eframe::egui::{Pos2, Rect, Vec2};

/// Mapping between screen pixels and canvas units.
///
/// `screen = origin + (canvas * zoom + pan) * ui_scale`
///
/// `origin` is the screen position of the canvas widget's top-left corner,
/// `pan` is the scroll offset in unscaled pixels and `ui_scale` is the extra
/// device scale applied when the canvas is embedded in a desktop shell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateSpace {
    pub origin: Pos2,
    pub pan: Vec2,
    zoom: f32,
    ui_scale: f32,
    min_zoom: f32,
    max_zoom: f32,
}

impl Default for CoordinateSpace {
    fn default() -> Self {
        Self {
            origin: Pos2::ZERO,
            pan: Vec2::ZERO,
            zoom: 1.0,
            ui_scale: 1.0,
            min_zoom: 0.1,
            max_zoom: 5.0,
        }
    }
}

impl CoordinateSpace {
    pub fn new(zoom: f32, pan: Vec2) -> Self {
        let mut space = Self {
            pan,
            ..Self::default()
        };
        space.set_zoom(zoom);
        space
    }

    pub fn with_zoom_limits(mut self, min_zoom: f32, max_zoom: f32) -> Self {
        self.min_zoom = min_zoom.max(f32::EPSILON);
        self.max_zoom = max_zoom.max(self.min_zoom);
        self.set_zoom(self.zoom);
        self
    }

    pub fn with_ui_scale(mut self, ui_scale: f32) -> Self {
        self.set_ui_scale(ui_scale);
        self
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn ui_scale(&self) -> f32 {
        self.ui_scale
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = if zoom.is_finite() {
            zoom.clamp(self.min_zoom, self.max_zoom)
        } else {
            1.0_f32.clamp(self.min_zoom, self.max_zoom)
        };
    }

    pub fn set_ui_scale(&mut self, ui_scale: f32) {
        self.ui_scale = if ui_scale.is_finite() && ui_scale > 0.0 {
            ui_scale
        } else {
            1.0
        };
    }

    pub fn screen_to_canvas(&self, screen: Pos2) -> Pos2 {
        let unscaled = (screen - self.origin) / self.ui_scale;
        ((unscaled - self.pan) / self.zoom).to_pos2()
    }

    pub fn canvas_to_screen(&self, canvas: Pos2) -> Pos2 {
        self.origin + (canvas.to_vec2() * self.zoom + self.pan) * self.ui_scale
    }

    /// Converts a pointer movement into a canvas displacement.
    pub fn screen_delta_to_canvas(&self, delta: Vec2) -> Vec2 {
        delta / self.ui_scale / self.zoom
    }

    pub fn canvas_length_to_screen(&self, length: f32) -> f32 {
        length * self.zoom * self.ui_scale
    }

    /// Canvas rectangle currently covered by a widget of `viewport_size` pixels.
    pub fn visible_area(&self, viewport_size: Vec2) -> Rect {
        Rect::from_min_max(
            self.screen_to_canvas(self.origin),
            self.screen_to_canvas(self.origin + viewport_size),
        )
    }

    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.pan += screen_delta / self.ui_scale;
    }

    /// Multiplies the zoom by `factor` while keeping the canvas point under
    /// `screen_anchor` fixed on screen.
    pub fn zoom_around(&mut self, screen_anchor: Pos2, factor: f32) {
        let anchored = self.screen_to_canvas(screen_anchor);
        self.set_zoom(self.zoom * factor);
        let unscaled = (screen_anchor - self.origin) / self.ui_scale;
        self.pan = unscaled - anchored.to_vec2() * self.zoom;
    }

    /// Chooses zoom and pan so `content` fills the viewport, leaving `padding`
    /// pixels on every side.
    pub fn fit_to(&mut self, content: Rect, viewport_size: Vec2, padding: f32) {
        let available = (viewport_size / self.ui_scale - Vec2::splat(padding * 2.0)).max(Vec2::splat(1.0));
        let size = content.size().max(Vec2::splat(1.0));
        self.set_zoom((available.x / size.x).min(available.y / size.y));

        let center = content.center().to_vec2() * self.zoom;
        self.pan = viewport_size / self.ui_scale * 0.5 - center;
    }

    pub fn canvas_rect_to_screen(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.canvas_to_screen(rect.min), self.canvas_to_screen(rect.max))
    }

    pub fn screen_rect_to_canvas(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.screen_to_canvas(rect.min), self.screen_to_canvas(rect.max))
    }
}
