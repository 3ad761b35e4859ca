use std::collections::HashMap;

use eframe::egui::{Pos2, Rect, pos2};

use super::connector::{
    ConnectorEnd, ConnectorRequest, EndpointBias, PathSegment, build_connector_path,
};
use super::rects_touch;
use crate::config::CanvasConfig;

/// Axis-aligned box around the control polygons of `segments`.
///
/// The height is floored at one unit so a perfectly horizontal connector
/// still has a box that can intersect the viewport.
pub fn connector_bounds(segments: &[PathSegment]) -> Rect {
    let mut min = pos2(f32::INFINITY, f32::INFINITY);
    let mut max = pos2(f32::NEG_INFINITY, f32::NEG_INFINITY);

    for point in segments.iter().flat_map(PathSegment::points) {
        min = min.min(point);
        max = max.max(point);
    }

    if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
        return Rect::NOTHING;
    }

    if max.y - min.y < 1.0 {
        max.y = min.y + 1.0;
    }
    Rect::from_min_max(min, max)
}

pub fn is_renderable(bounds: Rect, visible_area: Rect) -> bool {
    let well_formed = bounds.min.x <= bounds.max.x && bounds.min.y <= bounds.max.y;
    well_formed && rects_touch(bounds, visible_area)
}

pub fn node_visible(footprint: Rect, visible_area: Rect) -> bool {
    rects_touch(footprint, visible_area)
}

#[derive(Clone, Debug, PartialEq)]
struct CullEntry {
    visible_area: Rect,
    start: ConnectorEnd,
    end: ConnectorEnd,
    bendpoints: Vec<Pos2>,
    bias: EndpointBias,
    renderable: bool,
}

impl CullEntry {
    fn matches(&self, request: &ConnectorRequest<'_>, visible_area: Rect) -> bool {
        self.visible_area == visible_area
            && self.start == request.start
            && self.end == request.end
            && self.bendpoints == request.bendpoints
            && self.bias == request.bias
    }
}

/// Remembers the last renderability decision per connector and recomputes it
/// only when the viewport, an endpoint, a bendpoint or the bias changed.
///
/// Requests carrying a move preview or virtual bendpoints change every frame
/// and are evaluated without touching the cache.
#[derive(Debug, Default)]
pub struct ConnectorCuller {
    entries: HashMap<String, CullEntry>,
    evaluations: usize,
}

impl ConnectorCuller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tests the box of the laid-out path of `request` against `visible_area`.
    pub fn is_renderable(
        &mut self,
        config: &CanvasConfig,
        connection_id: &str,
        request: &ConnectorRequest<'_>,
        visible_area: Rect,
    ) -> bool {
        let cacheable = request.moving.is_none() && request.virtual_bendpoints.is_none();
        if cacheable
            && let Some(entry) = self.entries.get(connection_id)
            && entry.matches(request, visible_area)
        {
            return entry.renderable;
        }

        self.evaluations += 1;
        let bounds = connector_bounds(&build_connector_path(config, request));
        let renderable = is_renderable(bounds, visible_area);
        if cacheable {
            self.entries.insert(
                connection_id.to_owned(),
                CullEntry {
                    visible_area,
                    start: request.start,
                    end: request.end,
                    bendpoints: request.bendpoints.to_vec(),
                    bias: request.bias,
                    renderable,
                },
            );
        }
        renderable
    }

    /// Number of decisions computed from scratch so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Drops cached decisions for connectors that no longer exist.
    pub fn retain<'a>(&mut self, live_ids: impl IntoIterator<Item = &'a str>) {
        let live = live_ids.into_iter().collect::<std::collections::HashSet<_>>();
        self.entries.retain(|id, _| live.contains(id.as_str()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
