//! Connector paths: cubic Bezier segments between two ports, optionally
//! routed through bendpoints.

use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::{Pos2, Vec2, vec2};

use crate::config::CanvasConfig;

/// One end of a connector.
///
/// `Floating` is the free end of a connector that is still being drawn and
/// follows the pointer instead of a port.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConnectorEnd {
    Port(Pos2),
    Floating(Pos2),
}

impl ConnectorEnd {
    pub fn position(self) -> Pos2 {
        match self {
            Self::Port(position) | Self::Floating(position) => position,
        }
    }

    pub fn is_floating(self) -> bool {
        matches!(self, Self::Floating(_))
    }

    fn translated(self, delta: Vec2) -> Self {
        match self {
            Self::Port(position) => Self::Port(position + delta),
            Self::Floating(position) => Self::Floating(position + delta),
        }
    }
}

/// Extra nudges applied to the very start/end of a connector so overlapping
/// endpoints stay distinguishable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EndpointBias {
    pub start: bool,
    pub end: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSegment {
    pub start: Pos2,
    pub control1: Pos2,
    pub control2: Pos2,
    pub end: Pos2,
    pub is_first: bool,
    pub is_last: bool,
}

impl PathSegment {
    pub fn points(&self) -> [Pos2; 4] {
        [self.start, self.control1, self.control2, self.end]
    }

    /// Point on the curve at `t = 0.5`.
    pub fn midpoint(&self) -> Pos2 {
        let sum = self.start.to_vec2()
            + self.control1.to_vec2() * 3.0
            + self.control2.to_vec2() * 3.0
            + self.end.to_vec2();
        (sum / 8.0).to_pos2()
    }

    pub fn to_svg_path(&self) -> String {
        format!(
            "M{},{} C{},{} {},{} {},{}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y
        )
    }
}

/// A bendpoint candidate created while dragging, not yet committed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VirtualBendpoint {
    pub position: Pos2,
    /// Real bendpoint count of the connection when this candidate was made.
    pub created_at_count: usize,
}

/// How one insertion slot of a connection resolves at build time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BendpointSlot {
    Real(Pos2),
    Virtual {
        position: Pos2,
        created_at_count: usize,
    },
    Absent,
}

/// Virtual bendpoints of one connection, keyed by the index the candidate
/// would be inserted at.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VirtualBendpoints {
    slots: BTreeMap<usize, VirtualBendpoint>,
}

impl VirtualBendpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, position: Pos2, live_count: usize) {
        self.slots.insert(
            index,
            VirtualBendpoint {
                position,
                created_at_count: live_count,
            },
        );
    }

    pub fn move_to(&mut self, index: usize, position: Pos2) -> bool {
        match self.slots.get_mut(&index) {
            Some(candidate) => {
                candidate.position = position;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<VirtualBendpoint> {
        self.slots.remove(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Resolves slot `index` against the connection's live bendpoint count.
    pub fn slot(&self, index: usize, live_count: usize) -> BendpointSlot {
        match self.slots.get(&index) {
            Some(candidate) if candidate.created_at_count == live_count => BendpointSlot::Virtual {
                position: candidate.position,
                created_at_count: candidate.created_at_count,
            },
            _ => BendpointSlot::Absent,
        }
    }

    pub fn has_fresh(&self, live_count: usize) -> bool {
        self.slots
            .values()
            .any(|candidate| candidate.created_at_count == live_count)
    }

    /// Drops every candidate created against a different bendpoint count.
    pub fn prune_stale(&mut self, live_count: usize) -> usize {
        let before = self.slots.len();
        self.slots
            .retain(|_, candidate| candidate.created_at_count == live_count);
        before - self.slots.len()
    }
}

/// Real and fresh virtual bendpoints in path order, tagged with their slot.
pub fn resolve_bendpoints(
    bendpoints: &[Pos2],
    virtual_bendpoints: Option<&VirtualBendpoints>,
) -> Vec<(usize, BendpointSlot)> {
    let live_count = bendpoints.len();
    let mut resolved = Vec::with_capacity(live_count + 1);

    for index in 0..=live_count {
        if let Some(candidates) = virtual_bendpoints {
            let slot = candidates.slot(index, live_count);
            if !matches!(slot, BendpointSlot::Absent) {
                resolved.push((index, slot));
            }
        }
        if let Some(&point) = bendpoints.get(index) {
            resolved.push((index, BendpointSlot::Real(point)));
        }
    }

    resolved
}

/// Which parts of a connector follow the current move preview.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovingParts {
    pub start: bool,
    pub end: bool,
    pub bendpoints: BTreeSet<usize>,
    pub virtual_bendpoint: Option<usize>,
}

impl MovingParts {
    pub fn bendpoint(index: usize) -> Self {
        Self {
            bendpoints: BTreeSet::from([index]),
            ..Self::default()
        }
    }

    pub fn virtual_bendpoint(index: usize) -> Self {
        Self {
            virtual_bendpoint: Some(index),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.start && !self.end && self.bendpoints.is_empty() && self.virtual_bendpoint.is_none()
    }

    fn moves(&self, slot_index: usize, slot: &BendpointSlot) -> bool {
        match slot {
            BendpointSlot::Real(_) => self.bendpoints.contains(&slot_index),
            BendpointSlot::Virtual { .. } => self.virtual_bendpoint == Some(slot_index),
            BendpointSlot::Absent => false,
        }
    }
}

/// Everything needed to lay out one connector.
#[derive(Clone, Copy, Debug)]
pub struct ConnectorRequest<'a> {
    pub start: ConnectorEnd,
    pub end: ConnectorEnd,
    pub bendpoints: &'a [Pos2],
    pub virtual_bendpoints: Option<&'a VirtualBendpoints>,
    pub bias: EndpointBias,
    pub moving: Option<&'a MovingParts>,
    pub preview_delta: Vec2,
}

impl<'a> ConnectorRequest<'a> {
    pub fn new(start: ConnectorEnd, end: ConnectorEnd) -> Self {
        Self {
            start,
            end,
            bendpoints: &[],
            virtual_bendpoints: None,
            bias: EndpointBias::default(),
            moving: None,
            preview_delta: Vec2::ZERO,
        }
    }

    pub fn with_bendpoints(mut self, bendpoints: &'a [Pos2]) -> Self {
        self.bendpoints = bendpoints;
        self
    }

    pub fn with_virtual_bendpoints(mut self, virtual_bendpoints: &'a VirtualBendpoints) -> Self {
        self.virtual_bendpoints = Some(virtual_bendpoints);
        self
    }

    pub fn with_bias(mut self, bias: EndpointBias) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_preview(mut self, moving: &'a MovingParts, delta: Vec2) -> Self {
        self.moving = Some(moving);
        self.preview_delta = delta;
        self
    }

    fn shifted_if(&self, moves: impl FnOnce(&MovingParts) -> bool) -> Vec2 {
        match self.moving {
            Some(parts) if moves(parts) => self.preview_delta,
            _ => Vec2::ZERO,
        }
    }
}

fn tuck_offset(config: &CanvasConfig, end: ConnectorEnd, biased: bool) -> f32 {
    if end.is_floating() {
        return 0.0;
    }
    let bias = if biased { config.endpoint_bias } else { 0.0 };
    config.port_size / 2.0 - 0.5 + bias
}

fn curve(start: Pos2, end: Pos2, is_first: bool, is_last: bool) -> PathSegment {
    let width = (end.x - start.x).abs();
    let height = (end.y - start.y).abs();
    let bow = width / 4.0 + height / 4.0;

    PathSegment {
        start,
        control1: start + vec2(bow, 0.0),
        control2: end - vec2(bow, 0.0),
        end,
        is_first,
        is_last,
    }
}

/// Single Bezier between two endpoints.
///
/// Port ends are tucked half a port size (minus half a unit) behind the port
/// glyph; the control points bow out horizontally by a quarter of the
/// horizontal plus a quarter of the vertical distance.
pub fn bezier(
    config: &CanvasConfig,
    start: ConnectorEnd,
    end: ConnectorEnd,
    bias: EndpointBias,
) -> PathSegment {
    let from = start.position() + vec2(tuck_offset(config, start, bias.start), 0.0);
    let to = end.position() - vec2(tuck_offset(config, end, bias.end), 0.0);
    curve(from, to, true, true)
}

/// Lays out a connector as an ordered list of Bezier segments.
///
/// Without bendpoints, or while one end is floating, the result is exactly
/// one segment. Otherwise every consecutive pair of path points becomes a
/// segment. Points belonging to moving parts are shifted by the preview delta
/// before the curves are built.
pub fn build_connector_path(config: &CanvasConfig, request: &ConnectorRequest<'_>) -> Vec<PathSegment> {
    let start = request
        .start
        .translated(request.shifted_if(|parts| parts.start));
    let end = request.end.translated(request.shifted_if(|parts| parts.end));

    let has_virtual = request
        .virtual_bendpoints
        .is_some_and(|candidates| candidates.has_fresh(request.bendpoints.len()));
    if request.start.is_floating()
        || request.end.is_floating()
        || (request.bendpoints.is_empty() && !has_virtual)
    {
        return vec![bezier(config, start, end, request.bias)];
    }

    let mut points = Vec::with_capacity(request.bendpoints.len() + 3);
    points.push(start.position() + vec2(tuck_offset(config, start, request.bias.start), 0.0));
    for (slot_index, slot) in resolve_bendpoints(request.bendpoints, request.virtual_bendpoints) {
        let position = match slot {
            BendpointSlot::Real(position) | BendpointSlot::Virtual { position, .. } => position,
            BendpointSlot::Absent => continue,
        };
        let shift = request.shifted_if(|parts| parts.moves(slot_index, &slot));
        points.push(position + shift);
    }
    points.push(end.position() - vec2(tuck_offset(config, end, request.bias.end), 0.0));

    let last = points.len() - 2;
    points
        .windows(2)
        .enumerate()
        .map(|(index, pair)| curve(pair[0], pair[1], index == 0, index == last))
        .collect()
}

/// Handles for inserting a new bendpoint: the midpoint of every segment.
pub fn segment_midpoints(segments: &[PathSegment]) -> Vec<Pos2> {
    segments.iter().map(PathSegment::midpoint).collect()
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    fn config() -> CanvasConfig {
        CanvasConfig::default()
    }

    fn port(x: f32, y: f32) -> ConnectorEnd {
        ConnectorEnd::Port(pos2(x, y))
    }

    #[test]
    fn bezier_matches_reference_values() {
        let segment = bezier(&config(), port(38.5, 7.5), port(7.5, 40.5), EndpointBias::default());

        assert_eq!(segment.start, pos2(42.5, 7.5));
        assert_eq!(segment.control1, pos2(60.5, 7.5));
        assert_eq!(segment.control2, pos2(-14.5, 40.5));
        assert_eq!(segment.end, pos2(3.5, 40.5));
        assert!(segment.is_first && segment.is_last);
    }

    #[test]
    fn bias_pushes_endpoints_further() {
        let plain = bezier(&config(), port(0.0, 0.0), port(100.0, 0.0), EndpointBias::default());
        let biased = bezier(
            &config(),
            port(0.0, 0.0),
            port(100.0, 0.0),
            EndpointBias {
                start: true,
                end: false,
            },
        );
        assert_eq!(biased.start.x - plain.start.x, 4.0);
        assert_eq!(biased.end, plain.end);
    }

    #[test]
    fn floating_end_is_not_tucked() {
        let config = config();
        let request = ConnectorRequest::new(port(0.0, 0.0), ConnectorEnd::Floating(pos2(80.0, 20.0)))
            .with_bendpoints(&[]);
        let path = build_connector_path(&config, &request);
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].start, pos2(4.0, 0.0));
        assert_eq!(path[0].end, pos2(80.0, 20.0));
    }

    #[test]
    fn floating_end_ignores_bendpoints() {
        let bendpoints = [pos2(40.0, 40.0)];
        let request = ConnectorRequest::new(ConnectorEnd::Floating(pos2(0.0, 0.0)), port(80.0, 20.0))
            .with_bendpoints(&bendpoints);
        assert_eq!(build_connector_path(&config(), &request).len(), 1);
    }

    #[test]
    fn plain_connection_is_one_segment() {
        let request = ConnectorRequest::new(port(0.0, 0.0), port(100.0, 50.0));
        let path = build_connector_path(&config(), &request);
        assert_eq!(path, vec![bezier(&config(), port(0.0, 0.0), port(100.0, 50.0), EndpointBias::default())]);
    }

    #[test]
    fn bendpoints_split_the_path() {
        let bendpoints = [pos2(10.0, 10.0), pos2(20.0, 20.0)];
        let request = ConnectorRequest::new(port(0.0, 0.0), port(100.0, 100.0)).with_bendpoints(&bendpoints);
        let path = build_connector_path(&config(), &request);

        assert_eq!(path.len(), 3);
        assert_eq!(path[0].start, pos2(4.0, 0.0));
        assert_eq!(path[0].end, pos2(10.0, 10.0));
        assert_eq!(path[1].start, pos2(10.0, 10.0));
        assert_eq!(path[2].end, pos2(96.0, 100.0));
        assert_eq!(
            path.iter().map(|segment| (segment.is_first, segment.is_last)).collect::<Vec<_>>(),
            vec![(true, false), (false, false), (false, true)]
        );
    }

    #[test]
    fn dragging_a_bendpoint_only_moves_adjacent_segments() {
        let config = config();
        let bendpoints = [pos2(10.0, 10.0), pos2(20.0, 20.0)];
        let moving = MovingParts::bendpoint(0);
        let still = ConnectorRequest::new(port(0.0, 0.0), port(100.0, 100.0)).with_bendpoints(&bendpoints);
        let dragged = still.with_preview(&moving, vec2(5.0, 5.0));

        let before = build_connector_path(&config, &still);
        let after = build_connector_path(&config, &dragged);

        assert_eq!(after.len(), 3);
        assert_eq!(after[0].start, before[0].start);
        assert_eq!(after[0].end, pos2(15.0, 15.0));
        assert_eq!(after[1].start, pos2(15.0, 15.0));
        assert_eq!(after[1].end, before[1].end);
        assert_eq!(after[2], before[2]);
    }

    #[test]
    fn moving_nodes_shift_path_ends() {
        let config = config();
        let bendpoints = [pos2(10.0, 10.0)];
        let moving = MovingParts {
            start: true,
            end: true,
            ..MovingParts::default()
        };
        let request = ConnectorRequest::new(port(0.0, 0.0), port(100.0, 100.0))
            .with_bendpoints(&bendpoints)
            .with_preview(&moving, vec2(0.0, 10.0));
        let path = build_connector_path(&config, &request);

        assert_eq!(path[0].start, pos2(4.0, 10.0));
        assert_eq!(path[0].end, pos2(10.0, 10.0));
        assert_eq!(path[1].end, pos2(96.0, 110.0));
    }

    #[test]
    fn fresh_virtual_bendpoint_is_inserted_before_real_one() {
        let bendpoints = [pos2(50.0, 50.0)];
        let mut candidates = VirtualBendpoints::new();
        candidates.insert(0, pos2(25.0, 5.0), 1);

        let request = ConnectorRequest::new(port(0.0, 0.0), port(100.0, 100.0))
            .with_bendpoints(&bendpoints)
            .with_virtual_bendpoints(&candidates);
        let path = build_connector_path(&config(), &request);

        assert_eq!(path.len(), 3);
        assert_eq!(path[0].end, pos2(25.0, 5.0));
        assert_eq!(path[1].end, pos2(50.0, 50.0));
    }

    #[test]
    fn virtual_bendpoint_alone_splits_a_straight_connection() {
        let mut candidates = VirtualBendpoints::new();
        candidates.insert(0, pos2(40.0, 80.0), 0);
        let moving = MovingParts::virtual_bendpoint(0);

        let request = ConnectorRequest::new(port(0.0, 0.0), port(100.0, 0.0))
            .with_virtual_bendpoints(&candidates)
            .with_preview(&moving, vec2(10.0, 0.0));
        let path = build_connector_path(&config(), &request);

        assert_eq!(path.len(), 2);
        assert_eq!(path[0].end, pos2(50.0, 80.0));
        assert_eq!(path[1].start, pos2(50.0, 80.0));
    }

    #[test]
    fn stale_virtual_bendpoint_is_ignored() {
        let bendpoints = [pos2(50.0, 50.0), pos2(60.0, 60.0)];
        let mut candidates = VirtualBendpoints::new();
        candidates.insert(1, pos2(55.0, 0.0), 1);

        let request = ConnectorRequest::new(port(0.0, 0.0), port(100.0, 100.0))
            .with_bendpoints(&bendpoints)
            .with_virtual_bendpoints(&candidates);
        let path = build_connector_path(&config(), &request);

        assert_eq!(path.len(), 3);
        assert!(path.iter().all(|segment| segment.end != pos2(55.0, 0.0)));
        assert_eq!(candidates.slot(1, 2), BendpointSlot::Absent);
    }

    #[test]
    fn virtual_bendpoint_bookkeeping() {
        let mut candidates = VirtualBendpoints::new();
        candidates.insert(0, pos2(1.0, 1.0), 0);
        candidates.insert(2, pos2(2.0, 2.0), 3);
        assert!(candidates.move_to(0, pos2(5.0, 5.0)));
        assert!(!candidates.move_to(1, pos2(5.0, 5.0)));
        assert_eq!(
            candidates.slot(0, 0),
            BendpointSlot::Virtual {
                position: pos2(5.0, 5.0),
                created_at_count: 0
            }
        );

        assert_eq!(candidates.prune_stale(3), 1);
        assert_eq!(candidates.len(), 1);
        assert!(candidates.remove(2).is_some());
        assert!(candidates.is_empty());
    }

    #[test]
    fn midpoints_and_svg_output() {
        let segment = bezier(&config(), port(0.0, 0.0), port(0.0, 0.0), EndpointBias::default());
        assert_eq!(segment.midpoint(), pos2(0.0, 0.0));

        let segment = PathSegment {
            start: pos2(0.0, 0.0),
            control1: pos2(10.0, 0.0),
            control2: pos2(10.0, 20.0),
            end: pos2(20.0, 20.0),
            is_first: true,
            is_last: true,
        };
        assert_eq!(segment_midpoints(&[segment]), vec![pos2(10.0, 10.0)]);
        assert_eq!(segment.to_svg_path(), "M0,0 C10,0 10,20 20,20");
    }
}
