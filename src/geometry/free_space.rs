use eframe::egui::{Pos2, Rect, Vec2, vec2};
use rand::Rng;
use tracing::{debug, warn};

use super::overlap_area;
use crate::config::CanvasConfig;
use crate::workflow::Node;

/// Where new content ended up and how much of it is on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Pos2,
    /// Fraction of the target rectangle inside the visible frame, `0..=1`.
    pub visibility: f32,
    pub used_fallback: bool,
}

fn padded_footprints(config: &CanvasConfig, nodes: &[Node]) -> Vec<Rect> {
    nodes
        .iter()
        .map(|node| node.footprint(config.node_size).expand(config.node_padding))
        .collect()
}

fn total_overlap(candidate: Rect, obstacles: &[Rect]) -> f32 {
    obstacles
        .iter()
        .map(|obstacle| overlap_area(candidate, *obstacle))
        .sum()
}

/// Fraction of `target` covered by `frame`.
pub fn visible_fraction(target: Rect, frame: Rect) -> f32 {
    let area = target.area();
    if area <= 0.0 {
        return if frame.contains(target.min) { 1.0 } else { 0.0 };
    }
    (overlap_area(target, frame) / area).clamp(0.0, 1.0)
}

/// Walks from `from` along `step` until a rectangle of `size` no longer
/// overlaps any padded node footprint.
///
/// Terminates for any finite node set: every obstacle is eventually left
/// behind. A degenerate step is replaced by one padded node height downward.
/// Far out on the canvas a step can be smaller than the float spacing; the
/// walk then jumps straight past the obstacles along the step's main axis.
pub fn find_free_space(
    config: &CanvasConfig,
    size: Vec2,
    from: Pos2,
    step: Vec2,
    nodes: &[Node],
) -> Pos2 {
    let step = if step.is_finite() && step.length() >= 0.5 {
        step
    } else {
        warn!(?step, "degenerate free-space step, walking downward instead");
        vec2(0.0, config.placement_step())
    };

    let obstacles = padded_footprints(config, nodes);
    let mut candidate = Rect::from_min_size(from, size.max(Vec2::ZERO));
    while total_overlap(candidate, &obstacles) > 0.0 {
        let next = candidate.translate(step);
        if next.min == candidate.min {
            warn!(position = ?candidate.min, ?step, "free-space step lost to float precision");
            return beyond_obstacles(candidate, step, &obstacles);
        }
        candidate = next;
    }
    candidate.min
}

fn beyond_obstacles(candidate: Rect, step: Vec2, obstacles: &[Rect]) -> Pos2 {
    let Some(blocked) = obstacles.iter().copied().reduce(Rect::union) else {
        return candidate.min;
    };

    let mut position = candidate.min;
    if step.y.abs() >= step.x.abs() {
        position.y = if step.y >= 0.0 {
            blocked.max.y
        } else {
            blocked.min.y - candidate.height()
        };
    } else {
        position.x = if step.x >= 0.0 {
            blocked.max.x
        } else {
            blocked.min.x - candidate.width()
        };
    }
    position
}

fn horizontal_offsets(step: f32, limit: f32) -> impl Iterator<Item = f32> {
    let rings = if step > 0.0 {
        (limit / step).floor().max(0.0) as i32
    } else {
        0
    };
    std::iter::once(0.0).chain((1..=rings).flat_map(move |ring| {
        let offset = ring as f32 * step;
        [offset, -offset]
    }))
}

/// Finds a spot for new content near `start` that is mostly on screen.
///
/// Horizontal offsets are tried outward from `start` (right before left) up
/// to the width of `visible_frame`; from each one the free-space walk runs
/// downward. The first result whose visibility reaches
/// `config.min_visibility` wins. When none does, a random position near
/// `start` is returned so the caller always gets something usable.
pub fn around_point_with_fallback(
    config: &CanvasConfig,
    start: Pos2,
    size: Vec2,
    visible_frame: Rect,
    nodes: &[Node],
    rng: &mut impl Rng,
) -> Placement {
    let step = config.placement_step();
    let downward = vec2(0.0, step);

    for offset in horizontal_offsets(step, visible_frame.width()) {
        let position = find_free_space(config, size, start + vec2(offset, 0.0), downward, nodes);
        let visibility = visible_fraction(Rect::from_min_size(position, size), visible_frame);
        if visibility >= config.min_visibility {
            debug!(?position, offset, visibility, "found free space");
            return Placement {
                position,
                visibility,
                used_fallback: false,
            };
        }
    }

    let jitter = vec2(rng.gen_range(-step..=step), rng.gen_range(-step..=step));
    let position = start + jitter;
    let visibility = visible_fraction(Rect::from_min_size(position, size), visible_frame);
    debug!(?position, visibility, "no visible free space, using random fallback");
    Placement {
        position,
        visibility,
        used_fallback: true,
    }
}

/// Translation that moves a pasted group with bounds `group` into free space
/// near `preferred`.
pub fn paste_offset(
    config: &CanvasConfig,
    group: Rect,
    preferred: Pos2,
    visible_frame: Rect,
    nodes: &[Node],
    rng: &mut impl Rng,
) -> Vec2 {
    let placement =
        around_point_with_fallback(config, preferred, group.size(), visible_frame, nodes, rng);
    placement.position - group.min
}
