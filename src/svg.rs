//! Static SVG rendering of a workflow snapshot.
//!
//! A second backend next to the eframe viewer. Both go through the same
//! geometry calls, so curves and port positions match exactly.

use std::fmt::Write as _;

use eframe::egui::{Rect, pos2, vec2};

use crate::config::CanvasConfig;
use crate::geometry::{
    PathSegment, build_connector_path, connection_request, connector_bounds,
    port_bar_port_position, port_shift,
};
use crate::workflow::{PortSide, Workflow};

const PADDING: f32 = 20.0;

const STYLE: &str = r#"<style>
.annotation { fill: #ffd800; fill-opacity: 0.27; stroke: #dcbe28; stroke-width: 1; }
.port-bar { stroke: #c8c8c8; stroke-width: 10; }
.connector { fill: none; stroke: #464646; stroke-width: 1.5; }
.node { fill: #ecbe54; }
.metanode { fill: #a4b0be; }
.port { fill: #2d3138; }
.label { fill: #1e1e1e; font-family: sans-serif; font-size: 12px; text-anchor: middle; }
</style>
"#;

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn path_data(segments: &[PathSegment]) -> String {
    segments
        .iter()
        .map(PathSegment::to_svg_path)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders `workflow` as a standalone SVG document sized to its content.
pub fn render_svg(config: &CanvasConfig, workflow: &Workflow) -> String {
    let connectors = workflow
        .connections()
        .iter()
        .filter_map(|connection| {
            let request = connection_request(config, workflow, connection)?;
            Some((connection.id.as_str(), build_connector_path(config, &request)))
        })
        .collect::<Vec<_>>();

    let bars = [PortSide::In, PortSide::Out]
        .into_iter()
        .filter_map(|side| workflow.port_bars().get(side).map(|bar| (side, *bar)))
        .collect::<Vec<_>>();

    let bounds = workflow
        .content_bounds(config.node_size)
        .into_iter()
        .chain(connectors.iter().map(|(_, segments)| connector_bounds(segments)))
        .chain(bars.iter().map(|(_, bar)| {
            Rect::from_min_size(pos2(bar.x, bar.y), vec2(0.0, bar.height)).expand(config.port_size)
        }))
        .reduce(Rect::union)
        .unwrap_or_else(|| Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0)))
        .expand(PADDING);

    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        bounds.min.x,
        bounds.min.y,
        bounds.width(),
        bounds.height()
    );
    out.push_str(STYLE);

    out.push_str(r#"<g class="annotations">"#);
    for annotation in workflow.annotations() {
        let rect = annotation.bounds;
        let _ = write!(
            &mut out,
            r#"<rect class="annotation" x="{}" y="{}" width="{}" height="{}" />"#,
            rect.min.x,
            rect.min.y,
            rect.width(),
            rect.height()
        );
    }
    out.push_str("</g>\n");

    out.push_str(r#"<g class="port-bars">"#);
    for (side, bar) in &bars {
        let _ = write!(
            &mut out,
            r#"<line class="port-bar" x1="{x}" y1="{}" x2="{x}" y2="{}" />"#,
            bar.y,
            bar.y + bar.height,
            x = bar.x,
        );
        for index in 0..bar.ports {
            let center = port_bar_port_position(config, bar, *side, index);
            let _ = write!(
                &mut out,
                r#"<circle class="port" cx="{}" cy="{}" r="{}" />"#,
                center.x,
                center.y,
                config.port_size / 2.0
            );
        }
    }
    out.push_str("</g>\n");

    out.push_str(r#"<g class="connectors">"#);
    for (id, segments) in &connectors {
        let _ = write!(
            &mut out,
            r#"<path class="connector" data-id="{}" d="{}" />"#,
            escape_xml(id),
            path_data(segments)
        );
    }
    out.push_str("</g>\n");

    out.push_str(r#"<g class="nodes">"#);
    for node in workflow.nodes() {
        let class = if node.is_metanode { "metanode" } else { "node" };
        let _ = write!(
            &mut out,
            r#"<rect class="{class}" data-id="{}" x="{}" y="{}" width="{size}" height="{size}" rx="4" />"#,
            escape_xml(&node.id),
            node.position.x,
            node.position.y,
            size = config.node_size,
        );
        for side in [PortSide::In, PortSide::Out] {
            let count = node.port_count(side);
            for index in 0..count {
                let center =
                    node.position + port_shift(config, index, count, node.is_metanode, side.is_out());
                let _ = write!(
                    &mut out,
                    r#"<circle class="port" cx="{}" cy="{}" r="{}" />"#,
                    center.x,
                    center.y,
                    config.port_size / 2.0
                );
            }
        }
        let _ = write!(
            &mut out,
            r#"<text class="label" x="{}" y="{}">{}</text>"#,
            node.position.x + config.node_size / 2.0,
            node.position.y + config.node_size + 16.0,
            escape_xml(&node.label)
        );
    }
    out.push_str("</g>\n");

    out.push_str("</svg>\n");
    out
}
