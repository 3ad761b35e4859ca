use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use eframe::egui::{Pos2, Rect, pos2, vec2};
use serde::Deserialize;

use super::{
    Annotation, Connection, Node, PortBar, PortBars, PortOwner, PortRef, PortSide, Workflow,
};

#[derive(Debug, Deserialize)]
struct RawWorkflow {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    connections: Vec<RawConnection>,
    #[serde(default)]
    annotations: Vec<RawAnnotation>,
    #[serde(default)]
    port_bars: RawPortBars,
    #[serde(default = "default_true")]
    writable: bool,
    #[serde(default)]
    move_locked: bool,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: String,
    #[serde(default)]
    label: Option<String>,
    position: [f32; 2],
    #[serde(default)]
    in_ports: usize,
    #[serde(default)]
    out_ports: usize,
    #[serde(default)]
    metanode: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPortRef {
    Node { node: String, port: usize },
    Bar { bar: RawSide, port: usize },
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawSide {
    In,
    Out,
}

#[derive(Debug, Deserialize)]
struct RawConnection {
    id: String,
    source: RawPortRef,
    dest: RawPortRef,
    #[serde(default)]
    bendpoints: Vec<[f32; 2]>,
}

#[derive(Debug, Deserialize)]
struct RawAnnotation {
    id: String,
    bounds: [f32; 4],
}

#[derive(Debug, Default, Deserialize)]
struct RawPortBars {
    #[serde(default, rename = "in")]
    input: Option<RawPortBar>,
    #[serde(default, rename = "out")]
    output: Option<RawPortBar>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct RawPortBar {
    x: f32,
    y: f32,
    height: f32,
    #[serde(default)]
    ports: usize,
}

fn default_true() -> bool {
    true
}

fn point(raw: [f32; 2]) -> Pos2 {
    pos2(raw[0], raw[1])
}

impl From<RawSide> for PortSide {
    fn from(side: RawSide) -> Self {
        match side {
            RawSide::In => Self::In,
            RawSide::Out => Self::Out,
        }
    }
}

impl From<RawPortRef> for PortRef {
    fn from(raw: RawPortRef) -> Self {
        match raw {
            RawPortRef::Node { node, port } => PortRef::node(node, port),
            RawPortRef::Bar { bar, port } => PortRef::bar(bar.into(), port),
        }
    }
}

impl From<RawPortBar> for PortBar {
    fn from(raw: RawPortBar) -> Self {
        Self {
            x: raw.x,
            y: raw.y,
            height: raw.height.max(0.0),
            ports: raw.ports,
        }
    }
}

pub fn parse_workflow(raw: &str) -> Result<Workflow> {
    let parsed: RawWorkflow = serde_json::from_str(raw).context("invalid workflow JSON")?;

    let mut seen = HashSet::with_capacity(parsed.nodes.len());
    let mut nodes = Vec::with_capacity(parsed.nodes.len());
    for raw_node in parsed.nodes {
        if !seen.insert(raw_node.id.clone()) {
            bail!("duplicate node id {:?} in workflow", raw_node.id);
        }

        nodes.push(Node {
            label: raw_node.label.unwrap_or_else(|| raw_node.id.clone()),
            id: raw_node.id,
            position: point(raw_node.position),
            in_ports: raw_node.in_ports,
            out_ports: raw_node.out_ports,
            is_metanode: raw_node.metanode,
        });
    }

    let mut connections = Vec::with_capacity(parsed.connections.len());
    for raw_connection in parsed.connections {
        let connection = Connection {
            id: raw_connection.id,
            source: raw_connection.source.into(),
            dest: raw_connection.dest.into(),
            bendpoints: raw_connection.bendpoints.into_iter().map(point).collect(),
        };

        for end in [&connection.source, &connection.dest] {
            if let PortOwner::Node(node_id) = &end.owner
                && !seen.contains(node_id)
            {
                return Err(anyhow!(
                    "connection {:?} references unknown node {:?}",
                    connection.id,
                    node_id
                ));
            }
        }
        connections.push(connection);
    }

    let annotations = parsed
        .annotations
        .into_iter()
        .map(|raw_annotation| {
            let [x, y, width, height] = raw_annotation.bounds;
            Annotation {
                id: raw_annotation.id,
                bounds: Rect::from_min_size(pos2(x, y), vec2(width.max(0.0), height.max(0.0))),
            }
        })
        .collect();

    let port_bars = PortBars {
        input: parsed.port_bars.input.map(PortBar::from),
        output: parsed.port_bars.output.map(PortBar::from),
    };

    let mut workflow = Workflow::new(nodes, connections, annotations, port_bars);
    workflow.writable = parsed.writable;
    workflow.move_locked = parsed.move_locked;
    Ok(workflow)
}

pub fn load_workflow(path: &Path) -> Result<Workflow> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read workflow snapshot {}", path.display()))?;
    parse_workflow(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "nodes": [
            {"id": "reader", "label": "CSV Reader", "position": [0, 0], "in_ports": 1, "out_ports": 2},
            {"id": "inner", "position": [100, 40], "in_ports": 2, "out_ports": 1, "metanode": true}
        ],
        "connections": [
            {"id": "c1", "source": {"node": "reader", "port": 1},
             "dest": {"node": "inner", "port": 0}, "bendpoints": [[60, 10], [80, 30]]},
            {"id": "c2", "source": {"bar": "in", "port": 0}, "dest": {"node": "reader", "port": 0}}
        ],
        "annotations": [{"id": "a1", "bounds": [-10, -10, 200, 100]}],
        "port_bars": {"in": {"x": -100, "y": 0, "height": 300, "ports": 2}},
        "move_locked": true
    }"#;

    #[test]
    fn parses_full_snapshot() {
        let workflow = parse_workflow(SNAPSHOT).unwrap();

        assert_eq!(workflow.nodes().len(), 2);
        assert_eq!(workflow.node("reader").unwrap().label, "CSV Reader");
        assert_eq!(workflow.node("inner").unwrap().label, "inner");
        assert!(workflow.node("inner").unwrap().is_metanode);

        let c1 = workflow.connection("c1").unwrap();
        assert_eq!(c1.bendpoints, vec![pos2(60.0, 10.0), pos2(80.0, 30.0)]);

        let c2 = workflow.connection("c2").unwrap();
        assert_eq!(c2.source.owner, PortOwner::Bar(PortSide::In));

        assert_eq!(
            workflow.annotation("a1").unwrap().bounds,
            Rect::from_min_size(pos2(-10.0, -10.0), vec2(200.0, 100.0))
        );
        assert_eq!(workflow.port_bars().input.unwrap().ports, 2);
        assert!(workflow.port_bars().output.is_none());
        assert!(workflow.writable);
        assert!(workflow.move_locked);
    }

    #[test]
    fn rejects_dangling_connection() {
        let raw = r#"{
            "nodes": [{"id": "a", "position": [0, 0]}],
            "connections": [{"id": "c", "source": {"node": "a", "port": 1},
                             "dest": {"node": "ghost", "port": 1}}]
        }"#;
        let error = parse_workflow(raw).unwrap_err();
        assert!(error.to_string().contains("ghost"));
    }

    #[test]
    fn rejects_duplicate_node_ids() {
        let raw = r#"{"nodes": [{"id": "a", "position": [0, 0]}, {"id": "a", "position": [1, 1]}]}"#;
        assert!(parse_workflow(raw).is_err());
    }
}
