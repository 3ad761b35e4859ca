//! Read-only workflow snapshot consumed by the geometry components.
//!
//! The snapshot is owned by whoever embeds the canvas. Geometry code only
//! borrows it; the state owner mutates it (for example with
//! [`Workflow::apply_move`]) once a change has been committed.

mod demo;
mod parse;

use std::collections::HashMap;

use eframe::egui::{Pos2, Rect, Vec2};

pub use demo::demo_workflow;
pub use parse::{load_workflow, parse_workflow};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortSide {
    In,
    Out,
}

impl PortSide {
    pub fn is_out(self) -> bool {
        matches!(self, Self::Out)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    /// Top-left corner in canvas units.
    pub position: Pos2,
    pub in_ports: usize,
    pub out_ports: usize,
    pub is_metanode: bool,
}

impl Node {
    pub fn port_count(&self, side: PortSide) -> usize {
        match side {
            PortSide::In => self.in_ports,
            PortSide::Out => self.out_ports,
        }
    }

    pub fn footprint(&self, node_size: f32) -> Rect {
        Rect::from_min_size(self.position, Vec2::splat(node_size))
    }
}

/// What a port hangs off: a node, or one of the metanode port bars.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PortOwner {
    Node(String),
    Bar(PortSide),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub owner: PortOwner,
    pub index: usize,
}

impl PortRef {
    pub fn node(id: impl Into<String>, index: usize) -> Self {
        Self {
            owner: PortOwner::Node(id.into()),
            index,
        }
    }

    pub fn bar(side: PortSide, index: usize) -> Self {
        Self {
            owner: PortOwner::Bar(side),
            index,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    pub id: String,
    pub source: PortRef,
    pub dest: PortRef,
    pub bendpoints: Vec<Pos2>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub id: String,
    pub bounds: Rect,
}

/// Vertical bar carrying a metanode's ports inside its inner workflow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortBar {
    pub x: f32,
    pub y: f32,
    pub height: f32,
    pub ports: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PortBars {
    pub input: Option<PortBar>,
    pub output: Option<PortBar>,
}

impl PortBars {
    pub fn get(&self, side: PortSide) -> Option<&PortBar> {
        match side {
            PortSide::In => self.input.as_ref(),
            PortSide::Out => self.output.as_ref(),
        }
    }

    fn get_mut(&mut self, side: PortSide) -> Option<&mut PortBar> {
        match side {
            PortSide::In => self.input.as_mut(),
            PortSide::Out => self.output.as_mut(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BendpointId {
    pub connection: String,
    pub index: usize,
}

/// Anything the drag controller can move.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectId {
    Node(String),
    Annotation(String),
    Bendpoint(BendpointId),
    PortBar(PortSide),
}

#[derive(Clone, Debug)]
pub struct Workflow {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    annotations: Vec<Annotation>,
    port_bars: PortBars,
    pub writable: bool,
    pub move_locked: bool,
    node_index: HashMap<String, usize>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), PortBars::default())
    }
}

impl Workflow {
    pub fn new(
        nodes: Vec<Node>,
        connections: Vec<Connection>,
        annotations: Vec<Annotation>,
        port_bars: PortBars,
    ) -> Self {
        let node_index = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();

        Self {
            nodes,
            connections,
            annotations,
            port_bars,
            writable: true,
            move_locked: false,
            node_index,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn port_bars(&self) -> &PortBars {
        &self.port_bars
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).and_then(|&index| self.nodes.get(index))
    }

    pub fn annotation(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.id == id)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|connection| connection.id == id)
    }

    /// Whether pointer gestures may start moving objects.
    pub fn accepts_moves(&self) -> bool {
        self.writable && !self.move_locked
    }

    /// Canvas position of a movable object, used as the drag anchor.
    pub fn object_position(&self, object: &ObjectId) -> Option<Pos2> {
        match object {
            ObjectId::Node(id) => self.node(id).map(|node| node.position),
            ObjectId::Annotation(id) => self.annotation(id).map(|annotation| annotation.bounds.min),
            ObjectId::Bendpoint(bendpoint) => self
                .connection(&bendpoint.connection)
                .and_then(|connection| connection.bendpoints.get(bendpoint.index))
                .copied(),
            ObjectId::PortBar(side) => self
                .port_bars
                .get(*side)
                .map(|bar| Pos2::new(bar.x, bar.y)),
        }
    }

    pub fn add_node(&mut self, node: Node) {
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Inserts a bendpoint before the one currently at `index`; `index` equal
    /// to the bendpoint count appends. Returns `false` for an unknown
    /// connection or an index past the end.
    pub fn insert_bendpoint(&mut self, connection: &str, index: usize, position: Pos2) -> bool {
        match self
            .connections
            .iter_mut()
            .find(|candidate| candidate.id == connection)
        {
            Some(connection) if index <= connection.bendpoints.len() => {
                connection.bendpoints.insert(index, position);
                true
            }
            _ => false,
        }
    }

    /// Translates every listed object by `delta`. Unknown ids are skipped.
    pub fn apply_move(&mut self, objects: &[ObjectId], delta: Vec2) {
        for object in objects {
            match object {
                ObjectId::Node(id) => {
                    if let Some(&index) = self.node_index.get(id)
                        && let Some(node) = self.nodes.get_mut(index)
                    {
                        node.position += delta;
                    }
                }
                ObjectId::Annotation(id) => {
                    if let Some(annotation) = self
                        .annotations
                        .iter_mut()
                        .find(|annotation| &annotation.id == id)
                    {
                        annotation.bounds = annotation.bounds.translate(delta);
                    }
                }
                ObjectId::Bendpoint(bendpoint) => {
                    if let Some(point) = self
                        .connections
                        .iter_mut()
                        .find(|connection| connection.id == bendpoint.connection)
                        .and_then(|connection| connection.bendpoints.get_mut(bendpoint.index))
                    {
                        *point += delta;
                    }
                }
                ObjectId::PortBar(side) => {
                    if let Some(bar) = self.port_bars.get_mut(*side) {
                        bar.x += delta.x;
                        bar.y += delta.y;
                    }
                }
            }
        }
    }

    /// Bounding box of every node footprint and annotation.
    pub fn content_bounds(&self, node_size: f32) -> Option<Rect> {
        self.nodes
            .iter()
            .map(|node| node.footprint(node_size))
            .chain(self.annotations.iter().map(|annotation| annotation.bounds))
            .reduce(|acc, rect| acc.union(rect))
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn node(id: &str, x: f32, y: f32) -> Node {
        Node {
            id: id.to_owned(),
            label: id.to_owned(),
            position: pos2(x, y),
            in_ports: 2,
            out_ports: 2,
            is_metanode: false,
        }
    }

    #[test]
    fn apply_move_translates_every_object_kind() {
        let mut workflow = Workflow::new(
            vec![node("a", 0.0, 0.0), node("b", 100.0, 0.0)],
            vec![Connection {
                id: "c".to_owned(),
                source: PortRef::node("a", 1),
                dest: PortRef::node("b", 1),
                bendpoints: vec![pos2(50.0, 10.0)],
            }],
            vec![Annotation {
                id: "note".to_owned(),
                bounds: Rect::from_min_size(pos2(0.0, 100.0), vec2(40.0, 20.0)),
            }],
            PortBars {
                input: Some(PortBar {
                    x: -50.0,
                    y: 0.0,
                    height: 200.0,
                    ports: 1,
                }),
                output: None,
            },
        );

        workflow.apply_move(
            &[
                ObjectId::Node("a".to_owned()),
                ObjectId::Annotation("note".to_owned()),
                ObjectId::Bendpoint(BendpointId {
                    connection: "c".to_owned(),
                    index: 0,
                }),
                ObjectId::PortBar(PortSide::In),
                ObjectId::Node("missing".to_owned()),
            ],
            vec2(5.0, -5.0),
        );

        assert_eq!(workflow.node("a").unwrap().position, pos2(5.0, -5.0));
        assert_eq!(workflow.node("b").unwrap().position, pos2(100.0, 0.0));
        assert_eq!(
            workflow.annotation("note").unwrap().bounds.min,
            pos2(5.0, 95.0)
        );
        assert_eq!(
            workflow.connection("c").unwrap().bendpoints[0],
            pos2(55.0, 5.0)
        );
        assert_eq!(workflow.port_bars().input.unwrap().x, -45.0);
    }

    #[test]
    fn content_bounds_covers_nodes_and_annotations() {
        let workflow = Workflow::new(
            vec![node("a", 0.0, 0.0), node("b", 100.0, 50.0)],
            Vec::new(),
            vec![Annotation {
                id: "note".to_owned(),
                bounds: Rect::from_min_size(pos2(-20.0, -10.0), vec2(10.0, 10.0)),
            }],
            PortBars::default(),
        );

        let bounds = workflow.content_bounds(32.0).unwrap();
        assert_eq!(bounds.min, pos2(-20.0, -10.0));
        assert_eq!(bounds.max, pos2(132.0, 82.0));
        assert!(Workflow::default().content_bounds(32.0).is_none());
    }

    #[test]
    fn locked_workflow_rejects_moves() {
        let mut workflow = Workflow::default();
        assert!(workflow.accepts_moves());
        workflow.writable = false;
        assert!(!workflow.accepts_moves());
        workflow.writable = true;
        workflow.move_locked = true;
        assert!(!workflow.accepts_moves());
    }

    #[test]
    fn default_and_new_agree_on_flags() {
        let empty = Workflow::new(Vec::new(), Vec::new(), Vec::new(), PortBars::default());
        let default = Workflow::default();
        assert_eq!(default.writable, empty.writable);
        assert_eq!(default.move_locked, empty.move_locked);
    }

    #[test]
    fn insert_bendpoint_keeps_path_order() {
        let mut workflow = Workflow::new(
            vec![node("a", 0.0, 0.0), node("b", 100.0, 0.0)],
            vec![Connection {
                id: "c".to_owned(),
                source: PortRef::node("a", 1),
                dest: PortRef::node("b", 1),
                bendpoints: vec![pos2(50.0, 10.0)],
            }],
            Vec::new(),
            PortBars::default(),
        );

        assert!(workflow.insert_bendpoint("c", 0, pos2(20.0, 40.0)));
        assert!(workflow.insert_bendpoint("c", 2, pos2(80.0, 40.0)));
        assert!(!workflow.insert_bendpoint("c", 5, pos2(0.0, 0.0)));
        assert!(!workflow.insert_bendpoint("missing", 0, pos2(0.0, 0.0)));
        assert_eq!(
            workflow.connection("c").unwrap().bendpoints,
            vec![pos2(20.0, 40.0), pos2(50.0, 10.0), pos2(80.0, 40.0)]
        );
    }
}
