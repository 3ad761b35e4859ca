use eframe::egui::{Rect, pos2, vec2};

use super::{Annotation, Connection, Node, PortBar, PortBars, PortRef, PortSide, Workflow};

const COLUMN_SPACING: f32 = 140.0;
const ROW_SPACING: f32 = 90.0;

fn node(id: &str, label: &str, column: usize, row: usize, in_ports: usize, out_ports: usize) -> Node {
    Node {
        id: id.to_owned(),
        label: label.to_owned(),
        position: pos2(column as f32 * COLUMN_SPACING, row as f32 * ROW_SPACING),
        in_ports,
        out_ports,
        is_metanode: false,
    }
}

fn connect(id: &str, source: PortRef, dest: PortRef) -> Connection {
    Connection {
        id: id.to_owned(),
        source,
        dest,
        bendpoints: Vec::new(),
    }
}

/// Small metanode interior used when the viewer starts without a snapshot.
pub fn demo_workflow() -> Workflow {
    let mut joiner = node("join", "Joiner", 2, 1, 3, 2);
    joiner.position += vec2(0.0, 10.0);
    let mut aggregate = node("meta", "Aggregate", 3, 2, 1, 2);
    aggregate.is_metanode = true;

    let nodes = vec![
        node("read", "CSV Reader", 0, 0, 2, 2),
        node("filter", "Row Filter", 1, 0, 2, 2),
        node("lookup", "Table Reader", 1, 2, 1, 2),
        joiner,
        aggregate,
        node("write", "CSV Writer", 4, 1, 2, 1),
    ];

    let mut detour = connect("lookup-join", PortRef::node("lookup", 1), PortRef::node("join", 2));
    detour.bendpoints = vec![pos2(220.0, 250.0), pos2(250.0, 130.0)];

    let connections = vec![
        connect("bar-read", PortRef::bar(PortSide::In, 0), PortRef::node("read", 1)),
        connect("read-filter", PortRef::node("read", 1), PortRef::node("filter", 1)),
        connect("filter-join", PortRef::node("filter", 1), PortRef::node("join", 1)),
        detour,
        connect("join-meta", PortRef::node("join", 1), PortRef::node("meta", 0)),
        connect("join-write", PortRef::node("join", 1), PortRef::node("write", 1)),
        connect("meta-bar", PortRef::node("meta", 1), PortRef::bar(PortSide::Out, 0)),
        connect("write-bar", PortRef::node("write", 0), PortRef::bar(PortSide::Out, 1)),
    ];

    let annotations = vec![Annotation {
        id: "inputs".to_owned(),
        bounds: Rect::from_min_size(pos2(-30.0, -40.0), vec2(220.0, 100.0)),
    }];

    let port_bars = PortBars {
        input: Some(PortBar {
            x: -120.0,
            y: -40.0,
            height: 320.0,
            ports: 1,
        }),
        output: Some(PortBar {
            x: 700.0,
            y: -40.0,
            height: 320.0,
            ports: 2,
        }),
    };

    Workflow::new(nodes, connections, annotations, port_bars)
}
