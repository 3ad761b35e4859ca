//! Port placement on node shapes and metanode port bars.

use eframe::egui::{Pos2, Vec2, pos2, vec2};

use super::connector::{ConnectorEnd, ConnectorRequest, EndpointBias};
use crate::config::CanvasConfig;
use crate::workflow::{Connection, PortBar, PortOwner, PortRef, PortSide, Workflow};

const MIN_PLACEHOLDER_SLOTS: usize = 4;
const MIN_METANODE_PLACEHOLDER_SLOTS: usize = 3;

/// Offset from a node's top-left corner to the center of one of its ports.
///
/// Index 0 of a regular node is the flow-control port, drawn flush with the
/// top edge. Metanodes have no such port, so their indices are shifted by one
/// before the shared layout is applied.
pub fn port_shift(
    config: &CanvasConfig,
    port_index: usize,
    port_count: usize,
    is_metanode: bool,
    is_out_port: bool,
) -> Vec2 {
    let node_size = config.node_size;
    let port_size = config.port_size;
    let x = if is_out_port {
        node_size + port_size / 2.0
    } else {
        -port_size / 2.0
    };

    let (port_index, port_count) = if is_metanode {
        (port_index + 1, port_count + 1)
    } else {
        (port_index, port_count)
    };

    if port_index == 0 {
        let flush_x = if is_out_port {
            x - port_size / 2.0
        } else {
            x + port_size / 2.0
        };
        return vec2(flush_x, -port_size / 2.0);
    }

    let middle_y = node_size / 2.0;
    if port_count == 2 {
        return vec2(x, middle_y);
    }

    // the centered slot stays free for a second side port
    let port_index = if port_count == 3 && port_index == 2 { 3 } else { port_index };
    let slot = port_index as f32 - 2.0;
    vec2(x, middle_y + slot * (port_size + config.port_margin))
}

/// Offset of the "add port" affordance below the existing ports.
pub fn placeholder_position(
    config: &CanvasConfig,
    port_count: usize,
    is_out_port: bool,
    is_metanode: bool,
) -> Vec2 {
    let reserved = if is_metanode {
        MIN_METANODE_PLACEHOLDER_SLOTS
    } else {
        MIN_PLACEHOLDER_SLOTS
    };
    let slot = port_count.max(reserved);
    port_shift(config, slot, slot + 1, is_metanode, is_out_port)
}

/// Center of port `index` on a metanode port bar.
///
/// Ports are spread evenly over the bar height. The input bar exposes its
/// ports on its right edge (they feed inner nodes), the output bar on its
/// left edge.
pub fn port_bar_port_position(
    config: &CanvasConfig,
    bar: &PortBar,
    side: PortSide,
    index: usize,
) -> Pos2 {
    let x = match side {
        PortSide::In => bar.x + config.port_size / 2.0,
        PortSide::Out => bar.x - config.port_size / 2.0,
    };
    let count = bar.ports.max(index + 1) as f32;
    let y = bar.y + bar.height * (index as f32 + 1.0) / (count + 1.0);
    pos2(x, y)
}

/// Absolute canvas position of a connection endpoint.
///
/// `side` is the side of the port on its owner: a connection source is an
/// output port of its node, a destination an input port. Port-bar ends are
/// looked up on the bar named by the reference.
pub fn port_position(
    config: &CanvasConfig,
    workflow: &Workflow,
    port: &PortRef,
    side: PortSide,
) -> Option<Pos2> {
    match &port.owner {
        PortOwner::Node(id) => {
            let node = workflow.node(id)?;
            let shift = port_shift(
                config,
                port.index,
                node.port_count(side),
                node.is_metanode,
                side.is_out(),
            );
            Some(node.position + shift)
        }
        PortOwner::Bar(bar_side) => {
            let bar = workflow.port_bars().get(*bar_side)?;
            Some(port_bar_port_position(config, bar, *bar_side, port.index))
        }
    }
}

/// Layout request for `connection` at rest, with both ends resolved.
///
/// Ends on a port bar are biased: bar ports are drawn on the bar edge, so the
/// curve is pulled further in there. `None` when an end cannot be resolved.
pub fn connection_request<'a>(
    config: &CanvasConfig,
    workflow: &Workflow,
    connection: &'a Connection,
) -> Option<ConnectorRequest<'a>> {
    let start = port_position(config, workflow, &connection.source, PortSide::Out)?;
    let end = port_position(config, workflow, &connection.dest, PortSide::In)?;
    let bias = EndpointBias {
        start: matches!(connection.source.owner, PortOwner::Bar(_)),
        end: matches!(connection.dest.owner, PortOwner::Bar(_)),
    };

    Some(
        ConnectorRequest::new(ConnectorEnd::Port(start), ConnectorEnd::Port(end))
            .with_bendpoints(&connection.bendpoints)
            .with_bias(bias),
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::workflow::{Node, PortBars};

    fn config() -> CanvasConfig {
        CanvasConfig::default()
    }

    #[test]
    fn flow_port_sits_flush_on_top() {
        let config = config();
        assert_eq!(port_shift(&config, 0, 3, false, false), vec2(0.0, -4.5));
        assert_eq!(port_shift(&config, 0, 3, false, true), vec2(32.0, -4.5));
    }

    #[test]
    fn single_data_port_is_centered() {
        let config = config();
        assert_eq!(port_shift(&config, 1, 2, false, false), vec2(-4.5, 16.0));
        assert_eq!(port_shift(&config, 1, 2, false, true), vec2(36.5, 16.0));
    }

    #[test]
    fn two_data_ports_fan_out_symmetrically() {
        let config = config();
        assert_eq!(port_shift(&config, 1, 3, false, false).y, 5.5);
        assert_eq!(port_shift(&config, 2, 3, false, false).y, 26.5);
    }

    #[test]
    fn three_data_ports_use_the_center_slot() {
        let config = config();
        let ys = (1..4)
            .map(|index| port_shift(&config, index, 4, false, true).y)
            .collect::<Vec<_>>();
        assert_eq!(ys, vec![5.5, 16.0, 26.5]);
    }

    #[test]
    fn metanode_ports_shift_by_one_slot() {
        let config = config();
        // a metanode with one port behaves like a regular node's first data port
        assert_eq!(
            port_shift(&config, 0, 1, true, false),
            port_shift(&config, 1, 2, false, false)
        );
        assert_eq!(port_shift(&config, 1, 2, true, true).y, 26.5);
    }

    #[test]
    fn placeholder_never_overlaps_existing_ports() {
        let config = config();
        for count in 1..8 {
            let placeholder = placeholder_position(&config, count, true, false);
            for index in 0..count {
                let port = port_shift(&config, index, count, false, true);
                assert!(
                    (placeholder.y - port.y).abs() >= config.port_size,
                    "placeholder overlaps port {index} of {count}"
                );
            }
        }
    }

    #[test]
    fn placeholder_grows_linearly_after_reserved_slots() {
        let config = config();
        let step = config.port_size + config.port_margin;
        assert_eq!(placeholder_position(&config, 1, false, false).y, 37.0);
        assert_eq!(placeholder_position(&config, 4, false, false).y, 37.0);
        assert_eq!(placeholder_position(&config, 5, false, false).y, 37.0 + step);
        assert_eq!(placeholder_position(&config, 0, false, true).y, 37.0);
        assert_eq!(placeholder_position(&config, 4, false, true).y, 37.0 + step);
    }

    #[test]
    fn port_bar_spreads_ports_evenly() {
        let config = config();
        let bar = PortBar {
            x: -100.0,
            y: 0.0,
            height: 300.0,
            ports: 2,
        };
        assert_eq!(
            port_bar_port_position(&config, &bar, PortSide::In, 0),
            pos2(-95.5, 100.0)
        );
        assert_eq!(
            port_bar_port_position(&config, &bar, PortSide::Out, 1),
            pos2(-104.5, 200.0)
        );
    }

    #[test]
    fn resolves_absolute_port_positions() {
        let config = config();
        let workflow = Workflow::new(
            vec![Node {
                id: "n".to_owned(),
                label: "n".to_owned(),
                position: pos2(100.0, 50.0),
                in_ports: 2,
                out_ports: 2,
                is_metanode: false,
            }],
            Vec::new(),
            Vec::new(),
            PortBars::default(),
        );

        assert_eq!(
            port_position(&config, &workflow, &PortRef::node("n", 1), PortSide::Out),
            Some(pos2(136.5, 66.0))
        );
        assert_eq!(
            port_position(&config, &workflow, &PortRef::bar(PortSide::In, 0), PortSide::Out),
            None
        );
    }

    #[test]
    fn connection_request_biases_bar_ends_only() {
        let config = config();
        let bar = PortBar {
            x: -100.0,
            y: 0.0,
            height: 300.0,
            ports: 1,
        };
        let workflow = Workflow::new(
            vec![Node {
                id: "n".to_owned(),
                label: "n".to_owned(),
                position: pos2(100.0, 50.0),
                in_ports: 2,
                out_ports: 2,
                is_metanode: false,
            }],
            Vec::new(),
            Vec::new(),
            PortBars {
                input: Some(bar),
                output: None,
            },
        );
        let connection = Connection {
            id: "c".to_owned(),
            source: PortRef::bar(PortSide::In, 0),
            dest: PortRef::node("n", 1),
            bendpoints: vec![pos2(20.0, 80.0)],
        };

        let request = connection_request(&config, &workflow, &connection).unwrap();
        assert_eq!(request.start, ConnectorEnd::Port(pos2(-95.5, 150.0)));
        assert_eq!(request.end, ConnectorEnd::Port(pos2(95.5, 66.0)));
        assert_eq!(request.bendpoints, &[pos2(20.0, 80.0)]);
        assert_eq!(
            request.bias,
            EndpointBias {
                start: true,
                end: false,
            }
        );

        let dangling = Connection {
            dest: PortRef::node("ghost", 1),
            ..connection
        };
        assert!(connection_request(&config, &workflow, &dangling).is_none());
    }

    proptest! {
        #[test]
        fn flow_port_offset_is_constant(count in 1usize..64, is_out in any::<bool>()) {
            let config = config();
            prop_assert_eq!(port_shift(&config, 0, count, false, is_out).y, -config.port_size / 2.0);
        }

        #[test]
        fn inputs_mirror_outputs(
            count in 1usize..32,
            index_seed in 0usize..32,
            is_metanode in any::<bool>(),
        ) {
            let config = config();
            let index = index_seed % count;
            let input = port_shift(&config, index, count, is_metanode, false);
            let output = port_shift(&config, index, count, is_metanode, true);
            let center = config.node_size / 2.0;
            assert_abs_diff_eq!(center - input.x, output.x - center);
            prop_assert_eq!(input.y, output.y);
        }
    }
}
