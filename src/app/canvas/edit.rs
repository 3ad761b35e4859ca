use std::collections::HashSet;

use eframe::egui::{Rect, vec2};
use tracing::info;
use workflow_canvas::geometry::{around_point_with_fallback, paste_offset, snap_point};
use workflow_canvas::workflow::{Node, ObjectId};

use super::super::ViewModel;

impl ViewModel {
    /// Canvas area shown by the last rendered frame.
    fn visible_frame(&self) -> Rect {
        if self.canvas_rect.is_positive() {
            self.space.screen_rect_to_canvas(self.canvas_rect)
        } else {
            self.space.visible_area(vec2(800.0, 600.0))
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        loop {
            self.next_node_number += 1;
            let id = format!("{prefix}-{}", self.next_node_number);
            if self.workflow.node(&id).is_none() {
                return id;
            }
        }
    }

    pub(in crate::app) fn add_node_in_view(&mut self) {
        let visible = self.visible_frame();
        let size = vec2(self.config.node_size, self.config.node_size);
        let start = snap_point(visible.center() - size / 2.0, self.config.grid_size);
        let placement = around_point_with_fallback(
            &self.config,
            start,
            size,
            visible,
            self.workflow.nodes(),
            &mut self.rng,
        );

        let id = self.next_id("node");
        info!(%id, position = ?placement.position, fallback = placement.used_fallback, "node added");
        self.workflow.add_node(Node {
            id: id.clone(),
            label: format!("Node {}", self.next_node_number),
            position: placement.position,
            in_ports: 2,
            out_ports: 2,
            is_metanode: false,
        });
        self.selection = HashSet::from([ObjectId::Node(id)]);
        self.status = Some(if placement.used_fallback {
            "no free space in view, node placed near the center".to_owned()
        } else {
            format!("node added ({:.0}% visible)", placement.visibility * 100.0)
        });
    }

    pub(in crate::app) fn duplicate_selection(&mut self) {
        let node_size = self.config.node_size;
        let copies = self
            .workflow
            .nodes()
            .iter()
            .filter(|node| self.selection.contains(&ObjectId::Node(node.id.clone())))
            .cloned()
            .collect::<Vec<_>>();
        let Some(group) = copies
            .iter()
            .map(|node| node.footprint(node_size))
            .reduce(|acc, rect| acc.union(rect))
        else {
            self.status = Some("select nodes to duplicate".to_owned());
            return;
        };

        let step = self.config.placement_step();
        let offset = paste_offset(
            &self.config,
            group,
            group.min + vec2(step, step),
            self.visible_frame(),
            self.workflow.nodes(),
            &mut self.rng,
        );

        self.selection.clear();
        let count = copies.len();
        for node in copies {
            let id = self.next_id(&node.id);
            self.workflow.add_node(Node {
                id: id.clone(),
                position: node.position + offset,
                ..node
            });
            self.selection.insert(ObjectId::Node(id));
        }
        info!(count, ?offset, "selection duplicated");
        self.status = Some(format!("duplicated {count} node(s)"));
    }
}
