use eframe::egui::{Pos2, Rect, pos2, vec2};
use workflow_canvas::geometry::{
    ConnectorRequest, build_connector_path, connection_request, segment_midpoints,
};
use workflow_canvas::workflow::{Connection, ObjectId, PortBar, PortOwner, PortSide};

use super::ViewModel;

mod edit;
mod interaction;
mod view;

/// Width of a port bar body in canvas units.
const PORT_BAR_WIDTH: f32 = 10.0;

/// Screen radius of an "add bendpoint" handle, also its pick radius.
const INSERTION_HANDLE_RADIUS: f32 = 4.0;

/// Body of a port bar. Ports sit on the edge facing the workflow, so the
/// input bar extends to the left of its anchor and the output bar to the right.
fn port_bar_rect(bar: &PortBar, side: PortSide) -> Rect {
    let left = match side {
        PortSide::In => bar.x - PORT_BAR_WIDTH,
        PortSide::Out => bar.x,
    };
    Rect::from_min_size(pos2(left, bar.y), vec2(PORT_BAR_WIDTH, bar.height))
}

/// "Add bendpoint" handle: drop a bendpoint into slot `index` of `connection`.
#[derive(Clone, Debug, PartialEq)]
struct InsertionHandle {
    connection: String,
    index: usize,
    position: Pos2,
}

impl ViewModel {
    fn connector_request<'a>(&self, connection: &'a Connection) -> Option<ConnectorRequest<'a>> {
        connection_request(&self.config, &self.workflow, connection)
    }

    /// Whether `connection` shows its insertion handles: one of its owners is
    /// selected and no gesture is running.
    fn shows_insertion_handles(&self, connection: &Connection) -> bool {
        if self.drag.is_dragging() || self.insertion.is_some() || !self.workflow.accepts_moves() {
            return false;
        }
        [&connection.source.owner, &connection.dest.owner]
            .into_iter()
            .any(|owner| {
                let object = match owner {
                    PortOwner::Node(id) => ObjectId::Node(id.clone()),
                    PortOwner::Bar(side) => ObjectId::PortBar(*side),
                };
                self.selection.contains(&object)
            })
    }

    fn insertion_handles(&self) -> Vec<InsertionHandle> {
        self.workflow
            .connections()
            .iter()
            .filter(|connection| self.shows_insertion_handles(connection))
            .filter_map(|connection| {
                let request = self.connector_request(connection)?;
                let midpoints = segment_midpoints(&build_connector_path(&self.config, &request));
                Some(
                    midpoints
                        .into_iter()
                        .enumerate()
                        .map(|(index, position)| InsertionHandle {
                            connection: connection.id.clone(),
                            index,
                            position,
                        })
                        .collect::<Vec<_>>(),
                )
            })
            .flatten()
            .collect()
    }
}
