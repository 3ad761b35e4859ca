//! Pointer-driven interaction on top of the geometry layer.

mod drag;

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use eframe::egui::Vec2;

use crate::geometry::MovingParts;
use crate::workflow::{Connection, ObjectId, PortOwner};

pub use drag::{DragController, DragError, DragOutcome, DragPhase, MoveCommands};

/// Finished move handed to the external command layer.
#[derive(Clone, Debug, PartialEq)]
pub struct MoveIntent {
    pub objects: Vec<ObjectId>,
    pub delta: Vec2,
}

/// Admits at most one evaluation per rendered frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameGate {
    last_frame: Option<u64>,
}

impl FrameGate {
    pub fn admit(&mut self, frame: u64) -> bool {
        if self.last_frame == Some(frame) {
            return false;
        }
        self.last_frame = Some(frame);
        true
    }

    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

/// Cancellation flag shared between the active gesture and event handlers
/// that may fire while a commit is awaited (window blur, Escape, lost
/// pointer capture).
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Rc<Cell<bool>>);

impl AbortHandle {
    pub fn raise(&self) {
        self.0.set(true);
    }

    pub fn is_raised(&self) -> bool {
        self.0.get()
    }

    fn clear(&self) {
        self.0.set(false);
    }
}

/// Parts of `connection` that follow a move preview of `moving` objects.
pub fn connector_moving_parts(connection: &Connection, moving: &HashSet<ObjectId>) -> MovingParts {
    let owner_moves = |owner: &PortOwner| match owner {
        PortOwner::Node(id) => moving.contains(&ObjectId::Node(id.clone())),
        PortOwner::Bar(side) => moving.contains(&ObjectId::PortBar(*side)),
    };

    let bendpoints = moving
        .iter()
        .filter_map(|object| match object {
            ObjectId::Bendpoint(bendpoint) if bendpoint.connection == connection.id => {
                Some(bendpoint.index)
            }
            _ => None,
        })
        .collect();

    MovingParts {
        start: owner_moves(&connection.source.owner),
        end: owner_moves(&connection.dest.owner),
        bendpoints,
        virtual_bendpoint: None,
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::workflow::{BendpointId, PortRef, PortSide};

    #[test]
    fn frame_gate_admits_once_per_frame() {
        let mut gate = FrameGate::default();
        assert!(gate.admit(1));
        assert!(!gate.admit(1));
        assert!(gate.admit(2));
        gate.reset();
        assert!(gate.admit(2));
    }

    #[test]
    fn abort_handle_is_shared() {
        let handle = AbortHandle::default();
        let clone = handle.clone();
        clone.raise();
        assert!(handle.is_raised());
        handle.clear();
        assert!(!clone.is_raised());
    }

    #[test]
    fn moving_parts_follow_selection() {
        let connection = Connection {
            id: "c".to_owned(),
            source: PortRef::bar(PortSide::In, 0),
            dest: PortRef::node("b", 1),
            bendpoints: vec![pos2(0.0, 0.0), pos2(1.0, 1.0)],
        };
        let moving = HashSet::from([
            ObjectId::PortBar(PortSide::In),
            ObjectId::Bendpoint(BendpointId {
                connection: "c".to_owned(),
                index: 1,
            }),
            ObjectId::Bendpoint(BendpointId {
                connection: "other".to_owned(),
                index: 0,
            }),
        ]);

        let parts = connector_moving_parts(&connection, &moving);
        assert!(parts.start);
        assert!(!parts.end);
        assert_eq!(parts.bendpoints.into_iter().collect::<Vec<_>>(), vec![1]);
    }
}
