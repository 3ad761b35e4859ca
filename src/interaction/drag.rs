use std::future::Future;

use eframe::egui::{Pos2, Vec2, vec2};
use thiserror::Error;
use tracing::{debug, error, trace};

use super::{AbortHandle, FrameGate, MoveIntent};
use crate::config::CanvasConfig;
use crate::geometry::{CoordinateSpace, snap, snap_point};
use crate::workflow::{ObjectId, Workflow};

/// External command layer that persists finished moves.
pub trait MoveCommands {
    /// Last chance to veto a finished drag; `false` drops the move.
    fn confirm_move(&mut self, intent: &MoveIntent) -> impl Future<Output = bool>;

    fn commit_move(&mut self, intent: &MoveIntent) -> impl Future<Output = anyhow::Result<()>>;
}

#[derive(Debug, Error)]
pub enum DragError {
    #[error("failed to commit move of {count} object(s)")]
    Commit {
        count: usize,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Pending,
    Dragging,
    Committing,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DragOutcome {
    /// No gesture was active.
    Ignored,
    /// Released before the drag threshold was crossed.
    Click,
    Vetoed,
    Aborted,
    Committed(MoveIntent),
}

#[derive(Clone, Debug)]
struct Gesture {
    objects: Vec<ObjectId>,
    start_screen: Pos2,
    latest_screen: Pos2,
    grid_adjustment: Vec2,
    bypass_grid: bool,
    moves_seen: usize,
}

/// Move/drag state machine for one pointer gesture at a time.
///
/// `Idle -> Pending` on press, `Pending -> Dragging` once the pointer leaves
/// the threshold radius, `Dragging -> Committing -> Idle` on release.
#[derive(Debug)]
pub struct DragController {
    config: CanvasConfig,
    phase: DragPhase,
    gesture: Option<Gesture>,
    preview_delta: Vec2,
    frame_gate: FrameGate,
    abort: AbortHandle,
}

impl DragController {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            phase: DragPhase::Idle,
            gesture: None,
            preview_delta: Vec2::ZERO,
            frame_gate: FrameGate::default(),
            abort: AbortHandle::default(),
        }
    }

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    /// True while the move preview replaces normal selection rendering.
    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging | DragPhase::Committing)
    }

    pub fn preview_delta(&self) -> Vec2 {
        self.preview_delta
    }

    pub fn objects(&self) -> &[ObjectId] {
        self.gesture
            .as_ref()
            .map(|gesture| gesture.objects.as_slice())
            .unwrap_or_default()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Starts a gesture on `objects`; the first one anchors grid snapping.
    ///
    /// Returns `false` when a gesture is already active, the workflow is not
    /// writable or move-locked, or the anchor object does not exist.
    pub fn pointer_down(&mut self, workflow: &Workflow, screen: Pos2, objects: Vec<ObjectId>) -> bool {
        if self.phase != DragPhase::Idle {
            debug!(phase = ?self.phase, "ignoring pointer down during active gesture");
            return false;
        }
        if !workflow.accepts_moves() {
            debug!("workflow does not accept moves");
            return false;
        }
        let Some(anchor) = objects
            .first()
            .and_then(|object| workflow.object_position(object))
        else {
            return false;
        };

        let grid_adjustment = snap_point(anchor, self.config.grid_size) - anchor;
        self.abort.clear();
        self.frame_gate.reset();
        self.preview_delta = Vec2::ZERO;
        self.gesture = Some(Gesture {
            objects,
            start_screen: screen,
            latest_screen: screen,
            grid_adjustment,
            bypass_grid: false,
            moves_seen: 0,
        });
        self.phase = DragPhase::Pending;
        debug!(?anchor, ?grid_adjustment, "drag pending");
        true
    }

    /// Feeds a pointer move. Returns the new preview delta when it was
    /// recomputed during this call.
    pub fn pointer_move(
        &mut self,
        space: &CoordinateSpace,
        screen: Pos2,
        bypass_grid: bool,
        frame: u64,
    ) -> Option<Vec2> {
        if self.abort.is_raised() {
            self.reset();
            return None;
        }
        if !matches!(self.phase, DragPhase::Pending | DragPhase::Dragging) {
            return None;
        }

        let gesture = self.gesture.as_mut()?;
        gesture.latest_screen = screen;
        gesture.bypass_grid = bypass_grid;
        gesture.moves_seen += 1;

        if self.phase == DragPhase::Pending {
            // touchpad double taps emit one spurious move right after the press
            if gesture.moves_seen == 1 {
                return None;
            }
            if gesture.start_screen.distance(screen) <= self.config.drag_threshold {
                return None;
            }
            self.phase = DragPhase::Dragging;
            debug!(objects = gesture.objects.len(), "drag started");
        }

        if !self.frame_gate.admit(frame) {
            return None;
        }

        self.preview_delta = self.compute_delta(space);
        trace!(delta = ?self.preview_delta, "move preview");
        Some(self.preview_delta)
    }

    fn compute_delta(&self, space: &CoordinateSpace) -> Vec2 {
        let Some(gesture) = self.gesture.as_ref() else {
            return Vec2::ZERO;
        };

        let raw = space.screen_delta_to_canvas(gesture.latest_screen - gesture.start_screen);
        let step = self.config.snap_step(gesture.bypass_grid);
        vec2(snap(raw.x, step), snap(raw.y, step)) + gesture.grid_adjustment
    }

    /// Finishes the gesture.
    ///
    /// A real drag asks `commands` for confirmation and then commits the
    /// last delta. The controller is back in `Idle` whatever happens; a
    /// failed commit is logged and returned as [`DragError::Commit`]. An
    /// abort raised while the commit is in flight turns a successful commit
    /// into [`DragOutcome::Aborted`], so the caller must not apply it.
    pub async fn pointer_up<C: MoveCommands>(
        &mut self,
        space: &CoordinateSpace,
        screen: Pos2,
        bypass_grid: bool,
        commands: &mut C,
    ) -> Result<DragOutcome, DragError> {
        match self.phase {
            DragPhase::Idle | DragPhase::Committing => return Ok(DragOutcome::Ignored),
            DragPhase::Pending => {
                self.reset();
                return Ok(DragOutcome::Click);
            }
            DragPhase::Dragging => {}
        }

        if self.abort.is_raised() {
            self.reset();
            return Ok(DragOutcome::Aborted);
        }

        let Some(gesture) = self.gesture.as_mut() else {
            self.reset();
            return Ok(DragOutcome::Ignored);
        };
        gesture.latest_screen = screen;
        gesture.bypass_grid = bypass_grid;
        self.preview_delta = self.compute_delta(space);
        self.phase = DragPhase::Committing;

        let intent = MoveIntent {
            objects: self.objects().to_vec(),
            delta: self.preview_delta,
        };

        if !commands.confirm_move(&intent).await {
            debug!("move vetoed");
            self.reset();
            return Ok(DragOutcome::Vetoed);
        }

        if self.abort.is_raised() {
            debug!("drag aborted while awaiting confirmation");
            self.reset();
            return Ok(DragOutcome::Aborted);
        }

        let result = commands.commit_move(&intent).await;
        let aborted = self.abort.is_raised();
        self.reset();
        match result {
            Ok(()) if aborted => {
                debug!("drag aborted while the commit was in flight, dropping result");
                Ok(DragOutcome::Aborted)
            }
            Ok(()) => {
                debug!(delta = ?intent.delta, objects = intent.objects.len(), "move committed");
                Ok(DragOutcome::Committed(intent))
            }
            Err(source) => {
                error!(error = %source, "failed to commit move");
                Err(DragError::Commit {
                    count: intent.objects.len(),
                    source,
                })
            }
        }
    }

    /// Cancels the active gesture without committing anything.
    pub fn abort(&mut self) {
        if self.phase != DragPhase::Idle {
            debug!(phase = ?self.phase, "drag aborted");
        }
        self.abort.raise();
        self.reset();
    }

    fn reset(&mut self) {
        self.phase = DragPhase::Idle;
        self.gesture = None;
        self.preview_delta = Vec2::ZERO;
        self.frame_gate.reset();
    }
}
