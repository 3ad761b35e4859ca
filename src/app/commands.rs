use std::future::{Future, ready};

use anyhow::anyhow;
use eframe::egui::Vec2;
use tracing::info;
use workflow_canvas::interaction::{MoveCommands, MoveIntent};

/// In-process stand-in for the workflow service: it accepts every non-empty
/// move and can be told to fail the next commit.
#[derive(Debug, Default)]
pub(in crate::app) struct LocalCommands {
    pub(in crate::app) fail_next_commit: bool,
    pub(in crate::app) committed: usize,
}

impl MoveCommands for LocalCommands {
    fn confirm_move(&mut self, intent: &MoveIntent) -> impl Future<Output = bool> {
        ready(intent.delta != Vec2::ZERO && !intent.objects.is_empty())
    }

    fn commit_move(&mut self, intent: &MoveIntent) -> impl Future<Output = anyhow::Result<()>> {
        let result = if self.fail_next_commit {
            self.fail_next_commit = false;
            Err(anyhow!("workflow service rejected the move"))
        } else {
            self.committed += 1;
            info!(objects = intent.objects.len(), delta = ?intent.delta, "move committed");
            Ok(())
        };
        ready(result)
    }
}
