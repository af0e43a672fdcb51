//! Catch-up stages and the per-peer stage tracker.

use std::collections::HashSet;

use tracing::warn;

/// A labelled phase of catching up a joining peer.
///
/// Only the middle five appear in the replay sequence. `Always` wraps the
/// whole sync; `Never` marks rules whose stage never completes during sync,
/// so they are routed purely by their before/after handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Always,
    LoadAssets,
    CreateActors,
    SetBehaviors,
    CreateAnimations,
    SyncAnimations,
    Never,
}

impl Stage {
    /// The fixed replay order.
    pub const SEQUENCE: [Stage; 5] = [
        Stage::LoadAssets,
        Stage::CreateActors,
        Stage::SetBehaviors,
        Stage::CreateAnimations,
        Stage::SyncAnimations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Always => "always",
            Stage::LoadAssets => "load-assets",
            Stage::CreateActors => "create-actors",
            Stage::SetBehaviors => "set-behaviors",
            Stage::CreateAnimations => "create-animations",
            Stage::SyncAnimations => "sync-animations",
            Stage::Never => "never",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stages are underway or finished for one peer.
///
/// Stages move `absent → in_progress → complete` and never roll back. Owned
/// by exactly one sync driver.
#[derive(Debug, Default)]
pub struct StageTracker {
    in_progress: HashSet<Stage>,
    complete: HashSet<Stage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a stage as underway.
    pub fn begin(&mut self, stage: Stage) {
        if self.complete.contains(&stage) {
            warn!("Stage {} restarted after completion; ignoring", stage);
            return;
        }
        self.in_progress.insert(stage);
    }

    /// Mark a stage as finished. Completion is permanent.
    ///
    /// Completing `Always` ends the sync, so the `Never` sentinel completes
    /// with it; rules anchored to it then resolve to their after-handling
    /// and the final queue drain can flush them.
    pub fn complete(&mut self, stage: Stage) {
        self.in_progress.remove(&stage);
        self.complete.insert(stage);
        if stage == Stage::Always {
            self.complete.insert(Stage::Never);
        }
    }

    pub fn is_in_progress(&self, stage: Stage) -> bool {
        self.in_progress.contains(&stage)
    }

    pub fn is_complete(&self, stage: Stage) -> bool {
        self.complete.contains(&stage)
    }

    /// Human-readable snapshot for diagnostics.
    pub fn describe(&self) -> String {
        let mut in_progress: Vec<&str> = self.in_progress.iter().map(Stage::as_str).collect();
        let mut complete: Vec<&str> = self.complete.iter().map(Stage::as_str).collect();
        in_progress.sort_unstable();
        complete.sort_unstable();
        format!("in_progress={:?} complete={:?}", in_progress, complete)
    }
}
