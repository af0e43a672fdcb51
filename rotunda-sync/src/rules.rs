//! The message classification table.
//!
//! One rule per message kind: which stage governs the kind, and how an
//! outbound message of that kind is handled before the stage starts, while
//! it runs, and after it completes. The router performs no classification of
//! its own; this table is the single source of truth.

use rotunda_proto::MessageKind;

use crate::stage::{Stage, StageTracker};

/// What the router does with one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    /// Forward to the transport now.
    Allow,
    /// Defer until the governing stage advances.
    Queue,
    /// Drop silently (resolving any reply continuation as empty).
    Ignore,
    /// Should be impossible at this phase; log loudly and drop.
    Error,
}

/// Per-kind classification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub stage: Stage,
    pub before: Handling,
    pub during: Handling,
    pub after: Handling,
}

impl Rule {
    pub const fn new(stage: Stage, before: Handling, during: Handling, after: Handling) -> Self {
        Self {
            stage,
            before,
            during,
            after,
        }
    }

    /// Resolve this rule against the peer's current stage state.
    pub fn handling(&self, stages: &StageTracker) -> Handling {
        if stages.is_complete(self.stage) {
            self.after
        } else if stages.is_in_progress(self.stage) {
            self.during
        } else {
            self.before
        }
    }
}

/// Fail-safe rule for kinds without a table entry: defer until sync is done.
pub const DEFAULT_RULE: Rule = Rule::new(
    Stage::Never,
    Handling::Queue,
    Handling::Queue,
    Handling::Allow,
);

/// Look up the table entry for a kind, if it has one.
///
/// Kinds without an entry (application-defined events, future additions) are
/// governed by [`DEFAULT_RULE`]; the router logs a warning the first time it
/// sees such a kind.
pub fn rule_for(kind: MessageKind) -> Option<Rule> {
    use Handling::{Allow, Error, Ignore, Queue};
    use MessageKind as K;

    match kind {
        // Control traffic and replies are legal at any point.
        K::Heartbeat
        | K::Trace
        | K::OperationResult
        | K::ObjectSpawned
        | K::AssetsLoaded
        | K::SyncComplete => Some(Rule::new(Stage::Always, Allow, Allow, Allow)),

        // The server consumes sync-request; routing one outbound is a bug.
        K::SyncRequest => Some(Rule::new(Stage::Always, Error, Error, Error)),

        K::CreateAsset | K::LoadAssets | K::AssetUpdate => {
            Some(Rule::new(Stage::LoadAssets, Queue, Allow, Allow))
        }

        K::CreateActor | K::CreateFromLibrary => {
            Some(Rule::new(Stage::CreateActors, Queue, Allow, Allow))
        }

        K::SetBehavior => Some(Rule::new(Stage::SetBehaviors, Queue, Allow, Allow)),

        K::CreateAnimation | K::InterpolateActor | K::SetAnimationState => {
            Some(Rule::new(Stage::CreateAnimations, Queue, Allow, Allow))
        }

        // Requested by the reconciler itself; worthless before that point.
        K::SyncAnimations => Some(Rule::new(Stage::SyncAnimations, Ignore, Allow, Allow)),

        // User-generated traffic waits for the full catch-up.
        K::ActorUpdate | K::DestroyActors => {
            Some(Rule::new(Stage::Never, Queue, Queue, Allow))
        }

        K::AppEvent => None,
    }
}

/// The rule applied by the router: the table entry or the fail-safe default.
pub fn rule_or_default(kind: MessageKind) -> Rule {
    rule_for(kind).unwrap_or(DEFAULT_RULE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_kinds_queue_before_and_allow_after() {
        for kind in [
            MessageKind::CreateAsset,
            MessageKind::LoadAssets,
            MessageKind::AssetUpdate,
            MessageKind::CreateActor,
            MessageKind::CreateFromLibrary,
            MessageKind::SetBehavior,
            MessageKind::CreateAnimation,
            MessageKind::InterpolateActor,
            MessageKind::SetAnimationState,
        ] {
            let rule = rule_for(kind).unwrap();
            assert_eq!(rule.before, Handling::Queue, "{}", kind);
            assert_eq!(rule.during, Handling::Allow, "{}", kind);
            assert_eq!(rule.after, Handling::Allow, "{}", kind);
            assert!(Stage::SEQUENCE.contains(&rule.stage), "{}", kind);
        }
    }

    #[test]
    fn test_sync_animations_is_ignored_before_its_stage() {
        let rule = rule_for(MessageKind::SyncAnimations).unwrap();
        assert_eq!(rule.stage, Stage::SyncAnimations);
        assert_eq!(rule.before, Handling::Ignore);
        assert_eq!(rule.during, Handling::Allow);
    }

    #[test]
    fn test_rule_resolution_follows_stage_state() {
        let rule = rule_for(MessageKind::CreateActor).unwrap();
        let mut stages = StageTracker::new();

        assert_eq!(rule.handling(&stages), Handling::Queue);

        stages.begin(Stage::CreateActors);
        assert_eq!(rule.handling(&stages), Handling::Allow);

        stages.complete(Stage::CreateActors);
        assert_eq!(rule.handling(&stages), Handling::Allow);
    }

    #[test]
    fn test_user_generated_kinds_wait_for_sync_end() {
        let rule = rule_for(MessageKind::ActorUpdate).unwrap();
        let mut stages = StageTracker::new();
        stages.begin(Stage::Always);

        // Stage `never` is not in the sequence, so mid-sync stays queued.
        for stage in Stage::SEQUENCE {
            stages.begin(stage);
            assert_eq!(rule.handling(&stages), Handling::Queue);
            stages.complete(stage);
        }

        stages.complete(Stage::Always);
        assert_eq!(rule.handling(&stages), Handling::Allow);
    }

    #[test]
    fn test_unlisted_kind_falls_back_to_default() {
        assert!(rule_for(MessageKind::AppEvent).is_none());
        let rule = rule_or_default(MessageKind::AppEvent);
        assert_eq!(rule.stage, Stage::Never);
        assert_eq!(rule.before, Handling::Queue);
        assert_eq!(rule.after, Handling::Allow);
    }

    #[test]
    fn test_outbound_sync_request_is_illegal() {
        let rule = rule_for(MessageKind::SyncRequest).unwrap();
        let stages = StageTracker::new();
        assert_eq!(rule.handling(&stages), Handling::Error);
    }
}
