//! Replay statistics for a completed sync.

/// Counters accumulated while catching a peer up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub assets_replayed: u64,
    pub asset_updates_replayed: u64,
    pub actors_replayed: u64,
    pub behaviors_replayed: u64,
    pub interpolations_replayed: u64,
    pub animations_replayed: u64,
    pub animation_states_reconciled: u64,
    pub messages_drained: u64,
}
