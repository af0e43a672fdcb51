//! Join-synchronization protocol.
//!
//! Brings a newly connected peer to a state observationally identical to the
//! peers already in the session, without pausing the application:
//!
//! 1. [`startup`] waits for the peer's `sync-request` and calibrates the link.
//! 2. [`driver::SyncDriver`] replays the session cache stage by stage
//!    (`load-assets → create-actors → set-behaviors → create-animations →
//!    sync-animations`), draining the outbound queue between stages.
//! 3. [`router::Router`] classifies every live application message against
//!    the [`rules`] table and the peer's stage state: send now, defer, drop,
//!    or flag as illegal.
//! 4. [`reconcile`] rewrites animation playheads to compensate for both
//!    links' latency.

pub mod config;
pub mod driver;
pub mod errors;
pub mod queue;
pub mod reconcile;
pub mod router;
pub mod rules;
pub mod stage;
pub mod startup;
pub mod stats;

pub use config::SyncConfig;
pub use driver::{SyncContext, SyncDriver};
pub use errors::{Result, SyncError};
pub use queue::{OutboundQueue, QueuedMessage, ReplySender};
pub use router::Router;
pub use rules::{Handling, Rule};
pub use stage::{Stage, StageTracker};
pub use stats::SyncStats;
