//! Append-only session cache of scene state.
//!
//! The application task records every state-bearing message it sends; sync
//! drivers replay the cache to bring a joining peer up to date. Readers get
//! snapshots, so a replay observes a consistent prefix while the application
//! keeps appending.

pub mod cache;
pub mod errors;

pub use cache::{CachedActor, SceneCache};
pub use errors::{Result, SceneError};
