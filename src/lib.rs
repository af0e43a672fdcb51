//! Rotunda integration tests and workspace root
//!
//! This crate serves as the root of the rotunda workspace and contains
//! integration tests that test interactions between multiple crates.

// Re-export major components for integration testing
pub use rotunda_net as net;
pub use rotunda_proto as proto;
pub use rotunda_scene as scene;
pub use rotunda_server as server;
pub use rotunda_sync as sync;
