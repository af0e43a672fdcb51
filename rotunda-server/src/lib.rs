//! Session and peer lifecycle management.
//!
//! A [`session::Session`] groups the peers sharing one application instance
//! and one scene cache. Joining a peer runs the startup handshake and the
//! staged sync; the peer is registered only once its sync completes, so a
//! failed or disconnected join leaves no trace.

pub mod errors;
pub mod peer;
pub mod session;

pub use errors::{Result, ServerError};
pub use peer::Peer;
pub use session::{Session, SessionConfig};
