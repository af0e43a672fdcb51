//! Wire envelope and payload types shared by the rotunda runtime crates.
//!
//! Application traffic is a stream of [`Envelope`]s, each carrying a
//! `type`-discriminated [`Payload`]. The runtime inspects only the
//! discriminant (and a handful of typed fields such as actor ids and
//! animation times); everything else rides along as opaque JSON.

pub mod animation;
pub mod envelope;
pub mod payload;
pub mod validation;

pub use animation::{AnimationState, AnimationStateSample};
pub use envelope::Envelope;
pub use payload::{MessageKind, Payload, ResultCode};
pub use validation::{limits, ValidationError};

/// Protocol version exchanged during the startup handshake.
pub const PROTOCOL_VERSION: &str = "0.1.0";
