//! Bus error types.
//!
//! All public APIs in this crate surface errors through [`BusError`].

/// Unified error type for the Earshot message bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Emitting a message onto the bus failed.
    #[error("bus emit failed: {reason}")]
    EmitFailed { reason: String },

    /// A message payload could not be serialized or deserialized.
    #[error("malformed message payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Convenience alias used throughout the bus crate.
pub type Result<T> = std::result::Result<T, BusError>;
