//! Message schema and bus transport for Earshot skills.
//!
//! Everything a skill says to its host assistant -- and everything the host
//! says back -- travels as a [`Message`] over a [`MessageBus`]:
//!
//! - **[`message`]** -- string-typed messages with JSON data and context
//!   payloads, UUID v7 identifiers, and reply construction that preserves
//!   routing context.
//! - **[`bus`]** -- publish/subscribe fan-out backed by
//!   [`tokio::sync::broadcast`]; emitting with no subscribers is not an
//!   error, and slow subscribers observe lag rather than blocking emitters.
//! - **[`error`]** -- bus error types via [`thiserror`].
//!
//! All public types are `Send + Sync` and designed for use within a
//! multi-threaded tokio runtime.

pub mod bus;
pub mod error;
pub mod message;

// Re-export the most commonly used types at the crate root for convenience.
pub use bus::MessageBus;
pub use error::{BusError, Result};
pub use message::Message;
