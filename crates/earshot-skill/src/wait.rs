//! Bounded wait for a success/failure round-trip.
//!
//! Some utterance handlers kick off work elsewhere on the bus and need to
//! know whether it landed before they can answer the user.  The wait blocks
//! the calling task on its own bus subscription until the skill's
//! `{namespace}.success` or `{namespace}.failure` message arrives, or the
//! deadline elapses -- in which case exactly one `{namespace}.timeout`
//! message is emitted and the wait resolves unsuccessfully.
//!
//! The subscription is opened when the wait starts; replies emitted before
//! that are not observed, matching the request-then-wait call pattern.

use std::time::Duration;

use earshot_bus::{Message, MessageBus};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;

/// Wait for `{namespace}.success` or `{namespace}.failure`, up to `wait`.
///
/// Returns `true` only if the success message arrived in time.  On timeout,
/// emits `{namespace}.timeout` -- as a reply to `origin` when one is
/// supplied, so routing context survives, else as a fresh message -- and
/// returns `false`.  Unrelated bus traffic is ignored.
pub async fn wait_for_response(
    bus: &MessageBus,
    namespace: &str,
    wait: Duration,
    origin: Option<&Message>,
) -> bool {
    let mut rx = bus.subscribe();

    let success_type = format!("{namespace}.success");
    let failure_type = format!("{namespace}.failure");
    let deadline = Instant::now() + wait;

    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(message)) => {
                if message.msg_type == success_type {
                    tracing::debug!(namespace, "wait resolved: success");
                    return true;
                }
                if message.msg_type == failure_type {
                    tracing::debug!(namespace, "wait resolved: failure");
                    return false;
                }
                // Unrelated traffic; keep waiting.
            }
            Ok(Err(RecvError::Lagged(skipped))) => {
                tracing::warn!(namespace, skipped, "response listener lagged behind the bus");
            }
            Ok(Err(RecvError::Closed)) => {
                tracing::warn!(namespace, "bus closed while waiting for a response");
                return false;
            }
            Err(_) => {
                tracing::debug!(namespace, ?wait, "wait timed out");
                let timeout_type = format!("{namespace}.timeout");
                let message = match origin {
                    Some(origin) => origin.reply(&timeout_type),
                    None => Message::new(&timeout_type),
                };
                if let Err(error) = bus.emit(message) {
                    tracing::warn!(namespace, %error, "failed to emit timeout message");
                }
                return false;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
