//! Fallback handler registry.
//!
//! When every intent matcher has passed on an utterance, the host offers it
//! to registered fallback handlers in ascending priority order (lower runs
//! earlier) until one claims it.  Registration order breaks priority ties.

use std::sync::{Arc, RwLock};

use earshot_bus::Message;

use crate::error::{Result, SkillError};
use crate::traits::UtteranceHandler;

/// Priority-ordered registry of fallback handlers.
///
/// Cheaply cloneable is not needed here; the registry lives inside the
/// [`crate::router::ConverseRouter`], which is the shared handle.
pub struct FallbackRegistry {
    entries: RwLock<Vec<FallbackEntry>>,
}

#[derive(Clone)]
struct FallbackEntry {
    priority: u8,
    skill_id: String,
    handler: Arc<dyn UtteranceHandler>,
}

impl FallbackRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register a handler at the given priority.
    ///
    /// Returns [`SkillError::AlreadyRegistered`] if the handler's skill id
    /// is already present.
    pub fn register(&self, priority: u8, handler: Arc<dyn UtteranceHandler>) -> Result<()> {
        let skill_id = handler.skill_id().to_owned();
        let mut entries = self.entries.write().expect("fallback registry lock");

        if entries.iter().any(|e| e.skill_id == skill_id) {
            return Err(SkillError::AlreadyRegistered { skill_id });
        }

        // Insert after all entries of equal or lower numeric priority so
        // ties preserve registration order.
        let at = entries.partition_point(|e| e.priority <= priority);
        tracing::info!(skill = %skill_id, priority, "fallback handler registered");
        entries.insert(
            at,
            FallbackEntry {
                priority,
                skill_id,
                handler,
            },
        );

        Ok(())
    }

    /// Remove a handler.  Returns whether it was present.
    pub fn deregister(&self, skill_id: &str) -> bool {
        let mut entries = self.entries.write().expect("fallback registry lock");
        let before = entries.len();
        entries.retain(|e| e.skill_id != skill_id);
        let removed = entries.len() != before;
        if removed {
            tracing::info!(skill = %skill_id, "fallback handler deregistered");
        }
        removed
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.entries.read().expect("fallback registry lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offer a fallback query to each handler in priority order.
    ///
    /// Returns the id of the first handler that claimed the utterance.
    pub async fn dispatch(&self, message: &Message) -> Option<String> {
        let entries: Vec<FallbackEntry> = self
            .entries
            .read()
            .expect("fallback registry lock")
            .clone();

        for entry in entries {
            if entry.handler.handle_fallback(message).await {
                tracing::debug!(skill = %entry.skill_id, "fallback handled");
                return Some(entry.skill_id);
            }
        }

        tracing::debug!("no fallback handler claimed the utterance");
        None
    }
}

impl Default for FallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
