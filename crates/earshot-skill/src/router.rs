//! Utterance routing: converse claims first, then fallback.
//!
//! The router is the host-side counterpart of the skill runtime.  Skills
//! holding a live **conversation claim** get first refusal of every
//! utterance (the converse phase, most recent claimant first); whatever no
//! claimant consumes is offered to the [`FallbackRegistry`] as a
//! `fallback.query`.  Claims expire after a TTL unless refreshed -- either
//! by a successful converse or by the `converse.ping` keepalive messages
//! skills emit while intercepting.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use earshot_bus::{Message, MessageBus};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SkillError};
use crate::registry::FallbackRegistry;
use crate::traits::UtteranceHandler;

/// Keepalive message type; `data["skill"]` names the claimant.
pub const CONVERSE_PING: &str = "converse.ping";

/// Fallback query message type; `data["utterance"]` carries the text.
pub const FALLBACK_QUERY: &str = "fallback.query";

/// How long a conversation claim survives without a refresh.
pub const DEFAULT_CLAIM_TTL: Duration = Duration::from_secs(300);

/// Where an utterance ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A claimant consumed it during the converse phase.
    Converse { skill_id: String },
    /// A fallback handler consumed it.
    Fallback { skill_id: String },
    /// Nobody wanted it.
    Unhandled,
}

struct Claim {
    skill_id: String,
    last_seen: Instant,
}

/// Routes utterances through the converse and fallback phases.
///
/// Cheaply cloneable (`Arc`-backed) and `Send + Sync`.
#[derive(Clone)]
pub struct ConverseRouter {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    /// Registered skills by id.
    handlers: DashMap<String, Arc<dyn UtteranceHandler>>,

    /// Live conversation claims, most recent first.
    claims: Mutex<Vec<Claim>>,

    fallbacks: FallbackRegistry,
    claim_ttl: Duration,
    bus: MessageBus,
}

impl ConverseRouter {
    /// Create a router with the default claim TTL.
    #[must_use]
    pub fn new(bus: MessageBus) -> Self {
        Self::with_claim_ttl(bus, DEFAULT_CLAIM_TTL)
    }

    /// Create a router with a custom claim TTL.
    #[must_use]
    pub fn with_claim_ttl(bus: MessageBus, claim_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                handlers: DashMap::new(),
                claims: Mutex::new(Vec::new()),
                fallbacks: FallbackRegistry::new(),
                claim_ttl,
                bus,
            }),
        }
    }

    /// Register a skill for both routing phases.
    ///
    /// `priority` orders the fallback phase (lower runs earlier).  Returns
    /// [`SkillError::AlreadyRegistered`] for a duplicate skill id.
    pub fn register(&self, priority: u8, handler: Arc<dyn UtteranceHandler>) -> Result<()> {
        let skill_id = handler.skill_id().to_owned();
        self.inner.fallbacks.register(priority, Arc::clone(&handler))?;
        self.inner.handlers.insert(skill_id.clone(), handler);
        tracing::info!(skill = %skill_id, "skill registered with the router");
        Ok(())
    }

    /// Remove a skill from both phases and drop any claim it held.
    pub fn deregister(&self, skill_id: &str) -> bool {
        let removed = self.inner.handlers.remove(skill_id).is_some();
        self.inner.fallbacks.deregister(skill_id);
        self.inner
            .claims
            .lock()
            .expect("claims lock")
            .retain(|c| c.skill_id != skill_id);
        if removed {
            tracing::info!(skill = %skill_id, "skill deregistered from the router");
        }
        removed
    }

    /// Promote or refresh a skill's conversation claim.
    pub fn make_active(&self, skill_id: &str) -> Result<()> {
        if !self.inner.handlers.contains_key(skill_id) {
            return Err(SkillError::NotRegistered {
                skill_id: skill_id.to_owned(),
            });
        }

        let mut claims = self.inner.claims.lock().expect("claims lock");
        claims.retain(|c| c.skill_id != skill_id);
        claims.insert(
            0,
            Claim {
                skill_id: skill_id.to_owned(),
                last_seen: Instant::now(),
            },
        );
        tracing::debug!(skill = %skill_id, "conversation claim refreshed");
        Ok(())
    }

    /// Ids of skills currently holding a live claim, most recent first.
    pub fn active_skills(&self) -> Vec<String> {
        self.expire_stale();
        self.inner
            .claims
            .lock()
            .expect("claims lock")
            .iter()
            .map(|c| c.skill_id.clone())
            .collect()
    }

    /// Route transcribed utterance variants through both phases.
    pub async fn route(&self, utterances: &[String]) -> RouteOutcome {
        let Some(first) = utterances.first() else {
            return RouteOutcome::Unhandled;
        };

        self.expire_stale();

        // Converse phase: claimants, most recent first.
        let claimants: Vec<(String, Arc<dyn UtteranceHandler>)> = {
            let claims = self.inner.claims.lock().expect("claims lock");
            claims
                .iter()
                .filter_map(|c| {
                    self.inner
                        .handlers
                        .get(&c.skill_id)
                        .map(|h| (c.skill_id.clone(), Arc::clone(h.value())))
                })
                .collect()
        };

        for (skill_id, handler) in claimants {
            if handler.converse(utterances).await {
                tracing::debug!(skill = %skill_id, "utterance intercepted");
                // A successful converse counts as activity.
                let _ = self.make_active(&skill_id);
                return RouteOutcome::Converse { skill_id };
            }
        }

        // Fallback phase.
        let query = Message::new(FALLBACK_QUERY).with_data("utterance", first.as_str());
        match self.inner.fallbacks.dispatch(&query).await {
            Some(skill_id) => RouteOutcome::Fallback { skill_id },
            None => RouteOutcome::Unhandled,
        }
    }

    /// Spawn a task that refreshes claims from `converse.ping` messages.
    ///
    /// The task runs until `token` is cancelled.
    pub fn spawn_ping_listener(&self, token: CancellationToken) -> JoinHandle<()> {
        let router = self.clone();
        let mut rx = self.inner.bus.subscribe();

        tokio::spawn(async move {
            tracing::debug!("converse ping listener started");
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    received = rx.recv() => match received {
                        Ok(message) if message.msg_type == CONVERSE_PING => {
                            let Some(skill_id) = message.data_str("skill") else {
                                continue;
                            };
                            if let Err(error) = router.make_active(skill_id) {
                                tracing::debug!(skill = %skill_id, %error, "ping from unknown skill");
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "ping listener lagged behind the bus");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
            tracing::debug!("converse ping listener stopped");
        })
    }

    /// Drop claims older than the TTL.
    fn expire_stale(&self) {
        let mut claims = self.inner.claims.lock().expect("claims lock");
        let ttl = self.inner.claim_ttl;
        let before = claims.len();
        claims.retain(|c| c.last_seen.elapsed() <= ttl);
        let expired = before - claims.len();
        if expired > 0 {
            tracing::debug!(expired, "conversation claims expired");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
