//! Converse/fallback skill framework for Earshot.
//!
//! A **skill** answers spoken utterances two ways: as a last-resort
//! **fallback** handler once every intent matcher has passed, and -- when
//! the user has switched interception on -- as a **converse** interceptor
//! with first refusal of everything said.  This crate provides:
//!
//! - **[`traits::Skill`]** -- the implementor surface: `handle_utterance`
//!   plus setup and settings hooks; the default implementation claims
//!   nothing.
//! - **[`runtime`]** -- `SkillRuntime` wires a skill to the bus: settings
//!   defaults, interception toggles with spoken confirmations, intent
//!   registration, the keepalive task holding the conversation claim open,
//!   and cooperative shutdown.
//! - **[`intercept`]** -- the two-state interception machine and its dialog
//!   cues.
//! - **[`wait`]** -- a bounded, channel-blocking wait for a
//!   success/failure round-trip, with a synthesized timeout message.
//! - **[`settings`]** -- the settings store with per-key change dispatch.
//! - **[`router`] / [`registry`]** -- host-side utterance routing: converse
//!   claims with TTL expiry, then priority-ordered fallback dispatch.
//! - **[`dialog`] / [`intent`]** -- dialog render requests and declarative
//!   intent registrations, both handed to the host over the bus.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use earshot_bus::MessageBus;
//! use earshot_skill::{BusSpeaker, ConverseRouter, Skill, SkillContext, SkillRuntime};
//!
//! struct ParrotSkill;
//!
//! #[async_trait]
//! impl Skill for ParrotSkill {
//!     fn name(&self) -> &str {
//!         "ParrotSkill"
//!     }
//!
//!     async fn handle_utterance(&mut self, ctx: &SkillContext, utterance: &str) -> bool {
//!         let _ = (ctx, utterance);
//!         false
//!     }
//! }
//!
//! # async fn example() -> earshot_skill::Result<()> {
//! let bus = MessageBus::new(256);
//! let router = ConverseRouter::new(bus.clone());
//! let runtime = SkillRuntime::new(ParrotSkill, bus.clone(), Arc::new(BusSpeaker::new(bus)));
//! runtime.initialize(&router).await?;
//! # Ok(())
//! # }
//! ```

pub mod dialog;
pub mod error;
pub mod intent;
pub mod intercept;
pub mod registry;
pub mod router;
pub mod runtime;
pub mod settings;
pub mod traits;
pub mod wait;

// Re-export the most commonly used types at the crate root for convenience.
pub use dialog::{BusSpeaker, DialogSpeaker};
pub use error::{Result, SkillError};
pub use intent::{IntentBuilder, IntentDeclaration};
pub use intercept::{DialogCue, InterceptState, Toggle};
pub use registry::FallbackRegistry;
pub use router::{ConverseRouter, RouteOutcome};
pub use runtime::{camel_case_split, SkillContext, SkillRuntime, SkillRuntimeBuilder};
pub use settings::{SettingChange, SettingValue, Settings};
pub use traits::{Skill, UtteranceHandler};
pub use wait::wait_for_response;
