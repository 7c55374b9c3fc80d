//! Core traits at the skill/host seam.

use async_trait::async_trait;
use earshot_bus::Message;

use crate::intent::IntentDeclaration;
use crate::runtime::SkillContext;
use crate::settings::SettingChange;

/// The business logic of a skill.
///
/// Implementors supply [`Skill::handle_utterance`]; everything else --
/// registration, interception state, keepalive, settings plumbing -- is
/// provided by [`crate::runtime::SkillRuntime`].  The default
/// `handle_utterance` claims nothing, so an unmodified skill is inert on
/// both the converse and fallback paths.
#[async_trait]
pub trait Skill: Send + 'static {
    /// CamelCase skill identifier, e.g. `"ParrotSkill"`.  The bus namespace
    /// (lowercased) and the spoken display name are derived from it.
    fn name(&self) -> &str;

    /// Handle an utterance from either the converse or the fallback stage.
    ///
    /// Return `true` to claim the utterance and stop further handling.
    async fn handle_utterance(&mut self, ctx: &SkillContext, utterance: &str) -> bool {
        let _ = (ctx, utterance);
        false
    }

    /// One-time setup hook, invoked after the runtime finishes wiring.
    async fn initial_setup(&mut self, ctx: &SkillContext) {
        let _ = ctx;
    }

    /// Per-key settings change hook.
    async fn on_setting_changed(&mut self, ctx: &SkillContext, change: &SettingChange) {
        let _ = (ctx, change);
    }

    /// Additional intents beyond the built-in converse enable/disable and
    /// why intents.
    fn intents(&self) -> Vec<IntentDeclaration> {
        Vec::new()
    }
}

/// Host-facing surface of a running skill: what the router calls to offer
/// utterances during the converse and fallback phases.
#[async_trait]
pub trait UtteranceHandler: Send + Sync {
    /// The skill's bus namespace, used as its registry id.
    fn skill_id(&self) -> &str;

    /// Offer the transcribed utterance variants to the skill while it holds
    /// a conversation claim.  `true` consumes the utterance.
    async fn converse(&self, utterances: &[String]) -> bool;

    /// Offer a fallback query (`data["utterance"]`) after every intent
    /// matcher has passed.  `true` consumes the utterance.
    async fn handle_fallback(&self, message: &Message) -> bool;
}
