//! Minimal wiring demo: a parrot skill that repeats whatever follows "say".
//!
//! Run with `RUST_LOG=debug cargo run --example parrot` to watch the bus
//! traffic.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use earshot_bus::{Message, MessageBus};
use earshot_skill::{BusSpeaker, ConverseRouter, Skill, SkillContext, SkillRuntime};
use tokio_util::sync::CancellationToken;

struct ParrotSkill;

#[async_trait]
impl Skill for ParrotSkill {
    fn name(&self) -> &str {
        "ParrotSkill"
    }

    async fn handle_utterance(&mut self, ctx: &SkillContext, utterance: &str) -> bool {
        let Some(rest) = utterance.strip_prefix("say ") else {
            return false;
        };
        let mut data = HashMap::new();
        data.insert("text".to_owned(), rest.to_owned());
        ctx.speak_dialog("parrot_repeat", &data);
        true
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let bus = MessageBus::new(256);
    let router = ConverseRouter::new(bus.clone());
    let token = CancellationToken::new();
    let ping_listener = router.spawn_ping_listener(token.clone());

    let runtime = SkillRuntime::new(ParrotSkill, bus.clone(), Arc::new(BusSpeaker::new(bus.clone())));
    runtime.initialize(&router).await?;

    // Interception is off, so the utterance arrives via the fallback phase.
    let outcome = router.route(&["say hello".to_owned()]).await;
    println!("fallback route: {outcome:?}");

    // Switch interception on the way the host would: over the bus.
    bus.emit(Message::new("parrotskill.converse.activate"))?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    router.make_active(runtime.namespace())?;

    let outcome = router.route(&["say it again".to_owned()]).await;
    println!("converse route: {outcome:?}");

    token.cancel();
    ping_listener.await?;
    runtime.shutdown().await;
    Ok(())
}
