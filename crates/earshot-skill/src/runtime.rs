//! Skill runtime: wiring between a [`Skill`] and the host bus.
//!
//! The runtime owns everything a skill implementation should not have to
//! think about: settings defaults and change dispatch, the interception
//! flag, dialog cues for enable/disable, intent registration, the keepalive
//! task that holds the conversation claim open, and cooperative shutdown of
//! its background tasks.
//!
//! Two tasks run per skill instance: a bus listener that reacts to the
//! skill's namespaced messages, and the keepalive loop.  Both select on one
//! [`CancellationToken`]; [`SkillRuntime::shutdown`] cancels it and joins
//! each task with a bounded grace period.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use earshot_bus::{Message, MessageBus};
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::dialog::DialogSpeaker;
use crate::error::Result;
use crate::intent::{IntentBuilder, IntentDeclaration};
use crate::intercept::{InterceptState, Toggle};
use crate::router::{ConverseRouter, CONVERSE_PING};
use crate::settings::{keys, SettingValue, Settings};
use crate::traits::{Skill, UtteranceHandler};
use crate::wait::wait_for_response;

/// How often the keepalive reasserts a live conversation claim.
pub const KEEPALIVE_PERIOD: Duration = Duration::from_secs(60);

/// How long shutdown waits for each background task.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Split a CamelCase identifier into words.
///
/// Runs of capitals stay together: `"HTTPSkill"` becomes `"HTTP Skill"`.
#[must_use]
pub fn camel_case_split(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    let mut out = String::with_capacity(identifier.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let after_lower = chars[i - 1].is_lowercase();
            let ends_acronym = chars[i - 1].is_uppercase()
                && chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if after_lower || ends_acronym {
                out.push(' ');
            }
        }
        out.push(c);
    }

    out
}

/// What a skill implementation sees of its surroundings.
///
/// Handed to every [`Skill`] hook; cheap to construct and clone.  The
/// response timeout is snapshotted from the `timeout` setting when the
/// context is built.
#[derive(Clone)]
pub struct SkillContext {
    bus: MessageBus,
    speaker: Arc<dyn DialogSpeaker>,
    namespace: String,
    skill_name: String,
    response_timeout: Duration,
}

impl SkillContext {
    /// The skill's bus namespace (lowercased identifier).
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The spoken display name, e.g. `"Parrot Skill"`.
    pub fn skill_name(&self) -> &str {
        &self.skill_name
    }

    /// The underlying bus, for skills that emit their own messages.
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Emit a message on the bus.
    pub fn emit(&self, message: Message) -> Result<usize> {
        Ok(self.bus.emit(message)?)
    }

    /// Speak a dialog template with substitutions.
    pub fn speak_dialog(&self, name: &str, data: &HashMap<String, String>) {
        self.speaker.speak_dialog(name, data);
    }

    /// Block (this task only) until the skill's success or failure message
    /// arrives, or the configured timeout elapses.
    ///
    /// See [`crate::wait::wait_for_response`] for the full contract.
    pub async fn wait_for_confirmation(&self, origin: Option<&Message>) -> bool {
        wait_for_response(&self.bus, &self.namespace, self.response_timeout, origin).await
    }
}

/// Configures and builds a [`SkillRuntime`].
pub struct SkillRuntimeBuilder<S: Skill> {
    skill: S,
    bus: MessageBus,
    speaker: Arc<dyn DialogSpeaker>,
    settings: Settings,
    keepalive_period: Duration,
    shutdown_grace: Duration,
}

impl<S: Skill> SkillRuntimeBuilder<S> {
    /// Preload settings (e.g. loaded from a local file).
    #[must_use]
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Override the keepalive period (tests use short ones).
    #[must_use]
    pub fn keepalive_period(mut self, period: Duration) -> Self {
        self.keepalive_period = period;
        self
    }

    /// Override the shutdown grace period.
    #[must_use]
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    #[must_use]
    pub fn build(self) -> SkillRuntime<S> {
        let name = self.skill.name().to_owned();
        let namespace = name.to_lowercase();
        let display_name = camel_case_split(&name);
        let (intercept, _) = watch::channel(false);

        SkillRuntime {
            inner: Arc::new(RuntimeInner {
                skill: tokio::sync::Mutex::new(self.skill),
                bus: self.bus,
                speaker: self.speaker,
                settings: RwLock::new(self.settings),
                intercept,
                namespace,
                display_name,
                keepalive_period: self.keepalive_period,
                shutdown_grace: self.shutdown_grace,
                cancel: CancellationToken::new(),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }
}

/// The runtime wrapping one skill instance.
///
/// Cheaply cloneable (`Arc`-backed); clones share the same skill.
pub struct SkillRuntime<S: Skill> {
    inner: Arc<RuntimeInner<S>>,
}

impl<S: Skill> Clone for SkillRuntime<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct RuntimeInner<S> {
    skill: tokio::sync::Mutex<S>,
    bus: MessageBus,
    speaker: Arc<dyn DialogSpeaker>,
    settings: RwLock<Settings>,

    /// Interception flag; the runtime is the only writer.
    intercept: watch::Sender<bool>,

    namespace: String,
    display_name: String,
    keepalive_period: Duration,
    shutdown_grace: Duration,

    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: Skill> SkillRuntime<S> {
    /// Start configuring a runtime for the given skill.
    pub fn builder(
        skill: S,
        bus: MessageBus,
        speaker: Arc<dyn DialogSpeaker>,
    ) -> SkillRuntimeBuilder<S> {
        SkillRuntimeBuilder {
            skill,
            bus,
            speaker,
            settings: Settings::new(),
            keepalive_period: KEEPALIVE_PERIOD,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }

    /// Build a runtime with default settings and timing.
    pub fn new(skill: S, bus: MessageBus, speaker: Arc<dyn DialogSpeaker>) -> Self {
        Self::builder(skill, bus, speaker).build()
    }

    /// Wire the skill up: seed settings defaults, restore the interception
    /// flag, register with the router, spawn the listener and keepalive
    /// tasks, announce intents, and run the skill's one-time setup.
    pub async fn initialize(&self, router: &ConverseRouter) -> Result<()> {
        let (enabled, priority) = {
            let mut settings = self.inner.settings.write().expect("settings lock");
            settings.ensure_default(keys::INTERCEPT_ALLOWED, false);
            settings.ensure_default(keys::PRIORITY, 50);
            settings.ensure_default(keys::TIMEOUT, 15);
            (
                settings.bool_or(keys::INTERCEPT_ALLOWED, false),
                settings.int_or(keys::PRIORITY, 50).clamp(0, 255) as u8,
            )
        };
        self.inner.intercept.send_replace(enabled);

        router.register(priority, Arc::new(self.clone()))?;

        let listener = tokio::spawn(listen(
            self.clone(),
            self.inner.bus.subscribe(),
            self.inner.cancel.clone(),
        ));
        let keepalive = tokio::spawn(keepalive_loop(
            self.inner.bus.clone(),
            self.inner.namespace.clone(),
            self.inner.intercept.subscribe(),
            self.inner.keepalive_period,
            self.inner.cancel.clone(),
        ));
        self.inner
            .tasks
            .lock()
            .expect("task lock")
            .extend([listener, keepalive]);

        for intent in self.intent_declarations().await {
            self.inner
                .bus
                .emit(intent.registration(&self.inner.namespace))?;
        }

        let ctx = self.context();
        self.inner.skill.lock().await.initial_setup(&ctx).await;

        tracing::info!(skill = %self.inner.namespace, priority, "skill initialized");
        Ok(())
    }

    /// The skill's bus namespace.
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// The spoken display name.
    pub fn display_name(&self) -> &str {
        &self.inner.display_name
    }

    /// Whether the skill currently claims first refusal of utterances.
    pub fn is_intercepting(&self) -> bool {
        *self.inner.intercept.borrow()
    }

    /// Build a context snapshot for skill hooks.
    pub fn context(&self) -> SkillContext {
        let timeout = self
            .inner
            .settings
            .read()
            .expect("settings lock")
            .float_or(keys::TIMEOUT, 15.0);

        SkillContext {
            bus: self.inner.bus.clone(),
            speaker: Arc::clone(&self.inner.speaker),
            namespace: self.inner.namespace.clone(),
            skill_name: self.inner.display_name.clone(),
            response_timeout: Duration::from_secs_f64(timeout.max(0.0)),
        }
    }

    /// Switch interception on.  Speaks a dialog either way; re-enabling an
    /// already-active skill is a state no-op.
    pub fn enable_interception(&self) {
        self.toggle_interception(Toggle::Enable);
    }

    /// Switch interception off.  Mirror of [`SkillRuntime::enable_interception`].
    pub fn disable_interception(&self) {
        self.toggle_interception(Toggle::Disable);
    }

    /// Speak the welcome dialog.  The host triggers this once on install.
    pub fn intro_message(&self) {
        self.speak("intro");
    }

    /// Merge an externally supplied settings map, dispatching the per-key
    /// hook exactly once for every key whose value changed.
    pub async fn apply_settings(&self, incoming: HashMap<String, SettingValue>) {
        let changes = {
            let mut settings = self.inner.settings.write().expect("settings lock");
            settings.apply(incoming)
        };
        if changes.is_empty() {
            return;
        }

        // The runtime reacts to its own key before the skill hears about it.
        for change in &changes {
            if change.key == keys::INTERCEPT_ALLOWED {
                self.sync_interception(change.new.truthy());
            }
        }

        let ctx = self.context();
        let mut skill = self.inner.skill.lock().await;
        for change in &changes {
            skill.on_setting_changed(&ctx, change).await;
        }
    }

    /// Cancel the background tasks and join each within the grace period.
    pub async fn shutdown(&self) {
        tracing::info!(skill = %self.inner.namespace, "skill shutting down");
        self.inner.cancel.cancel();

        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = self.inner.tasks.lock().expect("task lock");
            tasks.drain(..).collect()
        };

        for handle in handles {
            match tokio::time::timeout(self.inner.shutdown_grace, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    tracing::warn!(skill = %self.inner.namespace, %error, "background task panicked");
                }
                Err(_) => {
                    tracing::warn!(
                        skill = %self.inner.namespace,
                        "background task did not stop within the grace period"
                    );
                }
            }
        }
    }

    // -- Private helpers ----------------------------------------------------

    fn toggle_interception(&self, toggle: Toggle) {
        let current = InterceptState::from_flag(*self.inner.intercept.borrow());
        let (next, cue) = current.apply(toggle);

        self.inner.intercept.send_replace(next.is_active());
        self.inner
            .settings
            .write()
            .expect("settings lock")
            .set(keys::INTERCEPT_ALLOWED, next.is_active());

        tracing::info!(skill = %self.inner.namespace, state = ?next, "interception toggled");
        self.speak(cue.dialog_name());
    }

    /// Align the flag with an externally changed setting.  No dialog: the
    /// user did not just ask for it out loud.
    fn sync_interception(&self, enabled: bool) {
        let changed = *self.inner.intercept.borrow() != enabled;
        self.inner.intercept.send_replace(enabled);
        if changed {
            tracing::info!(skill = %self.inner.namespace, enabled, "interception synced from settings");
        }
    }

    fn speak(&self, dialog: &str) {
        let mut data = HashMap::new();
        data.insert("skill_name".to_owned(), self.inner.display_name.clone());
        self.inner.speaker.speak_dialog(dialog, &data);
    }

    async fn intent_declarations(&self) -> Vec<IntentDeclaration> {
        let mut intents = vec![
            IntentDeclaration::File {
                name: "converse.enable".into(),
            },
            IntentDeclaration::File {
                name: "converse.disable".into(),
            },
            IntentBuilder::new("why")
                .require("why_keyword")
                .require("changed_context")
                .build(),
        ];
        intents.extend(self.inner.skill.lock().await.intents());
        intents
    }

    /// React to one of the skill's namespaced bus messages.
    async fn dispatch(&self, message: &Message) {
        let Some(rest) = message.msg_type.strip_prefix(self.inner.namespace.as_str()) else {
            return;
        };
        let Some(event) = rest.strip_prefix('.') else {
            return;
        };

        match event {
            "converse.activate" | "intent.converse.enable" => self.enable_interception(),
            "converse.deactivate" | "intent.converse.disable" => self.disable_interception(),
            "intent.why" => {
                // Context set elsewhere enables this intent.
                self.inner.speaker.speak_dialog("why", &HashMap::new());
            }
            "settings.change" => {
                match serde_json::from_value::<HashMap<String, SettingValue>>(Value::Object(
                    message.data.clone(),
                )) {
                    Ok(incoming) => self.apply_settings(incoming).await,
                    Err(error) => {
                        tracing::warn!(
                            skill = %self.inner.namespace,
                            %error,
                            "malformed settings change payload"
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl<S: Skill> UtteranceHandler for SkillRuntime<S> {
    fn skill_id(&self) -> &str {
        &self.inner.namespace
    }

    async fn converse(&self, utterances: &[String]) -> bool {
        let intercepting = *self.inner.intercept.borrow();
        if !intercepting {
            return false;
        }
        let Some(first) = utterances.first() else {
            return false;
        };

        let ctx = self.context();
        let mut skill = self.inner.skill.lock().await;
        skill.handle_utterance(&ctx, first).await
    }

    async fn handle_fallback(&self, message: &Message) -> bool {
        let Some(utterance) = message.data_str("utterance") else {
            tracing::debug!(skill = %self.inner.namespace, "fallback query without an utterance");
            return false;
        };

        let ctx = self.context();
        let mut skill = self.inner.skill.lock().await;
        skill.handle_utterance(&ctx, utterance).await
    }
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

async fn listen<S: Skill>(
    runtime: SkillRuntime<S>,
    mut rx: broadcast::Receiver<Arc<Message>>,
    token: CancellationToken,
) {
    tracing::debug!(skill = %runtime.inner.namespace, "skill listener started");
    loop {
        tokio::select! {
            () = token.cancelled() => break,
            received = rx.recv() => match received {
                Ok(message) => runtime.dispatch(&message).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        skill = %runtime.inner.namespace,
                        skipped,
                        "skill listener lagged behind the bus"
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
    tracing::debug!(skill = %runtime.inner.namespace, "skill listener stopped");
}

/// Reassert the conversation claim while interception is enabled, so the
/// host does not expire it between utterances.
async fn keepalive_loop(
    bus: MessageBus,
    namespace: String,
    intercept: watch::Receiver<bool>,
    period: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tracing::debug!(skill = %namespace, "keepalive started");
    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {
                if *intercept.borrow() {
                    let ping = Message::new(CONVERSE_PING).with_data("skill", namespace.as_str());
                    if let Err(error) = bus.emit(ping) {
                        tracing::warn!(skill = %namespace, %error, "failed to emit keepalive");
                    }
                }
            }
        }
    }
    tracing::debug!(skill = %namespace, "keepalive stopped");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::settings::SettingChange;

    #[test]
    fn camel_case_split_words() {
        assert_eq!(camel_case_split("ParrotSkill"), "Parrot Skill");
        assert_eq!(camel_case_split("MySkill"), "My Skill");
        assert_eq!(camel_case_split("HTTPSkill"), "HTTP Skill");
        assert_eq!(camel_case_split("Weather"), "Weather");
        assert_eq!(camel_case_split(""), "");
    }

    /// Records every dialog request.
    struct RecordingSpeaker {
        spoken: Mutex<Vec<(String, HashMap<String, String>)>>,
    }

    impl RecordingSpeaker {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                spoken: Mutex::new(Vec::new()),
            })
        }

        fn names(&self) -> Vec<String> {
            self.spoken
                .lock()
                .unwrap()
                .iter()
                .map(|(name, _)| name.clone())
                .collect()
        }
    }

    impl DialogSpeaker for RecordingSpeaker {
        fn speak_dialog(&self, name: &str, data: &HashMap<String, String>) {
            self.spoken
                .lock()
                .unwrap()
                .push((name.to_owned(), data.clone()));
        }
    }

    /// Claims everything; counts settings hooks.
    struct EagerSkill {
        handled: Arc<Mutex<Vec<String>>>,
        setting_changes: Arc<Mutex<Vec<SettingChange>>>,
    }

    impl EagerSkill {
        fn new() -> Self {
            Self {
                handled: Arc::new(Mutex::new(Vec::new())),
                setting_changes: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl Skill for EagerSkill {
        fn name(&self) -> &str {
            "ParrotSkill"
        }

        async fn handle_utterance(&mut self, _ctx: &SkillContext, utterance: &str) -> bool {
            self.handled.lock().unwrap().push(utterance.to_owned());
            true
        }

        async fn on_setting_changed(&mut self, _ctx: &SkillContext, change: &SettingChange) {
            self.setting_changes.lock().unwrap().push(change.clone());
        }
    }

    fn runtime_with_speaker() -> (SkillRuntime<EagerSkill>, Arc<RecordingSpeaker>) {
        let bus = MessageBus::new(16);
        let speaker = RecordingSpeaker::new();
        let runtime = SkillRuntime::new(EagerSkill::new(), bus, Arc::clone(&speaker) as Arc<dyn DialogSpeaker>);
        (runtime, speaker)
    }

    #[tokio::test]
    async fn names_derive_from_the_skill_identifier() {
        let (runtime, _) = runtime_with_speaker();
        assert_eq!(runtime.namespace(), "parrotskill");
        assert_eq!(runtime.display_name(), "Parrot Skill");
    }

    #[tokio::test]
    async fn converse_defers_while_interception_is_disabled() {
        let (runtime, _) = runtime_with_speaker();

        // The skill would claim anything, but the gate is closed.
        assert!(!runtime.converse(&["hello".to_owned()]).await);
        assert!(!runtime.is_intercepting());
    }

    #[tokio::test]
    async fn converse_forwards_the_first_utterance_when_enabled() {
        let (runtime, _) = runtime_with_speaker();
        runtime.enable_interception();

        assert!(
            runtime
                .converse(&["hello there".to_owned(), "hello bear".to_owned()])
                .await
        );

        let handled = {
            let skill = runtime.inner.skill.lock().await;
            skill.handled.lock().unwrap().clone()
        };
        assert_eq!(handled, vec!["hello there"]);
    }

    #[tokio::test]
    async fn converse_with_no_utterances_defers() {
        let (runtime, _) = runtime_with_speaker();
        runtime.enable_interception();
        assert!(!runtime.converse(&[]).await);
    }

    #[tokio::test]
    async fn every_toggle_speaks_exactly_one_dialog() {
        let (runtime, speaker) = runtime_with_speaker();

        runtime.enable_interception();
        runtime.enable_interception();
        runtime.disable_interception();
        runtime.disable_interception();

        assert_eq!(
            speaker.names(),
            vec![
                "converse_enable",
                "converse_on",
                "converse_disable",
                "converse_off"
            ]
        );
        assert!(!runtime.is_intercepting());

        // The settings key tracks the flag.
        let allowed = runtime
            .inner
            .settings
            .read()
            .unwrap()
            .bool_or(keys::INTERCEPT_ALLOWED, true);
        assert!(!allowed);
    }

    #[tokio::test]
    async fn dialogs_substitute_the_display_name() {
        let (runtime, speaker) = runtime_with_speaker();
        runtime.intro_message();

        let spoken = speaker.spoken.lock().unwrap();
        let (name, data) = &spoken[0];
        assert_eq!(name, "intro");
        assert_eq!(data.get("skill_name").map(String::as_str), Some("Parrot Skill"));
    }

    #[tokio::test]
    async fn fallback_extracts_the_utterance_payload() {
        let (runtime, _) = runtime_with_speaker();

        let query = Message::new("fallback.query").with_data("utterance", "what time is it");
        assert!(runtime.handle_fallback(&query).await);

        let empty = Message::new("fallback.query");
        assert!(!runtime.handle_fallback(&empty).await);
    }

    #[tokio::test]
    async fn settings_hook_fires_once_per_changed_key() {
        let (runtime, speaker) = runtime_with_speaker();

        let mut incoming = HashMap::new();
        incoming.insert("intercept_allowed".to_owned(), SettingValue::Bool(true));
        incoming.insert("priority".to_owned(), SettingValue::Int(42));
        runtime.apply_settings(incoming.clone()).await;

        {
            let skill = runtime.inner.skill.lock().await;
            let changes = skill.setting_changes.lock().unwrap();
            assert_eq!(changes.len(), 2);
        }

        // The flag synced silently -- no dialog.
        assert!(runtime.is_intercepting());
        assert!(speaker.names().is_empty());

        // Replaying the same map is quiet.
        runtime.apply_settings(incoming).await;
        let skill = runtime.inner.skill.lock().await;
        assert_eq!(skill.setting_changes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn bus_events_drive_the_toggle() {
        let bus = MessageBus::new(16);
        let speaker = RecordingSpeaker::new();
        let runtime = SkillRuntime::builder(
            EagerSkill::new(),
            bus.clone(),
            Arc::clone(&speaker) as Arc<dyn DialogSpeaker>,
        )
        .build();
        let router = ConverseRouter::new(bus.clone());
        runtime.initialize(&router).await.expect("initialize");

        bus.emit(Message::new("parrotskill.converse.activate"))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(runtime.is_intercepting());

        bus.emit(Message::new("parrotskill.converse.deactivate"))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!runtime.is_intercepting());

        assert_eq!(speaker.names(), vec!["converse_enable", "converse_disable"]);
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn initialize_announces_intents_and_registers_fallback() {
        let bus = MessageBus::new(32);
        let mut rx = bus.subscribe();
        let speaker = RecordingSpeaker::new();
        let runtime = SkillRuntime::new(
            EagerSkill::new(),
            bus.clone(),
            Arc::clone(&speaker) as Arc<dyn DialogSpeaker>,
        );
        let router = ConverseRouter::new(bus.clone());
        runtime.initialize(&router).await.expect("initialize");

        let mut registrations = 0;
        while let Ok(message) = rx.try_recv() {
            if message.msg_type == crate::intent::INTENT_REGISTER {
                registrations += 1;
            }
        }
        assert_eq!(registrations, 3);

        // Registered as a fallback handler: an utterance reaches the skill.
        let outcome = router.route(&["anything".to_owned()]).await;
        assert_eq!(
            outcome,
            crate::router::RouteOutcome::Fallback {
                skill_id: "parrotskill".into()
            }
        );

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_joins_background_tasks() {
        let bus = MessageBus::new(16);
        let speaker = RecordingSpeaker::new();
        let runtime = SkillRuntime::builder(
            EagerSkill::new(),
            bus.clone(),
            Arc::clone(&speaker) as Arc<dyn DialogSpeaker>,
        )
        .keepalive_period(Duration::from_millis(20))
        .build();
        let router = ConverseRouter::new(bus.clone());
        runtime.initialize(&router).await.expect("initialize");

        runtime.shutdown().await;
        assert!(runtime.inner.tasks.lock().unwrap().is_empty());
    }
}
