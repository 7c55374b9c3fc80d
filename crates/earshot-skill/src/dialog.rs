//! Spoken dialog output.
//!
//! Skills never render speech themselves: they name a dialog template and
//! hand substitutions to the host, which owns template resolution and TTS.
//! The shipped [`BusSpeaker`] forwards that request as a `speak.dialog`
//! message; tests substitute their own recorder.

use std::collections::HashMap;

use earshot_bus::{Message, MessageBus};

/// Message type carrying a dialog render request to the host.
pub const SPEAK_DIALOG: &str = "speak.dialog";

/// Renders a named dialog with substitutions.
pub trait DialogSpeaker: Send + Sync {
    /// Ask the host to speak the dialog template `name`, substituting the
    /// given key/value pairs into it.
    fn speak_dialog(&self, name: &str, data: &HashMap<String, String>);
}

/// [`DialogSpeaker`] that emits `speak.dialog` messages on the bus.
pub struct BusSpeaker {
    bus: MessageBus,
}

impl BusSpeaker {
    #[must_use]
    pub fn new(bus: MessageBus) -> Self {
        Self { bus }
    }
}

impl DialogSpeaker for BusSpeaker {
    fn speak_dialog(&self, name: &str, data: &HashMap<String, String>) {
        let substitutions: serde_json::Map<String, serde_json::Value> = data
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        let message = Message::new(SPEAK_DIALOG)
            .with_data("name", name)
            .with_data("data", substitutions);

        tracing::debug!(dialog = %name, "dialog requested");
        if let Err(error) = self.bus.emit(message) {
            tracing::warn!(dialog = %name, %error, "failed to emit dialog request");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bus_speaker_emits_a_render_request() {
        let bus = MessageBus::new(16);
        let mut rx = bus.subscribe();

        let speaker = BusSpeaker::new(bus.clone());
        let mut data = HashMap::new();
        data.insert("skill_name".to_owned(), "Parrot Skill".to_owned());
        speaker.speak_dialog("intro", &data);

        let message = rx.recv().await.expect("render request on the bus");
        assert_eq!(message.msg_type, SPEAK_DIALOG);
        assert_eq!(message.data_str("name"), Some("intro"));
        assert_eq!(
            message
                .data
                .get("data")
                .and_then(|v| v.get("skill_name"))
                .and_then(|v| v.as_str()),
            Some("Parrot Skill")
        );
    }
}
