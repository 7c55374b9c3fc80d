//! Intent declarations.
//!
//! Skills declare their intents; the host's parser owns matching and fires
//! `{namespace}.intent.{name}` messages when one lands.  A declaration is
//! either file-based (the host resolves `{name}.intent` sample files) or
//! built from required/optional vocabulary keywords.

use serde::{Deserialize, Serialize};

use earshot_bus::Message;

/// Message type announcing a skill's intent to the host parser.
pub const INTENT_REGISTER: &str = "intent.register";

/// A declarative intent registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntentDeclaration {
    /// Matched against `{name}.intent` sample files by the host.
    File { name: String },

    /// Keyword-built intent: all of `requires`, any of `optional`.
    Builder {
        name: String,
        requires: Vec<String>,
        #[serde(default)]
        optional: Vec<String>,
    },
}

impl IntentDeclaration {
    /// The intent's name, used in trigger message types.
    pub fn name(&self) -> &str {
        match self {
            Self::File { name } | Self::Builder { name, .. } => name,
        }
    }

    /// Build the registration message for this declaration.
    pub fn registration(&self, namespace: &str) -> Message {
        Message::new(INTENT_REGISTER)
            .with_data("skill", namespace)
            .with_data(
                "intent",
                serde_json::to_value(self).unwrap_or(serde_json::Value::Null),
            )
    }
}

/// Fluent builder for keyword-based intents.
///
/// ```rust
/// # use earshot_skill::intent::IntentBuilder;
/// let intent = IntentBuilder::new("why")
///     .require("why_keyword")
///     .require("changed_context")
///     .build();
/// assert_eq!(intent.name(), "why");
/// ```
#[derive(Debug, Default)]
pub struct IntentBuilder {
    name: String,
    requires: Vec<String>,
    optional: Vec<String>,
}

impl IntentBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            optional: Vec::new(),
        }
    }

    /// Add a required vocabulary keyword.
    #[must_use]
    pub fn require(mut self, keyword: impl Into<String>) -> Self {
        self.requires.push(keyword.into());
        self
    }

    /// Add an optional vocabulary keyword.
    #[must_use]
    pub fn optionally(mut self, keyword: impl Into<String>) -> Self {
        self.optional.push(keyword.into());
        self
    }

    #[must_use]
    pub fn build(self) -> IntentDeclaration {
        IntentDeclaration::Builder {
            name: self.name,
            requires: self.requires,
            optional: self.optional,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
