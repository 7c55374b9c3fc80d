//! Intercept/fallback state machine.
//!
//! A skill is either `Inactive` (it only ever sees utterances through the
//! fallback path) or `Active` (it gets first refusal via the converse hook).
//! Enable/disable requests are absolute rather than toggles, so re-enabling
//! an active skill is a state no-op -- but it still speaks a dialog telling
//! the user interception was already on.

/// Whether the skill currently claims first refusal of utterances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptState {
    /// Fallback only.
    Inactive,
    /// First refusal via the converse hook.
    Active,
}

/// An enable or disable request, from an intent or a bus event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Enable,
    Disable,
}

/// What to say about a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogCue {
    /// Interception was just switched on.
    Activated,
    /// Interception was already on.
    AlreadyActive,
    /// Interception was just switched off.
    Deactivated,
    /// Interception was already off.
    AlreadyInactive,
}

impl InterceptState {
    #[must_use]
    pub fn from_flag(active: bool) -> Self {
        if active { Self::Active } else { Self::Inactive }
    }

    #[must_use]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// Apply an enable/disable request, returning the next state and the
    /// dialog cue to speak.  Every request speaks exactly one dialog.
    #[must_use]
    pub fn apply(self, toggle: Toggle) -> (Self, DialogCue) {
        match (self, toggle) {
            (Self::Inactive, Toggle::Enable) => (Self::Active, DialogCue::Activated),
            (Self::Active, Toggle::Enable) => (Self::Active, DialogCue::AlreadyActive),
            (Self::Active, Toggle::Disable) => (Self::Inactive, DialogCue::Deactivated),
            (Self::Inactive, Toggle::Disable) => (Self::Inactive, DialogCue::AlreadyInactive),
        }
    }
}

impl DialogCue {
    /// The dialog file name to render for this cue.
    #[must_use]
    pub fn dialog_name(self) -> &'static str {
        match self {
            Self::Activated => "converse_enable",
            Self::AlreadyActive => "converse_on",
            Self::Deactivated => "converse_disable",
            Self::AlreadyInactive => "converse_off",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
