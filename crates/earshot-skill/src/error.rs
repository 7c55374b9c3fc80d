//! Error types for the skill framework.

use earshot_bus::BusError;

/// Skill-framework errors.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    /// A skill with the same id is already registered with the router.
    #[error("skill `{skill_id}` is already registered")]
    AlreadyRegistered { skill_id: String },

    /// The referenced skill is not registered with the router.
    #[error("skill not registered: `{skill_id}`")]
    NotRegistered { skill_id: String },

    /// A settings value could not be interpreted.
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SkillError>;
