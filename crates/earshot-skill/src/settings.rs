//! Skill settings store and change dispatcher.
//!
//! Settings are a flat map of string keys to primitive values.  The host may
//! replace them at any time (a remote settings page, a companion app); the
//! store keeps a snapshot of the last observed state and, on every
//! [`Settings::apply`], reports one [`SettingChange`] per key whose value
//! actually differs.  Writes made locally by the skill itself update the
//! snapshot in lockstep, so they are never re-reported as external changes.
//!
//! Missing keys are defaulted by the typed accessors rather than treated as
//! errors.  Values arriving from remote settings pages are frequently
//! stringly typed (`"true"`, `"15"`), so the accessors coerce.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Well-known settings keys used by the framework itself.
pub mod keys {
    /// Whether the skill may intercept utterances via the converse hook.
    pub const INTERCEPT_ALLOWED: &str = "intercept_allowed";
    /// Fallback priority (lower runs earlier).
    pub const PRIORITY: &str = "priority";
    /// Bounded-wait timeout in seconds.
    pub const TIMEOUT: &str = "timeout";
}

/// A primitive settings value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    /// Interpret the value as a boolean flag.
    ///
    /// Remote settings pages deliver booleans as strings often enough that
    /// `"true"` (any case) counts, and numeric values count when non-zero.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }

    /// Coerce to an integer, parsing text and truncating floats.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Bool(_) => None,
            Self::Int(i) => Some(*i),
            Self::Float(f) => Some(*f as i64),
            Self::Text(s) => s.parse().ok(),
        }
    }

    /// Coerce to a float, parsing text and widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(_) => None,
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.parse().ok(),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for SettingValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SettingValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

/// A single observed settings delta.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    pub key: String,
    /// The new value.
    pub new: SettingValue,
    /// The previously observed value; `None` when the key first appears.
    pub old: Option<SettingValue>,
}

/// The skill's settings store.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Live values.
    values: HashMap<String, SettingValue>,

    /// Last state observed by the change dispatcher.
    snapshot: HashMap<String, SettingValue>,
}

impl Settings {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a default value if the key is absent.
    ///
    /// Defaults are recorded in the snapshot as well, so seeding them does
    /// not surface as a change on the next [`Settings::apply`].
    pub fn ensure_default(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            let value = value.into();
            self.values.insert(key.clone(), value.clone());
            self.snapshot.insert(key, value);
        }
    }

    /// Fetch a value.
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    /// Write a value locally.
    ///
    /// The snapshot is updated in lockstep: local writes are the skill's own
    /// doing and must not be re-reported as external changes later.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        let key = key.into();
        let value = value.into();
        self.values.insert(key.clone(), value.clone());
        self.snapshot.insert(key, value);
    }

    /// Merge an externally supplied settings map and report the deltas.
    ///
    /// Every incoming key whose value differs from the snapshot produces one
    /// [`SettingChange`]; unchanged keys produce none.  Keys absent from the
    /// incoming map are left untouched.  No ordering guarantee across keys
    /// beyond map iteration order.
    pub fn apply(&mut self, incoming: HashMap<String, SettingValue>) -> Vec<SettingChange> {
        let mut changes = Vec::new();

        for (key, new) in incoming {
            let old = self.snapshot.get(&key).cloned();
            if old.as_ref() != Some(&new) {
                changes.push(SettingChange {
                    key: key.clone(),
                    new: new.clone(),
                    old,
                });
            }
            self.values.insert(key.clone(), new.clone());
            self.snapshot.insert(key, new);
        }

        if !changes.is_empty() {
            tracing::debug!(changed = changes.len(), "settings changed");
        }

        changes
    }

    /// Boolean accessor with a default for missing keys.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.values.get(key).map_or(default, SettingValue::truthy)
    }

    /// Integer accessor with a default for missing or uncoercible keys.
    pub fn int_or(&self, key: &str, default: i64) -> i64 {
        self.values
            .get(key)
            .and_then(SettingValue::as_i64)
            .unwrap_or(default)
    }

    /// Float accessor with a default for missing or uncoercible keys.
    pub fn float_or(&self, key: &str, default: f64) -> f64 {
        self.values
            .get(key)
            .and_then(SettingValue::as_f64)
            .unwrap_or(default)
    }

    /// Load settings from a local JSON file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let values: HashMap<String, SettingValue> = serde_json::from_str(&raw)?;
        Ok(Self {
            snapshot: values.clone(),
            values,
        })
    }

    /// Persist the current values to a local JSON file.
    pub fn persist_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, SettingValue)]) -> HashMap<String, SettingValue> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn defaults_do_not_surface_as_changes() {
        let mut settings = Settings::new();
        settings.ensure_default(keys::INTERCEPT_ALLOWED, false);
        settings.ensure_default(keys::PRIORITY, 50);

        let changes = settings.apply(map(&[
            ("intercept_allowed", SettingValue::Bool(false)),
            ("priority", SettingValue::Int(50)),
        ]));
        assert!(changes.is_empty());
    }

    #[test]
    fn ensure_default_does_not_clobber() {
        let mut settings = Settings::new();
        settings.set(keys::PRIORITY, 10);
        settings.ensure_default(keys::PRIORITY, 50);
        assert_eq!(settings.int_or(keys::PRIORITY, 0), 10);
    }

    #[test]
    fn apply_reports_exactly_the_changed_keys() {
        let mut settings = Settings::new();
        settings.ensure_default("a", 1);
        settings.ensure_default("b", 2);

        let changes = settings.apply(map(&[
            ("a", SettingValue::Int(1)),  // unchanged
            ("b", SettingValue::Int(99)), // changed
            ("c", SettingValue::Text("new".into())), // appeared
        ]));

        assert_eq!(changes.len(), 2);

        let b = changes.iter().find(|c| c.key == "b").expect("b changed");
        assert_eq!(b.old, Some(SettingValue::Int(2)));
        assert_eq!(b.new, SettingValue::Int(99));

        let c = changes.iter().find(|c| c.key == "c").expect("c appeared");
        assert_eq!(c.old, None);
    }

    #[test]
    fn second_apply_with_same_values_is_quiet() {
        let mut settings = Settings::new();
        let incoming = map(&[("x", SettingValue::Int(7))]);

        assert_eq!(settings.apply(incoming.clone()).len(), 1);
        assert!(settings.apply(incoming).is_empty());
    }

    #[test]
    fn local_writes_are_not_re_reported() {
        let mut settings = Settings::new();
        settings.ensure_default(keys::INTERCEPT_ALLOWED, false);

        // The skill flips the flag itself.
        settings.set(keys::INTERCEPT_ALLOWED, true);

        // The host later echoes the same state back -- no delta.
        let changes = settings.apply(map(&[("intercept_allowed", SettingValue::Bool(true))]));
        assert!(changes.is_empty());
    }

    #[test]
    fn truthy_coercions() {
        assert!(SettingValue::Bool(true).truthy());
        assert!(SettingValue::Text("True".into()).truthy());
        assert!(SettingValue::Int(1).truthy());
        assert!(!SettingValue::Text("false".into()).truthy());
        assert!(!SettingValue::Text("yes".into()).truthy());
        assert!(!SettingValue::Int(0).truthy());
    }

    #[test]
    fn numeric_coercions() {
        assert_eq!(SettingValue::Text("15".into()).as_i64(), Some(15));
        assert_eq!(SettingValue::Float(12.9).as_i64(), Some(12));
        assert_eq!(SettingValue::Int(15).as_f64(), Some(15.0));
        assert_eq!(SettingValue::Text("nope".into()).as_f64(), None);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = Settings::new();
        assert!(!settings.bool_or(keys::INTERCEPT_ALLOWED, false));
        assert_eq!(settings.int_or(keys::PRIORITY, 50), 50);
        assert_eq!(settings.float_or(keys::TIMEOUT, 15.0), 15.0);
    }

    #[test]
    fn load_and_persist_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");

        let mut settings = Settings::new();
        settings.set(keys::INTERCEPT_ALLOWED, true);
        settings.set(keys::PRIORITY, 25);
        settings.set("greeting", "hello");
        settings.persist_to(&path).expect("persist");

        let loaded = Settings::load_from(&path).expect("load");
        assert!(loaded.bool_or(keys::INTERCEPT_ALLOWED, false));
        assert_eq!(loaded.int_or(keys::PRIORITY, 0), 25);
        assert_eq!(
            loaded.get("greeting"),
            Some(&SettingValue::Text("hello".into()))
        );
    }
}
