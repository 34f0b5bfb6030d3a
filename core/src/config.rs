//! Host-owned configuration, read from the environment.

use crate::ai::gemini::{DEFAULT_MODEL, GEMINI_API_BASE};
use crate::classify::FallbackMode;
use log::warn;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "TRIAGE_GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "TRIAGE_GEMINI_BASE_URL";
pub const FALLBACK_MODE_VAR: &str = "TRIAGE_FALLBACK_MODE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// `None` when unset or blank.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub fallback_mode: FallbackMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            base_url: GEMINI_API_BASE.to_owned(),
            fallback_mode: FallbackMode::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Unknown fallback modes are
    /// logged and replaced by the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let fallback_mode = match non_blank(FALLBACK_MODE_VAR).map(|v| v.parse()) {
            Some(Ok(mode)) => mode,
            Some(Err(e)) => {
                warn!("[Settings::from_lookup] {e}; using heuristic fallback");
                defaults.fallback_mode
            }
            None => defaults.fallback_mode,
        };

        Self {
            api_key: non_blank(API_KEY_VAR),
            model: non_blank(MODEL_VAR).unwrap_or(defaults.model),
            base_url: non_blank(BASE_URL_VAR).unwrap_or(defaults.base_url),
            fallback_mode,
        }
    }
}
