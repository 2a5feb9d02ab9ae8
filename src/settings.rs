use std::env;

use crate::error::{AdminError, Result};
use crate::rest::GhostApi;

pub const BLOG_URL_VAR: &str = "GHOST_BLOG_URL";
pub const ADMIN_KEY_VAR: &str = "GHOST_ADMIN_API_KEY";

pub const OPENROUTER_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const OPENROUTER_MODEL_VAR: &str = "OPENROUTER_MODEL";
pub const OPENROUTER_LANGUAGE_VAR: &str = "OPENROUTER_LANGUAGE";
pub const OPENROUTER_PROMPT_VAR: &str = "OPENROUTER_CUSTOM_PROMPT";

pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.0-flash-exp:free";
pub const DEFAULT_OPENROUTER_LANGUAGE: &str = "English";

/// Connection settings for the admin API
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub blog_url: String,
    pub admin_key: String,
}

impl Settings {
    /// Load settings from `GHOST_BLOG_URL` and `GHOST_ADMIN_API_KEY`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings through an arbitrary lookup, e.g. a parsed config file
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let blog_url = non_empty(lookup(BLOG_URL_VAR))
            .ok_or_else(|| AdminError::SettingsMissing(format!("{} is not set", BLOG_URL_VAR)))?;
        let admin_key = non_empty(lookup(ADMIN_KEY_VAR))
            .ok_or_else(|| AdminError::SettingsMissing(format!("{} is not set", ADMIN_KEY_VAR)))?;

        Ok(Settings {
            blog_url,
            admin_key,
        })
    }

    /// Build an API client from these settings
    pub fn into_api(self) -> Result<GhostApi> {
        GhostApi::new(&self.blog_url, self.admin_key)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("blog_url", &self.blog_url)
            .field("admin_key", &"<redacted>")
            .finish()
    }
}

/// Settings for tag description generation
#[derive(Clone, PartialEq, Eq)]
pub struct OpenRouterSettings {
    pub api_key: String,
    pub model: String,
    pub language: String,
    pub custom_prompt: String,
}

impl OpenRouterSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Missing values fall back to defaults; an empty key means generation is off
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        OpenRouterSettings {
            api_key: non_empty(lookup(OPENROUTER_KEY_VAR)).unwrap_or_default(),
            model: non_empty(lookup(OPENROUTER_MODEL_VAR))
                .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
            language: non_empty(lookup(OPENROUTER_LANGUAGE_VAR))
                .unwrap_or_else(|| DEFAULT_OPENROUTER_LANGUAGE.to_string()),
            custom_prompt: lookup(OPENROUTER_PROMPT_VAR).unwrap_or_default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl std::fmt::Debug for OpenRouterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("language", &self.language)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
