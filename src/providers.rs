//! Built-in provider presets: the user only supplies a name and an API key.

use crate::profile::ModelOverrides;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provider {
    pub key: &'static str,
    pub name: &'static str,
    pub base_url: &'static str,
    pub description: &'static str,
    pub opus_model: Option<&'static str>,
    pub sonnet_model: Option<&'static str>,
    pub haiku_model: Option<&'static str>,
}

impl Provider {
    pub fn overrides(&self) -> ModelOverrides {
        ModelOverrides {
            opus: self.opus_model.map(str::to_string),
            sonnet: self.sonnet_model.map(str::to_string),
            haiku: self.haiku_model.map(str::to_string),
        }
    }

    /// `custom` has no base URL; the user must enter one.
    pub fn needs_base_url(&self) -> bool {
        self.base_url.is_empty()
    }
}

pub const PROVIDERS: &[Provider] = &[
    Provider {
        key: "anthropic",
        name: "Anthropic",
        base_url: "https://api.anthropic.com",
        description: "Claude models (Opus, Sonnet, Haiku)",
        opus_model: Some("claude-opus-4-5-20251101"),
        sonnet_model: Some("claude-sonnet-4-5-20250929"),
        haiku_model: Some("claude-haiku-4-5-20251001"),
    },
    Provider {
        key: "openrouter",
        name: "OpenRouter",
        base_url: "https://openrouter.ai/api/v1",
        description: "Multiple model providers unified",
        opus_model: Some("anthropic/claude-3.5-sonnet"),
        sonnet_model: Some("anthropic/claude-3.5-haiku"),
        haiku_model: Some("openai/gpt-4o-mini"),
    },
    Provider {
        key: "openai",
        name: "OpenAI",
        base_url: "https://api.openai.com/v1",
        description: "GPT models",
        opus_model: Some("gpt-4o"),
        sonnet_model: Some("gpt-4o-mini"),
        haiku_model: Some("gpt-3.5-turbo"),
    },
    Provider {
        key: "xiaomi",
        name: "Xiaomi",
        base_url: "https://api.xiaomimimo.com/anthropic",
        description: "Xiaomi models",
        opus_model: Some("mimo-v2-flash"),
        sonnet_model: Some("mimo-v2-flash"),
        haiku_model: Some("mimo-v2-flash"),
    },
    Provider {
        key: "custom",
        name: "Custom",
        base_url: "",
        description: "Enter your own configuration",
        opus_model: None,
        sonnet_model: None,
        haiku_model: None,
    },
];

/// Case-insensitive lookup by key.
pub fn find_provider(key: &str) -> Option<&'static Provider> {
    PROVIDERS.iter().find(|p| p.key.eq_ignore_ascii_case(key))
}
