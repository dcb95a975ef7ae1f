//! Model configurations ("profiles") and how they are shown to people.

use chrono::{DateTime, Local, Utc};
use crossterm::style::Stylize;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{CmError, Result};

/// One named credential set used to launch claude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub token: String,
    pub base_url: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        rename = "defaultOpusModel",
        alias = "opusModel",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub opus_model: Option<String>,
    #[serde(
        rename = "defaultSonnetModel",
        alias = "sonnetModel",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub sonnet_model: Option<String>,
    #[serde(
        rename = "defaultHaikuModel",
        alias = "haikuModel",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub haiku_model: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

/// Optional opus/sonnet/haiku model names exported to claude.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelOverrides {
    pub opus: Option<String>,
    pub sonnet: Option<String>,
    pub haiku: Option<String>,
}

impl ModelOverrides {
    pub fn is_empty(&self) -> bool {
        self.opus.is_none() && self.sonnet.is_none() && self.haiku.is_none()
    }

    /// Labelled overrides that are set, in opus/sonnet/haiku order.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Opus", self.opus.as_deref()),
            ("Sonnet", self.sonnet.as_deref()),
            ("Haiku", self.haiku.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, model)| model.map(|m| (label, m)))
        .collect()
    }
}

impl Profile {
    /// Build a fresh profile with a new id; nothing is persisted.
    pub fn new(
        name: &str,
        token: &str,
        base_url: &str,
        description: Option<&str>,
        overrides: ModelOverrides,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            token: token.to_string(),
            base_url: base_url.to_string(),
            description: description.map(str::to_string).and_then(non_empty),
            opus_model: overrides.opus.and_then(non_empty),
            sonnet_model: overrides.sonnet.and_then(non_empty),
            haiku_model: overrides.haiku.and_then(non_empty),
            created_at: now,
            updated_at: None,
            last_used: None,
        }
    }

    pub fn overrides(&self) -> ModelOverrides {
        ModelOverrides {
            opus: self.opus_model.clone(),
            sonnet: self.sonnet_model.clone(),
            haiku: self.haiku_model.clone(),
        }
    }
}

/// Sparse patch applied by `ProfileRegistry::update_model`.
///
/// `None` leaves a field untouched. The override fields take
/// `Some(None)` to clear the override; an empty string clears as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub description: Option<String>,
    pub opus_model: Option<Option<String>>,
    pub sonnet_model: Option<Option<String>>,
    pub haiku_model: Option<Option<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// The new name, if this patch renames a profile currently called `current`.
    pub fn renames<'a>(&'a self, current: &str) -> Option<&'a str> {
        self.name.as_deref().filter(|name| *name != current)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let required = [
            ("Name", &self.name),
            ("Token", &self.token),
            ("Base URL", &self.base_url),
        ];
        for (label, value) in required {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(CmError::validation(format!("{label} cannot be empty")));
            }
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, profile: &mut Profile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(token) = self.token {
            profile.token = token;
        }
        if let Some(base_url) = self.base_url {
            profile.base_url = base_url;
        }
        if let Some(description) = self.description {
            profile.description = non_empty(description);
        }
        if let Some(opus) = self.opus_model {
            profile.opus_model = opus.and_then(non_empty);
        }
        if let Some(sonnet) = self.sonnet_model {
            profile.sonnet_model = sonnet.and_then(non_empty);
        }
        if let Some(haiku) = self.haiku_model {
            profile.haiku_model = haiku.and_then(non_empty);
        }
    }

    /// Human-readable `(field, value)` pairs for the fields this patch sets.
    /// Tokens are masked.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        fn shown(value: &Option<String>) -> String {
            value.clone().unwrap_or_else(|| "(cleared)".to_string())
        }

        let mut fields = Vec::new();
        if let Some(name) = &self.name {
            fields.push(("name", name.clone()));
        }
        if let Some(token) = &self.token {
            fields.push(("token", mask_token(token)));
        }
        if let Some(base_url) = &self.base_url {
            fields.push(("baseUrl", base_url.clone()));
        }
        if let Some(description) = &self.description {
            fields.push(("description", description.clone()));
        }
        if let Some(opus) = &self.opus_model {
            fields.push(("defaultOpusModel", shown(opus)));
        }
        if let Some(sonnet) = &self.sonnet_model {
            fields.push(("defaultSonnetModel", shown(sonnet)));
        }
        if let Some(haiku) = &self.haiku_model {
            fields.push(("defaultHaikuModel", shown(haiku)));
        }
        fields
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(non_empty))
}

/// Hide most of a secret: first 10 and last 5 characters for long tokens,
/// asterisks otherwise.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 15 {
        let head: String = chars[..10].iter().collect();
        let tail: String = chars[chars.len() - 5..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "*".repeat(chars.len())
    }
}

/// Render a timestamp in the user's local time zone.
pub fn local_time(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// One entry of `cm list`: marker, name, description and last use.
pub fn format_model(profile: &Profile, is_current: bool) -> String {
    let prefix = if is_current {
        "▶ ".green().to_string()
    } else {
        "  ".to_string()
    };
    let name = if is_current {
        profile.name.as_str().bold().to_string()
    } else {
        profile.name.clone()
    };
    let description = profile
        .description
        .as_deref()
        .map(|d| format!(" - {d}").dark_grey().to_string())
        .unwrap_or_default();
    let last_used = profile
        .last_used
        .map(|t| {
            format!("\n    Last used: {}", local_time(t))
                .blue()
                .to_string()
        })
        .unwrap_or_default();

    format!("{prefix}{name}{description}{last_used}")
}

/// `format_model` followed by endpoint, masked token and model overrides.
pub fn format_model_full(profile: &Profile, is_current: bool) -> String {
    let mut out = format_model(profile, is_current);
    out.push_str(&format!("\n    Base URL: {}", profile.base_url));
    out.push_str(&format!("\n    Token: {}", mask_token(&profile.token)));
    for (label, model) in profile.overrides().entries() {
        out.push_str(&format!("\n    {label}: {model}").dark_grey().to_string());
    }
    out
}
