use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Per-user provider credential lookup configuration.
///
/// ```toml
/// [credentials]
/// timeout_ms = 2000
///
/// [credentials.lookup]
/// type = "http"
/// base_url = "http://keys.internal"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsConfig {
    /// Which credential store to ask.
    #[serde(default)]
    pub lookup: CredentialLookupConfig,

    /// Deadline for a single lookup in milliseconds. An expired lookup is treated
    /// like an unreachable store: the caller falls back to default-accessible models.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            lookup: CredentialLookupConfig::default(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl CredentialsConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "credentials.timeout_ms must be greater than 0".into(),
            ));
        }
        self.lookup.validate()
    }
}

/// Credential store backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum CredentialLookupConfig {
    /// No credential store. Every user holds no keys.
    #[default]
    None,

    /// Fixed `user_id -> [provider]` map. Unknown users hold no keys.
    Static {
        #[serde(default)]
        users: HashMap<String, Vec<String>>,
    },

    /// Remote credential service answering
    /// `GET {base_url}/users/{user_id}/providers` with `{"providers": [...]}`.
    Http { base_url: String },
}

impl CredentialLookupConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::None | Self::Static { .. } => Ok(()),
            Self::Http { base_url } => {
                let parsed = url::Url::parse(base_url).map_err(|e| {
                    ConfigError::Validation(format!(
                        "credentials.base_url '{base_url}' is invalid: {e}"
                    ))
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(ConfigError::Validation(format!(
                        "credentials.base_url must use http or https, got '{}'",
                        parsed.scheme()
                    )));
                }
                Ok(())
            }
        }
    }
}

fn default_timeout_ms() -> u64 {
    2000
}
