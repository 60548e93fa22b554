use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Caller identity configuration.
///
/// modelgate does not authenticate callers itself. It trusts an identity header set
/// by an authenticating reverse proxy (oauth2-proxy, Cloudflare Access, an API
/// gateway). A request carrying the header is authenticated as that user; a request
/// without it is anonymous.
///
/// **Security:** only expose modelgate behind a proxy that strips client-supplied
/// copies of this header. Otherwise callers can claim any identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Header containing the authenticated user's identity.
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_header: default_identity_header(),
        }
    }
}

impl AuthConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.identity_header.is_empty() {
            return Err(ConfigError::Validation(
                "auth.identity_header cannot be empty".into(),
            ));
        }
        if http::HeaderName::from_bytes(self.identity_header.as_bytes()).is_err() {
            return Err(ConfigError::Validation(format!(
                "auth.identity_header '{}' is not a valid HTTP header name",
                self.identity_header
            )));
        }
        Ok(())
    }
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}
