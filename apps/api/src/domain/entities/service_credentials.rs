use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Default OAuth token endpoint written into service-identity key files.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Where the session authority's credentials came from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Service-identity JSON passed inline as a secret.
    Inline,
    /// Service-identity JSON read from a file reference.
    File,
    /// Platform metadata server. Can call the provider, cannot sign.
    Ambient,
    /// Nothing usable. Development only; verification will fail.
    Bare,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Inline => "inline",
            Self::File => "file",
            Self::Ambient => "ambient",
            Self::Bare => "bare",
        };
        write!(f, "{}", s)
    }
}

/// A parsed service-identity key.
#[derive(Debug)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: SecretString,
    pub token_uri: String,
}

#[derive(Deserialize)]
struct RawServiceAccountKey {
    project_id: String,
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

impl ServiceAccountKey {
    /// Parse the JSON key file format. Fails on missing fields or an empty key.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let raw: RawServiceAccountKey =
            serde_json::from_str(json).map_err(|e| format!("invalid service identity JSON: {e}"))?;

        if raw.private_key.trim().is_empty() {
            return Err("service identity JSON has an empty private_key".into());
        }

        Ok(Self {
            project_id: raw.project_id,
            client_email: raw.client_email,
            private_key: SecretString::new(raw.private_key.into()),
            token_uri: raw
                .token_uri
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }
}

/// The outcome of credential resolution, handed to the session authority at startup.
#[derive(Debug)]
pub struct ResolvedCredentials {
    pub source: CredentialSource,
    pub project_id: Option<String>,
    pub service_account: Option<ServiceAccountKey>,
}

impl ResolvedCredentials {
    pub fn bare(project_id: Option<String>) -> Self {
        Self {
            source: CredentialSource::Bare,
            project_id,
            service_account: None,
        }
    }

    pub fn private_key_pem(&self) -> Option<&str> {
        self.service_account
            .as_ref()
            .map(|sa| sa.private_key.expose_secret())
    }
}
