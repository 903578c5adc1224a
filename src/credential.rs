use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{LlapiError, Result};

/// LinuxLink user identity: account email and API key.
///
/// The `Debug` implementation redacts `api_key` to prevent
/// accidental leakage in logs.
#[derive(Clone)]
pub struct Credential {
    pub email: String,
    pub api_key: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            api_key: api_key.into(),
        }
    }

    /// Trims both fields and rejects empty values.
    fn validated(email: &str, api_key: &str, source: &str) -> Result<Self> {
        let email = email.trim();
        let api_key = api_key.trim();
        if email.is_empty() || api_key.is_empty() {
            return Err(LlapiError::Configuration(format!(
                "{} has an empty email or key",
                source
            )));
        }
        Ok(Self::new(email, api_key))
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("api_key", &"****")
            .finish()
    }
}

/// Resolves a [`Credential`] from a specific source.
pub trait CredentialProvider {
    /// Attempt to resolve a credential from this provider.
    fn resolve(&self) -> Result<Credential>;
}

/// Provides a credential from explicitly specified values.
pub struct StaticProvider {
    credential: Credential,
}

impl StaticProvider {
    pub fn new(email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            credential: Credential::new(email, api_key),
        }
    }
}

impl CredentialProvider for StaticProvider {
    fn resolve(&self) -> Result<Credential> {
        self.credential.resolve()
    }
}

/// An explicit credential resolves to itself once validated.
impl CredentialProvider for Credential {
    fn resolve(&self) -> Result<Credential> {
        Credential::validated(&self.email, &self.api_key, "credential")
    }
}

/// Provides a credential from a downloaded LinuxLink key file.
///
/// The key file is JSON: `{"email": "...", "key": "..."}`.
pub struct KeyFileProvider {
    path: PathBuf,
}

#[derive(Deserialize)]
struct KeyFile {
    email: Option<String>,
    key: Option<String>,
}

impl KeyFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(content: &str) -> Result<Credential> {
        let key_file: KeyFile = serde_json::from_str(content).map_err(|e| {
            LlapiError::Configuration(format!("key file is not valid JSON: {}", e))
        })?;

        match (key_file.email, key_file.key) {
            (Some(email), Some(key)) => Credential::validated(&email, &key, "key file"),
            _ => Err(LlapiError::Configuration(
                "key file missing email or key".into(),
            )),
        }
    }
}

impl CredentialProvider for KeyFileProvider {
    fn resolve(&self) -> Result<Credential> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            LlapiError::Configuration(format!(
                "unable to read key file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }
}
