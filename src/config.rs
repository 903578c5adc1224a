use std::path::PathBuf;
use std::time::Duration;

use crate::sign::{CanonicalForm, SignatureScheme};

/// Production LinuxLink host.
pub const DEFAULT_BASE_URL: &str = "https://linuxlink.timesys.com";

/// Transport options for the LinuxLink client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every request path is appended to.
    pub base_url: String,

    /// Verify the server's TLS certificate. Disabling is insecure.
    pub verify_tls: bool,

    /// PEM bundle of extra CA certificates to trust.
    pub ca_bundle: Option<PathBuf>,

    /// Sign requests but never send them.
    pub dry_run: bool,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Keyed hash and encoding used for `X-Auth-Signature`.
    pub signature_scheme: SignatureScheme,

    /// How parameter pairs are joined in the signed message.
    pub canonical_form: CanonicalForm,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            verify_tls: true,
            ca_bundle: None,
            dry_run: false,
            timeout: Duration::from_secs(30),
            signature_scheme: SignatureScheme::default(),
            canonical_form: CanonicalForm::default(),
        }
    }
}

impl ClientConfig {
    /// Sets a custom base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Enables or disables TLS certificate verification.
    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    /// Trusts the CA certificates in a PEM bundle, e.g. a corporate proxy CA.
    pub fn with_ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }

    /// Enables or disables dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the signature hash and encoding.
    pub fn with_signature_scheme(mut self, scheme: SignatureScheme) -> Self {
        self.signature_scheme = scheme;
        self
    }

    /// Sets how parameter pairs are joined in the signed message.
    pub fn with_canonical_form(mut self, form: CanonicalForm) -> Self {
        self.canonical_form = form;
        self
    }

    /// Joins the base URL and a request path without doubling the slash.
    pub(crate) fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://linuxlink.timesys.com");
        assert!(config.verify_tls);
        assert!(config.ca_bundle.is_none());
        assert!(!config.dry_run);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.signature_scheme, SignatureScheme::HmacSha256Base64);
        assert_eq!(config.canonical_form, CanonicalForm::Concatenated);
    }

    #[test]
    fn builder_overrides() {
        let config = ClientConfig::default()
            .with_base_url("http://127.0.0.1:8080")
            .with_verify_tls(false)
            .with_dry_run(true)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert!(!config.verify_tls);
        assert!(config.dry_run);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn url_for_tolerates_trailing_slash() {
        let config = ClientConfig::default().with_base_url("https://example.com/");
        assert_eq!(
            config.url_for("/api/v1/heartbeat"),
            "https://example.com/api/v1/heartbeat"
        );
    }
}
