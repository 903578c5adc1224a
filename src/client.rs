use std::fs;
use std::path::Path;

use log::{debug, warn};
use reqwest::Certificate;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::credential::{Credential, CredentialProvider, KeyFileProvider};
use crate::error::{LlapiError, Result};
use crate::exec::{Expect, handle_response};
use crate::request::{RequestSpec, SignedRequest, build_signed_request};
use crate::response::{ApiResponse, Reply};

/// Everything a configured client needs to sign and send requests.
struct Store {
    http: reqwest::blocking::Client,
    credential: Credential,
    context: Context,
    config: ClientConfig,
}

impl Store {
    fn build(credential: Credential, context: Context, config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls);
        if let Some(path) = &config.ca_bundle {
            for cert in load_ca_bundle(path)? {
                builder = builder.add_root_certificate(cert);
            }
        }
        let http = builder
            .build()
            .map_err(|e| {
                LlapiError::Configuration(format!("failed to build HTTP client: {}", e))
            })?;

        if config.dry_run {
            warn!("Dry run mode is enabled. No requests will be made.");
        }
        if !config.verify_tls {
            warn!("Insecure requests are enabled. Certificates will not be verified.");
        }

        Ok(Self {
            http,
            credential,
            context,
            config,
        })
    }
}

/// Reads every certificate of a PEM bundle.
fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>> {
    let pem = fs::read(path).map_err(|e| {
        LlapiError::Configuration(format!(
            "unable to read CA bundle {}: {}",
            path.display(),
            e
        ))
    })?;
    let certs = Certificate::from_pem_bundle(&pem).map_err(|e| {
        LlapiError::Configuration(format!("invalid CA bundle {}: {}", path.display(), e))
    })?;
    if certs.is_empty() {
        return Err(LlapiError::Configuration(format!(
            "CA bundle {} contains no certificates",
            path.display()
        )));
    }
    debug!("loaded {} CA certificates from {}", certs.len(), path.display());
    Ok(certs)
}

/// Blocking client for the LinuxLink API.
///
/// A client starts either configured ([`Client::new`]) or empty
/// ([`Client::unconfigured`]). Requests against an empty client fail with
/// [`LlapiError::Configuration`].
pub struct Client {
    store: Option<Store>,
}

impl Client {
    /// Creates a configured client.
    pub fn new(credential: Credential, context: Context, config: ClientConfig) -> Result<Self> {
        let mut client = Self::unconfigured();
        client.configure(&credential, Some(context), config)?;
        Ok(client)
    }

    /// Creates a client from a LinuxLink key file and no context.
    pub fn from_key_file(
        path: impl Into<std::path::PathBuf>,
        config: ClientConfig,
    ) -> Result<Self> {
        let mut client = Self::unconfigured();
        client.configure(&KeyFileProvider::new(path), None, config)?;
        Ok(client)
    }

    pub fn unconfigured() -> Self {
        Self { store: None }
    }

    /// Replaces the client's credential, context and transport options.
    ///
    /// Everything is resolved before anything is replaced: on error the
    /// previous configuration stays in effect.
    pub fn configure(
        &mut self,
        credentials: &dyn CredentialProvider,
        context: Option<Context>,
        config: ClientConfig,
    ) -> Result<()> {
        let credential = credentials.resolve()?;
        let store = Store::build(credential, context.unwrap_or_default(), config)?;
        self.store = Some(store);
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    pub fn config(&self) -> Option<&ClientConfig> {
        self.store.as_ref().map(|s| &s.config)
    }

    pub fn context(&self) -> Option<&Context> {
        self.store.as_ref().map(|s| &s.context)
    }

    /// Email of the configured user.
    pub fn email(&self) -> Option<&str> {
        self.store.as_ref().map(|s| s.credential.email.as_str())
    }

    fn store(&self) -> Result<&Store> {
        self.store
            .as_ref()
            .ok_or_else(|| LlapiError::Configuration("client has not been configured".into()))
    }

    /// Signs `spec` and describes the request without sending it,
    /// whether or not dry-run mode is enabled.
    pub fn sign(&self, spec: RequestSpec) -> Result<SignedRequest> {
        let store = self.store()?;
        let prepared =
            build_signed_request(spec, &store.credential, &store.context, &store.config)?;
        Ok(prepared.describe())
    }

    /// Signs and sends `spec`, or describes it in dry-run mode.
    ///
    /// Performs at most one network round-trip and never retries.
    pub fn execute(&self, spec: RequestSpec, expect: Expect) -> Result<Reply<ApiResponse>> {
        let store = self.store()?;
        let prepared =
            build_signed_request(spec, &store.credential, &store.context, &store.config)?;

        if store.config.dry_run {
            debug!("dry run: {} {}", prepared.method, prepared.url.path());
            return Ok(Reply::DryRun(prepared.describe()));
        }

        debug!("sending {} {}", prepared.method, prepared.url.path());
        let response = prepared.into_builder(&store.http).send()?;
        let status = response.status();
        let body = response.bytes()?.to_vec();
        debug!("received HTTP {} ({} bytes)", status, body.len());

        handle_response(status, body, expect).map(Reply::Live)
    }

    pub(crate) fn call_json<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<Reply<T>> {
        self.execute(spec, Expect::Json)?
            .try_map(ApiResponse::into_typed)
    }

    pub(crate) fn call_bytes(&self, spec: RequestSpec) -> Result<Reply<Vec<u8>>> {
        self.execute(spec, Expect::Bytes)?
            .try_map(ApiResponse::into_bytes)
    }
}
