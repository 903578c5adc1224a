//! Request parameters, request building and signing for the LinuxLink API.

use std::collections::BTreeMap;

use reqwest::blocking::multipart;
use reqwest::{Method, Url};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::context::Context;
use crate::credential::Credential;
use crate::error::{LlapiError, Result};
use crate::sign::canonical_message;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Auth-Signature";

/// A single request parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Text(String),
    /// Sent as a repeated parameter, one entry per element.
    List(Vec<String>),
    /// Binary upload; only valid for multipart requests, never signed.
    File { file_name: String, bytes: Vec<u8> },
}

/// Request parameters ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) -> &mut Self {
        self.0.insert(key.into(), value);
        self
    }

    /// Sets a scalar value.
    pub fn text(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.insert(key, ParamValue::Text(value.into()))
    }

    /// Booleans travel as `True` / `False`.
    pub fn flag(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.text(key, if value { "True" } else { "False" })
    }

    /// Sets a repeated value; each element becomes its own `key=value` pair.
    pub fn list<I, S>(&mut self, key: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.insert(key, ParamValue::List(values))
    }

    /// Sets a file part. Files are sent only in multipart bodies and are
    /// never signed.
    pub fn file(
        &mut self,
        key: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> &mut Self {
        self.insert(
            key,
            ParamValue::File {
                file_name: file_name.into(),
                bytes,
            },
        )
    }

    /// Sets a text value only if `key` is not present yet.
    fn text_or_keep(&mut self, key: &str, value: &str) {
        self.0
            .entry(key.to_string())
            .or_insert_with(|| ParamValue::Text(value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    fn has_files(&self) -> bool {
        self.0.values().any(|v| matches!(v, ParamValue::File { .. }))
    }

    /// Scalar pairs in signing order: by key, list elements sorted, files skipped.
    pub(crate) fn signable_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::with_capacity(self.0.len());
        for (key, value) in &self.0 {
            match value {
                ParamValue::Text(v) => pairs.push((key.as_str(), v.as_str())),
                ParamValue::List(values) => {
                    let mut sorted: Vec<&str> = values.iter().map(String::as_str).collect();
                    sorted.sort_unstable();
                    pairs.extend(sorted.into_iter().map(|v| (key.as_str(), v)));
                }
                ParamValue::File { .. } => {}
            }
        }
        pairs
    }

    fn owned_pairs(&self) -> Vec<(String, String)> {
        self.signable_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// JSON view of the parameters. Files are summarised, not embedded.
    pub(crate) fn to_json(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    ParamValue::Text(v) => Value::String(v.clone()),
                    ParamValue::List(values) => {
                        Value::Array(values.iter().cloned().map(Value::String).collect())
                    }
                    ParamValue::File { file_name, bytes } => serde_json::json!({
                        "file_name": file_name,
                        "size": bytes.len(),
                    }),
                };
                (key.clone(), value)
            })
            .collect()
    }

    fn to_multipart(&self) -> multipart::Form {
        let mut form = multipart::Form::new();
        for (key, value) in &self.0 {
            match value {
                ParamValue::Text(v) => form = form.text(key.clone(), v.clone()),
                ParamValue::List(values) => {
                    for v in values {
                        form = form.text(key.clone(), v.clone());
                    }
                }
                ParamValue::File { file_name, bytes } => {
                    let part = multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());
                    form = form.part(key.clone(), part);
                }
            }
        }
        form
    }
}

/// How a request body is encoded. Only POST requests carry a body; every
/// other method sends its parameters in the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Form,
    Json,
    Multipart,
}

/// Method, path and parameters of one API call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    /// Leading slash, no host, no query string.
    pub path: String,
    pub params: Params,
    pub encoding: Encoding,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            encoding: Encoding::Form,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.path.starts_with('/') || self.path.contains('?') || self.path.contains("://") {
            return Err(LlapiError::invalid(format!(
                "request path '{}' must start with '/' and carry no host or query",
                self.path
            )));
        }
        if self.params.has_files()
            && (self.method != Method::POST || self.encoding != Encoding::Multipart)
        {
            return Err(LlapiError::invalid(
                "file parameters require a multipart POST request",
            ));
        }
        Ok(())
    }
}

/// Description of a signed request, as returned in dry-run mode.
///
/// Serializes to `{headers, method, url, data, hmac_msg}`, which third-party
/// client authors can use to check their own signing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedRequest {
    pub headers: BTreeMap<String, String>,
    pub method: String,
    pub url: String,
    pub data: Map<String, Value>,
    /// The exact message that was signed.
    pub hmac_msg: String,
}

impl SignedRequest {
    /// Value of the `X-Auth-Signature` header.
    pub fn signature(&self) -> Option<&str> {
        self.headers.get(SIGNATURE_HEADER).map(String::as_str)
    }
}

/// A fully signed request ready to be described or sent.
#[derive(Debug)]
pub(crate) struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub signature: String,
    pub hmac_msg: String,
    pub params: Params,
    pub encoding: Encoding,
}

impl PreparedRequest {
    fn has_body(&self) -> bool {
        self.method == Method::POST
    }

    pub fn describe(&self) -> SignedRequest {
        SignedRequest {
            headers: BTreeMap::from([(SIGNATURE_HEADER.to_string(), self.signature.clone())]),
            method: self.method.as_str().to_string(),
            url: self.url.to_string(),
            data: self.params.to_json(),
            hmac_msg: self.hmac_msg.clone(),
        }
    }

    /// Attaches the signature header and the encoded body.
    pub fn into_builder(
        self,
        http: &reqwest::blocking::Client,
    ) -> reqwest::blocking::RequestBuilder {
        let has_body = self.has_body();
        let builder = http
            .request(self.method, self.url)
            .header(SIGNATURE_HEADER, self.signature);

        if !has_body {
            return builder;
        }
        match self.encoding {
            Encoding::Form => builder.form(&self.params.owned_pairs()),
            Encoding::Json => builder.json(&self.params.to_json()),
            Encoding::Multipart => builder.multipart(self.params.to_multipart()),
        }
    }
}

/// Builds and signs a request.
///
/// This function:
/// 1. Injects `email` and any context tokens into the parameters
/// 2. Builds the canonical message from method, path and scalar parameters
/// 3. Signs it with the API key
/// 4. Derives the URL, with a query string for methods without a body
///
/// A caller-supplied `product_token` or `folder_token` takes precedence over
/// the context; `email` is always the configured one.
pub(crate) fn build_signed_request(
    spec: RequestSpec,
    credential: &Credential,
    context: &Context,
    config: &ClientConfig,
) -> Result<PreparedRequest> {
    spec.validate()?;
    let RequestSpec {
        method,
        path,
        mut params,
        encoding,
    } = spec;

    params.text("email", credential.email.as_str());
    if let Some(product) = &context.product_token {
        params.text_or_keep("product_token", product);
    }
    if let Some(folder) = &context.folder_token {
        params.text_or_keep("folder_token", folder);
    }

    let hmac_msg = canonical_message(&method, &path, &params, config.canonical_form);
    let signature = config
        .signature_scheme
        .sign(hmac_msg.as_bytes(), credential.api_key.as_bytes())?;

    let base = config.url_for(&path);
    let url = if method == Method::POST {
        Url::parse(&base)
    } else {
        Url::parse_with_params(&base, params.owned_pairs())
    }
    .map_err(|e| LlapiError::Configuration(format!("invalid request URL '{}': {}", base, e)))?;

    // The signed path must be the path the server receives.
    if !url.path().ends_with(path.as_str()) {
        return Err(LlapiError::invalid(format!(
            "request path '{}' would be sent as '{}'",
            path,
            url.path()
        )));
    }

    Ok(PreparedRequest {
        method,
        url,
        signature,
        hmac_msg,
        params,
        encoding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sign::SignatureScheme;

    fn credential() -> Credential {
        Credential::new("user@example.com", "user-api-key")
    }

    #[test]
    fn heartbeat_request() {
        let prepared = build_signed_request(
            RequestSpec::post("/api/v1/heartbeat"),
            &credential(),
            &Context::default(),
            &ClientConfig::default(),
        )
        .unwrap();

        assert_eq!(prepared.hmac_msg, "POST/api/v1/heartbeatemail=user@example.com");
        assert_eq!(
            prepared.signature,
            "7ohyfgJexw8D9SGiP2dkL9VixkgOgvWuTkVtXxUtqDI="
        );
        assert_eq!(
            prepared.url.as_str(),
            "https://linuxlink.timesys.com/api/v1/heartbeat"
        );
    }

    #[test]
    fn email_is_always_injected() {
        let mut params = Params::new();
        params.text("email", "someone-else@example.com");
        let prepared = build_signed_request(
            RequestSpec::post("/api/v1/heartbeat").with_params(params),
            &credential(),
            &Context::default(),
            &ClientConfig::default(),
        )
        .unwrap();
        assert_eq!(
            prepared.params.get("email"),
            Some(&ParamValue::Text("user@example.com".into()))
        );
    }

    #[test]
    fn context_tokens_are_injected_and_signed() {
        let context = Context::product("prod").with_folder("fold");
        let prepared = build_signed_request(
            RequestSpec::get("/api/v1/vigiles/folders"),
            &credential(),
            &context,
            &ClientConfig::default(),
        )
        .unwrap();

        assert_eq!(
            prepared.hmac_msg,
            "GET/api/v1/vigiles/foldersemail=user@example.comfolder_token=foldproduct_token=prod"
        );
        assert_eq!(
            prepared.url.as_str(),
            "https://linuxlink.timesys.com/api/v1/vigiles/folders?email=user%40example.com&folder_token=fold&product_token=prod"
        );
    }

    #[test]
    fn caller_token_overrides_context() {
        let mut params = Params::new();
        params.text("product_token", "explicit");
        let prepared = build_signed_request(
            RequestSpec::get("/x").with_params(params),
            &credential(),
            &Context::product("configured"),
            &ClientConfig::default(),
        )
        .unwrap();
        assert!(prepared.hmac_msg.contains("product_token=explicit"));
        assert!(!prepared.hmac_msg.contains("configured"));
    }

    #[test]
    fn describe_has_dry_run_shape() {
        let prepared = build_signed_request(
            RequestSpec::post("/api/v1/heartbeat"),
            &credential(),
            &Context::default(),
            &ClientConfig::default().with_signature_scheme(SignatureScheme::HmacSha256Hex),
        )
        .unwrap();
        let described = prepared.describe();
        let json = serde_json::to_value(&described).unwrap();

        assert_eq!(json["method"], "POST");
        assert_eq!(json["url"], "https://linuxlink.timesys.com/api/v1/heartbeat");
        assert_eq!(json["data"]["email"], "user@example.com");
        assert_eq!(json["hmac_msg"], "POST/api/v1/heartbeatemail=user@example.com");
        assert_eq!(json["headers"][SIGNATURE_HEADER].as_str().unwrap().len(), 64);
    }

    #[test]
    fn file_bytes_do_not_change_signature() {
        let sign_with = |bytes: &[u8]| {
            let mut params = Params::new();
            params.text("manifest_name", "image");
            params.file("manifest", "manifest.json", bytes.to_vec());
            build_signed_request(
                RequestSpec::post("/api/v1/vigiles/manifests")
                    .with_params(params)
                    .with_encoding(Encoding::Multipart),
                &credential(),
                &Context::default(),
                &ClientConfig::default(),
            )
            .unwrap()
        };

        let a = sign_with(b"{\"packages\": {\"a\": 1}}");
        let b = sign_with(b"{\"packages\": {\"b\": 2}}");
        assert_eq!(a.signature, b.signature);
        assert_eq!(a.hmac_msg, b.hmac_msg);
    }

    #[test]
    fn files_require_multipart_post() {
        let mut params = Params::new();
        params.file("manifest", "m.json", vec![1, 2, 3]);
        let err = build_signed_request(
            RequestSpec::post("/x").with_params(params),
            &credential(),
            &Context::default(),
            &ClientConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LlapiError::Validation { status: None, .. }));
    }

    #[test]
    fn path_with_query_is_rejected() {
        let err = build_signed_request(
            RequestSpec::get("/api/v1/vigiles/cves?product=bash"),
            &credential(),
            &Context::default(),
            &ClientConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn path_rewritten_by_url_parsing_is_rejected() {
        for path in [
            "/api/v1/vigiles/manifests/a#b",
            "/api/v1/vigiles/manifests/../products",
            "/api/v1/vigiles/manifests/a b",
        ] {
            let err = build_signed_request(
                RequestSpec::get(path),
                &credential(),
                &Context::default(),
                &ClientConfig::default(),
            )
            .unwrap_err();
            assert!(
                matches!(err, LlapiError::Validation { status: None, .. }),
                "{} should be rejected, got {:?}",
                path,
                err
            );
        }
    }

    #[test]
    fn base_url_prefix_is_allowed() {
        let prepared = build_signed_request(
            RequestSpec::post("/api/v1/heartbeat"),
            &credential(),
            &Context::default(),
            &ClientConfig::default().with_base_url("https://proxy.example.com/linuxlink/"),
        )
        .unwrap();
        assert_eq!(prepared.url.path(), "/linuxlink/api/v1/heartbeat");
        assert_eq!(prepared.hmac_msg, "POST/api/v1/heartbeatemail=user@example.com");
    }
}
