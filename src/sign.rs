//! Canonical message construction and request signing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::Method;
use sha2::Sha256;

use crate::error::{LlapiError, Result};
use crate::request::Params;

type HmacSha256 = Hmac<Sha256>;

/// Keyed hash and text encoding used to produce `X-Auth-Signature`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureScheme {
    /// HMAC-SHA256, standard base64 with padding.
    #[default]
    HmacSha256Base64,
    /// HMAC-SHA256, lowercase hex.
    HmacSha256Hex,
}

impl SignatureScheme {
    /// Signs `message` with `key`. Pure: identical inputs give identical output.
    pub fn sign(&self, message: &[u8], key: &[u8]) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| LlapiError::Configuration(format!("HMAC key error: {}", e)))?;
        mac.update(message);
        let digest = mac.finalize().into_bytes();

        Ok(match self {
            SignatureScheme::HmacSha256Base64 => BASE64.encode(digest),
            SignatureScheme::HmacSha256Hex => hex::encode(digest),
        })
    }
}

/// How `key=value` pairs are joined after the method and path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CanonicalForm {
    /// Pairs are concatenated directly: `a=1b=2`.
    #[default]
    Concatenated,
    /// Pairs are joined with `&`: `a=1&b=2`.
    AmpersandJoined,
}

impl CanonicalForm {
    fn separator(&self) -> &'static str {
        match self {
            CanonicalForm::Concatenated => "",
            CanonicalForm::AmpersandJoined => "&",
        }
    }
}

/// Builds the exact string that is signed for a request.
///
/// Layout: `{METHOD}{path}{k1=v1}{k2=v2}...`
///
/// - pairs are ordered by key (the `Params` map is a `BTreeMap`);
/// - list values yield one pair per element, elements sorted;
/// - file parts never participate;
/// - values are used verbatim, without percent-encoding.
pub fn canonical_message(
    method: &Method,
    path: &str,
    params: &Params,
    form: CanonicalForm,
) -> String {
    let pairs = params
        .signable_pairs()
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(form.separator());

    format!("{}{}{}", method.as_str(), path, pairs)
}
