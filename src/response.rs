use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LlapiError, Result};
use crate::request::SignedRequest;

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Bytes(Vec<u8>),
}

/// Normalized response of a live call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub payload: Payload,
}

impl ApiResponse {
    pub fn json(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Json(value) => Some(value),
            Payload::Bytes(_) => None,
        }
    }

    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Bytes(bytes) => Some(bytes),
            Payload::Json(_) => None,
        }
    }

    /// Deserializes a JSON payload into a typed result.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        match self.payload {
            Payload::Json(value) => serde_json::from_value(value).map_err(|e| {
                LlapiError::Protocol(format!("unexpected response shape: {}", e))
            }),
            Payload::Bytes(_) => Err(LlapiError::Protocol(
                "expected a JSON response, got raw bytes".into(),
            )),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self.payload {
            Payload::Bytes(bytes) => Ok(bytes),
            Payload::Json(_) => Err(LlapiError::Protocol(
                "expected raw bytes, got a JSON response".into(),
            )),
        }
    }
}

/// Outcome of a call: the live result, or the request that dry-run mode
/// refused to send.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<T> {
    Live(T),
    DryRun(SignedRequest),
}

impl<T> Reply<T> {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Reply::DryRun(_))
    }

    /// Returns the live result, if any.
    pub fn live(self) -> Option<T> {
        match self {
            Reply::Live(value) => Some(value),
            Reply::DryRun(_) => None,
        }
    }

    pub fn dry_run(&self) -> Option<&SignedRequest> {
        match self {
            Reply::DryRun(request) => Some(request),
            Reply::Live(_) => None,
        }
    }

    pub(crate) fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<Reply<U>> {
        Ok(match self {
            Reply::Live(value) => Reply::Live(f(value)?),
            Reply::DryRun(request) => Reply::DryRun(request),
        })
    }
}

/// Fields the server returned that have no typed counterpart.
pub type Extra = BTreeMap<String, Value>;

/// Response from the heartbeat endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Heartbeat {
    #[serde(default)]
    pub ok: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// An entry of the manifest listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Manifest {
    pub manifest_token: String,
    pub manifest_name: Option<String>,
    pub group_token: Option<String>,
    pub folder_token: Option<String>,
    pub upload_date: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Manifest metadata together with its content.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManifestInfo {
    pub manifest_token: String,
    pub manifest_name: Option<String>,
    pub group_token: Option<String>,
    pub folder_token: Option<String>,
    pub upload_date: Option<String>,
    /// As uploaded, unless converted with `sbom_format`.
    pub manifest_data: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// CVE scan result for a manifest, also called the report.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Report {
    pub manifest_token: Option<String>,
    pub group_token: Option<String>,
    pub folder_token: Option<String>,
    #[serde(default)]
    pub cves: Vec<Value>,
    /// Keys: fixed, kernel, toolchain, unapplied, unfixed, upgradable, whitelisted.
    #[serde(default)]
    pub counts: BTreeMap<String, Value>,
    pub date: Option<String>,
    pub report_path: Option<String>,
    pub group_path: Option<String>,
    pub exported_manifest: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Report {
    /// The report token is the last segment of `report_path`.
    pub fn report_token(&self) -> Option<&str> {
        self.report_path
            .as_deref()
            .and_then(|path| path.trim_end_matches('/').rsplit('/').next())
            .filter(|token| !token.is_empty())
    }
}

/// One generated report of a manifest.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportSummary {
    pub report_token: String,
    pub manifest_token: Option<String>,
    pub manifest_version: Option<Value>,
    pub created_date: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Manifest metadata and its available reports.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportList {
    #[serde(default)]
    pub reports: Vec<ReportSummary>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Difference between two reports.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportComparison {
    #[serde(default)]
    pub resolved: Vec<Value>,
    #[serde(default)]
    pub new: Vec<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Product {
    pub token: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_default: Option<bool>,
    pub created: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Folder {
    pub folder_token: String,
    pub folder_name: Option<String>,
    pub folder_description: Option<String>,
    pub creation_date: Option<String>,
    pub product_token: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Group {
    pub token: String,
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Group` or `Subgroup`.
    pub group_type: Option<String>,
    pub organization_token: Option<String>,
    pub subgroups: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Detailed CVE record, possibly limited to requested fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Cve {
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub assigner: Option<String>,
    pub published: Option<String>,
    pub modified: Option<String>,
    pub impact: Option<Value>,
    pub problem_types: Option<Value>,
    pub references: Option<Value>,
    pub affected_configurations: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Result of a CVE search by CPE product.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CveSearch {
    /// `ids_only` searches return bare identifiers.
    Ids(Vec<String>),
    /// Otherwise identifiers map to descriptions.
    Descriptions(BTreeMap<String, Value>),
}

/// Result of a delete operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeleteResult {
    pub success: bool,
    /// Reason when `success` is false.
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_scan_report() {
        let json = r#"{
            "manifest_token": "m-123",
            "folder_token": "f-1",
            "cves": [{"cve_id": "CVE-2021-3711"}],
            "counts": {"unfixed": 1, "fixed": 0},
            "date": "2024-01-01",
            "report_path": "https://linuxlink.timesys.com/vigiles/report/r-456",
            "unexpected": true
        }"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.manifest_token.as_deref(), Some("m-123"));
        assert_eq!(report.cves.len(), 1);
        assert_eq!(report.counts["unfixed"], 1);
        assert_eq!(report.report_token(), Some("r-456"));
        assert_eq!(report.extra["unexpected"], true);
    }

    #[test]
    fn report_token_absent_without_path() {
        let report: Report = serde_json::from_str("{}").unwrap();
        assert_eq!(report.report_token(), None);
    }

    #[test]
    fn deserialize_cve_search_variants() {
        let ids: CveSearch = serde_json::from_str(r#"["CVE-2014-6271"]"#).unwrap();
        assert!(matches!(ids, CveSearch::Ids(ref v) if v.len() == 1));

        let descs: CveSearch =
            serde_json::from_str(r#"{"CVE-2014-6271": "GNU Bash through 4.3..."}"#).unwrap();
        assert!(matches!(descs, CveSearch::Descriptions(ref m) if m.contains_key("CVE-2014-6271")));
    }

    #[test]
    fn deserialize_product_list() {
        let json = r#"[
            {"name": "Default", "description": "", "token": "p-1", "is_default": true},
            {"name": "Gateway", "token": "p-2"}
        ]"#;
        let products: Vec<Product> = serde_json::from_str(json).unwrap();
        assert_eq!(products[0].is_default, Some(true));
        assert_eq!(products[1].token, "p-2");
    }

    #[test]
    fn into_typed_shape_mismatch_is_protocol_error() {
        let resp = ApiResponse {
            status: 200,
            payload: Payload::Json(serde_json::json!({"unexpected": 1})),
        };
        let err = resp.into_typed::<Vec<Folder>>().unwrap_err();
        assert!(matches!(err, LlapiError::Protocol(_)));
    }

    #[test]
    fn into_bytes_rejects_json() {
        let resp = ApiResponse {
            status: 200,
            payload: Payload::Json(Value::Null),
        };
        assert!(resp.into_bytes().is_err());
    }
}
