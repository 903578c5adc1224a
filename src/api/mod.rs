//! Endpoint wrappers: parameter-to-endpoint mappings on top of [`Client`].
//!
//! [`Client`]: crate::Client

use std::fmt;
use std::str::FromStr;

use crate::error::{LlapiError, Result};

mod cves;
mod folders;
mod groups;
mod heartbeat;
mod manifests;
mod products;
mod reports;

pub use manifests::{RescanOptions, UploadManifestRequest};

pub(crate) const API_ROOT: &str = "/api/v1/vigiles";

/// Rejects empty or whitespace-only identifiers before any request is built.
pub(crate) fn require<'a>(value: &'a str, name: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LlapiError::invalid(format!("{} is required", name)));
    }
    Ok(value)
}

/// Like [`require`], for tokens placed in the request path: a token must be
/// a single path segment that URL parsing leaves untouched.
pub(crate) fn require_token<'a>(value: &'a str, name: &str) -> Result<&'a str> {
    let value = require(value, name)?;
    let bad_char = value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '\\' | '?' | '#' | '%'));
    if bad_char || value == "." || value == ".." {
        return Err(LlapiError::invalid(format!(
            "{} '{}' is not a valid token",
            name, value
        )));
    }
    Ok(value)
}

/// Optional CVE data fields, used to extend reports and to limit CVE lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CveField {
    AffectedConfigurations,
    Assigner,
    Description,
    Identifier,
    Impact,
    Modified,
    ProblemTypes,
    Published,
    References,
}

impl CveField {
    pub const ALL: [CveField; 9] = [
        CveField::AffectedConfigurations,
        CveField::Assigner,
        CveField::Description,
        CveField::Identifier,
        CveField::Impact,
        CveField::Modified,
        CveField::ProblemTypes,
        CveField::Published,
        CveField::References,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CveField::AffectedConfigurations => "affected_configurations",
            CveField::Assigner => "assigner",
            CveField::Description => "description",
            CveField::Identifier => "identifier",
            CveField::Impact => "impact",
            CveField::Modified => "modified",
            CveField::ProblemTypes => "problem_types",
            CveField::Published => "published",
            CveField::References => "references",
        }
    }
}

impl fmt::Display for CveField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CveField {
    type Err = LlapiError;

    fn from_str(s: &str) -> Result<Self> {
        CveField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| LlapiError::invalid(format!("unknown CVE field '{}'", s)))
    }
}

/// File formats a CVE report can be downloaded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Pdf,
    PdfSummary,
    Xlsx,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Pdf => "pdf",
            ReportFormat::PdfSummary => "pdfsummary",
            ReportFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = LlapiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "pdf" => Ok(ReportFormat::Pdf),
            "pdfsummary" => Ok(ReportFormat::PdfSummary),
            "xlsx" => Ok(ReportFormat::Xlsx),
            _ => Err(LlapiError::invalid(format!(
                "invalid report format '{}'. Acceptable values: csv, pdf, pdfsummary, xlsx",
                s
            ))),
        }
    }
}
