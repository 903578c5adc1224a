use std::sync::OnceLock;

use regex::Regex;

use crate::api::{API_ROOT, CveField, require};
use crate::client::Client;
use crate::error::{LlapiError, Result};
use crate::request::{Params, RequestSpec};
use crate::response::{Cve, CveSearch, Reply};

/// Cached regex for CVE identifiers: `CVE-{year}-{4 or more digits}`.
static CVE_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn cve_id_regex() -> &'static Regex {
    CVE_ID_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^CVE-\d{4}-\d{4,}$").expect("Invalid CVE_ID_REGEX pattern")
    })
}

fn validate_cve_id(cve_id: &str) -> Result<()> {
    if !cve_id_regex().is_match(cve_id) {
        return Err(LlapiError::invalid(format!(
            "Invalid CVE ID '{}'. Expected: CVE-YYYY-NNNN",
            cve_id
        )));
    }
    Ok(())
}

impl Client {
    /// Gets CVE data, limited to `fields` when any are given.
    pub fn cve_info(&self, cve_id: &str, fields: &[CveField]) -> Result<Reply<Cve>> {
        let cve_id = require(cve_id, "cve_id")?;
        validate_cve_id(cve_id)?;

        let mut params = Params::new();
        if !fields.is_empty() {
            params.list("fields", fields.iter().map(CveField::as_str));
        }
        self.call_json(
            RequestSpec::get(format!("{}/cves/{}", API_ROOT, cve_id)).with_params(params),
        )
    }

    /// Finds CVEs affecting a CPE product, optionally a single version of it.
    pub fn search_cves(
        &self,
        cpe_product: &str,
        version: Option<&str>,
        ids_only: bool,
    ) -> Result<Reply<CveSearch>> {
        let product = require(cpe_product, "cpe_product")?;

        let mut params = Params::new();
        params
            .text("product", product)
            .text("version", version.unwrap_or_default())
            .flag("ids_only", ids_only);
        self.call_json(RequestSpec::get(format!("{}/cves", API_ROOT)).with_params(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_cve_ids() {
        assert!(validate_cve_id("CVE-2014-6271").is_ok());
        assert!(validate_cve_id("cve-2021-44228").is_ok());
        assert!(validate_cve_id("CVE-2023-1234567").is_ok());
    }

    #[test]
    fn rejects_malformed_cve_ids() {
        assert!(validate_cve_id("2014-6271").is_err());
        assert!(validate_cve_id("CVE-14-6271").is_err());
        assert!(validate_cve_id("CVE-2014-62").is_err());
        assert!(validate_cve_id("CVE-2014-6271/../x").is_err());
    }
}
