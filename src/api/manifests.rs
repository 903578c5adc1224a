use log::warn;

use crate::api::{API_ROOT, CveField, require_token};
use crate::client::Client;
use crate::error::{LlapiError, Result};
use crate::request::{Encoding, Params, RequestSpec};
use crate::response::{DeleteResult, Manifest, ManifestInfo, Reply, Report, ReportList};

/// Request parameters for uploading a manifest.
///
/// The manifest and the optional config files are sent as multipart file
/// parts and are not covered by the request signature.
#[derive(Debug, Clone)]
pub struct UploadManifestRequest {
    /// Manifest (SBOM) content.
    pub manifest: Vec<u8>,
    /// File name reported for the manifest part.
    pub manifest_file_name: String,
    /// Kernel config used to filter out CVEs irrelevant to the built kernel.
    pub kernel_config: Option<Vec<u8>>,
    /// U-Boot config used to filter out CVEs irrelevant to the bootloader.
    pub uboot_config: Option<Vec<u8>>,
    /// Name for the new manifest; the server generates one if absent.
    pub manifest_name: Option<String>,
    /// Folder to create or reuse under the configured product/folder.
    pub subfolder_name: Option<String>,
    /// Apply every configured filter, not only the config filters.
    pub filter_results: bool,
    /// Extra CVE fields to include in the report.
    pub extra_fields: Vec<CveField>,
    /// Skip generating the initial report.
    pub upload_only: bool,
}

impl UploadManifestRequest {
    pub fn new(manifest: impl Into<Vec<u8>>) -> Self {
        Self {
            manifest: manifest.into(),
            manifest_file_name: "manifest".to_string(),
            kernel_config: None,
            uboot_config: None,
            manifest_name: None,
            subfolder_name: None,
            filter_results: false,
            extra_fields: Vec::new(),
            upload_only: false,
        }
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.manifest_file_name = file_name.into();
        self
    }

    pub fn kernel_config(mut self, config: impl Into<Vec<u8>>) -> Self {
        self.kernel_config = Some(config.into());
        self
    }

    pub fn uboot_config(mut self, config: impl Into<Vec<u8>>) -> Self {
        self.uboot_config = Some(config.into());
        self
    }

    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = Some(name.into());
        self
    }

    pub fn subfolder_name(mut self, name: impl Into<String>) -> Self {
        self.subfolder_name = Some(name.into());
        self
    }

    pub fn filter_results(mut self, filter: bool) -> Self {
        self.filter_results = filter;
        self
    }

    pub fn extra_fields(mut self, fields: impl IntoIterator<Item = CveField>) -> Self {
        self.extra_fields = fields.into_iter().collect();
        self
    }

    pub fn upload_only(mut self, upload_only: bool) -> Self {
        self.upload_only = upload_only;
        self
    }

    pub(crate) fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .file("manifest", self.manifest_file_name.as_str(), self.manifest.clone())
            .flag("filter_results", self.filter_results)
            .flag("upload_only", self.upload_only);
        if let Some(ref config) = self.kernel_config {
            params.file("kernel_config", "kernel_config", config.clone());
        }
        if let Some(ref config) = self.uboot_config {
            params.file("uboot_config", "uboot_config", config.clone());
        }
        if let Some(ref name) = self.manifest_name {
            params.text("manifest_name", name.as_str());
        }
        if let Some(ref name) = self.subfolder_name {
            params.text("subfolder_name", name.as_str());
        }
        if !self.extra_fields.is_empty() {
            params.list("with_field", self.extra_fields.iter().map(CveField::as_str));
        }
        params
    }
}

/// Options for generating a new report of an existing manifest.
#[derive(Debug, Clone, Default)]
pub struct RescanOptions {
    /// Rescan without returning the report data.
    pub rescan_only: bool,
    /// Apply every configured filter, not only the config filters.
    pub filter_results: bool,
    pub extra_fields: Vec<CveField>,
}

fn manifest_path(token: &str) -> String {
    format!("{}/manifests/{}", API_ROOT, token)
}

impl Client {
    /// Lists manifests visible to the current user, limited to the
    /// configured folder when one is set.
    pub fn list_manifests(&self) -> Result<Reply<Vec<Manifest>>> {
        self.call_json(RequestSpec::get(format!("{}/manifests", API_ROOT)))
    }

    /// Gets manifest metadata and content, converted to `sbom_format` if given.
    pub fn manifest_info(
        &self,
        manifest_token: &str,
        sbom_format: Option<&str>,
    ) -> Result<Reply<ManifestInfo>> {
        let token = require_token(manifest_token, "manifest_token")?;

        let mut params = Params::new();
        if let Some(format) = sbom_format.filter(|f| !f.is_empty()) {
            params.text("sbom_format", format);
        }
        self.call_json(RequestSpec::get(manifest_path(token)).with_params(params))
    }

    /// Downloads the raw manifest file.
    pub fn download_manifest(
        &self,
        manifest_token: &str,
        sbom_format: Option<&str>,
    ) -> Result<Reply<Vec<u8>>> {
        let token = require_token(manifest_token, "manifest_token")?;

        let mut params = Params::new();
        params.flag("send_file", true);
        if let Some(format) = sbom_format.filter(|f| !f.is_empty()) {
            params.text("sbom_format", format);
        }
        self.call_bytes(RequestSpec::get(manifest_path(token)).with_params(params))
    }

    /// Uploads a manifest and, unless `upload_only` is set, scans it.
    ///
    /// The upload target is the configured folder, else the configured
    /// product, else the private workspace.
    pub fn upload_manifest(&self, request: &UploadManifestRequest) -> Result<Reply<Report>> {
        if request.manifest.iter().all(u8::is_ascii_whitespace) {
            return Err(LlapiError::invalid("manifest data is required"));
        }

        if let Some(context) = self.context().filter(|c| c.is_private_workspace()) {
            warn!("No product token is configured. Upload target will be \"Private Workspace\"");
            if context.folder_token.is_some() || request.subfolder_name.is_some() {
                warn!(
                    "\"Private Workspace\" does not support folders; \
                     folder and subfolder will be ignored."
                );
            }
        }

        self.call_json(
            RequestSpec::post(format!("{}/manifests", API_ROOT))
                .with_params(request.to_params())
                .with_encoding(Encoding::Multipart),
        )
    }

    /// Generates a new report for an existing manifest.
    pub fn rescan_manifest(
        &self,
        manifest_token: &str,
        options: &RescanOptions,
    ) -> Result<Reply<Report>> {
        let token = require_token(manifest_token, "manifest_token")?;

        let mut params = Params::new();
        params
            .text("manifest", token)
            .flag("rescan_only", options.rescan_only)
            .flag("filtered", options.filter_results);
        if !options.extra_fields.is_empty() {
            params.list("with_field", options.extra_fields.iter().map(CveField::as_str));
        }
        self.call_json(
            RequestSpec::post(format!("{}/reports", manifest_path(token))).with_params(params),
        )
    }

    /// Deletes a manifest. This cannot be undone, so `confirmed` must be true.
    pub fn delete_manifest(
        &self,
        manifest_token: &str,
        confirmed: bool,
    ) -> Result<Reply<DeleteResult>> {
        let token = require_token(manifest_token, "manifest_token")?;
        if !confirmed {
            return Err(LlapiError::invalid(
                "deleting a manifest cannot be undone and must be confirmed",
            ));
        }

        let mut params = Params::new();
        params.flag("confirmed", confirmed);
        self.call_json(RequestSpec::delete(manifest_path(token)).with_params(params))
    }

    /// Lists the reports generated for a manifest.
    pub fn report_tokens(&self, manifest_token: &str) -> Result<Reply<ReportList>> {
        let token = require_token(manifest_token, "manifest_token")?;
        self.call_json(RequestSpec::get(format!("{}/reports", manifest_path(token))))
    }

    /// Gets the most recent report of a manifest.
    pub fn latest_report(
        &self,
        manifest_token: &str,
        filter_results: bool,
        extra_fields: &[CveField],
    ) -> Result<Reply<Report>> {
        let token = require_token(manifest_token, "manifest_token")?;

        let mut params = Params::new();
        params.flag("filtered", filter_results);
        if !extra_fields.is_empty() {
            params.list("with_field", extra_fields.iter().map(CveField::as_str));
        }
        self.call_json(
            RequestSpec::get(format!("{}/reports/latest", manifest_path(token)))
                .with_params(params),
        )
    }
}
