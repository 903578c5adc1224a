use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{LlapiError, Result};

/// Optional scoping for requests.
///
/// A folder belongs to a product. With neither token set, requests target
/// the user's default private workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    pub product_token: Option<String>,
    pub folder_token: Option<String>,
}

#[derive(Deserialize)]
struct DashboardConfig {
    product: Option<String>,
    folder: Option<String>,
}

impl Context {
    /// Scopes requests to a product.
    pub fn product(product_token: impl Into<String>) -> Self {
        Self {
            product_token: Some(product_token.into()),
            folder_token: None,
        }
    }

    /// Narrows a product context to one of its folders.
    pub fn with_folder(mut self, folder_token: impl Into<String>) -> Self {
        self.folder_token = Some(folder_token.into());
        self
    }

    /// Without a product token, uploads land in the private workspace and
    /// any folder token is ignored.
    pub fn is_private_workspace(&self) -> bool {
        self.product_token.is_none()
    }

    /// Loads a context from a dashboard config file.
    ///
    /// The file is JSON with a required `product` token and an optional
    /// `folder` token.
    pub fn from_dashboard_config(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LlapiError::Configuration(format!(
                "unable to read dashboard config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse_dashboard_config(&content)
    }

    fn parse_dashboard_config(content: &str) -> Result<Self> {
        let config: DashboardConfig = serde_json::from_str(content).map_err(|e| {
            LlapiError::Configuration(format!("dashboard config is not valid JSON: {}", e))
        })?;

        let product = config
            .product
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                LlapiError::Configuration("dashboard config missing product token".into())
            })?;
        let folder = config
            .folder
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        Ok(Self {
            product_token: Some(product),
            folder_token: folder,
        })
    }
}
