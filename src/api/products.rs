use crate::api::{API_ROOT, require, require_token};
use crate::client::Client;
use crate::error::{LlapiError, Result};
use crate::request::{Params, RequestSpec};
use crate::response::{Product, Reply};

impl Client {
    /// Lists every product available to the current user.
    pub fn list_products(&self) -> Result<Reply<Vec<Product>>> {
        self.call_json(RequestSpec::get(format!("{}/products", API_ROOT)))
    }

    pub fn create_product(&self, name: &str, description: Option<&str>) -> Result<Reply<Product>> {
        let name = require(name, "product name")?;

        let mut params = Params::new();
        params.text("name", name);
        if let Some(desc) = description.filter(|d| !d.is_empty()) {
            params.text("desc", desc);
        }
        self.call_json(RequestSpec::post(format!("{}/products", API_ROOT)).with_params(params))
    }

    /// Gets a product by token, falling back to the configured product.
    pub fn product_info(&self, product_token: Option<&str>) -> Result<Reply<Product>> {
        let token = product_token
            .map(str::to_string)
            .or_else(|| self.context().and_then(|c| c.product_token.clone()))
            .ok_or_else(|| {
                LlapiError::invalid(
                    "product_token is required either as a parameter or in the dashboard config",
                )
            })?;
        let token = require_token(&token, "product_token")?;

        self.call_json(RequestSpec::get(format!("{}/products/{}", API_ROOT, token)))
    }
}
