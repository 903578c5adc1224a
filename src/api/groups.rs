use crate::api::{API_ROOT, require, require_token};
use crate::client::Client;
use crate::error::Result;
use crate::request::{Params, RequestSpec};
use crate::response::{Group, Reply};

impl Client {
    /// Lists every group available to the current user.
    pub fn list_groups(&self) -> Result<Reply<Vec<Group>>> {
        self.call_json(RequestSpec::get(format!("{}/groups", API_ROOT)))
    }

    /// Creates a group, or a subgroup of `parent_group_token`.
    pub fn create_group(
        &self,
        name: &str,
        description: Option<&str>,
        parent_group_token: Option<&str>,
    ) -> Result<Reply<Group>> {
        let name = require(name, "group name")?;

        let mut params = Params::new();
        params.text("group_name", name);
        if let Some(desc) = description.filter(|d| !d.is_empty()) {
            params.text("description", desc);
        }
        if let Some(parent) = parent_group_token.filter(|p| !p.is_empty()) {
            params.text("group_token", parent);
        }
        self.call_json(RequestSpec::post(format!("{}/groups", API_ROOT)).with_params(params))
    }

    pub fn group_info(&self, group_token: &str, subgroups: bool) -> Result<Reply<Group>> {
        let token = require_token(group_token, "group_token")?;

        let mut params = Params::new();
        params.flag("subgroups", subgroups);
        self.call_json(
            RequestSpec::get(format!("{}/groups/{}", API_ROOT, token)).with_params(params),
        )
    }
}
