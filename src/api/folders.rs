use crate::api::API_ROOT;
use crate::client::Client;
use crate::error::Result;
use crate::request::RequestSpec;
use crate::response::{Folder, Reply};

impl Client {
    /// Lists folders owned by the current user, limited to the configured
    /// product when one is set.
    pub fn list_folders(&self) -> Result<Reply<Vec<Folder>>> {
        self.call_json(RequestSpec::get(format!("{}/folders", API_ROOT)))
    }
}
