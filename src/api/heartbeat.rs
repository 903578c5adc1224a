use crate::client::Client;
use crate::error::Result;
use crate::request::RequestSpec;
use crate::response::{Heartbeat, Reply};

impl Client {
    /// Verifies that authentication works and the server is responding.
    ///
    /// A healthy server answers `{"ok": true}`.
    pub fn heartbeat(&self) -> Result<Reply<Heartbeat>> {
        self.call_json(RequestSpec::post("/api/v1/heartbeat"))
    }
}
