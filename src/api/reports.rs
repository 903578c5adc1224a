use crate::api::{API_ROOT, ReportFormat, require, require_token};
use crate::client::Client;
use crate::error::Result;
use crate::request::{Params, RequestSpec};
use crate::response::{Reply, ReportComparison};

impl Client {
    /// Downloads a CVE report as a file.
    ///
    /// `filter_results` applies every configured filter; otherwise only the
    /// kernel and U-Boot config filters apply.
    pub fn download_report(
        &self,
        report_token: &str,
        format: ReportFormat,
        filter_results: bool,
    ) -> Result<Reply<Vec<u8>>> {
        let token = require_token(report_token, "report_token")?;

        let mut params = Params::new();
        params
            .flag("filtered", filter_results)
            .text("format", format.as_str());
        self.call_bytes(
            RequestSpec::get(format!("{}/reports/{}", API_ROOT, token)).with_params(params),
        )
    }

    /// Lists CVEs resolved and introduced between two reports.
    pub fn compare_reports(
        &self,
        token_one: &str,
        token_two: &str,
        remove_whitelist: bool,
        filter_results: bool,
    ) -> Result<Reply<ReportComparison>> {
        let one = require(token_one, "first report token")?;
        let two = require(token_two, "second report token")?;

        let mut params = Params::new();
        params
            .text("token_one", one)
            .text("token_two", two)
            .flag("remove_whitelist", remove_whitelist)
            .flag("filtered", filter_results);
        self.call_json(
            RequestSpec::get(format!("{}/reports/compare", API_ROOT)).with_params(params),
        )
    }
}
