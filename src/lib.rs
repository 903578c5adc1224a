//! Client library for the Vigiles LinuxLink API.
//!
//! Every request is signed: the method, path and sorted scalar parameters
//! form a canonical message, which is keyed-hashed with the user's API key
//! and sent in the `X-Auth-Signature` header. Dry-run mode runs the same
//! signing path and returns a description of the request instead of
//! sending it.
//!
//! Supported operations:
//!
//! - [`Client::heartbeat`]: check authentication and server health
//! - manifests: [`Client::list_manifests`], [`Client::manifest_info`],
//!   [`Client::download_manifest`], [`Client::upload_manifest`],
//!   [`Client::rescan_manifest`], [`Client::delete_manifest`],
//!   [`Client::report_tokens`], [`Client::latest_report`]
//! - reports: [`Client::download_report`], [`Client::compare_reports`]
//! - [`Client::list_folders`], products and groups
//! - CVEs: [`Client::search_cves`], [`Client::cve_info`]
//! - anything else: [`Client::execute`] with a [`RequestSpec`]
//!
//! # Quick Start
//!
//! ```no_run
//! use vigiles_llapi::{Client, ClientConfig, Context, KeyFileProvider, Reply};
//!
//! # fn example() -> vigiles_llapi::Result<()> {
//! let mut client = Client::unconfigured();
//! client.configure(
//!     &KeyFileProvider::new("/home/me/timesys/linuxlink_key"),
//!     Some(Context::from_dashboard_config("/home/me/timesys/dashboard_config")?),
//!     ClientConfig::default(),
//! )?;
//!
//! if let Reply::Live(beat) = client.heartbeat()? {
//!     println!("server ok: {}", beat.ok);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod context;
pub mod credential;
pub mod error;
pub mod exec;
pub mod request;
pub mod response;
pub mod sign;

pub use api::{CveField, ReportFormat, RescanOptions, UploadManifestRequest};
pub use client::Client;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use context::Context;
pub use credential::{Credential, CredentialProvider, KeyFileProvider, StaticProvider};
pub use error::{LlapiError, Result};
pub use exec::{Expect, ensure_trailing_newline, write_download};
pub use request::{Encoding, ParamValue, Params, RequestSpec, SIGNATURE_HEADER, SignedRequest};
pub use response::{
    ApiResponse, Cve, CveSearch, DeleteResult, Folder, Group, Heartbeat, Manifest, ManifestInfo,
    Payload, Product, Reply, Report, ReportComparison, ReportList, ReportSummary,
};
pub use sign::{CanonicalForm, SignatureScheme, canonical_message};

// Compile-time assertions: key types must be Send + Sync for use across threads.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<Client>;
    let _ = assert_send_sync::<LlapiError>;
    let _ = assert_send_sync::<Credential>;
};
