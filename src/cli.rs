//! Command-line front end: argument parsing and subcommand dispatch.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use vigiles_llapi::{
    Client, ClientConfig, Context, CveField, KeyFileProvider, Reply, ReportFormat, RescanOptions,
    UploadManifestRequest, write_download,
};

/// Command-line interface to the Vigiles LinuxLink API.
#[derive(Parser, Debug)]
#[command(name = "vigiles", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Sign requests and print them instead of sending them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Base URL of the LinuxLink server
    #[arg(short = 'u', long = "url", global = true)]
    pub url: Option<String>,

    /// Do not verify the server's TLS certificate
    #[arg(short = 'i', long, global = true)]
    pub insecure: bool,

    /// PEM bundle of additional CA certificates to trust
    #[arg(long, global = true, value_name = "PATH")]
    pub ca_bundle: Option<PathBuf>,

    /// LinuxLink key file [default: $HOME/timesys/linuxlink_key]
    #[arg(short = 'k', long, global = true)]
    pub key_file: Option<PathBuf>,

    /// Dashboard config with product/folder tokens [default: $HOME/timesys/dashboard_config]
    #[arg(short = 'd', long, global = true)]
    pub dash_config: Option<PathBuf>,

    /// Print compact JSON instead of pretty-printed JSON
    #[arg(short = 'f', long, global = true)]
    pub no_format: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the client version
    Version,
    /// Verify authentication and server availability
    #[command(alias = "test")]
    Heartbeat,
    /// Manage manifests
    #[command(subcommand)]
    Manifest(ManifestCommand),
    /// Download and compare reports
    #[command(subcommand)]
    Report(ReportCommand),
    /// Inspect folders
    #[command(subcommand)]
    Folder(FolderCommand),
    /// Manage products
    #[command(subcommand)]
    Product(ProductCommand),
    /// Manage groups
    #[command(subcommand)]
    Group(GroupCommand),
    /// Look up CVEs
    #[command(subcommand)]
    Cves(CvesCommand),
}

#[derive(Args, Debug)]
pub struct ReportFilters {
    /// Apply every configured filter, not only the kernel/U-Boot config filters
    #[arg(long = "filter")]
    pub filter_results: bool,

    /// Extra CVE fields to include (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub extra_fields: Vec<CveField>,
}

#[derive(Subcommand, Debug)]
pub enum ManifestCommand {
    /// List manifests
    List,
    /// Show manifest metadata and content
    Info {
        token: String,
        /// Convert the manifest to this SBOM format
        #[arg(long)]
        sbom_format: Option<String>,
    },
    /// Download the manifest file
    Download {
        token: String,
        #[arg(long)]
        sbom_format: Option<String>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        outfile: Option<PathBuf>,
    },
    /// Upload a manifest and scan it
    Upload {
        manifest: PathBuf,
        /// Name for the new manifest
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        kernel_config: Option<PathBuf>,
        #[arg(long)]
        uboot_config: Option<PathBuf>,
        /// Folder to create or reuse under the configured product/folder
        #[arg(long)]
        subfolder: Option<String>,
        /// Upload without generating a report
        #[arg(long)]
        upload_only: bool,
        #[command(flatten)]
        filters: ReportFilters,
    },
    /// Delete a manifest (cannot be undone)
    Delete {
        token: String,
        /// Confirm the deletion
        #[arg(long)]
        confirm: bool,
    },
    /// Generate a new report for a manifest
    Rescan {
        token: String,
        /// Rescan without returning the report
        #[arg(long)]
        rescan_only: bool,
        #[command(flatten)]
        filters: ReportFilters,
    },
    /// Show the latest report of a manifest
    LatestReport {
        token: String,
        #[command(flatten)]
        filters: ReportFilters,
    },
    /// List report tokens of a manifest
    Reports { token: String },
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Download a report file
    Download {
        token: String,
        /// csv, pdf, pdfsummary or xlsx
        #[arg(long, default_value = "csv")]
        format: ReportFormat,
        #[arg(long = "filter")]
        filter_results: bool,
        #[arg(short, long)]
        outfile: Option<PathBuf>,
    },
    /// Compare two reports
    Compare {
        token_one: String,
        token_two: String,
        /// Remove whitelisted CVEs from the comparison
        #[arg(long)]
        remove_whitelist: bool,
        #[arg(long = "filter")]
        filter_results: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum FolderCommand {
    /// List folders
    List,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// List products
    List,
    /// Create a product
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show a product (defaults to the configured product)
    Info { token: Option<String> },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// List groups
    List,
    /// Create a group or subgroup
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Parent group token, to create a subgroup
        #[arg(long)]
        parent: Option<String>,
    },
    /// Show a group
    Info {
        token: String,
        /// Include subgroup details
        #[arg(long)]
        subgroups: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CvesCommand {
    /// Search CVEs affecting a CPE product
    Search {
        product: String,
        #[arg(long)]
        version: Option<String>,
        /// Only list CVE identifiers
        #[arg(long)]
        ids_only: bool,
    },
    /// Show CVE details
    Info {
        cve_id: String,
        /// Limit output to these fields (comma separated)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<CveField>,
    },
}

fn home_path(relative: &str) -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(relative))
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default()
            .with_dry_run(self.dry_run)
            .with_verify_tls(!self.insecure);
        if let Some(url) = &self.url {
            config = config.with_base_url(url.as_str());
        }
        if let Some(path) = &self.ca_bundle {
            config = config.with_ca_bundle(path);
        }
        config
    }

    fn context(&self) -> Result<Option<Context>> {
        if let Some(path) = &self.dash_config {
            return Ok(Some(Context::from_dashboard_config(path)?));
        }
        match home_path("timesys/dashboard_config").filter(|p| p.is_file()) {
            Some(path) => Ok(Some(Context::from_dashboard_config(path)?)),
            None => Ok(None),
        }
    }

    fn client(&self) -> Result<Client> {
        let key_file = self
            .key_file
            .clone()
            .or_else(|| home_path("timesys/linuxlink_key"))
            .context("no key file given and $HOME is not set")?;

        let mut client = Client::unconfigured();
        client.configure(
            &KeyFileProvider::new(key_file),
            self.context()?,
            self.client_config(),
        )?;
        Ok(client)
    }
}

/// Writes a JSON reply, or the dry-run description of the request.
fn print_json<T: Serialize, W: Write>(out: &mut W, reply: Reply<T>, compact: bool) -> Result<()> {
    let value = match reply {
        Reply::Live(value) => serde_json::to_value(value)?,
        Reply::DryRun(request) => serde_json::to_value(request)?,
    };
    let text = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    writeln!(out, "{}", text)?;
    Ok(())
}

/// Writes downloaded content to `outfile` or `out`.
fn save_bytes<W: Write>(
    out: &mut W,
    reply: Reply<Vec<u8>>,
    outfile: Option<&Path>,
    compact: bool,
) -> Result<()> {
    let bytes = match reply {
        Reply::Live(bytes) => bytes,
        Reply::DryRun(request) => return print_json(out, Reply::<()>::DryRun(request), compact),
    };
    match outfile {
        Some(path) => {
            let mut file = fs::File::create(path)
                .with_context(|| format!("unable to create {}", path.display()))?;
            write_download(&mut file, &bytes)?;
            log::info!("wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => write_download(out, &bytes)?,
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("unable to read {}", path.display()))
}

fn run_manifest<W: Write>(
    client: &Client,
    command: &ManifestCommand,
    out: &mut W,
    compact: bool,
) -> Result<()> {
    match command {
        ManifestCommand::List => print_json(out, client.list_manifests()?, compact),
        ManifestCommand::Info { token, sbom_format } => print_json(
            out,
            client.manifest_info(token, sbom_format.as_deref())?,
            compact,
        ),
        ManifestCommand::Download {
            token,
            sbom_format,
            outfile,
        } => save_bytes(
            out,
            client.download_manifest(token, sbom_format.as_deref())?,
            outfile.as_deref(),
            compact,
        ),
        ManifestCommand::Upload {
            manifest,
            name,
            kernel_config,
            uboot_config,
            subfolder,
            upload_only,
            filters,
        } => {
            let file_name = manifest
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "manifest".to_string());
            let mut request = UploadManifestRequest::new(read_file(manifest)?)
                .file_name(file_name)
                .filter_results(filters.filter_results)
                .extra_fields(filters.extra_fields.iter().copied())
                .upload_only(*upload_only);
            if let Some(name) = name {
                request = request.manifest_name(name.as_str());
            }
            if let Some(path) = kernel_config {
                request = request.kernel_config(read_file(path)?);
            }
            if let Some(path) = uboot_config {
                request = request.uboot_config(read_file(path)?);
            }
            if let Some(subfolder) = subfolder {
                request = request.subfolder_name(subfolder.as_str());
            }
            print_json(out, client.upload_manifest(&request)?, compact)
        }
        ManifestCommand::Delete { token, confirm } => {
            print_json(out, client.delete_manifest(token, *confirm)?, compact)
        }
        ManifestCommand::Rescan {
            token,
            rescan_only,
            filters,
        } => {
            let options = RescanOptions {
                rescan_only: *rescan_only,
                filter_results: filters.filter_results,
                extra_fields: filters.extra_fields.clone(),
            };
            print_json(out, client.rescan_manifest(token, &options)?, compact)
        }
        ManifestCommand::LatestReport { token, filters } => print_json(
            out,
            client.latest_report(token, filters.filter_results, &filters.extra_fields)?,
            compact,
        ),
        ManifestCommand::Reports { token } => {
            print_json(out, client.report_tokens(token)?, compact)
        }
    }
}

/// Runs one command, writing its output to `out`.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    let compact = cli.no_format;

    if let Command::Version = cli.command {
        writeln!(out, "vigiles {}", env!("CARGO_PKG_VERSION"))?;
        return Ok(());
    }

    let client = cli.client()?;
    match &cli.command {
        Command::Version => Ok(()),
        Command::Heartbeat => print_json(out, client.heartbeat()?, compact),
        Command::Manifest(command) => run_manifest(&client, command, out, compact),
        Command::Report(ReportCommand::Download {
            token,
            format,
            filter_results,
            outfile,
        }) => save_bytes(
            out,
            client.download_report(token, *format, *filter_results)?,
            outfile.as_deref(),
            compact,
        ),
        Command::Report(ReportCommand::Compare {
            token_one,
            token_two,
            remove_whitelist,
            filter_results,
        }) => print_json(
            out,
            client.compare_reports(token_one, token_two, *remove_whitelist, *filter_results)?,
            compact,
        ),
        Command::Folder(FolderCommand::List) => print_json(out, client.list_folders()?, compact),
        Command::Product(ProductCommand::List) => {
            print_json(out, client.list_products()?, compact)
        }
        Command::Product(ProductCommand::Create { name, description }) => print_json(
            out,
            client.create_product(name, description.as_deref())?,
            compact,
        ),
        Command::Product(ProductCommand::Info { token }) => {
            print_json(out, client.product_info(token.as_deref())?, compact)
        }
        Command::Group(GroupCommand::List) => print_json(out, client.list_groups()?, compact),
        Command::Group(GroupCommand::Create {
            name,
            description,
            parent,
        }) => print_json(
            out,
            client.create_group(name, description.as_deref(), parent.as_deref())?,
            compact,
        ),
        Command::Group(GroupCommand::Info { token, subgroups }) => {
            print_json(out, client.group_info(token, *subgroups)?, compact)
        }
        Command::Cves(CvesCommand::Search {
            product,
            version,
            ids_only,
        }) => print_json(
            out,
            client.search_cves(product, version.as_deref(), *ids_only)?,
            compact,
        ),
        Command::Cves(CvesCommand::Info { cve_id, fields }) => {
            print_json(out, client.cve_info(cve_id, fields)?, compact)
        }
    }
}

/// Process exit status for a command result: 0 on success, 1 on any error.
pub fn exit_status(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn key_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"email": "user@example.com", "key": "user-api-key"}}"#
        )
        .unwrap();
        file
    }

    fn run_args(args: &[&str]) -> (Result<()>, String) {
        let cli = Cli::try_parse_from(args).expect("arguments should parse");
        let mut out = Vec::new();
        let result = run(&cli, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn version_needs_no_key_file() {
        let (result, out) = run_args(&["vigiles", "-k", "/nonexistent/key", "version"]);
        assert!(result.is_ok());
        assert!(out.starts_with("vigiles "));
    }

    #[test]
    fn dry_run_heartbeat_prints_descriptor() {
        let key = key_file();
        let path = key.path().to_str().unwrap();
        let (result, out) = run_args(&["vigiles", "--dry-run", "-f", "-k", path, "test"]);
        assert!(result.is_ok());

        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["hmac_msg"], "POST/api/v1/heartbeatemail=user@example.com");
        assert_eq!(value["url"], "https://linuxlink.timesys.com/api/v1/heartbeat");
        assert_eq!(
            value["headers"]["X-Auth-Signature"],
            "7ohyfgJexw8D9SGiP2dkL9VixkgOgvWuTkVtXxUtqDI="
        );
    }

    #[test]
    fn dry_run_report_download_prints_descriptor() {
        let key = key_file();
        let path = key.path().to_str().unwrap();
        let (result, out) = run_args(&[
            "vigiles", "--dry-run", "-k", path, "-u", "http://localhost:9", "report", "download",
            "r-1", "--format", "pdf",
        ]);
        assert!(result.is_ok());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            value["hmac_msg"],
            "GET/api/v1/vigiles/reports/r-1email=user@example.comfiltered=Falseformat=pdf"
        );
    }

    #[test]
    fn missing_key_file_exits_non_zero() {
        let (result, _) = run_args(&["vigiles", "-k", "/nonexistent/key", "heartbeat"]);
        assert!(result.is_err());
        assert_eq!(exit_status(&result), 1);
        assert_eq!(exit_status(&Ok(())), 0);
    }

    #[test]
    fn invalid_report_format_is_rejected() {
        let parsed =
            Cli::try_parse_from(["vigiles", "report", "download", "r-1", "--format", "docx"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn ca_bundle_flag_reaches_client_config() {
        let cli = Cli::try_parse_from([
            "vigiles",
            "--ca-bundle",
            "/etc/ssl/corp-ca.pem",
            "heartbeat",
        ])
        .unwrap();
        let config = cli.client_config();
        assert_eq!(
            config.ca_bundle.as_deref(),
            Some(Path::new("/etc/ssl/corp-ca.pem"))
        );
        assert!(config.verify_tls);
    }

    #[test]
    fn extra_fields_parse_comma_separated() {
        let cli = Cli::try_parse_from([
            "vigiles",
            "manifest",
            "latest-report",
            "m-1",
            "--extra-fields",
            "assigner,references",
        ])
        .unwrap();
        match cli.command {
            Command::Manifest(ManifestCommand::LatestReport { filters, .. }) => {
                assert_eq!(
                    filters.extra_fields,
                    vec![CveField::Assigner, CveField::References]
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
