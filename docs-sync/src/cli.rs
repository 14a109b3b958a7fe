//! This module implements the CLI interface for docs-sync: flag parsing, flag
//! validation, and the async `run` entrypoint used by `main` and by tests.
//!
//! All synchronisation logic (ordering, retries, tables) lives in the
//! [`docs-sync-core`] crate. This module wires the concrete collaborators
//! (the HTTP client and the `rdme` adapter) into a `VersionSynchroniser`.
//!
//! ## Flags
//! - `--version` / `-v` or `--versionTag` / `-vt` (exactly one)
//! - `--create` or `--update` (exactly one)
//! - `--config` (defaults to `docs-sync.yaml`)
//!
//! Invalid flag combinations are usage errors: they are reported together
//! with the usage line before any config is read or any request is sent.
//!
//! [`docs-sync-core`]: ../../docs-sync-core/

use crate::client::ReadmeClient;
use crate::load_config::load_config;
use crate::rdme::RdmeUploader;
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use docs_sync_core::config::SyncConfig;
use docs_sync_core::synchronise::{RunMode, RunRequest, SynchroniseReport, VersionSynchroniser};
use std::ffi::OsString;
use std::path::PathBuf;

/// CLI for docs-sync: fork, clean and re-populate a documentation version.
#[derive(Parser, Debug)]
#[command(
    name = "docs-sync",
    about = "Synchronise a hosted API documentation version with local OpenAPI and markdown sources",
    disable_version_flag = true
)]
pub struct Cli {
    /// Full identifier of the documentation version
    #[arg(short = 'v', long = "version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Suffix appended to the configured base version (also accepted as `-vt`)
    #[arg(long = "versionTag", visible_alias = "vt", value_name = "TAG")]
    pub version_tag: Option<String>,

    /// Fork the base version before cleaning and populating
    #[arg(long)]
    pub create: bool,

    /// Clean and populate an existing version
    #[arg(long)]
    pub update: bool,

    /// Path to the YAML config file
    #[arg(long, default_value = "docs-sync.yaml")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("one of --version or --versionTag is required")]
    MissingVersion,

    #[error("conflicting arguments: --version and --versionTag cannot be used together")]
    ConflictingVersion,

    #[error("one of --create or --update is required")]
    MissingMode,

    #[error("conflicting arguments: --create and --update cannot be used together")]
    ConflictingMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    Explicit(String),
    Tag(String),
}

impl VersionSelector {
    pub fn resolve(&self, config: &SyncConfig) -> String {
        match self {
            VersionSelector::Explicit(version) => version.clone(),
            VersionSelector::Tag(tag) => config.version_from_tag(tag),
        }
    }
}

/// A validated command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub selector: VersionSelector,
    pub mode: RunMode,
    pub config: PathBuf,
}

impl Cli {
    pub fn validate(&self) -> Result<Invocation, UsageError> {
        let selector = match (&self.version, &self.version_tag) {
            (Some(_), Some(_)) => return Err(UsageError::ConflictingVersion),
            (None, None) => return Err(UsageError::MissingVersion),
            (Some(version), None) => VersionSelector::Explicit(version.clone()),
            (None, Some(tag)) => VersionSelector::Tag(tag.clone()),
        };
        let mode = match (self.create, self.update) {
            (true, true) => return Err(UsageError::ConflictingMode),
            (false, false) => return Err(UsageError::MissingMode),
            (true, false) => RunMode::Create,
            (false, true) => RunMode::Update,
        };
        Ok(Invocation {
            selector,
            mode,
            config: self.config.clone(),
        })
    }
}

/// Rewrites the single-dash `-vt` spelling to `--versionTag`, since clap would
/// otherwise read `-vt=beta` as `-v` with the value `t=beta`. Arguments after
/// `--` are passed through untouched.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let rewritten = match arg.to_str() {
                Some("--") => {
                    passthrough = true;
                    None
                }
                Some("-vt") => Some(OsString::from("--versionTag")),
                Some(other) => other
                    .strip_prefix("-vt=")
                    .map(|tag| OsString::from(format!("--versionTag={tag}"))),
                None => None,
            };
            rewritten.unwrap_or(arg)
        })
        .collect()
}

fn print_summary(report: &SynchroniseReport) {
    println!("Synchronised version {}", report.version);
    println!("  forked: {}", report.forked);
    println!(
        "  categories: {} deleted, {} created ({} reference)",
        report.clean.categories_deleted,
        report.clean.categories_created.len(),
        report.clean.marked_reference.len()
    );
    println!(
        "  specifications deleted: {}",
        report.clean.specifications_deleted
    );
    println!("  OpenAPI upload: {:?}", report.specification);
    println!("  tables updated: {}", report.tables_updated.len());
    println!("  reference upload attempts: {}", report.reference_attempts);
}

/// Async CLI entrypoint for `main` and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    let invocation = match cli.validate() {
        Ok(invocation) => invocation,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid arguments, nothing was synchronised");
            eprintln!("error: {e}\n\n{}", Cli::command().render_usage());
            return Ok(());
        }
    };

    let loaded = load_config(&invocation.config)?;
    let version = invocation.selector.resolve(&loaded.sync);
    tracing::info!(command = "sync", version = %version, mode = ?invocation.mode, "Starting synchronisation");

    let api = ReadmeClient::new(&loaded.api).context("failed to build documentation API client")?;
    let uploader = RdmeUploader::new(loaded.rdme, loaded.api.api_key.clone());
    let synchroniser = VersionSynchroniser::new(api, uploader, loaded.sync);

    let request = RunRequest {
        version,
        mode: invocation.mode,
    };
    match synchroniser.run(&request).await {
        Ok(report) => {
            tracing::info!(command = "sync", ?report, "Synchronisation complete");
            print_summary(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = "sync", error = %e, "Synchronisation failed");
            Err(anyhow::Error::new(e).context(format!("synchronising version {}", request.version)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["docs-sync"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("flags parse")
    }

    #[test]
    fn explicit_version_with_create() {
        let invocation = parse(&["-v", "2.1", "--create"]).validate().unwrap();
        assert_eq!(invocation.selector, VersionSelector::Explicit("2.1".into()));
        assert_eq!(invocation.mode, RunMode::Create);
        assert_eq!(invocation.config, PathBuf::from("docs-sync.yaml"));
    }

    #[test]
    fn version_tag_with_update_and_alias() {
        let invocation = parse(&["--versionTag", "beta", "--update"]).validate().unwrap();
        assert_eq!(invocation.selector, VersionSelector::Tag("beta".into()));
        assert_eq!(invocation.mode, RunMode::Update);

        let aliased = parse(&["--vt", "beta", "--update"]).validate().unwrap();
        assert_eq!(aliased, invocation);
    }

    fn parse_normalized(args: &[&str]) -> Cli {
        let mut argv = vec!["docs-sync"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(normalize_args(argv)).expect("flags parse")
    }

    #[test]
    fn single_dash_vt_is_the_version_tag() {
        let spaced = parse_normalized(&["-vt", "beta", "--update"]).validate().unwrap();
        assert_eq!(spaced.selector, VersionSelector::Tag("beta".into()));

        let joined = parse_normalized(&["-vt=beta", "--update"]).validate().unwrap();
        assert_eq!(joined, spaced);
    }

    #[test]
    fn normalize_leaves_other_arguments_alone() {
        let argv = ["docs-sync", "-v", "2.1", "--create", "--", "-vt"];
        let expected: Vec<OsString> = argv.iter().map(OsString::from).collect();
        assert_eq!(normalize_args(argv), expected);
    }

    #[test]
    fn missing_version_is_usage_error() {
        assert_eq!(
            parse(&["--create"]).validate(),
            Err(UsageError::MissingVersion)
        );
    }

    #[test]
    fn both_version_flags_conflict() {
        assert_eq!(
            parse(&["-v", "2.1", "--vt", "beta", "--create"]).validate(),
            Err(UsageError::ConflictingVersion)
        );
    }

    #[test]
    fn both_modes_conflict() {
        assert_eq!(
            parse(&["-v", "2.1", "--create", "--update"]).validate(),
            Err(UsageError::ConflictingMode)
        );
    }

    #[test]
    fn missing_mode_is_usage_error() {
        assert_eq!(parse(&["-v", "2.1"]).validate(), Err(UsageError::MissingMode));
    }
}
