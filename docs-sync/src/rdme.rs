//! # rdme adapter
//!
//! Implements [`BulkUploader`] by shelling out to the `rdme` CLI:
//!
//! - `rdme openapi <file> --version=<v>` for the OpenAPI document
//! - `rdme docs <dir> --version=<v>` for a markdown directory
//!
//! The tool's exit status is not a reliable signal, so its combined
//! stdout/stderr is classified by marker substrings (case-insensitive) from
//! [`RdmeSettings`], in this order: category not found, success, timeout.
//! A partial docs upload prints both success lines and "category not found",
//! so that marker goes first. Success lines echo doc slugs and file names,
//! so they are checked before the timeout message.
//!
//! The API key is passed through `RDME_API_KEY` rather than on the command line.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use docs_sync_core::contract::{BulkUploader, UploadReport};
use docs_sync_core::error::UploadError;
use serde::Deserialize;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RdmeSettings {
    /// Program to run; a bare name is looked up on `PATH`.
    pub command: String,
    pub success_markers: Vec<String>,
    pub timeout_markers: Vec<String>,
    pub category_not_found_markers: Vec<String>,
}

impl Default for RdmeSettings {
    fn default() -> Self {
        Self {
            command: "rdme".into(),
            success_markers: vec!["successfully".into()],
            timeout_markers: vec!["your upload request timed out".into()],
            category_not_found_markers: vec![
                "category not found".into(),
                "category_notfound".into(),
                "couldn't find a category".into(),
            ],
        }
    }
}

fn contains_any(haystack: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .any(|marker| haystack.contains(&marker.to_lowercase()))
}

/// Maps the tool's output to an upload outcome.
pub fn classify_output(
    settings: &RdmeSettings,
    target: &Path,
    output: &str,
) -> Result<UploadReport, UploadError> {
    let lowered = output.to_lowercase();
    let message = output.trim().to_string();

    if contains_any(&lowered, &settings.category_not_found_markers) {
        return Err(UploadError::CategoryNotFound(message));
    }
    if contains_any(&lowered, &settings.success_markers) {
        return Ok(UploadReport {
            target: target.to_path_buf(),
            output: message,
        });
    }
    if contains_any(&lowered, &settings.timeout_markers) {
        return Err(UploadError::TimedOut(message));
    }
    Err(UploadError::Rejected(message))
}

/// Stdout then stderr, on separate lines.
fn join_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    combined.push('\n');
    combined.push_str(&String::from_utf8_lossy(stderr));
    combined
}

pub struct RdmeUploader {
    settings: RdmeSettings,
    api_key: String,
}

impl RdmeUploader {
    pub fn new(settings: RdmeSettings, api_key: String) -> Self {
        Self { settings, api_key }
    }

    async fn invoke(
        &self,
        subcommand: &str,
        target: &Path,
        version: &str,
    ) -> Result<UploadReport, UploadError> {
        tracing::info!(
            command = %self.settings.command,
            subcommand,
            target = %target.display(),
            version,
            "Invoking bulk-upload tool"
        );
        let output = Command::new(&self.settings.command)
            .arg(subcommand)
            .arg(target)
            .arg(format!("--version={version}"))
            .env("RDME_API_KEY", &self.api_key)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, command = %self.settings.command, "Failed to launch bulk-upload tool");
                UploadError::Launch(format!("{}: {e}", self.settings.command))
            })?;

        let combined = join_output(&output.stdout, &output.stderr);
        tracing::debug!(status = ?output.status, output = %combined, "Bulk-upload tool finished");

        let outcome = classify_output(&self.settings, target, &combined);
        match &outcome {
            Ok(_) => tracing::info!(target = %target.display(), "Bulk upload reported success"),
            Err(e) => tracing::warn!(target = %target.display(), error = %e, "Bulk upload did not report success"),
        }
        outcome
    }
}

#[async_trait]
impl BulkUploader for RdmeUploader {
    async fn upload_specification(
        &self,
        path: &Path,
        version: &str,
    ) -> Result<UploadReport, UploadError> {
        self.invoke("openapi", path, version).await
    }

    async fn upload_docs(&self, dir: &Path, version: &str) -> Result<UploadReport, UploadError> {
        self.invoke("docs", dir, version).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(output: &str) -> Result<UploadReport, UploadError> {
        classify_output(&RdmeSettings::default(), Path::new("docs"), output)
    }

    #[test]
    fn success_marker_is_success() {
        let report = classify("✅ Successfully uploaded openapi.yaml\n").unwrap();
        assert_eq!(report.target, Path::new("docs"));
        assert_eq!(report.output, "✅ Successfully uploaded openapi.yaml");
    }

    #[test]
    fn timeout_is_classified_even_next_to_other_text() {
        assert!(matches!(
            classify("Error: We're sorry, your upload request Timed Out."),
            Err(UploadError::TimedOut(_))
        ));
    }

    #[test]
    fn category_not_found_wins_over_partial_success() {
        let output = "successfully created 'intro'\nCATEGORY_NOTFOUND: The category couldn't be found.";
        assert!(matches!(classify(output), Err(UploadError::CategoryNotFound(_))));
    }

    #[test]
    fn success_for_doc_named_after_timeouts_is_success() {
        let output = "✅ Successfully created 'webhook-timeout' (docs/guides/webhook-timeout.md) with ID 123";
        assert!(classify(output).is_ok());
    }

    #[test]
    fn generic_network_timeout_is_rejected() {
        assert!(matches!(
            classify("Error: connect ETIMEDOUT, socket timeout after 30s"),
            Err(UploadError::Rejected(_))
        ));
    }

    #[test]
    fn markers_do_not_match_across_stdout_stderr_boundary() {
        let joined = join_output(b"upload succe", b"ssfully");
        assert_eq!(joined, "upload succe\nssfully");
        assert!(matches!(classify(&joined), Err(UploadError::Rejected(_))));
    }

    #[test]
    fn anything_else_is_rejected() {
        assert!(matches!(
            classify("Error: invalid API key"),
            Err(UploadError::Rejected(msg)) if msg == "Error: invalid API key"
        ));
    }
}
