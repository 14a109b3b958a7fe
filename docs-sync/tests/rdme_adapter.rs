#![cfg(unix)]

mod common;

use std::path::Path;

use docs_sync::rdme::{RdmeSettings, RdmeUploader};
use docs_sync_core::contract::BulkUploader;
use docs_sync_core::error::UploadError;
use serial_test::serial;
use tempfile::tempdir;

use common::{fake_rdme, recorded_calls};

fn uploader(command: &Path) -> RdmeUploader {
    RdmeUploader::new(
        RdmeSettings {
            command: command.display().to_string(),
            ..RdmeSettings::default()
        },
        "rdme_secret".into(),
    )
}

#[tokio::test]
#[serial]
async fn openapi_upload_passes_file_version_and_key() {
    let dir = tempdir().unwrap();
    let script = fake_rdme(dir.path(), "Successfully uploaded openapi.yaml");

    let report = uploader(&script)
        .upload_specification(Path::new("openapi.yaml"), "1.0-beta")
        .await
        .expect("upload succeeds");

    assert_eq!(report.target, Path::new("openapi.yaml"));
    assert_eq!(
        recorded_calls(dir.path()),
        vec!["openapi openapi.yaml --version=1.0-beta key=rdme_secret"]
    );
}

#[tokio::test]
#[serial]
async fn openapi_timeout_text_is_timed_out() {
    let dir = tempdir().unwrap();
    let script = fake_rdme(dir.path(), "Error: Your upload request timed out.");

    let err = uploader(&script)
        .upload_specification(Path::new("openapi.yaml"), "1.0")
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::TimedOut(_)));
}

#[tokio::test]
#[serial]
async fn docs_upload_reports_category_not_found() {
    let dir = tempdir().unwrap();
    let script = fake_rdme(dir.path(), "Error uploading pets.md: Category not found");

    let err = uploader(&script)
        .upload_docs(Path::new("docs/reference"), "1.0")
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(
        recorded_calls(dir.path()),
        vec!["docs docs/reference --version=1.0 key=rdme_secret"]
    );
}

#[tokio::test]
#[serial]
async fn output_without_markers_is_rejected() {
    let dir = tempdir().unwrap();
    let script = fake_rdme(dir.path(), "Error: unauthorized");

    let err = uploader(&script)
        .upload_docs(Path::new("docs/guides"), "1.0")
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Rejected(msg) if msg.contains("unauthorized")));
}

#[tokio::test]
#[serial]
async fn missing_program_is_launch_error() {
    let dir = tempdir().unwrap();

    let err = uploader(&dir.path().join("does-not-exist"))
        .upload_docs(Path::new("docs/guides"), "1.0")
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Launch(_)));
}
