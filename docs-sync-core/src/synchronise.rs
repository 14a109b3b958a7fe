//! High-level pipeline: brings one documentation version into a clean state and re-populates it.
//!
//! A run walks a fixed sequence of phases:
//!
//! `Start → [Fork] → Clean → UploadSpecification → BuildTables → UpdateTables →
//! UploadGuides → UploadReferenceDocs (retry) → Done`
//!
//! # Responsibilities
//! - Fork a new version when asked to; any fork failure aborts the run
//! - Clean: delete all categories, recreate the configured tree in order, mark
//!   reference categories, delete all API specifications
//! - Upload the OpenAPI document, tolerating the upload-timeout response
//! - Regenerate index tables, then upload guides and reference docs
//!
//! # Error Handling
//! Every phase is fatal on failure and the run stops there. There is no
//! checkpointing: clean is delete-then-recreate, so re-running from the start
//! is always safe.
//!
//! # Ordering
//! Category creation is strictly sequential. The host orders categories by
//! creation time and has no rank field, so issuing creations concurrently
//! would scramble the navigation.

use std::fmt;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::config::{RetryPolicy, SyncConfig};
use crate::contract::{BulkUploader, CategoryKind, DocsApi, UploadReport};
use crate::error::{ApiError, SyncError, UploadError};
use crate::tables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Fork the base version first.
    Create,
    /// The version already exists.
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub version: String,
    pub mode: RunMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Fork,
    Clean,
    UploadSpecification,
    BuildTables,
    UpdateTables,
    UploadGuides,
    UploadReferenceDocs,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Fork => "fork",
            Phase::Clean => "clean",
            Phase::UploadSpecification => "upload-specification",
            Phase::BuildTables => "build-tables",
            Phase::UpdateTables => "update-tables",
            Phase::UploadGuides => "upload-guides",
            Phase::UploadReferenceDocs => "upload-reference-docs",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// How the OpenAPI upload was acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificationOutcome {
    Uploaded,
    /// The host accepted the document but the synchronous response timed out.
    AcceptedAfterTimeout,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanReport {
    pub categories_deleted: usize,
    /// Titles in the order they were created.
    pub categories_created: Vec<String>,
    pub marked_reference: Vec<String>,
    pub specifications_deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchroniseReport {
    pub version: String,
    pub forked: bool,
    pub clean: CleanReport,
    pub specification: SpecificationOutcome,
    pub tables_updated: Vec<PathBuf>,
    pub reference_attempts: u32,
}

/// Synchronises one version at a time against a [`DocsApi`] and a [`BulkUploader`].
pub struct VersionSynchroniser<A, U> {
    api: A,
    uploader: U,
    config: SyncConfig,
}

impl<A, U> VersionSynchroniser<A, U>
where
    A: DocsApi,
    U: BulkUploader,
{
    pub fn new(api: A, uploader: U, config: SyncConfig) -> Self {
        Self {
            api,
            uploader,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs every phase in order. The first failing phase ends the run.
    pub async fn run(&self, request: &RunRequest) -> Result<SynchroniseReport, SyncError> {
        let version = request.version.as_str();
        info!(version, mode = ?request.mode, "[SYNC] Starting version synchronisation");

        let forked = match request.mode {
            RunMode::Create => {
                info!(phase = %Phase::Fork, version, "[SYNC] Entering phase");
                self.create_version(&self.config.base_version, version)
                    .await?;
                true
            }
            RunMode::Update => {
                info!(version, "[SYNC] Updating existing version, fork skipped");
                false
            }
        };

        info!(phase = %Phase::Clean, version, "[SYNC] Entering phase");
        let clean = self.clean_version(version).await?;

        info!(phase = %Phase::UploadSpecification, version, "[SYNC] Entering phase");
        let specification = self
            .upload_specification(version, &self.config.openapi_path)
            .await?;

        info!(phase = %Phase::BuildTables, tables = self.config.tables.len(), "[SYNC] Entering phase");
        let rendered = tables::build_tables(&self.config.tables)?;

        info!(phase = %Phase::UpdateTables, "[SYNC] Entering phase");
        let tables_updated = tables::update_tables(&rendered)?;

        info!(phase = %Phase::UploadGuides, version, "[SYNC] Entering phase");
        self.upload_guides(version, &self.config.guides_dir).await?;

        info!(phase = %Phase::UploadReferenceDocs, version, "[SYNC] Entering phase");
        let reference_attempts = self
            .upload_reference_docs_with_retry(
                version,
                &self.config.reference_dir,
                &self.config.retry,
            )
            .await?;

        info!(phase = %Phase::Done, version, "[SYNC] Version synchronised");
        Ok(SynchroniseReport {
            version: version.to_string(),
            forked,
            clean,
            specification,
            tables_updated,
            reference_attempts,
        })
    }

    /// Forks `base` into `new_version`. Not retried.
    pub async fn create_version(&self, base: &str, new_version: &str) -> Result<(), SyncError> {
        info!(base, new_version, "[SYNC][FORK] Forking version");
        match self.api.fork_version(base, new_version).await {
            Ok(()) => {
                info!(new_version, "[SYNC][FORK] Version created");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, base, new_version, "[SYNC][ERROR][FORK] Fork request failed");
                Err(SyncError::Fork {
                    base: base.to_string(),
                    version: new_version.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Deletes every category and specification of `version` and recreates
    /// the configured category tree.
    pub async fn clean_version(&self, version: &str) -> Result<CleanReport, SyncError> {
        let categories_deleted = self.delete_all_categories(version).await?;
        info!(version, categories_deleted, "[SYNC][CLEAN] Deleted existing categories");

        let categories_created = self.create_categories(version).await?;
        let marked_reference = self.mark_reference_categories(version).await?;

        let specifications_deleted = self.delete_all_specifications(version).await?;
        info!(version, specifications_deleted, "[SYNC][CLEAN] Deleted existing specifications");

        Ok(CleanReport {
            categories_deleted,
            categories_created,
            marked_reference,
            specifications_deleted,
        })
    }

    async fn delete_all_categories(&self, version: &str) -> Result<usize, SyncError> {
        let categories = self
            .api
            .list_categories(version)
            .await
            .map_err(|source| SyncError::Api {
                step: "listing categories",
                source,
            })?;

        let deletions = categories.iter().map(|category| async move {
            self.api
                .delete_category(version, &category.slug)
                .await
                .map_err(|e| {
                    warn!(slug = %category.slug, error = %e, "[SYNC][CLEAN] Failed to delete category");
                    e
                })
        });
        join_deletions("deleting categories", join_all(deletions).await)
    }

    async fn create_categories(&self, version: &str) -> Result<Vec<String>, SyncError> {
        let mut created = Vec::new();
        // One at a time: creation order is display order.
        for title in self.config.categories.creation_order() {
            let category = self
                .api
                .create_category(version, title)
                .await
                .map_err(|source| {
                    error!(title, error = %source, "[SYNC][ERROR][CLEAN] Failed to create category");
                    SyncError::Api {
                        step: "creating categories",
                        source,
                    }
                })?;
            info!(title, slug = %category.slug, "[SYNC][CLEAN] Created category");
            created.push(title.to_string());
        }
        Ok(created)
    }

    async fn mark_reference_categories(&self, version: &str) -> Result<Vec<String>, SyncError> {
        let categories = self
            .api
            .list_categories(version)
            .await
            .map_err(|source| SyncError::Api {
                step: "re-listing categories",
                source,
            })?;

        let mut marked = Vec::new();
        for category in categories
            .iter()
            .filter(|c| self.config.categories.is_reference(&c.title))
        {
            self.api
                .update_category_kind(version, category, CategoryKind::Reference)
                .await
                .map_err(|source| SyncError::Api {
                    step: "marking reference categories",
                    source,
                })?;
            info!(title = %category.title, slug = %category.slug, "[SYNC][CLEAN] Marked category as reference");
            marked.push(category.title.clone());
        }
        Ok(marked)
    }

    async fn delete_all_specifications(&self, version: &str) -> Result<usize, SyncError> {
        let specifications = self
            .api
            .list_specifications(version)
            .await
            .map_err(|source| SyncError::Api {
                step: "listing specifications",
                source,
            })?;

        let deletions = specifications.iter().map(|spec| async move {
            self.api
                .delete_specification(version, &spec.id)
                .await
                .map_err(|e| {
                    warn!(id = %spec.id, error = %e, "[SYNC][CLEAN] Failed to delete specification");
                    e
                })
        });
        join_deletions("deleting specifications", join_all(deletions).await)
    }

    /// Uploads the OpenAPI document. A timed-out upload still counts as accepted.
    pub async fn upload_specification(
        &self,
        version: &str,
        path: &Path,
    ) -> Result<SpecificationOutcome, SyncError> {
        info!(version, path = %path.display(), "[SYNC][SPEC] Uploading OpenAPI document");
        match self.uploader.upload_specification(path, version).await {
            Ok(_) => {
                info!(version, "[SYNC][SPEC] OpenAPI document uploaded");
                Ok(SpecificationOutcome::Uploaded)
            }
            Err(UploadError::TimedOut(message)) => {
                warn!(version, %message, "[SYNC][SPEC] Upload response timed out, treating as accepted");
                Ok(SpecificationOutcome::AcceptedAfterTimeout)
            }
            Err(e) => {
                error!(version, error = %e, "[SYNC][ERROR][SPEC] OpenAPI upload failed");
                Err(SyncError::Specification(e))
            }
        }
    }

    pub async fn upload_guides(&self, version: &str, dir: &Path) -> Result<UploadReport, SyncError> {
        info!(version, dir = %dir.display(), "[SYNC][GUIDES] Uploading guides");
        self.uploader
            .upload_docs(dir, version)
            .await
            .map_err(|e| {
                error!(version, error = %e, "[SYNC][ERROR][GUIDES] Guide upload failed");
                SyncError::Guides(e)
            })
    }

    /// Single attempt; see [`Self::upload_reference_docs_with_retry`] for the bounded loop.
    pub async fn upload_reference_docs(
        &self,
        version: &str,
        dir: &Path,
    ) -> Result<UploadReport, SyncError> {
        self.attempt_reference_upload(version, dir)
            .await
            .map_err(SyncError::ReferenceDocs)
    }

    async fn attempt_reference_upload(
        &self,
        version: &str,
        dir: &Path,
    ) -> Result<UploadReport, UploadError> {
        info!(version, dir = %dir.display(), "[SYNC][REFERENCE] Uploading reference docs");
        self.uploader.upload_docs(dir, version).await
    }

    /// Uploads `dir`, retrying "category not found" with a fixed delay until
    /// `policy.max_attempts` is spent. Returns the number of attempts it took.
    /// Any other failure is fatal on the spot.
    pub async fn upload_reference_docs_with_retry(
        &self,
        version: &str,
        dir: &Path,
        policy: &RetryPolicy,
    ) -> Result<u32, SyncError> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(version, attempt, max_attempts, "[SYNC][REFERENCE] Attempt");
            match self.attempt_reference_upload(version, dir).await {
                Ok(report) => {
                    info!(version, attempt, target = %report.target.display(), "[SYNC][REFERENCE] Reference docs uploaded");
                    return Ok(attempt);
                }
                Err(e) if e.is_retryable() => {
                    if attempt >= max_attempts {
                        error!(version, attempts = attempt, error = %e, "[SYNC][ERROR][REFERENCE] Retries exhausted");
                        return Err(SyncError::RetriesExhausted {
                            attempts: attempt,
                            last: e,
                        });
                    }
                    warn!(
                        version,
                        attempt,
                        delay_ms = policy.delay.as_millis() as u64,
                        error = %e,
                        "[SYNC][REFERENCE] Categories not visible yet, retrying"
                    );
                    tokio::time::sleep(policy.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(version, attempt, error = %e, "[SYNC][ERROR][REFERENCE] Reference upload failed");
                    return Err(SyncError::ReferenceDocs(e));
                }
            }
        }
    }
}

/// Every request in a fan-out batch has run by the time this is called; any
/// failure fails the batch.
fn join_deletions(
    step: &'static str,
    results: Vec<Result<(), ApiError>>,
) -> Result<usize, SyncError> {
    let total = results.len();
    let mut failures = results.into_iter().filter_map(Result::err);
    match failures.next() {
        None => Ok(total),
        Some(first) => Err(SyncError::Cleanup {
            step,
            failed: 1 + failures.count(),
            total,
            first,
        }),
    }
}
