//! # contract: interfaces to the outside world
//!
//! Two traits separate the synchroniser from transport details:
//! - [`DocsApi`]: the documentation host's management REST API
//!   (versions, categories, API specifications), always scoped to one version.
//! - [`BulkUploader`]: the external bulk-upload tool that turns a local OpenAPI
//!   file or markdown directory into remote docs.
//!
//! Both are annotated for `mockall`, so tests can script exact call sequences.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::Serialize;

use crate::error::{ApiError, UploadError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    /// Default kind for a newly created category.
    #[default]
    Guide,
    Reference,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Guide => "guide",
            CategoryKind::Reference => "reference",
        }
    }

    /// Unknown kinds fall back to the default.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "reference" => CategoryKind::Reference,
            _ => CategoryKind::Guide,
        }
    }
}

/// A category as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Remote-assigned identifier.
    pub slug: String,
    pub title: String,
    pub kind: CategoryKind,
}

/// An uploaded OpenAPI document attached to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Specification {
    pub id: String,
    pub title: String,
}

/// What the bulk-upload tool reported for one upload target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub target: PathBuf,
    pub output: String,
}

/// The documentation host's management API.
///
/// Every version-scoped call takes the version identifier explicitly; the
/// implementor is responsible for authentication and for sending it in
/// whatever form the host expects.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocsApi: Send + Sync {
    /// Fork `base` into a new version called `new_version`.
    async fn fork_version(&self, base: &str, new_version: &str) -> Result<(), ApiError>;

    async fn list_categories(&self, version: &str) -> Result<Vec<Category>, ApiError>;

    /// Create a category of the default kind. Creation order is display order.
    async fn create_category(&self, version: &str, title: &str) -> Result<Category, ApiError>;

    async fn update_category_kind(
        &self,
        version: &str,
        category: &Category,
        kind: CategoryKind,
    ) -> Result<Category, ApiError>;

    async fn delete_category(&self, version: &str, slug: &str) -> Result<(), ApiError>;

    async fn list_specifications(&self, version: &str) -> Result<Vec<Specification>, ApiError>;

    async fn delete_specification(&self, version: &str, id: &str) -> Result<(), ApiError>;
}

/// The external bulk-upload tool.
///
/// Implementors classify the tool's outcome into [`UploadReport`] or one of
/// the [`UploadError`] variants; the synchroniser only sees the classification.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BulkUploader: Send + Sync {
    /// Upload an OpenAPI document as a new specification of `version`.
    async fn upload_specification(
        &self,
        path: &Path,
        version: &str,
    ) -> Result<UploadReport, UploadError>;

    /// Upload every markdown doc under `dir` into `version`.
    async fn upload_docs(&self, dir: &Path, version: &str) -> Result<UploadReport, UploadError>;
}

#[async_trait]
impl<T: DocsApi + ?Sized> DocsApi for Arc<T> {
    async fn fork_version(&self, base: &str, new_version: &str) -> Result<(), ApiError> {
        (**self).fork_version(base, new_version).await
    }

    async fn list_categories(&self, version: &str) -> Result<Vec<Category>, ApiError> {
        (**self).list_categories(version).await
    }

    async fn create_category(&self, version: &str, title: &str) -> Result<Category, ApiError> {
        (**self).create_category(version, title).await
    }

    async fn update_category_kind(
        &self,
        version: &str,
        category: &Category,
        kind: CategoryKind,
    ) -> Result<Category, ApiError> {
        (**self).update_category_kind(version, category, kind).await
    }

    async fn delete_category(&self, version: &str, slug: &str) -> Result<(), ApiError> {
        (**self).delete_category(version, slug).await
    }

    async fn list_specifications(&self, version: &str) -> Result<Vec<Specification>, ApiError> {
        (**self).list_specifications(version).await
    }

    async fn delete_specification(&self, version: &str, id: &str) -> Result<(), ApiError> {
        (**self).delete_specification(version, id).await
    }
}

#[async_trait]
impl<T: BulkUploader + ?Sized> BulkUploader for Arc<T> {
    async fn upload_specification(
        &self,
        path: &Path,
        version: &str,
    ) -> Result<UploadReport, UploadError> {
        (**self).upload_specification(path, version).await
    }

    async fn upload_docs(&self, dir: &Path, version: &str) -> Result<UploadReport, UploadError> {
        (**self).upload_docs(dir, version).await
    }
}
