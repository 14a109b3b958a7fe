#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use docs_sync_core::config::{CategoryLayout, RetryPolicy, SyncConfig};
use docs_sync_core::contract::{Category, CategoryKind, DocsApi, Specification};
use docs_sync_core::error::ApiError;

/// In-memory stand-in for the documentation host. Records every call in order.
#[derive(Default)]
pub struct FakeDocsApi {
    pub categories: Mutex<Vec<Category>>,
    pub specifications: Mutex<Vec<Specification>>,
    pub calls: Mutex<Vec<String>>,
    pub failing_deletes: HashSet<String>,
    pub fail_fork: bool,
}

impl FakeDocsApi {
    pub fn with_state(categories: Vec<Category>, specifications: Vec<Specification>) -> Self {
        Self {
            categories: Mutex::new(categories),
            specifications: Mutex::new(specifications),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DocsApi for FakeDocsApi {
    async fn fork_version(&self, base: &str, new_version: &str) -> Result<(), ApiError> {
        self.record(format!("fork {base} -> {new_version}"));
        if self.fail_fork {
            return Err(ApiError::Status {
                method: "POST".into(),
                path: "/version".into(),
                status: 400,
                body: "version already exists".into(),
            });
        }
        Ok(())
    }

    async fn list_categories(&self, _version: &str) -> Result<Vec<Category>, ApiError> {
        self.record("list categories".into());
        Ok(self.categories())
    }

    async fn create_category(&self, _version: &str, title: &str) -> Result<Category, ApiError> {
        self.record(format!("create {title}"));
        let category = Category {
            slug: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            kind: CategoryKind::Guide,
        };
        self.categories.lock().unwrap().push(category.clone());
        Ok(category)
    }

    async fn update_category_kind(
        &self,
        _version: &str,
        category: &Category,
        kind: CategoryKind,
    ) -> Result<Category, ApiError> {
        self.record(format!("update {} {}", category.slug, kind.as_str()));
        let mut categories = self.categories.lock().unwrap();
        let stored = categories
            .iter_mut()
            .find(|c| c.slug == category.slug)
            .expect("updated category exists");
        stored.kind = kind;
        Ok(stored.clone())
    }

    async fn delete_category(&self, _version: &str, slug: &str) -> Result<(), ApiError> {
        self.record(format!("delete category {slug}"));
        if self.failing_deletes.contains(slug) {
            return Err(ApiError::Transport(format!("connection reset deleting {slug}")));
        }
        self.categories.lock().unwrap().retain(|c| c.slug != slug);
        Ok(())
    }

    async fn list_specifications(&self, _version: &str) -> Result<Vec<Specification>, ApiError> {
        self.record("list specifications".into());
        Ok(self.specifications.lock().unwrap().clone())
    }

    async fn delete_specification(&self, _version: &str, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete specification {id}"));
        if self.failing_deletes.contains(id) {
            return Err(ApiError::Transport(format!("connection reset deleting {id}")));
        }
        self.specifications.lock().unwrap().retain(|s| s.id != id);
        Ok(())
    }
}

pub fn category(slug: &str, title: &str, kind: CategoryKind) -> Category {
    Category {
        slug: slug.into(),
        title: title.into(),
        kind,
    }
}

pub fn specification(id: &str) -> Specification {
    Specification {
        id: id.into(),
        title: format!("spec {id}"),
    }
}

pub fn sync_config() -> SyncConfig {
    SyncConfig {
        base_version: "1.0".into(),
        categories: CategoryLayout {
            guides: vec!["Getting Started".into(), "Authentication".into()],
            reference: vec!["Endpoints".into(), "Errors".into()],
        },
        openapi_path: "openapi/openapi.yaml".into(),
        guides_dir: "docs/guides".into(),
        reference_dir: "docs/reference".into(),
        retry: RetryPolicy::default(),
        tables: vec![],
    }
}
