#![doc = "HTTP client for the documentation host's management API, implementing the core DocsApi contract."]
//
//! # ReadmeClient
//!
//! Bridges [`docs_sync_core::contract::DocsApi`] to the hosted docs platform's
//! REST API (`/version`, `/categories`, `/api-specification`).
//!
//! - Every request uses HTTP Basic auth with the API key as user name.
//! - Version-scoped requests carry the `x-readme-version` header.
//! - List endpoints are paged; pages are fetched until a short page comes back.
//! - Non-2xx responses map to [`ApiError::Status`] with the response body kept
//!   for diagnostics.

use async_trait::async_trait;
use docs_sync_core::contract::{Category, CategoryKind, DocsApi, Specification};
use docs_sync_core::error::ApiError;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://dash.readme.com/api/v1";
const VERSION_HEADER: &str = "x-readme-version";
const PAGE_SIZE: usize = 100;

/// Where the API lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
struct WireCategory {
    slug: String,
    title: String,
    #[serde(rename = "type", default)]
    kind: String,
}

impl From<WireCategory> for Category {
    fn from(wire: WireCategory) -> Self {
        Category {
            slug: wire.slug,
            title: wire.title,
            kind: CategoryKind::parse(&wire.kind),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireSpecification {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    #[serde(default)]
    title: String,
}

pub struct ReadmeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ReadmeClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("docs-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        tracing::info!(
            base_url = %settings.base_url,
            api_key_set = !settings.api_key.is_empty(),
            "Initialized ReadmeClient"
        );
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth(&self.api_key, None::<&str>)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn versioned(&self, method: Method, path: &str, version: &str) -> RequestBuilder {
        self.request(method, path).header(VERSION_HEADER, version)
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!(error = ?e, %method, path, "Request to documentation API failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!(%method, path, status = status.as_u16(), body = %body, "Documentation API returned an error");
        Err(ApiError::Status {
            method: method.to_string(),
            path: path.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        version: &str,
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut page = 1usize;
        loop {
            let builder = self
                .versioned(Method::GET, path, version)
                .query(&[("perPage", PAGE_SIZE), ("page", page)]);
            let batch: Vec<T> = self
                .send(builder, &Method::GET, path)
                .await?
                .json()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))?;
            let fetched = batch.len();
            items.extend(batch);
            if fetched < PAGE_SIZE {
                break;
            }
            page += 1;
        }
        tracing::debug!(path, version, count = items.len(), "Fetched all pages");
        Ok(items)
    }
}

#[async_trait]
impl DocsApi for ReadmeClient {
    async fn fork_version(&self, base: &str, new_version: &str) -> Result<(), ApiError> {
        tracing::info!(base, new_version, "Forking documentation version");
        let body = json!({
            "version": new_version,
            "from": base,
            "is_stable": false,
            "is_beta": false,
            "is_hidden": false,
        });
        let builder = self.request(Method::POST, "/version").json(&body);
        self.send(builder, &Method::POST, "/version").await?;
        Ok(())
    }

    async fn list_categories(&self, version: &str) -> Result<Vec<Category>, ApiError> {
        let categories: Vec<WireCategory> = self.fetch_all("/categories", version).await?;
        tracing::info!(version, count = categories.len(), "Listed categories");
        Ok(categories.into_iter().map(Category::from).collect())
    }

    async fn create_category(&self, version: &str, title: &str) -> Result<Category, ApiError> {
        let body = json!({ "title": title, "type": CategoryKind::Guide.as_str() });
        let builder = self
            .versioned(Method::POST, "/categories", version)
            .json(&body);
        let created: WireCategory = self
            .send(builder, &Method::POST, "/categories")
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(created.into())
    }

    async fn update_category_kind(
        &self,
        version: &str,
        category: &Category,
        kind: CategoryKind,
    ) -> Result<Category, ApiError> {
        let path = format!("/categories/{}", category.slug);
        let body = json!({ "title": category.title, "type": kind.as_str() });
        let builder = self.versioned(Method::PUT, &path, version).json(&body);
        let updated: WireCategory = self
            .send(builder, &Method::PUT, &path)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(updated.into())
    }

    async fn delete_category(&self, version: &str, slug: &str) -> Result<(), ApiError> {
        let path = format!("/categories/{slug}");
        let builder = self.versioned(Method::DELETE, &path, version);
        self.send(builder, &Method::DELETE, &path).await?;
        tracing::info!(version, slug, "Deleted category");
        Ok(())
    }

    async fn list_specifications(&self, version: &str) -> Result<Vec<Specification>, ApiError> {
        let specs: Vec<WireSpecification> = self.fetch_all("/api-specification", version).await?;
        tracing::info!(version, count = specs.len(), "Listed API specifications");
        Ok(specs
            .into_iter()
            .map(|s| Specification {
                id: s.id,
                title: s.title,
            })
            .collect())
    }

    async fn delete_specification(&self, version: &str, id: &str) -> Result<(), ApiError> {
        let path = format!("/api-specification/{id}");
        let builder = self.versioned(Method::DELETE, &path, version);
        self.send(builder, &Method::DELETE, &path).await?;
        tracing::info!(version, id, "Deleted API specification");
        Ok(())
    }
}
