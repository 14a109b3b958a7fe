use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::ConfigError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Bounded fixed-delay retry for the reference-doc upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// The category tree of a version, in display order.
///
/// The remote service sorts categories by creation time, so the order of
/// these lists is the order the categories appear in the navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryLayout {
    pub guides: Vec<String>,
    pub reference: Vec<String>,
}

impl CategoryLayout {
    /// Guides first, then reference categories, each in list order.
    pub fn creation_order(&self) -> impl Iterator<Item = &str> {
        self.guides
            .iter()
            .chain(self.reference.iter())
            .map(String::as_str)
    }

    pub fn is_reference(&self, title: &str) -> bool {
        self.reference.iter().any(|t| t == title)
    }
}

/// One generated index table: the docs in `source_dir` rendered into the
/// marked region called `name` inside `index_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTarget {
    pub name: String,
    pub source_dir: PathBuf,
    pub index_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Version that new versions are forked from and tags are appended to.
    pub base_version: String,
    pub categories: CategoryLayout,
    pub openapi_path: PathBuf,
    pub guides_dir: PathBuf,
    pub reference_dir: PathBuf,
    pub retry: RetryPolicy,
    pub tables: Vec<TableTarget>,
}

impl SyncConfig {
    pub fn version_from_tag(&self, tag: &str) -> String {
        format!("{}-{}", self.base_version, tag)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_version.trim().is_empty() {
            return Err(ConfigError::EmptyBaseVersion);
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if let Some(title) = self
            .categories
            .guides
            .iter()
            .find(|t| self.categories.is_reference(t))
        {
            return Err(ConfigError::DuplicateCategory(title.clone()));
        }
        let mut names = HashSet::new();
        for table in &self.tables {
            if !names.insert(table.name.as_str()) {
                return Err(ConfigError::DuplicateTable(table.name.clone()));
            }
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            base_version = %self.base_version,
            guide_categories = self.categories.guides.len(),
            reference_categories = self.categories.reference.len(),
            tables = self.tables.len(),
            max_attempts = self.retry.max_attempts,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SyncConfig {
        SyncConfig {
            base_version: "2.0".into(),
            categories: CategoryLayout {
                guides: vec!["Getting Started".into(), "Authentication".into()],
                reference: vec!["Endpoints".into()],
            },
            openapi_path: "openapi.yaml".into(),
            guides_dir: "docs/guides".into(),
            reference_dir: "docs/reference".into(),
            retry: RetryPolicy::default(),
            tables: vec![],
        }
    }

    #[test]
    fn creation_order_puts_guides_first() {
        let cfg = config();
        let order: Vec<_> = cfg.categories.creation_order().collect();
        assert_eq!(order, vec!["Getting Started", "Authentication", "Endpoints"]);
    }

    #[test]
    fn version_from_tag_appends_suffix() {
        assert_eq!(config().version_from_tag("beta"), "2.0-beta");
    }

    #[test]
    fn default_retry_is_six_attempts_five_seconds() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.max_attempts, 6);
        assert_eq!(retry.delay, Duration::from_secs(5));
    }

    #[test]
    fn validate_rejects_title_in_both_lists() {
        let mut cfg = config();
        cfg.categories.reference.push("Authentication".into());
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateCategory("Authentication".into()))
        );
    }

    #[test]
    fn validate_rejects_zero_attempts_and_empty_base() {
        let mut cfg = config();
        cfg.retry.max_attempts = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroAttempts));

        let mut cfg = config();
        cfg.base_version = "  ".into();
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyBaseVersion));
    }

    #[test]
    fn validate_rejects_duplicate_table_names() {
        let mut cfg = config();
        let table = TableTarget {
            name: "endpoints".into(),
            source_dir: "docs/reference".into(),
            index_file: "docs/guides/overview.md".into(),
        };
        cfg.tables = vec![table.clone(), table];
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DuplicateTable("endpoints".into()))
        );
    }
}
