//! Index tables generated from doc front matter.
//!
//! Each [`TableTarget`] lists the markdown docs of one directory as a
//! `| Page | Description |` table and writes it between a pair of markers in
//! an index file:
//!
//! ```text
//! <!-- docs-sync:table endpoints:start -->
//! | Page | Description |
//! | --- | --- |
//! | [List pets](doc:list-pets) | Returns all pets. |
//! <!-- docs-sync:table endpoints:end -->
//! ```
//!
//! Anything outside the markers is left untouched, and files are only
//! rewritten when the region actually changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::TableTarget;
use crate::error::TableError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocEntry {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub target: TableTarget,
    pub markdown: String,
}

#[derive(Debug, Deserialize)]
struct FrontMatter {
    title: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    hidden: bool,
}

/// Leading `---` block. The closing `---` must sit alone on its line.
static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?sm)\A---\r?\n(.*?)\r?\n---[ \t]*\r?$").expect("front matter pattern is valid")
});

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TableError + '_ {
    move |source| TableError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Parses the front matter of one doc. Returns `None` for hidden docs.
pub fn read_entry(path: &Path) -> Result<Option<DocEntry>, TableError> {
    let content = fs::read_to_string(path).map_err(io_error(path))?;
    let block = FRONT_MATTER
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| TableError::FrontMatter {
            path: path.to_path_buf(),
            message: "missing '---' delimited block".into(),
        })?;

    let parsed: FrontMatter =
        serde_yaml::from_str(block.as_str()).map_err(|e| TableError::FrontMatter {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    if parsed.hidden {
        debug!(path = %path.display(), "Skipping hidden doc");
        return Ok(None);
    }

    let slug = match parsed.slug {
        Some(slug) => slug,
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    Ok(Some(DocEntry {
        title: parsed.title,
        slug,
        excerpt: parsed.excerpt,
    }))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Reads the docs of `target.source_dir`, sorted by file name. Only `.md`
/// files directly inside the directory count; the index file itself is skipped.
pub fn collect_entries(target: &TableTarget) -> Result<Vec<DocEntry>, TableError> {
    let dir = target.source_dir.as_path();
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        let is_markdown = path.extension().is_some_and(|ext| ext == "md");
        if path.is_file() && is_markdown && !same_file(&path, &target.index_file) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut entries = Vec::new();
    for path in paths {
        if let Some(entry) = read_entry(&path)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn cell(text: &str) -> String {
    text.replace(['\r', '\n'], " ").replace('|', "\\|").trim().to_string()
}

pub fn render_table(entries: &[DocEntry]) -> String {
    let mut out = String::from("| Page | Description |\n| --- | --- |\n");
    for entry in entries {
        out.push_str(&format!(
            "| [{}](doc:{}) | {} |\n",
            cell(&entry.title),
            entry.slug,
            cell(entry.excerpt.as_deref().unwrap_or(""))
        ));
    }
    out
}

pub fn start_marker(name: &str) -> String {
    format!("<!-- docs-sync:table {name}:start -->")
}

pub fn end_marker(name: &str) -> String {
    format!("<!-- docs-sync:table {name}:end -->")
}

/// Replaces the region called `name` in `content` with `table`.
/// Returns `None` when the markers are missing.
pub fn replace_region(content: &str, name: &str, table: &str) -> Option<String> {
    let pattern = format!(
        "(?s)({})(.*?)({})",
        regex::escape(&start_marker(name)),
        regex::escape(&end_marker(name))
    );
    let region = Regex::new(&pattern).ok()?;
    if !region.is_match(content) {
        return None;
    }
    let replaced = region.replacen(content, 1, |caps: &Captures| {
        format!("{}\n{}{}", &caps[1], table, &caps[3])
    });
    Some(replaced.into_owned())
}

pub fn build_tables(targets: &[TableTarget]) -> Result<Vec<RenderedTable>, TableError> {
    let mut rendered = Vec::with_capacity(targets.len());
    for target in targets {
        let entries = collect_entries(target)?;
        info!(
            table = %target.name,
            source_dir = %target.source_dir.display(),
            rows = entries.len(),
            "Built index table"
        );
        rendered.push(RenderedTable {
            target: target.clone(),
            markdown: render_table(&entries),
        });
    }
    Ok(rendered)
}

/// Writes each table into its index file. Returns the files that changed,
/// once each, in the order they were first written.
pub fn update_tables(tables: &[RenderedTable]) -> Result<Vec<PathBuf>, TableError> {
    let mut changed: Vec<PathBuf> = Vec::new();
    for table in tables {
        let path = table.target.index_file.as_path();
        let content = fs::read_to_string(path).map_err(io_error(path))?;
        let updated = replace_region(&content, &table.target.name, &table.markdown).ok_or_else(
            || TableError::MissingMarker {
                path: path.to_path_buf(),
                name: table.target.name.clone(),
            },
        )?;

        if updated == content {
            debug!(table = %table.target.name, path = %path.display(), "Index table unchanged");
            continue;
        }
        fs::write(path, updated).map_err(io_error(path))?;
        info!(table = %table.target.name, path = %path.display(), "Updated index table");
        if !changed.iter().any(|p| p == path) {
            changed.push(path.to_path_buf());
        }
    }
    Ok(changed)
}
