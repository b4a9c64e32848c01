//! File-backed timetable provider for development without network access.
//!
//! Loads saved timetable pages from a directory and serves them as if they
//! were live responses, through the same extraction code as the HTTP client.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{DetailHandle, format_hhmm};

use super::error::ProviderError;
use super::extract::{extract_connection_detail, extract_connection_list};
use super::types::{ConnectionQuery, RawConnectionDetail, RawConnectionList};
use super::TimetableProvider;

/// File name of the connection list page.
pub const LIST_PAGE: &str = "list.html";

/// Timetable provider that serves pages from a directory.
///
/// Expects a `list.html` connection list, returned for every query, and
/// detail pages whose file names are the handles `list.html` links to
/// (e.g. `detail-1.html`).
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    /// Page markup keyed by file name
    pages: Arc<HashMap<String, String>>,
}

impl FixtureProvider {
    /// Load every `.html` file in `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let dir = dir.as_ref();
        let mut pages = HashMap::new();

        let entries = std::fs::read_dir(dir).map_err(|e| ProviderError::Fixture {
            message: format!("failed to read fixture directory {:?}: {}", dir, e),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| ProviderError::Fixture {
                message: format!("failed to read directory entry: {}", e),
            })?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("html") {
                continue;
            }

            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .ok_or_else(|| ProviderError::Fixture {
                    message: format!("invalid file name: {:?}", path),
                })?
                .to_string();

            let html = std::fs::read_to_string(&path).map_err(|e| ProviderError::Fixture {
                message: format!("failed to read {:?}: {}", path, e),
            })?;

            pages.insert(name, html);
        }

        if !pages.contains_key(LIST_PAGE) {
            return Err(ProviderError::Fixture {
                message: format!("no {} in {:?}", LIST_PAGE, dir),
            });
        }

        debug!(dir = ?dir, pages = pages.len(), "loaded fixture pages");

        Ok(Self {
            pages: Arc::new(pages),
        })
    }

    /// Returns the handles of all loaded detail pages, sorted.
    pub fn detail_handles(&self) -> Vec<DetailHandle> {
        let mut handles: Vec<DetailHandle> = self
            .pages
            .keys()
            .filter(|name| name.as_str() != LIST_PAGE)
            .map(|name| DetailHandle::new(name.as_str()))
            .collect();
        handles.sort();
        handles
    }

    fn page(&self, name: &str) -> Result<&str, ProviderError> {
        self.pages
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ProviderError::Fixture {
                message: format!("no fixture page {}", name),
            })
    }
}

impl TimetableProvider for FixtureProvider {
    async fn list_connections(
        &self,
        query: &ConnectionQuery,
    ) -> Result<RawConnectionList, ProviderError> {
        // The saved page answers every query; only the query time is used
        extract_connection_list(self.page(LIST_PAGE)?, &format_hhmm(&query.departure))
    }

    async fn fetch_detail(&self, handle: &DetailHandle) -> Result<RawConnectionDetail, ProviderError> {
        extract_connection_detail(self.page(handle.as_str())?)
    }
}
