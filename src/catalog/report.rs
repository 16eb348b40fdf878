//! JSON report of the filtered catalog.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::catalog::error::{CatalogError, CatalogResult};
use crate::catalog::{CatalogPart, MountingSiteFilter};

/// Output document of the mounting-site filter.
///
/// ```json
/// {
///   "total_parts": 1,
///   "mountingsite_filter": [1, 3, 4, 5],
///   "parts": ["SIE.3RV2011-1AA10"],
///   "detailed_parts": [ { "part_number": "SIE.3RV2011-1AA10", ... } ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountingSiteReport {
    /// Number of matching parts.
    pub total_parts: usize,
    /// Codes the catalog was filtered by.
    pub mountingsite_filter: Vec<u32>,
    /// Part numbers in document order.
    pub parts: Vec<String>,
    /// Full records in document order.
    pub detailed_parts: Vec<CatalogPart>,
}

impl MountingSiteReport {
    /// Builds the report for `parts`.
    #[must_use]
    pub fn new(parts: Vec<CatalogPart>, filter: &MountingSiteFilter) -> Self {
        Self {
            total_parts: parts.len(),
            mountingsite_filter: filter.sites().to_vec(),
            parts: parts.iter().map(|p| p.part_number.clone()).collect(),
            detailed_parts: parts,
        }
    }

    /// Pretty-printed JSON (two-space indent, non-ASCII kept as is).
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json(&self) -> CatalogResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the JSON report to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn write_to(&self, path: &Path) -> CatalogResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| CatalogError::file_write(path, e))?;
        info!(path = %path.display(), parts = self.total_parts, "Report written");
        Ok(())
    }
}
