//! Mounting-site filter for EPLAN catalog exports.
//!
//! Scans an exported parts XML file for `part` elements whose
//! `P_ARTICLE_MOUNTINGSITE` is one of the wanted codes and collects their
//! part numbers. The resulting `parts` list is suitable input for the
//! download client's part-ID prompt.
//!
//! # Input
//!
//! ```xml
//! <partsmanagement>
//!   <part P_ARTICLE_PARTNR="SIE.3RV2011-1AA10" P_ARTICLE_MOUNTINGSITE="1"
//!         P_ARTICLE_DESCR1="Circuit breaker" P_ARTICLE_MANUFACTURER="SIE"
//!         P_ARTICLE_MACRO="$(MD_MACROS)\SIE\3RV2011_3D.ema"/>
//! </partsmanagement>
//! ```
//!
//! `part` elements are matched at any depth.

pub mod error;
pub mod report;

pub use error::{CatalogError, CatalogResult};
pub use report::MountingSiteReport;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use tracing::{debug, info};

/// Mounting-site codes selected when none are given.
pub const DEFAULT_MOUNTING_SITES: [u32; 4] = [1, 3, 4, 5];

const ATTR_MOUNTINGSITE: &str = "P_ARTICLE_MOUNTINGSITE";
const ATTR_PARTNR: &str = "P_ARTICLE_PARTNR";
const ATTR_DESCRIPTION: &str = "P_ARTICLE_DESCR1";
const ATTR_MANUFACTURER: &str = "P_ARTICLE_MANUFACTURER";
const ATTR_MACRO: &str = "P_ARTICLE_MACRO";

/// Set of mounting-site codes to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountingSiteFilter {
    sites: Vec<u32>,
}

impl MountingSiteFilter {
    /// Creates a filter for `sites`. Duplicates are dropped, order is kept.
    /// An empty list selects [`DEFAULT_MOUNTING_SITES`].
    pub fn new(sites: impl IntoIterator<Item = u32>) -> Self {
        let mut unique = Vec::new();
        for site in sites {
            if !unique.contains(&site) {
                unique.push(site);
            }
        }

        if unique.is_empty() {
            return Self::default();
        }

        Self { sites: unique }
    }

    /// Selected codes.
    #[must_use]
    pub fn sites(&self) -> &[u32] {
        &self.sites
    }

    /// `true` if the attribute value names a selected site.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        let value = value.trim();
        self.sites.iter().any(|site| site.to_string() == value)
    }
}

impl Default for MountingSiteFilter {
    fn default() -> Self {
        Self {
            sites: DEFAULT_MOUNTING_SITES.to_vec(),
        }
    }
}

/// A catalog part that passed the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogPart {
    /// `P_ARTICLE_PARTNR`.
    pub part_number: String,
    /// `P_ARTICLE_MOUNTINGSITE` as written in the file.
    pub mountingsite: String,
    /// `P_ARTICLE_DESCR1`, empty if absent.
    pub description: String,
    /// `P_ARTICLE_MANUFACTURER`, empty if absent.
    pub manufacturer: String,
    /// `P_ARTICLE_MACRO` is present and contains `3D`.
    pub has_3d_macro: bool,
}

impl CatalogPart {
    fn from_attributes(attrs: &HashMap<String, String>, filter: &MountingSiteFilter) -> Option<Self> {
        let mountingsite = attrs.get(ATTR_MOUNTINGSITE)?;
        if !filter.matches(mountingsite) {
            return None;
        }

        let part_number = attrs.get(ATTR_PARTNR).filter(|p| !p.is_empty())?;
        let text = |key: &str| attrs.get(key).cloned().unwrap_or_default();

        Some(Self {
            part_number: part_number.clone(),
            mountingsite: mountingsite.clone(),
            description: text(ATTR_DESCRIPTION),
            manufacturer: text(ATTR_MANUFACTURER),
            has_3d_macro: attrs.get(ATTR_MACRO).is_some_and(|m| m.contains("3D")),
        })
    }
}

/// Extracts the matching parts from catalog XML.
///
/// # Errors
///
/// Returns [`CatalogError::Xml`] if the document is malformed.
pub fn extract_parts<R: BufRead>(
    input: R,
    filter: &MountingSiteFilter,
) -> CatalogResult<Vec<CatalogPart>> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut parts = Vec::new();
    let mut scanned = 0_usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) if e.local_name().as_ref() == b"part" => {
                scanned += 1;
                let attrs = part_attributes(&reader, e)?;
                if let Some(part) = CatalogPart::from_attributes(&attrs, filter) {
                    parts.push(part);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(CatalogError::xml(position(&reader), e.to_string())),
        }
        buf.clear();
    }

    debug!(scanned, matched = parts.len(), "Catalog scanned");
    Ok(parts)
}

/// Opens `path` and extracts the matching parts.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is malformed.
pub fn extract_parts_from_file(
    path: &Path,
    filter: &MountingSiteFilter,
) -> CatalogResult<Vec<CatalogPart>> {
    info!(path = %path.display(), sites = ?filter.sites(), "Processing catalog");
    let file = File::open(path).map_err(|e| CatalogError::file_read(path, e))?;
    extract_parts(BufReader::new(file), filter)
}

/// Collects the attributes of one element, entity-unescaped.
fn part_attributes<R>(reader: &Reader<R>, e: &BytesStart<'_>) -> CatalogResult<HashMap<String, String>> {
    let mut attrs = HashMap::with_capacity(8);

    for attr in e.attributes() {
        let attr = attr.map_err(|err| CatalogError::xml(position(reader), err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| CatalogError::xml(position(reader), err.to_string()))?;
        let raw = std::str::from_utf8(&attr.value)
            .map_err(|err| CatalogError::xml(position(reader), err.to_string()))?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|err| CatalogError::xml(position(reader), err.to_string()))?;

        attrs.insert(key.to_string(), value.into_owned());
    }

    Ok(attrs)
}

fn position<R>(reader: &Reader<R>) -> u64 {
    u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX)
}
