//! Part and macro records returned by the data portal.
//!
//! The API speaks JSON:API. The wire structures here mirror only the fields
//! this tool reads; everything else in the documents is ignored.

use serde::Deserialize;

/// A part as seen by the download client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRecord {
    /// Part ID the record was requested with.
    pub id: String,
    /// ID of the related graphic macro, if the part has one.
    pub graphic_macro_id: Option<String>,
}

impl PartRecord {
    /// Parses a `GET /parts/{id}` document.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a part document.
    pub fn from_json(part_id: &str, body: &[u8]) -> Result<Self, serde_json::Error> {
        let document: Document<PartData> = serde_json::from_slice(body)?;
        let graphic_macro_id = document
            .data
            .relationships
            .graphic_macro
            .and_then(|rel| rel.data)
            .map(|r| r.id);

        Ok(Self {
            id: part_id.to_string(),
            graphic_macro_id,
        })
    }
}

/// A graphic macro and its downloadable variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroRecord {
    /// Macro ID the record was requested with.
    pub id: String,
    /// Display name, e.g. `ABB.1SDA066799R1_3D`.
    pub name: String,
    /// ID of the preview sub-resource, e.g. `..._3D.ema`.
    pub preview_id: Option<String>,
    /// Variant IDs in server order.
    pub variant_ids: Vec<String>,
}

impl MacroRecord {
    /// Parses a `GET /macros/{id}` document.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a macro document.
    pub fn from_json(macro_id: &str, body: &[u8]) -> Result<Self, serde_json::Error> {
        let document: Document<MacroData> = serde_json::from_slice(body)?;
        let data = document.data;

        Ok(Self {
            id: macro_id.to_string(),
            name: data.attributes.name,
            preview_id: data.relationships.preview.and_then(|rel| rel.data).map(|r| r.id),
            variant_ids: data
                .relationships
                .macro_variants
                .map(|rel| rel.data.into_iter().map(|r| r.id).collect())
                .unwrap_or_default(),
        })
    }
}

/// Returns `true` if the macro carries 3D data.
///
/// A macro is 3D when its name ends in `3d` or its preview ID ends in
/// `3d.ema`, both compared case-insensitively.
#[must_use]
pub fn classify_macro(record: &MacroRecord) -> bool {
    if record.name.to_lowercase().ends_with("3d") {
        return true;
    }

    record
        .preview_id
        .as_deref()
        .is_some_and(|id| id.to_lowercase().ends_with("3d.ema"))
}

/// First hit of a part-number search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSummary {
    /// Part ID usable with `GET /parts/{id}`.
    pub id: String,
    /// English description, empty if the portal has none.
    pub description: String,
}

impl PartSummary {
    /// Parses a `GET /parts?search=...` document, keeping the first hit.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a search document.
    pub fn first_from_json(body: &[u8]) -> Result<Option<Self>, serde_json::Error> {
        let document: SearchDocument = serde_json::from_slice(body)?;
        if document.meta.page.total == 0 {
            return Ok(None);
        }

        Ok(document.data.into_iter().next().map(|hit| Self {
            id: hit.id,
            description: hit
                .attributes
                .and_then(|a| a.description)
                .and_then(|d| d.en_us)
                .unwrap_or_default(),
        }))
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct Document<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ResourceRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ToOne {
    #[serde(default)]
    data: Option<ResourceRef>,
}

#[derive(Debug, Deserialize)]
struct ToMany {
    #[serde(default)]
    data: Vec<ResourceRef>,
}

#[derive(Debug, Deserialize)]
struct PartData {
    #[serde(default)]
    relationships: PartRelationships,
}

#[derive(Debug, Default, Deserialize)]
struct PartRelationships {
    #[serde(default)]
    graphic_macro: Option<ToOne>,
}

#[derive(Debug, Deserialize)]
struct MacroData {
    attributes: MacroAttributes,
    #[serde(default)]
    relationships: MacroRelationships,
}

#[derive(Debug, Deserialize)]
struct MacroAttributes {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct MacroRelationships {
    #[serde(default)]
    preview: Option<ToOne>,
    #[serde(default)]
    macro_variants: Option<ToMany>,
}

#[derive(Debug, Deserialize)]
struct SearchDocument {
    meta: SearchMeta,
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchMeta {
    page: SearchPage,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
    #[serde(default)]
    attributes: Option<SearchAttributes>,
}

#[derive(Debug, Deserialize)]
struct SearchAttributes {
    #[serde(default)]
    description: Option<LocalisedText>,
}

#[derive(Debug, Deserialize)]
struct LocalisedText {
    #[serde(rename = "en_US", default)]
    en_us: Option<String>,
}
