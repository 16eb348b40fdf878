//! Integration tests for the mounting-site filter.

use std::io::Write;

use dataportal_dl::catalog::{
    extract_parts, extract_parts_from_file, CatalogError, MountingSiteFilter, MountingSiteReport,
};
use tempfile::NamedTempFile;

const CATALOG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<EplanPxfRoot Name="parts" Type="Parts">
  <partsmanagement>
    <part P_ARTICLE_PARTNR="SIE.3RV2011-1AA10" P_ARTICLE_MOUNTINGSITE="1"
          P_ARTICLE_DESCR1="Circuit breaker" P_ARTICLE_MANUFACTURER="SIE"
          P_ARTICLE_MACRO="$(MD_MACROS)\SIE\3RV2011_3D.ema"/>
    <part P_ARTICLE_PARTNR="PXC.3044102" P_ARTICLE_MOUNTINGSITE="2"
          P_ARTICLE_DESCR1="Terminal block" P_ARTICLE_MANUFACTURER="PXC"/>
    <part P_ARTICLE_PARTNR="RIT.8606000" P_ARTICLE_MOUNTINGSITE="3"
          P_ARTICLE_DESCR1="Mounting plate" P_ARTICLE_MANUFACTURER="RIT"/>
    <part P_ARTICLE_PARTNR="ABB.1SDA066799R1" P_ARTICLE_MOUNTINGSITE="4"
          P_ARTICLE_DESCR1="Leistungsschalter" P_ARTICLE_MANUFACTURER="ABB"
          P_ARTICLE_MACRO="ABB_2D.ema"/>
    <part P_ARTICLE_PARTNR="WAG.2002-1201" P_ARTICLE_MOUNTINGSITE="5"
          P_ARTICLE_DESCR1="Durchgangsklemme" P_ARTICLE_MANUFACTURER="WAG">
      <variant P_PART_VARIANT="1"/>
    </part>
  </partsmanagement>
</EplanPxfRoot>
"#;

#[test]
fn default_sites_exclude_site_two() {
    let filter = MountingSiteFilter::default();
    let parts = extract_parts(CATALOG.as_bytes(), &filter).unwrap();
    let report = MountingSiteReport::new(parts, &filter);

    assert_eq!(report.total_parts, 4);
    assert_eq!(
        report.parts,
        vec!["SIE.3RV2011-1AA10", "RIT.8606000", "ABB.1SDA066799R1", "WAG.2002-1201"]
    );
    assert!(report.detailed_parts[0].has_3d_macro);
    assert!(!report.detailed_parts[2].has_3d_macro);
    assert_eq!(report.detailed_parts[3].description, "Durchgangsklemme");
}

#[test]
fn custom_sites() {
    let filter = MountingSiteFilter::new([2]);
    let parts = extract_parts(CATALOG.as_bytes(), &filter).unwrap();

    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].part_number, "PXC.3044102");
    assert_eq!(parts[0].mountingsite, "2");
}

#[test]
fn reads_catalog_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CATALOG.as_bytes()).unwrap();

    let filter = MountingSiteFilter::new([1, 5]);
    let parts = extract_parts_from_file(file.path(), &filter).unwrap();
    let report = MountingSiteReport::new(parts, &filter);

    let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(value["total_parts"], 2);
    assert_eq!(value["mountingsite_filter"], serde_json::json!([1, 5]));
    assert_eq!(value["parts"][1], "WAG.2002-1201");
    assert_eq!(value["detailed_parts"][0]["manufacturer"], "SIE");
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract_parts_from_file(&dir.path().join("nope.xml"), &MountingSiteFilter::default());
    assert!(matches!(result, Err(CatalogError::FileRead { .. })));
}

#[test]
fn catalog_without_matches_is_empty() {
    let xml = r#"<partsmanagement><part P_ARTICLE_PARTNR="A" P_ARTICLE_MOUNTINGSITE="9"/></partsmanagement>"#;
    let parts = extract_parts(xml.as_bytes(), &MountingSiteFilter::default()).unwrap();
    assert!(parts.is_empty());
}
