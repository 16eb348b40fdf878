//! Download orchestration for DXF archives and 3D macros.
//!
//! One call to [`download_part`] is one attempt:
//!
//! ```text
//! Idle ─▶ RequestingPart ─▶ RequestingMacro ─▶ Classifying ─▶ Downloading
//!   │         (3d only)        (3d only)          (3d only)        │
//!   └──────────────── dxf ────────────────────────────────────────┘
//!                                                                  ▼
//!                                    Success | SoftFailure | HardFailure
//! ```
//!
//! Hard failures are `Err(PortalError)`. Soft failures are the non-success
//! variants of [`DownloadOutcome`]; they never abort the caller's loop.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::portal::client::PortalClient;
use crate::portal::error::PortalResult;
use crate::portal::model::classify_macro;

/// Maximum length of a generated file name in bytes (`NAME_MAX`).
const MAX_FILE_NAME_LEN: usize = 255;

/// Bytes reserved for `~` and a 16-digit hash when a stem is shortened.
const HASH_SUFFIX_LEN: usize = 17;

/// Which artifact to fetch for a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Zipped DXF drawing of the part.
    Dxf,
    /// Every 3D macro variant of the part's graphic macro.
    ThreeD,
}

impl FileKind {
    /// Returns the operator-facing keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dxf => "dxf",
            Self::ThreeD => "3d",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised file type keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file type '{0}', expected 'dxf' or '3d'")]
pub struct UnknownFileKind(pub String);

impl FromStr for FileKind {
    type Err = UnknownFileKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dxf" => Ok(Self::Dxf),
            "3d" => Ok(Self::ThreeD),
            other => Err(UnknownFileKind(other.to_string())),
        }
    }
}

/// Result of one download attempt that did not hit a hard error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// At least one file was written.
    Downloaded(Vec<PathBuf>),
    /// The part has no graphic macro relationship.
    NoGraphicMacro {
        /// Requested part.
        part_id: String,
    },
    /// The graphic macro is not a 3D macro.
    NotThreeD {
        /// Macro that was inspected.
        macro_id: String,
        /// Its display name.
        name: String,
    },
    /// The macro is 3D but none of its variants could be downloaded.
    NoValidVariant {
        /// Macro that was inspected.
        macro_id: String,
        /// Number of variants tried.
        attempted: usize,
    },
}

impl DownloadOutcome {
    /// `true` if any file was written.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self, Self::Downloaded(_))
    }

    /// Files written by this attempt.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Self::Downloaded(files) => files,
            _ => &[],
        }
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downloaded(files) => write!(f, "downloaded {} file(s)", files.len()),
            Self::NoGraphicMacro { part_id } => {
                write!(f, "part {part_id} has no associated graphic macro")
            }
            Self::NotThreeD { macro_id, name } => {
                write!(f, "macro {macro_id} ({name}) is not a 3D macro")
            }
            Self::NoValidVariant {
                macro_id,
                attempted,
            } => write!(
                f,
                "none of the {attempted} variant(s) of macro {macro_id} could be downloaded"
            ),
        }
    }
}

/// Makes an ID safe to embed in a file name.
///
/// Removes `< > : " / \ | ? *` and replaces whitespace runs with `_`.
#[must_use]
pub fn sanitize_file_stem(raw: &str) -> String {
    static RESERVED: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();

    let reserved =
        RESERVED.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid reserved pattern"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid space pattern"));

    let stripped = reserved.replace_all(raw.trim(), "");
    whitespace.replace_all(&stripped, "_").into_owned()
}

/// File name for a part's DXF archive: `part_{id}.zip`.
#[must_use]
pub fn dxf_file_name(part_id: &str) -> String {
    bounded_file_name("part_", &sanitize_file_stem(part_id), ".zip")
}

/// File name for a macro variant: `macro_{id}.e3d`.
#[must_use]
pub fn macro_file_name(variant_id: &str) -> String {
    bounded_file_name("macro_", &sanitize_file_stem(variant_id), ".e3d")
}

/// Joins the parts, shortening an over-long stem so the whole name fits in
/// [`MAX_FILE_NAME_LEN`] bytes. A shortened stem is cut at a char boundary
/// and suffixed with a hash of the full stem, so distinct IDs sharing a long
/// prefix still get distinct names. The extension is always kept.
fn bounded_file_name(prefix: &str, stem: &str, extension: &str) -> String {
    let budget = MAX_FILE_NAME_LEN - prefix.len() - extension.len();
    if stem.len() <= budget {
        return format!("{prefix}{stem}{extension}");
    }

    let mut end = budget - HASH_SUFFIX_LEN;
    while !stem.is_char_boundary(end) {
        end -= 1;
    }

    let mut hasher = DefaultHasher::new();
    stem.hash(&mut hasher);
    format!("{prefix}{}~{:016x}{extension}", &stem[..end], hasher.finish())
}

/// Downloads the requested artifact for `part_id` into `output_dir`.
///
/// - [`FileKind::Dxf`]: one request to `/download/dxf_data/part/{id}`.
/// - [`FileKind::ThreeD`]: resolves the part and its graphic macro, checks
///   that the macro is 3D, then tries every variant in server order.
///
/// # Errors
///
/// Lookup failures and a failed DXF download are returned as hard errors.
/// Individual variant failures are logged and only count against the
/// attempt.
pub async fn download_part(
    client: &PortalClient,
    part_id: &str,
    kind: FileKind,
    output_dir: &Path,
) -> PortalResult<DownloadOutcome> {
    info!(part_id, kind = %kind, "Starting download");

    match kind {
        FileKind::Dxf => {
            let url = client.endpoint(&["download", "dxf_data", "part", part_id]);
            let path = output_dir.join(dxf_file_name(part_id));
            client.download_artifact(&url, &path).await?;
            Ok(DownloadOutcome::Downloaded(vec![path]))
        }
        FileKind::ThreeD => download_3d_macros(client, part_id, output_dir).await,
    }
}

async fn download_3d_macros(
    client: &PortalClient,
    part_id: &str,
    output_dir: &Path,
) -> PortalResult<DownloadOutcome> {
    debug!(part_id, "Requesting part");
    let part = client.resolve_part(part_id).await?;

    let Some(macro_id) = part.graphic_macro_id else {
        info!(part_id, "Part has no graphic macro");
        return Ok(DownloadOutcome::NoGraphicMacro {
            part_id: part_id.to_string(),
        });
    };

    debug!(part_id, macro_id = %macro_id, "Requesting macro");
    let record = client.resolve_macro(&macro_id).await?;
    debug!(?record, "Macro resolved");

    if !classify_macro(&record) {
        info!(macro_id = %record.id, name = %record.name, "Macro is not 3D");
        return Ok(DownloadOutcome::NotThreeD {
            macro_id: record.id,
            name: record.name,
        });
    }

    info!(
        macro_id = %record.id,
        variants = record.variant_ids.len(),
        "3D macro found, downloading variants"
    );

    let mut written = Vec::new();
    for variant_id in &record.variant_ids {
        let url = client.endpoint(&["download", "e3d_data", variant_id]);
        let path = output_dir.join(macro_file_name(variant_id));
        match client.download_artifact(&url, &path).await {
            Ok(_) => written.push(path),
            Err(e) => warn!(variant_id = %variant_id, error = %e, "Skipping variant"),
        }
    }

    if written.is_empty() {
        return Ok(DownloadOutcome::NoValidVariant {
            macro_id: record.id,
            attempted: record.variant_ids.len(),
        });
    }

    Ok(DownloadOutcome::Downloaded(written))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_kind_parsing() {
        assert_eq!("dxf".parse::<FileKind>(), Ok(FileKind::Dxf));
        assert_eq!(" DXF ".parse::<FileKind>(), Ok(FileKind::Dxf));
        assert_eq!("3D".parse::<FileKind>(), Ok(FileKind::ThreeD));
        assert_eq!(
            "step".parse::<FileKind>(),
            Err(UnknownFileKind("step".to_string()))
        );
    }

    #[test]
    fn file_names() {
        assert_eq!(dxf_file_name("123456"), "part_123456.zip");
        assert_eq!(macro_file_name("v-9"), "macro_v-9.e3d");
    }

    #[test]
    fn file_names_are_sanitised() {
        assert_eq!(dxf_file_name("../etc/passwd"), "part_..etcpasswd.zip");
        assert_eq!(macro_file_name("a b\tc"), "macro_a_b_c.e3d");
        assert_eq!(sanitize_file_stem(r#"x<>:"/\|?*y"#), "xy");
    }

    #[test]
    fn long_file_names_keep_extension() {
        let name = macro_file_name(&"v".repeat(400));
        assert!(name.len() <= MAX_FILE_NAME_LEN);
        assert!(name.starts_with("macro_vvv"));
        assert!(name.ends_with(".e3d"));

        let name = dxf_file_name(&"7".repeat(300));
        assert!(name.len() <= MAX_FILE_NAME_LEN);
        assert!(name.ends_with(".zip"));
    }

    #[test]
    fn multibyte_file_names_fit_in_bytes() {
        let name = macro_file_name(&"é".repeat(300));
        assert!(name.len() <= MAX_FILE_NAME_LEN);
        assert!(name.ends_with(".e3d"));
    }

    #[test]
    fn long_ids_with_shared_prefix_stay_distinct() {
        let shared = "v".repeat(300);
        let a = macro_file_name(&format!("{shared}a"));
        let b = macro_file_name(&format!("{shared}b"));
        assert_ne!(a, b);
        assert_eq!(a, macro_file_name(&format!("{shared}a")));
    }

    #[test]
    fn short_file_names_are_unchanged() {
        let id = "v".repeat(MAX_FILE_NAME_LEN - "macro_.e3d".len());
        assert_eq!(macro_file_name(&id), format!("macro_{id}.e3d"));
    }

    #[test]
    fn outcome_success_flag() {
        let ok = DownloadOutcome::Downloaded(vec![PathBuf::from("part_1.zip")]);
        assert!(ok.succeeded());
        assert_eq!(ok.files().len(), 1);

        let soft = DownloadOutcome::NoGraphicMacro {
            part_id: "1".to_string(),
        };
        assert!(!soft.succeeded());
        assert!(soft.files().is_empty());
        assert_eq!(soft.to_string(), "part 1 has no associated graphic macro");
    }
}
