//! EPLAN Data Portal client.
//!
//! This module resolves part IDs to downloadable artifacts:
//!
//! - [`client`]: authenticated requests, part/macro lookups, file downloads
//! - [`credential`]: personal access token validation
//! - [`model`]: part and macro records, 3D classification
//! - [`download`]: the per-part download attempt
//!
//! # REST API
//!
//! | Request | Purpose |
//! |---|---|
//! | `GET /parts/{id}` | Part with optional `graphic_macro` relationship |
//! | `GET /macros/{id}` | Macro name, preview ID and variant IDs |
//! | `GET /download/dxf_data/part/{id}` | Zipped DXF data |
//! | `GET /download/e3d_data/{variant}` | 3D macro file |
//! | `GET /parts?search={n}&fuzziness=0` | Part-number search |

pub mod client;
pub mod credential;
pub mod download;
pub mod error;
pub mod model;

pub use client::{validate_part_number, PortalClient};
pub use credential::{Credential, CredentialError, PAT_ENV_VAR};
pub use download::{download_part, DownloadOutcome, FileKind};
pub use error::{PortalError, PortalResult, ResponseDiagnostics};
pub use model::{classify_macro, MacroRecord, PartRecord, PartSummary};
