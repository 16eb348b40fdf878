//! dataportal-dl: part downloads from the EPLAN Data Portal
//!
//! This library backs two command-line tools:
//!
//! - `dataportal-dl`: an interactive client that authenticates with a
//!   personal access token, resolves part IDs through the REST API and
//!   downloads DXF archives or 3D macro variants into a local directory
//! - `mountingsite-filter`: extracts part numbers with selected mounting
//!   sites from an exported catalog XML file and prints them as JSON
//!
//! # Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Configuration error types
//! - [`logging`]: Tracing setup shared by both binaries
//! - [`portal`]: REST client, records, and the download attempt
//! - [`session`]: Interactive prompt loop with token retry
//! - [`catalog`]: Mounting-site filter and JSON report

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod portal;
pub mod session;
