//! mountingsite-filter: extract part numbers by mounting site
//!
//! Reads an exported EPLAN parts catalog and prints the parts whose
//! `P_ARTICLE_MOUNTINGSITE` is one of the selected codes as JSON.
//!
//! ```text
//! mountingsite-filter parts.xml               # JSON to stdout
//! mountingsite-filter parts.xml selected.json # JSON to a file
//! mountingsite-filter parts.xml --site 1 --site 3
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use dataportal_dl::catalog::{extract_parts_from_file, MountingSiteFilter, MountingSiteReport};
use dataportal_dl::logging::{init_tracing, log_level};

/// Extract part numbers with selected mounting sites from a catalog export.
#[derive(Parser, Debug)]
#[command(name = "mountingsite-filter")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Exported catalog XML file
    #[arg(value_name = "XML_FILE")]
    xml_file: PathBuf,

    /// Write the JSON report here instead of stdout
    #[arg(value_name = "OUTPUT_JSON")]
    output: Option<PathBuf>,

    /// Mounting-site code to keep (repeatable, default 1, 3, 4 and 5)
    #[arg(long = "site", value_name = "CODE")]
    sites: Vec<u32>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(log_level(args.verbose, args.quiet, "warn"));

    let filter = MountingSiteFilter::new(args.sites);
    let sites = filter
        .sites()
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    eprintln!("Processing XML file: {}", args.xml_file.display());
    let parts = match extract_parts_from_file(&args.xml_file, &filter) {
        Ok(parts) => parts,
        Err(e) => {
            error!(error = %e, "Failed to process catalog");
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if parts.is_empty() {
        eprintln!("No matching parts found");
        return ExitCode::SUCCESS;
    }

    eprintln!("Found {} parts with MOUNTINGSITE {sites}", parts.len());
    let report = MountingSiteReport::new(parts, &filter);

    let result = match &args.output {
        Some(path) => report.write_to(path).map(|()| {
            eprintln!("JSON saved to: {}", path.display());
        }),
        None => report.to_json().map(|json| println!("{json}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Failed to emit report");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
