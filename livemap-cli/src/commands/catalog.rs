//! Catalog command - print the basemap catalog as a table.

use std::path::PathBuf;

use clap::Args;

use livemap::basemap::DEFAULT_BASEMAP_ID;

use super::common::load_catalog;
use crate::error::CliError;

/// Arguments for the catalog command.
#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Basemap catalog file to use instead of the builtin set
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Include entries that are hidden from pickers
    #[arg(long)]
    pub all: bool,
}

/// Run the catalog command.
pub fn run(args: CatalogArgs) -> Result<(), CliError> {
    let catalog = load_catalog(args.catalog.as_deref())?;

    println!("Basemap catalog");
    println!("===============");
    println!();
    println!(
        "{:<18} {:<16} {:<7} {:>5} {:>4} {:>7}  {}",
        "ID", "LABEL", "KIND", "PITCH", "3D", "HOUSES", "ATTRIBUTION"
    );

    let mut shown = 0;
    for basemap in catalog.iter() {
        if !args.all && !basemap.enabled {
            continue;
        }
        shown += 1;

        let id = if basemap.id == DEFAULT_BASEMAP_ID {
            format!("{}*", basemap.id)
        } else {
            basemap.id.clone()
        };
        let label = if basemap.enabled {
            basemap.label.clone()
        } else {
            format!("{} (hidden)", basemap.label)
        };
        let pitch = basemap
            .preferred_pitch
            .map(|pitch| format!("{pitch:.0}"))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<18} {:<16} {:<7} {:>5} {:>4} {:>7}  {}",
            id,
            label,
            basemap.kind,
            pitch,
            yes_no(basemap.supports_3d),
            yes_no(basemap.supports_house_numbers),
            basemap.attribution
        );
    }

    println!();
    println!(
        "{shown} of {} entries shown ({} enabled)",
        catalog.len(),
        catalog.enabled().count()
    );
    if catalog.contains(DEFAULT_BASEMAP_ID) {
        println!("* session default");
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "-"
    }
}
