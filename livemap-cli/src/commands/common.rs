//! Common helpers shared across CLI commands.

use std::fs;
use std::path::Path;

use livemap::basemap::BasemapCatalog;

use crate::error::CliError;

/// Load the catalog from a JSON file, or fall back to the builtin set.
pub fn load_catalog(path: Option<&Path>) -> Result<BasemapCatalog, CliError> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            Ok(BasemapCatalog::from_json(&raw)?)
        }
        None => Ok(BasemapCatalog::builtin()),
    }
}
