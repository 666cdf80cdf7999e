//! Error type shared by the CLI commands.

use thiserror::Error;

/// Errors surfaced to the user by the `livemap` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// A scenario or catalog file could not be read.
    #[error("could not read input file: {0}")]
    Io(#[from] std::io::Error),

    /// A scenario document failed to parse.
    #[error("invalid scenario document: {0}")]
    Scenario(#[from] serde_json::Error),

    /// A catalog document failed to parse or validate.
    #[error("invalid catalog document: {0}")]
    Catalog(#[from] livemap::basemap::CatalogError),

    /// The scenario names a basemap the catalog does not have.
    #[error("basemap '{0}' is not in the catalog")]
    UnknownBasemap(String),

    /// A scenario step hit a surface fault.
    #[error("scenario step failed: {0}")]
    Step(#[from] livemap::surface::SurfaceError),

    /// A step needed a live session after the engine was destroyed.
    #[error("no active session for this step")]
    SessionClosed,
}
