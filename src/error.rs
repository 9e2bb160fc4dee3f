use std::path::PathBuf;

use thiserror::Error;

/// Errors that can abort a macro build.
///
/// Per-record problems (malformed lines, unmapped pitches, empty input) are
/// absorbed during parsing and building and never surface here.
#[derive(Error, Debug)]
pub enum BuildError {
    /// No Header record supplied a ticks-per-quarter division, so there is
    /// no time basis for the file at all.
    #[error("no Header record with a ticks-per-quarter division")]
    MissingDivision,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
