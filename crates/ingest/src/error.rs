use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating or reading corpus documents.
///
/// `MissingCorpus`, `NotADirectory` and `EmptyCorpus` are setup failures and
/// are returned by [`DocumentSource::open`](crate::DocumentSource::open)
/// before any document is handed out. `Read` and `TooShort` concern a single
/// document.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Corpus directory not found: {0}")]
    MissingCorpus(PathBuf),

    #[error("Corpus path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("No .{extension} files found in {path}")]
    EmptyCorpus { path: PathBuf, extension: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Text too short: {len} chars (min: {min})")]
    TooShort { len: usize, min: usize },
}
