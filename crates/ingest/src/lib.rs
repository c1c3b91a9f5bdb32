pub mod document;
pub mod error;
pub mod source;

pub use document::{Document, truncate_chars};
pub use error::IngestError;
pub use source::{CorpusConfig, DocumentEntry, DocumentSource};
