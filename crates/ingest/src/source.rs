use crate::document::Document;
use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub path: PathBuf,
    /// Extension without the leading dot.
    pub extension: String,
    /// Entries shorter than this many characters are never extracted.
    pub min_chars: usize,
    /// Only take the first N matching entries (sampling/test runs). `Some(0)`
    /// is the same as `None`.
    pub max_documents: Option<usize>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/corpus"),
            extension: "txt".to_string(),
            min_chars: 50,
            max_documents: None,
        }
    }
}

/// A corpus entry that has been located but not read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub identifier: String,
    pub path: PathBuf,
}

impl DocumentEntry {
    pub async fn read(&self, min_chars: usize) -> Result<Document, IngestError> {
        let text = fs::read_to_string(&self.path)
            .await
            .map_err(|source| IngestError::Read {
                path: self.path.clone(),
                source,
            })?;

        let document = Document::new(self.identifier.clone(), text);
        let len = document.char_len();
        if len < min_chars {
            return Err(IngestError::TooShort { len, min: min_chars });
        }

        Ok(document)
    }
}

/// Sorted, finite listing of the documents in a corpus directory.
///
/// Only paths are collected up front; text is loaded one document at a time
/// through [`DocumentSource::read`]. Iterating again starts from the first
/// entry.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    root: PathBuf,
    entries: Vec<DocumentEntry>,
    min_chars: usize,
}

impl DocumentSource {
    /// Scan the corpus directory. Fails if the directory is missing or no
    /// entry survives filtering, so callers can stop before any extraction
    /// or storage call is made.
    pub fn open(config: &CorpusConfig) -> Result<Self, IngestError> {
        let root = config.path.clone();
        if !root.exists() {
            return Err(IngestError::MissingCorpus(root));
        }
        if !root.is_dir() {
            return Err(IngestError::NotADirectory(root));
        }

        let extension = config.extension.trim_start_matches('.');
        let mut entries = Vec::new();

        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable corpus entry");
                    None
                }
            })
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !has_extension(path, extension) {
                continue;
            }

            // Byte length is an upper bound on char length, so this never
            // drops a file that would pass the char check on read.
            let bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if (bytes as usize) < config.min_chars {
                debug!(path = %path.display(), bytes, "Skipping short entry");
                continue;
            }

            entries.push(DocumentEntry {
                identifier: entry.file_name().to_string_lossy().to_string(),
                path: path.to_path_buf(),
            });
        }

        // 0 means no limit
        if let Some(max) = config.max_documents.filter(|&max| max > 0) {
            entries.truncate(max);
        }

        if entries.is_empty() {
            return Err(IngestError::EmptyCorpus {
                path: root,
                extension: extension.to_string(),
            });
        }

        info!(
            corpus = %root.display(),
            documents = entries.len(),
            "Corpus scanned"
        );

        Ok(Self {
            root,
            entries,
            min_chars: config.min_chars,
        })
    }

    pub async fn read(&self, entry: &DocumentEntry) -> Result<Document, IngestError> {
        entry.read(self.min_chars).await
    }

    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentEntry> {
        self.entries.iter()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.identifier.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}
