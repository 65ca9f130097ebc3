//! Corpus sources.
//!
//! Reading raw corpus text is the only I/O in this crate and happens once,
//! during the explicit startup load.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::corpus::CorpusError;

/// On-disk encoding of a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    /// A single JSON array of records
    JsonArray,
    /// One JSON record per line
    NdJson,
}

impl CorpusFormat {
    /// Infer the format from a file extension (`.jsonl`/`.ndjson` are NDJSON).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") => Self::NdJson,
            _ => Self::JsonArray,
        }
    }
}

/// Trait for anything that can supply raw corpus text.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Name used in load reports and errors
    fn name(&self) -> &str;

    /// Encoding of the raw text
    fn format(&self) -> CorpusFormat;

    /// Read the raw text.
    async fn read(&self) -> Result<String, CorpusError>;
}

/// Corpus stored in a file.
pub struct FileCorpusSource {
    path: PathBuf,
    name: String,
    format: CorpusFormat,
}

impl FileCorpusSource {
    /// Create a source, inferring the format from the extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = CorpusFormat::from_path(&path);
        let name = path.display().to_string();
        Self { path, name, format }
    }

    /// Builder: force a format.
    pub fn with_format(mut self, format: CorpusFormat) -> Self {
        self.format = format;
        self
    }
}

#[async_trait]
impl CorpusSource for FileCorpusSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> CorpusFormat {
        self.format
    }

    async fn read(&self) -> Result<String, CorpusError> {
        tracing::debug!(path = %self.path.display(), "Reading corpus file");
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CorpusError::Io {
                name: self.name.clone(),
                source,
            })
    }
}

/// Corpus text held in memory (bundled resources, tests).
pub struct StaticCorpusSource {
    name: String,
    raw: String,
    format: CorpusFormat,
}

impl StaticCorpusSource {
    pub fn new(name: impl Into<String>, raw: impl Into<String>, format: CorpusFormat) -> Self {
        Self {
            name: name.into(),
            raw: raw.into(),
            format,
        }
    }

    /// A JSON array source.
    pub fn json(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::new(name, raw, CorpusFormat::JsonArray)
    }

    /// An NDJSON source.
    pub fn ndjson(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::new(name, raw, CorpusFormat::NdJson)
    }
}

#[async_trait]
impl CorpusSource for StaticCorpusSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> CorpusFormat {
        self.format
    }

    async fn read(&self) -> Result<String, CorpusError> {
        Ok(self.raw.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(CorpusFormat::from_path(Path::new("a/insights.json")), CorpusFormat::JsonArray);
        assert_eq!(CorpusFormat::from_path(Path::new("generated.jsonl")), CorpusFormat::NdJson);
        assert_eq!(CorpusFormat::from_path(Path::new("generated.ndjson")), CorpusFormat::NdJson);
        assert_eq!(CorpusFormat::from_path(Path::new("noext")), CorpusFormat::JsonArray);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileCorpusSource::new(dir.path().join("missing.json"));
        let err = source.read().await.unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }

    #[tokio::test]
    async fn test_file_source_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.jsonl");
        std::fs::write(&path, "{}\n").unwrap();

        let source = FileCorpusSource::new(&path);
        assert_eq!(source.format(), CorpusFormat::NdJson);
        assert_eq!(source.read().await.unwrap(), "{}\n");
    }
}
