//! Document ingestion: decode raw files into text documents.
//!
//! Files are decoded one at a time in input order, so the output list
//! preserves input order regardless of per-file latency. Non-text files
//! and files that fail to decode are dropped from the batch without
//! aborting it; the only trace is an operator-level log line.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::models::IngestedDocument;

/// Extensions accepted even when the declared media type is missing or
/// opaque (case-sensitive suffix match).
const TEXT_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".json", ".csv", ".js", ".ts", ".py", ".html", ".css",
];

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{name} is not valid UTF-8")]
    InvalidUtf8 { name: String },
}

/// Where a raw file's bytes come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Vec<u8>),
    Path(PathBuf),
}

/// An input file as handed to the ingestor: display name, declared media
/// type, and a readable byte source.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub media_type: Option<String>,
    source: FileSource,
}

impl RawFile {
    /// A raw file backed by an in-memory buffer.
    pub fn from_bytes(name: &str, media_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            media_type: media_type.map(|m| m.to_string()),
            source: FileSource::Memory(bytes),
        }
    }

    /// A raw file backed by the filesystem. The media type is guessed
    /// from the file name since the filesystem declares none.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string());
        Self {
            name,
            media_type,
            source: FileSource::Path(path.to_path_buf()),
        }
    }

    /// Whether this file passes the text-acceptance filter: a `text/*`
    /// media type, structured text (JSON), or a recognized extension.
    fn is_text_like(&self) -> bool {
        if let Some(ref media_type) = self.media_type {
            if media_type.starts_with("text/") || media_type == "application/json" {
                return true;
            }
        }
        TEXT_EXTENSIONS.iter().any(|ext| self.name.ends_with(ext))
    }

    /// Read the full byte stream. The filesystem variant is the
    /// suspension point of the ingestion pipeline.
    async fn read_bytes(&self) -> Result<Vec<u8>, IngestError> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => {
                tokio::fs::read(path).await.map_err(|source| IngestError::Read {
                    name: self.name.clone(),
                    source,
                })
            }
        }
    }

    /// Decode the entire file as UTF-8 text.
    async fn decode(&self) -> Result<(String, u64), IngestError> {
        let bytes = self.read_bytes().await?;
        let size_bytes = bytes.len() as u64;
        let content = String::from_utf8(bytes).map_err(|_| IngestError::InvalidUtf8 {
            name: self.name.clone(),
        })?;
        Ok((content, size_bytes))
    }
}

/// Decode a batch of raw files into documents, preserving input order.
///
/// Lossy by design: files that fail the text filter or cannot be decoded
/// are skipped silently, and the rest of the batch continues. Each
/// accepted file gets a fresh v4 UUID, unique within the batch.
pub async fn ingest(files: Vec<RawFile>) -> Vec<IngestedDocument> {
    let mut documents = Vec::with_capacity(files.len());

    for file in files {
        if !file.is_text_like() {
            tracing::warn!(name = %file.name, media_type = ?file.media_type, "skipping non-text file");
            continue;
        }

        match file.decode().await {
            Ok((content, size_bytes)) => {
                tracing::debug!(name = %file.name, size_bytes, "ingested document");
                documents.push(IngestedDocument {
                    id: Uuid::new_v4(),
                    name: file.name,
                    content,
                    mime_hint: file.media_type.unwrap_or_default(),
                    size_bytes,
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping file from batch");
            }
        }
    }

    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    fn text_file(name: &str, content: &str) -> RawFile {
        RawFile::from_bytes(name, Some("text/plain"), content.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn output_order_equals_input_order() {
        let files = vec![
            text_file("a.txt", "first"),
            text_file("b.txt", "second"),
            text_file("c.txt", "third"),
        ];
        let docs = ingest(files).await;

        let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn non_text_files_are_dropped() {
        let files = vec![
            RawFile::from_bytes("photo.png", Some("image/png"), vec![0x89, 0x50]),
            text_file("notes.txt", "keep me"),
            RawFile::from_bytes("archive.zip", Some("application/zip"), vec![0x50, 0x4b]),
        ];
        let docs = ingest(files).await;

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "notes.txt");
    }

    #[tokio::test]
    async fn recognized_extensions_pass_without_media_type() {
        for name in [
            "a.txt", "b.md", "c.json", "d.csv", "e.js", "f.ts", "g.py", "h.html", "i.css",
        ] {
            let docs = ingest(vec![RawFile::from_bytes(name, None, b"x".to_vec())]).await;
            assert_eq!(docs.len(), 1, "{name} should be accepted");
        }

        let docs = ingest(vec![RawFile::from_bytes("j.exe", None, b"x".to_vec())]).await;
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn extension_match_is_case_sensitive() {
        let docs = ingest(vec![RawFile::from_bytes("NOTES.TXT", None, b"x".to_vec())]).await;
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn structured_text_media_type_passes() {
        let file = RawFile::from_bytes("data.bin", Some("application/json"), b"{}".to_vec());
        let docs = ingest(vec![file]).await;
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn decode_failure_is_isolated_to_one_file() {
        let files = vec![
            text_file("before.txt", "ok"),
            RawFile::from_bytes("broken.txt", Some("text/plain"), vec![0xff, 0xfe, 0xfd]),
            text_file("after.txt", "also ok"),
        ];
        let docs = ingest(files).await;

        let names: Vec<_> = docs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["before.txt", "after.txt"]);
    }

    #[tokio::test]
    async fn identifiers_are_unique_within_a_batch() {
        let files: Vec<_> = (0..20).map(|i| text_file(&format!("f{i}.txt"), "x")).collect();
        let docs = ingest(files).await;

        let ids: HashSet<_> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn content_is_carried_forward_unmodified() {
        let content = "Refunds within 30 days.\n\twith\ttabs and  spaces  ";
        let docs = ingest(vec![text_file("policy.txt", content)]).await;

        assert_eq!(docs[0].content, content);
        assert_eq!(docs[0].size_bytes, content.len() as u64);
        assert_eq!(docs[0].mime_hint, "text/plain");
    }

    #[tokio::test]
    async fn from_path_reads_and_guesses_media_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readme.md");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"# Title").unwrap();

        let raw = RawFile::from_path(&path);
        assert_eq!(raw.name, "readme.md");
        assert_eq!(raw.media_type.as_deref(), Some("text/markdown"));

        let docs = ingest(vec![raw]).await;
        assert_eq!(docs[0].content, "# Title");
    }

    #[tokio::test]
    async fn missing_path_is_dropped_not_fatal() {
        let files = vec![
            RawFile::from_path("/nonexistent/ghost.txt"),
            text_file("real.txt", "present"),
        ];
        let docs = ingest(files).await;

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "real.txt");
    }
}
