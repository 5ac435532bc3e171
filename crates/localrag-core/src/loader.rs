//! Plain-text document loader.
//!
//! Rich formats (PDF, DOCX) are extracted elsewhere; this loader only reads
//! UTF-8-ish text files so a directory of notes can be indexed directly.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::Document;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug, Default)]
pub struct TextLoader;

impl TextLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load every supported file under `root`, sorted by path.
    ///
    /// A missing directory yields no documents rather than an error.
    pub fn load_dir(&self, root: &Path) -> Result<Vec<Document>> {
        if !root.exists() {
            tracing::warn!(dir = %root.display(), "document directory not found");
            return Ok(Vec::new());
        }
        let mut documents = Vec::new();
        for path in self.list_files(root) {
            if !is_supported(&path) {
                tracing::warn!(file = %path.display(), "format not supported, skipping");
                continue;
            }
            let doc = self.load_file(&path)?;
            tracing::info!(file = %path.display(), chars = doc.text.chars().count(), "loaded");
            documents.push(doc);
        }
        Ok(documents)
    }

    pub fn load_file(&self, path: &Path) -> Result<Document> {
        let text = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => String::from_utf8_lossy(&fs::read(path)?).to_string(),
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Document::new(file_name.clone(), text)
            .with_meta("source", path.to_string_lossy())
            .with_meta("file_name", file_name))
    }

    fn list_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();
        files
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
