use std::fs;
use std::io::Write;
use tempfile::TempDir;

use localrag_core::chunker::{Chunker, ChunkingConfig};
use localrag_core::config::{Config, Settings};
use localrag_core::loader::TextLoader;
use localrag_core::types::Document;
use localrag_core::Error;

fn chunker(chunk_size: usize, overlap: usize) -> Chunker {
    Chunker::new(ChunkingConfig { chunk_size, overlap }).expect("valid chunking config")
}

/// Rebuild the source text from chunk windows: each chunk contributes the
/// characters past what earlier windows already covered.
fn reconstruct(chunks: &[localrag_core::types::Chunk]) -> String {
    let mut out: Vec<char> = Vec::new();
    for c in chunks {
        let chars: Vec<char> = c.text.chars().collect();
        let covered = out.len().saturating_sub(c.offset);
        assert!(c.offset <= out.len(), "gap before offset {}", c.offset);
        out.extend(chars.into_iter().skip(covered));
    }
    out.into_iter().collect()
}

#[test]
fn chunks_cover_every_character() {
    let text = "The quick brown fox jumps over the lazy dog, then naps in the sun.";
    for (size, overlap) in [(10, 0), (10, 3), (7, 6), (1, 0), (100, 20)] {
        let chunks = chunker(size, overlap).split(&[Document::new("fox.txt", text)]);
        assert_eq!(reconstruct(&chunks), text, "size={size} overlap={overlap}");
        assert!(chunks.iter().all(|c| c.text.chars().count() <= size));
    }
}

#[test]
fn chunk_count_is_ceil_of_length_over_step() {
    // step = 4, L = 12 divides exactly
    let exact = chunker(6, 2).split(&[Document::new("a", "abcdefghijkl")]);
    assert_eq!(exact.len(), 3);
    let offsets: Vec<usize> = exact.iter().map(|c| c.offset).collect();
    assert_eq!(offsets, vec![0, 4, 8]);
    assert_eq!(exact[2].text, "ijkl");

    // L = 13 leaves a one-character remainder window
    let remainder = chunker(6, 2).split(&[Document::new("a", "abcdefghijklm")]);
    assert_eq!(remainder.len(), 4);
    assert_eq!(remainder.last().map(|c| c.text.as_str()), Some("m"));
}

#[test]
fn overlap_not_smaller_than_chunk_size_is_rejected() {
    for (size, overlap) in [(5, 5), (5, 9), (0, 0)] {
        let err = Chunker::new(ChunkingConfig { chunk_size: size, overlap }).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)), "size={size} overlap={overlap}");
    }
}

#[test]
fn empty_document_yields_no_chunks_and_order_is_preserved() {
    let docs = vec![
        Document::new("first", "aaaa"),
        Document::new("empty", ""),
        Document::new("second", "bbbbbb"),
    ];
    let chunks = chunker(4, 0).split(&docs);
    let sources: Vec<&str> = chunks.iter().map(|c| c.source_id.as_str()).collect();
    assert_eq!(sources, vec!["first", "second", "second"]);
    assert_eq!(chunks, chunker(4, 0).split(&docs), "chunking is deterministic");
}

#[test]
fn metadata_keeps_loader_fields_and_source_id() {
    let doc = Document::new("report.txt", "hello world").with_meta("page", "3");
    let chunks = chunker(5, 1).split(&[doc]);
    for c in &chunks {
        assert_eq!(c.metadata.get("page").map(String::as_str), Some("3"));
        assert_eq!(c.metadata.get("source_id").map(String::as_str), Some("report.txt"));
    }
}

#[test]
fn loader_reads_supported_files_sorted() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let mut f = fs::File::create(dir.join("b.md")).unwrap();
    writeln!(f, "# Notes").unwrap();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("c.pdf"), [0u8, 1, 2]).unwrap();

    let docs = TextLoader::new().load_dir(dir).expect("load");
    let ids: Vec<&str> = docs.iter().map(|d| d.source_id.as_str()).collect();
    assert_eq!(ids, vec!["a.txt", "b.md"]);
    assert_eq!(docs[0].text, "alpha bravo");
    assert!(docs[0].metadata.contains_key("source"));
}

#[test]
fn loader_missing_directory_is_empty() {
    let tmp = TempDir::new().unwrap();
    let docs = TextLoader::new().load_dir(&tmp.path().join("nope")).expect("load");
    assert!(docs.is_empty());
}

#[test]
fn config_defaults_and_file_overlay() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[processing]\nchunk_size = 500\n\n[models]\ncoder = \"codellama\"\n",
    )
    .unwrap();
    fs::write(tmp.path().join("config.test.toml"), "[retrieval]\ntop_k = 6\n").unwrap();

    let settings = Config::load_from(tmp.path(), "test").unwrap().settings().expect("settings");
    assert_eq!(settings.processing.chunk_size, 500);
    assert_eq!(settings.processing.chunk_overlap, 200);
    assert_eq!(settings.models.coder, "codellama");
    assert_eq!(settings.models.embeddings, "nomic-embed-text");
    assert_eq!(settings.retrieval.top_k, 6);
    assert_eq!(settings.router.default_agent, "assistant");
}

#[test]
fn config_rejects_invalid_chunking() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[processing]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap();
    let err = Config::load_from(tmp.path(), "dev").unwrap().settings().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn settings_default_is_valid() {
    Settings::default().validate().expect("defaults validate");
}
