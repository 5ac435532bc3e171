//! Durable index layout.
//!
//! ```text
//! <location>/
//!   manifest.json      names the live version and the embedding model
//!   versions/<n>/      one LanceDB database per persist, table `chunks`
//! ```
//!
//! Each persist writes a new `versions/<n>` (staged as `<n>.partial` and
//! renamed when complete), then publishes it by renaming a freshly written
//! manifest over `manifest.json`. A reader resolves everything from a single
//! manifest read, so it sees either the previous index or the new one. The
//! last `RETAINED_VERSIONS` versions before the live one are kept for readers
//! still holding an older manifest; anything older is pruned.
//!
//! Two processes persisting to the same location at once are not
//! coordinated: they may pick the same version number and one of them fails.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use localrag_core::{Error, Result};

use crate::index::Index;
use crate::schema::{entries_to_record_batch, record_batch_to_entries, CHUNKS_TABLE};
use crate::table::{create_table_from_batch, open_db, open_table, read_all};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const VERSIONS_DIR: &str = "versions";
pub const FORMAT_VERSION: u32 = 1;
pub const RETAINED_VERSIONS: u64 = 2;

const PARTIAL_SUFFIX: &str = ".partial";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    /// Directory under `versions/` holding the table.
    pub version: u64,
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub created_at: String,
}

impl Manifest {
    fn for_index(index: &Index, version: u64) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            version,
            embedding_model: index.model().to_string(),
            dimension: index.dimension(),
            chunk_count: index.len(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn read(location: &Path) -> Result<Option<Self>> {
        let path = location.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let manifest = serde_json::from_slice(&fs::read(&path)?).map_err(Error::storage)?;
        Ok(Some(manifest))
    }
}

pub async fn persist(index: &Index, location: &Path) -> Result<()> {
    let versions = location.join(VERSIONS_DIR);
    fs::create_dir_all(&versions)?;
    let version = next_version(location, &versions)?;
    let partial = versions.join(format!("{version}{PARTIAL_SUFFIX}"));
    if partial.exists() {
        tracing::warn!(path = %partial.display(), "removing leftover partial version");
        fs::remove_dir_all(&partial)?;
    }

    let staged = stage(index, &partial, &versions.join(version.to_string())).await;
    if let Err(e) = staged {
        let _ = fs::remove_dir_all(&partial);
        return Err(e);
    }
    if let Err(e) = publish(&Manifest::for_index(index, version), location) {
        let _ = fs::remove_dir_all(versions.join(version.to_string()));
        return Err(e);
    }
    prune(&versions, version);
    tracing::info!(location = %location.display(), version, entries = index.len(), "index persisted");
    Ok(())
}

/// Load the index at `location`.
///
/// `Ok(None)` means there is no index there yet; a manifest recorded for a
/// different embedding model is an `IndexMismatch`. The returned index
/// searches its own copy of the rows, so later persists to the same
/// location do not affect it.
pub async fn load(location: &Path, expected_model: &str) -> Result<Option<Index>> {
    let Some(manifest) = Manifest::read(location)? else {
        tracing::info!(location = %location.display(), "no persisted index found");
        return Ok(None);
    };
    if manifest.format_version != FORMAT_VERSION {
        return Err(Error::Storage(format!(
            "unsupported index format version {} (expected {})",
            manifest.format_version, FORMAT_VERSION
        )));
    }
    if manifest.embedding_model != expected_model {
        return Err(Error::IndexMismatch { expected: expected_model.to_string(), found: manifest.embedding_model });
    }

    let dir = location.join(VERSIONS_DIR).join(manifest.version.to_string());
    if !dir.is_dir() {
        return Err(Error::Storage(format!("index version {} is missing at {}", manifest.version, dir.display())));
    }
    let conn = open_db(&dir.to_string_lossy()).await?;
    let table = open_table(&conn, CHUNKS_TABLE).await?;
    let batches = read_all(&table, manifest.chunk_count.max(1)).await?;
    let mut rows = Vec::with_capacity(manifest.chunk_count);
    for batch in &batches {
        rows.extend(record_batch_to_entries(batch)?);
    }
    if rows.len() != manifest.chunk_count {
        return Err(Error::Storage(format!(
            "manifest records {} chunks but the table holds {}",
            manifest.chunk_count,
            rows.len()
        )));
    }
    rows.sort_by_key(|(position, _)| *position);
    let entries = rows.into_iter().map(|(_, entry)| entry).collect();
    let index = Index::materialize(manifest.embedding_model, manifest.dimension, entries).await?;
    tracing::info!(location = %location.display(), version = manifest.version, entries = index.len(), model = %index.model(), "index loaded");
    Ok(Some(index))
}

/// Write the table into `partial`, then rename it to `target`.
async fn stage(index: &Index, partial: &Path, target: &Path) -> Result<()> {
    fs::create_dir(partial)?;
    let conn = open_db(&partial.to_string_lossy()).await?;
    create_table_from_batch(&conn, CHUNKS_TABLE, entries_to_record_batch(index.entries(), index.dimension())?).await?;
    fs::rename(partial, target)?;
    Ok(())
}

/// Atomically replace the manifest.
fn publish(manifest: &Manifest, location: &Path) -> Result<()> {
    let body = serde_json::to_vec_pretty(manifest).map_err(Error::storage)?;
    let tmp = location.join(format!("{MANIFEST_FILE}.{}.tmp", manifest.version));
    if let Err(e) = fs::write(&tmp, body).and_then(|()| fs::rename(&tmp, location.join(MANIFEST_FILE))) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn next_version(location: &Path, versions: &Path) -> Result<u64> {
    let live = Manifest::read(location)?.map(|m| m.version).unwrap_or(0);
    let newest = version_dirs(versions)?.into_iter().map(|(n, _)| n).max().unwrap_or(0);
    Ok(live.max(newest) + 1)
}

/// Completed version directories as `(number, path)`.
fn version_dirs(versions: &Path) -> Result<Vec<(u64, PathBuf)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(versions)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(n) = entry.file_name().to_str().and_then(|name| name.parse::<u64>().ok()) {
            out.push((n, entry.path()));
        }
    }
    Ok(out)
}

/// Drop versions more than `RETAINED_VERSIONS` behind `live`.
fn prune(versions: &Path, live: u64) {
    let dirs = match version_dirs(versions) {
        Ok(dirs) => dirs,
        Err(e) => {
            tracing::warn!(path = %versions.display(), error = %e, "could not list index versions");
            return;
        }
    };
    for (n, path) in dirs {
        if n + RETAINED_VERSIONS < live {
            if let Err(e) = fs::remove_dir_all(&path) {
                tracing::warn!(path = %path.display(), error = %e, "could not remove old index version");
            }
        }
    }
}
