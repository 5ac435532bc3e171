//! Arrow layout of the persisted `chunks` table and conversions to and from
//! in-memory index entries.

use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use localrag_core::types::{Chunk, Meta};
use localrag_core::{Error, Result};

use crate::index::IndexEntry;

pub const CHUNKS_TABLE: &str = "chunks";

/// Column LanceDB adds to vector search results.
pub const DISTANCE_COLUMN: &str = "_distance";

pub fn build_chunks_schema(dimension: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("position", DataType::Int64, false),
        Field::new("id", DataType::Utf8, false),
        Field::new("source_id", DataType::Utf8, false),
        Field::new("offset", DataType::Int64, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("metadata", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension as i32),
            true,
        ),
    ]))
}

pub fn entries_to_record_batch(entries: &[IndexEntry], dimension: usize) -> Result<RecordBatch> {
    let n = entries.len();
    let mut positions = Vec::with_capacity(n);
    let mut ids = Vec::with_capacity(n);
    let mut source_ids = Vec::with_capacity(n);
    let mut offsets = Vec::with_capacity(n);
    let mut texts = Vec::with_capacity(n);
    let mut metadata = Vec::with_capacity(n);
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(n);
    for (i, entry) in entries.iter().enumerate() {
        let c = &entry.chunk;
        positions.push(i as i64);
        ids.push(c.key());
        source_ids.push(c.source_id.clone());
        offsets.push(c.offset as i64);
        texts.push(c.text.clone());
        metadata.push(serde_json::to_string(&c.metadata).map_err(Error::storage)?);
        vectors.push(Some(entry.vector.iter().map(|&x| Some(x)).collect()));
    }
    RecordBatch::try_new(
        build_chunks_schema(dimension),
        vec![
            Arc::new(Int64Array::from(positions)),
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(source_ids)),
            Arc::new(Int64Array::from(offsets)),
            Arc::new(StringArray::from(texts)),
            Arc::new(StringArray::from(metadata)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
                vectors.into_iter(),
                dimension as i32,
            )),
        ],
    )
    .map_err(Error::storage)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::Storage(format!("chunks table is missing column '{name}'")))
}

/// Decode one batch into `(position, entry)` pairs.
pub fn record_batch_to_entries(batch: &RecordBatch) -> Result<Vec<(i64, IndexEntry)>> {
    let positions = column::<Int64Array>(batch, "position")?;
    let source_ids = column::<StringArray>(batch, "source_id")?;
    let offsets = column::<Int64Array>(batch, "offset")?;
    let texts = column::<StringArray>(batch, "text")?;
    let metadata = column::<StringArray>(batch, "metadata")?;
    let vectors = column::<FixedSizeListArray>(batch, "vector")?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        if vectors.is_null(i) {
            return Err(Error::Storage(format!("row {} has no vector", positions.value(i))));
        }
        let meta: Meta = serde_json::from_str(metadata.value(i)).map_err(Error::storage)?;
        let vector = vectors
            .value(i)
            .as_primitive::<Float32Type>()
            .values()
            .iter()
            .copied()
            .collect::<Vec<f32>>();
        let chunk = Chunk {
            text: texts.value(i).to_string(),
            source_id: source_ids.value(i).to_string(),
            offset: usize::try_from(offsets.value(i)).map_err(Error::storage)?,
            metadata: meta,
        };
        out.push((positions.value(i), IndexEntry { chunk, vector }));
    }
    Ok(out)
}

/// `(position, distance)` for each row of a vector search result.
pub fn distances(batch: &RecordBatch) -> Result<Vec<(i64, f32)>> {
    let positions = column::<Int64Array>(batch, "position")?;
    let distances = column::<Float32Array>(batch, DISTANCE_COLUMN)?;
    Ok((0..batch.num_rows()).map(|i| (positions.value(i), distances.value(i))).collect())
}
