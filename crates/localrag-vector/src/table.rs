//! LanceDB connection and table helpers.

use arrow_array::{RecordBatch, RecordBatchIterator};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, DistanceType, Table};

use localrag_core::{Error, Result};

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri).execute().await.map_err(Error::storage)
}

pub async fn open_table(conn: &Connection, name: &str) -> Result<Table> {
    conn.open_table(name).execute().await.map_err(Error::storage)
}

/// Create `name` holding exactly the rows of `batch`.
pub async fn create_table_from_batch(conn: &Connection, name: &str, batch: RecordBatch) -> Result<Table> {
    let schema = batch.schema();
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
    conn.create_table(name, reader).execute().await.map_err(Error::storage)
}

/// Full scan, at most `limit` rows.
pub async fn read_all(table: &Table, limit: usize) -> Result<Vec<RecordBatch>> {
    let mut stream = table.query().limit(limit).execute().await.map_err(Error::storage)?;
    let mut batches = Vec::new();
    while let Some(batch) = stream.try_next().await.map_err(Error::storage)? {
        batches.push(batch);
    }
    Ok(batches)
}

/// The `limit` rows closest to `query` by cosine distance; each batch carries `_distance`.
pub async fn nearest(table: &Table, query: &[f32], limit: usize) -> Result<Vec<RecordBatch>> {
    let stream = table
        .vector_search(query.to_vec())
        .map_err(Error::storage)?
        .column("vector")
        .distance_type(DistanceType::Cosine)
        .limit(limit)
        .execute()
        .await
        .map_err(Error::storage)?;
    stream.try_collect().await.map_err(Error::storage)
}
