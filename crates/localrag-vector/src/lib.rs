//! localrag-vector
//!
//! The embedding index: bulk build from chunks, cosine query through LanceDB,
//! LanceDB-backed persistence guarded by a manifest that records the
//! embedding model, and the query-time `Retriever`.

pub mod index;
pub mod retriever;
pub mod schema;
pub mod store;
pub mod table;

pub use index::{EmbeddingIndex, Index, IndexEntry};
pub use retriever::Retriever;
pub use store::{load, persist, Manifest};
