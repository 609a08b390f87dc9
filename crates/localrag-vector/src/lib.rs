//! Exact cosine-similarity index for a local knowledge base.
//!
//! A linear scan over normalized vectors is the whole search algorithm; at
//! the target scale of low tens of thousands of passages it answers in
//! milliseconds and needs no training or tuning.

pub mod index;
pub mod metric;

pub use index::VectorIndex;
pub use metric::{cosine_similarity, dot, normalized};
