#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod cancel;
pub mod chunker;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use cancel::CancelToken;
pub use chunker::{chunk, Chunker, ChunkingConfig, Chunks};
pub use error::{Error, Result};
pub use traits::{Embedder, Generator};
pub use types::{Chunk, DocId, Document, Passage, PassageId, SearchHit, SizeUnit};
