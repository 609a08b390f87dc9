//! Document store and context assembly for local retrieval-augmented generation.
//!
//! `store` turns raw text into embedded passages; `retrieve` answers top-k
//! queries against them; [`ContextBlender`] packs the ranked passages into a
//! bounded prompt context for a [`localrag_core::Generator`].

pub mod context;
pub mod embed;
pub mod generate;
pub mod rank;
pub mod snapshot;
pub mod store;

pub use context::ContextBlender;
pub use embed::embed_with_timeout;
pub use generate::generate_with_timeout;
pub use rank::{best_document, rank_documents};
pub use store::{DocumentStore, ScoredPassage};
