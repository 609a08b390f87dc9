//! Domain types shared by the chunker, the vector index and the document store.

use serde::{Deserialize, Serialize};

pub type PassageId = String;
pub type DocId = String;

/// A stored, independently retrievable unit of text.
///
/// - `id`: unique for the life of the store (`"{source_doc_id}:{chunk_index}"`)
/// - `embedding`: vector produced by the embedding collaborator
/// - `text`: the chunk payload
/// - `source_doc_id`: identity of the document the chunk was cut from
/// - `offset`: byte offset of `text` within the source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: PassageId,
    pub embedding: Vec<f32>,
    pub text: String,
    pub source_doc_id: DocId,
    pub offset: usize,
}

/// Raw input handed to `store`. Only its derived passages outlive the call.
#[derive(Debug, Clone)]
pub struct Document<'a> {
    pub id: DocId,
    pub raw_text: &'a str,
}

/// A bounded slice of a document, `text == source[start_offset..end_offset]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// A scored index entry. Higher `score` is always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: PassageId,
    pub score: f32,
}

/// Unit used for chunk sizes and blend budgets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    /// Unicode scalar values.
    #[default]
    Chars,
    /// Whitespace-delimited words.
    Words,
}

impl SizeUnit {
    /// Length of `text` measured in this unit.
    #[must_use]
    pub fn measure(self, text: &str) -> usize {
        match self {
            Self::Chars => text.chars().count(),
            Self::Words => text.split_whitespace().count(),
        }
    }
}
