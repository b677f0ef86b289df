//! Query execution and ranking over an inverted index.
//!
//! The index itself lives behind [`IndexStore`]; this crate turns query
//! phrases into ranked or boolean-filtered document ids, expands terms
//! fuzzily, and formats highlighted snippets of stored text.

use serde::{Deserialize, Serialize};

pub mod boolean;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod highlight;
pub mod index;
pub mod search;
pub mod stemmer;
pub mod store;
pub mod tokenizer;

pub use config::SearchConfig;
pub use error::{Error, Result};
pub use highlight::{HighlightOptions, Highlighter};
pub use index::{IndexData, MemoryStore};
pub use search::{BooleanResult, SearchOutput, SearchResult, Searcher};
pub use stemmer::{Stemmer, StemmerKind};
pub use store::IndexStore;
pub use tokenizer::{Tokenizer, TokenizerKind};

pub type DocId = u32;

/// Term frequency of one term in one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub hit_count: u32,
}

/// Document frequency of a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordlistEntry {
    pub term: String,
    pub num_docs: u32,
    /// Total occurrences across the collection.
    pub num_hits: u32,
}
