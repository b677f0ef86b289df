use crate::error::{Error, Result};
use crate::{DocId, Posting, WordlistEntry};

pub const INFO_TOTAL_DOCUMENTS: &str = "total_documents";
pub const INFO_STEMMER: &str = "stemmer";
pub const INFO_TOKENIZER: &str = "tokenizer";
pub const INFO_DRIVER: &str = "driver";

pub const DRIVER_FILESYSTEM: &str = "filesystem";

/// Read side of a persisted inverted index.
///
/// Implementations usually sit on a database and perform one blocking round
/// trip per call. `no_limit` lifts whatever cap the store applies to posting
/// lists. Every query method may fail with [`Error::IndexNotFound`] when no
/// index has been selected.
pub trait IndexStore: Send + Sync {
    fn select_index(&mut self, name: &str) -> Result<()>;

    /// Wordlist rows for `term`. `is_last` marks the final term of a phrase,
    /// which a store may resolve as a prefix while the user is still typing.
    fn wordlist_by_keyword(&self, term: &str, is_last: bool, no_limit: bool) -> Result<Vec<WordlistEntry>>;

    fn documents_for_strict_keyword(&self, term: &str, no_limit: bool) -> Result<Vec<Posting>>;

    /// Postings over a set of expanded terms, hit counts summed per document.
    fn documents_for_fuzzy_keyword(&self, terms: &[String], no_limit: bool) -> Result<Vec<Posting>>;

    /// Documents that do not contain `term`.
    fn documents_where_keyword_not(&self, term: &str, no_limit: bool) -> Result<Vec<DocId>>;

    /// Lexicon slice to rank fuzzy candidates from: terms sharing the first
    /// `prefix_len` characters with `term`.
    fn candidate_terms(&self, term: &str, prefix_len: usize) -> Result<Vec<String>>;

    fn all_document_ids(&self) -> Result<Vec<DocId>>;

    fn info(&self, key: &str) -> Result<Option<String>>;

    fn map_ids_to_paths(&self, ids: &[DocId]) -> Result<Vec<String>>;

    fn total_documents(&self) -> Result<u64> {
        match self.info(INFO_TOTAL_DOCUMENTS)? {
            Some(value) => value.trim().parse().map_err(|_| Error::InvalidInfo {
                key: INFO_TOTAL_DOCUMENTS.to_string(),
                value,
            }),
            None => Ok(0),
        }
    }

    fn is_filesystem_index(&self) -> Result<bool> {
        Ok(self.info(INFO_DRIVER)?.as_deref() == Some(DRIVER_FILESYSTEM))
    }
}
