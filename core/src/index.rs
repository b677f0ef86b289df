//! In-memory [`IndexStore`].
//!
//! Holds named indexes keyed by term. It is the reference store used by the
//! server and the tests; it is not durable.

use crate::error::{Error, Result};
use crate::stemmer::StemmerKind;
use crate::store::{IndexStore, INFO_STEMMER, INFO_TOKENIZER, INFO_TOTAL_DOCUMENTS};
use crate::tokenizer::TokenizerKind;
use crate::{DocId, Posting, WordlistEntry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

pub const DEFAULT_MAX_DOCS: usize = 500;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IndexData {
    /// term → (doc_id → hit count)
    pub dictionary: BTreeMap<String, BTreeMap<DocId, u32>>,
    pub docs: BTreeSet<DocId>,
    pub paths: HashMap<DocId, String>,
    pub info: HashMap<String, String>,
}

impl IndexData {
    pub fn new() -> Self {
        let mut data = Self::default();
        data.info.insert(INFO_TOTAL_DOCUMENTS.to_string(), "0".to_string());
        data
    }

    pub fn set_info(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.info.insert(key.to_string(), value.into());
        self
    }

    /// Tokenize and stem `text` with the stemmer and tokenizer named in this
    /// index's info table, then record its term frequencies.
    pub fn add_document(&mut self, doc_id: DocId, text: &str) -> Result<()> {
        let tokenizer = match self.info.get(INFO_TOKENIZER) {
            Some(name) => name.parse::<TokenizerKind>()?,
            None => TokenizerKind::default(),
        }
        .build();
        let stemmer = match self.info.get(INFO_STEMMER) {
            Some(name) => name.parse::<StemmerKind>()?,
            None => StemmerKind::default(),
        }
        .build();

        let terms = tokenizer
            .tokenize(text)
            .iter()
            .map(|token| stemmer.stem(token))
            .collect::<Vec<_>>();
        self.add_terms(doc_id, terms);
        Ok(())
    }

    /// Record already normalized terms for `doc_id`.
    pub fn add_terms<I, S>(&mut self, doc_id: DocId, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for term in terms {
            *self
                .dictionary
                .entry(term.into())
                .or_default()
                .entry(doc_id)
                .or_insert(0) += 1;
        }
        self.docs.insert(doc_id);
        self.info.insert(INFO_TOTAL_DOCUMENTS.to_string(), self.docs.len().to_string());
    }

    pub fn set_path(&mut self, doc_id: DocId, path: impl Into<String>) {
        self.paths.insert(doc_id, path.into());
    }

    fn entry(&self, term: &str) -> Option<WordlistEntry> {
        self.dictionary.get(term).map(|docs| WordlistEntry {
            term: term.to_string(),
            num_docs: docs.len() as u32,
            num_hits: docs.values().sum(),
        })
    }

    fn terms_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.dictionary
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(term, _)| term)
            .take_while(move |term| term.starts_with(prefix))
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    indexes: HashMap<String, IndexData>,
    selected: Option<String>,
    max_docs: usize,
    as_you_type: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self { indexes: HashMap::new(), selected: None, max_docs: DEFAULT_MAX_DOCS, as_you_type: false }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap on posting list length when the caller does not ask for no limit.
    pub fn with_max_docs(mut self, max_docs: usize) -> Self {
        self.max_docs = max_docs;
        self
    }

    /// Resolve the last term of a phrase as a prefix.
    pub fn with_as_you_type(mut self, as_you_type: bool) -> Self {
        self.as_you_type = as_you_type;
        self
    }

    /// Create (or replace) an index and return it for population.
    pub fn create_index(&mut self, name: &str) -> &mut IndexData {
        let slot = self.indexes.entry(name.to_string()).or_default();
        *slot = IndexData::new();
        slot
    }

    pub fn index_mut(&mut self, name: &str) -> Option<&mut IndexData> {
        self.indexes.get_mut(name)
    }

    fn current(&self) -> Result<&IndexData> {
        let name = self
            .selected
            .as_deref()
            .ok_or_else(|| Error::IndexNotFound("no index selected".to_string()))?;
        self.indexes.get(name).ok_or_else(|| Error::IndexNotFound(name.to_string()))
    }

    fn limit<T>(&self, mut items: Vec<T>, no_limit: bool) -> Vec<T> {
        if !no_limit {
            items.truncate(self.max_docs);
        }
        items
    }
}

/// Highest hit count first, then ascending id.
fn sorted_postings(hits: impl IntoIterator<Item = (DocId, u32)>) -> Vec<Posting> {
    let mut postings: Vec<Posting> =
        hits.into_iter().map(|(doc_id, hit_count)| Posting { doc_id, hit_count }).collect();
    postings.sort_by(|a, b| b.hit_count.cmp(&a.hit_count).then(a.doc_id.cmp(&b.doc_id)));
    postings
}

impl IndexStore for MemoryStore {
    fn select_index(&mut self, name: &str) -> Result<()> {
        if !self.indexes.contains_key(name) {
            return Err(Error::IndexNotFound(name.to_string()));
        }
        self.selected = Some(name.to_string());
        Ok(())
    }

    fn wordlist_by_keyword(&self, term: &str, is_last: bool, _no_limit: bool) -> Result<Vec<WordlistEntry>> {
        let index = self.current()?;
        if self.as_you_type && is_last {
            let best = index
                .terms_with_prefix(term)
                .filter_map(|t| index.entry(t))
                .min_by(|a, b| {
                    a.term
                        .chars()
                        .count()
                        .cmp(&b.term.chars().count())
                        .then(b.num_hits.cmp(&a.num_hits))
                        .then(a.term.cmp(&b.term))
                });
            return Ok(best.into_iter().collect());
        }
        Ok(index.entry(term).into_iter().collect())
    }

    fn documents_for_strict_keyword(&self, term: &str, no_limit: bool) -> Result<Vec<Posting>> {
        let index = self.current()?;
        let postings = match index.dictionary.get(term) {
            Some(docs) => sorted_postings(docs.iter().map(|(&id, &hits)| (id, hits))),
            None => Vec::new(),
        };
        Ok(self.limit(postings, no_limit))
    }

    fn documents_for_fuzzy_keyword(&self, terms: &[String], no_limit: bool) -> Result<Vec<Posting>> {
        let index = self.current()?;
        let mut hits: BTreeMap<DocId, u32> = BTreeMap::new();
        for term in terms {
            if let Some(docs) = index.dictionary.get(term) {
                for (&id, &count) in docs {
                    *hits.entry(id).or_insert(0) += count;
                }
            }
        }
        Ok(self.limit(sorted_postings(hits), no_limit))
    }

    fn documents_where_keyword_not(&self, term: &str, no_limit: bool) -> Result<Vec<DocId>> {
        let index = self.current()?;
        let containing = index.dictionary.get(term);
        let ids = index
            .docs
            .iter()
            .copied()
            .filter(|id| containing.map_or(true, |docs| !docs.contains_key(id)))
            .collect();
        Ok(self.limit(ids, no_limit))
    }

    fn candidate_terms(&self, term: &str, prefix_len: usize) -> Result<Vec<String>> {
        let index = self.current()?;
        let prefix: String = term.chars().take(prefix_len).collect();
        Ok(index.terms_with_prefix(&prefix).cloned().collect())
    }

    fn all_document_ids(&self) -> Result<Vec<DocId>> {
        Ok(self.current()?.docs.iter().copied().collect())
    }

    fn info(&self, key: &str) -> Result<Option<String>> {
        Ok(self.current()?.info.get(key).cloned())
    }

    fn map_ids_to_paths(&self, ids: &[DocId]) -> Result<Vec<String>> {
        let index = self.current()?;
        Ok(ids.iter().filter_map(|id| index.paths.get(id).cloned()).collect())
    }
}
