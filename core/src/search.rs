//! Ranked and boolean search over an [`IndexStore`].

use crate::boolean::{evaluate, to_postfix, DocSet, DocSetSource};
use crate::config::SearchConfig;
use crate::error::Result;
use crate::fuzzy::fuzzy_match;
use crate::highlight::{HighlightOptions, Highlighter};
use crate::stemmer::{Stemmer, StemmerKind};
use crate::store::{IndexStore, INFO_STEMMER, INFO_TOKENIZER};
use crate::tokenizer::{Tokenizer, TokenizerKind};
use crate::{DocId, Posting};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::debug;

/// Term-frequency saturation.
pub const TF_WEIGHT: f64 = 1.0;
/// Length normalization weight. Document length is not tracked, so the
/// normalization term collapses to `TF_WEIGHT`.
pub const DL_WEIGHT: f64 = 0.5;

/// The collection is never smaller than a term's document frequency, so an
/// unreported count of zero gives a zero weight instead of `-inf`.
pub fn idf(total_documents: u64, num_docs: u32) -> f64 {
    let num_docs = u64::from(num_docs.max(1));
    (total_documents.max(num_docs) as f64 / num_docs as f64).ln()
}

pub fn partial_score(idf: f64, tf: u32) -> f64 {
    let tf = f64::from(tf);
    idf * ((TF_WEIGHT + 1.0) * tf) / (TF_WEIGHT * ((1.0 - DL_WEIGHT) + DL_WEIGHT) + tf)
}

/// Result of a query against a regular index, or file paths when the
/// index was built over a filesystem.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SearchOutput<T> {
    Documents(T),
    Paths(Vec<String>),
}

impl<T> SearchOutput<T> {
    pub fn documents(self) -> Option<T> {
        match self {
            SearchOutput::Documents(docs) => Some(docs),
            SearchOutput::Paths(_) => None,
        }
    }

    pub fn paths(&self) -> Option<&[String]> {
        match self {
            SearchOutput::Paths(paths) => Some(paths),
            SearchOutput::Documents(_) => None,
        }
    }
}

fn serialize_elapsed<S: Serializer>(elapsed: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_elapsed(*elapsed))
}

fn format_elapsed(elapsed: Duration) -> String {
    format!("{} ms", elapsed.as_secs_f64() * 1000.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Best first, at most `max_results`.
    pub ids: Vec<DocId>,
    /// Distinct matching documents before truncation.
    pub hits: usize,
    /// Scores of every matching document.
    pub doc_scores: BTreeMap<DocId, f64>,
    #[serde(rename = "execution_time", serialize_with = "serialize_elapsed")]
    pub elapsed: Duration,
}

impl SearchResult {
    pub fn execution_time(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BooleanResult {
    pub ids: Vec<DocId>,
    /// Returned documents, after truncation.
    pub hits: usize,
    #[serde(rename = "execution_time", serialize_with = "serialize_elapsed")]
    pub elapsed: Duration,
}

impl BooleanResult {
    pub fn execution_time(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

pub struct Searcher<S: IndexStore> {
    store: S,
    config: SearchConfig,
    stemmer: Box<dyn Stemmer>,
    tokenizer: Box<dyn Tokenizer>,
    stopwords: HashSet<String>,
}

impl<S: IndexStore> Searcher<S> {
    pub fn new(store: S, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let stemmer = config.stemmer_kind()?.unwrap_or_default().build();
        let tokenizer = config.tokenizer_kind()?.unwrap_or_default().build();
        let stopwords = config.stopwords.iter().map(|word| word.to_lowercase()).collect();
        Ok(Self { store, config, stemmer, tokenizer, stopwords })
    }

    /// Select `name` in the store and adopt the stemmer and tokenizer it was
    /// built with. Names missing from the index fall back to configuration,
    /// then to the defaults.
    pub fn select_index(&mut self, name: &str) -> Result<()> {
        self.store.select_index(name)?;

        let stemmer = match self.store.info(INFO_STEMMER)? {
            Some(stored) => stored.parse::<StemmerKind>()?,
            None => self.config.stemmer_kind()?.unwrap_or_default(),
        };
        let tokenizer = match self.store.info(INFO_TOKENIZER)? {
            Some(stored) => stored.parse::<TokenizerKind>()?,
            None => self.config.tokenizer_kind()?.unwrap_or_default(),
        };
        debug!(index = name, %stemmer, %tokenizer, "index selected");

        self.stemmer = stemmer.build();
        self.tokenizer = tokenizer.build();
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Tokens of `phrase` minus stopwords, stemmed.
    pub fn query_terms(&self, phrase: &str) -> Vec<String> {
        self.tokenizer
            .tokenize(phrase)
            .into_iter()
            .filter(|token| !self.stopwords.contains(token))
            .map(|token| self.stemmer.stem(&token))
            .collect()
    }

    pub fn search(&self, phrase: &str, max_results: usize) -> Result<SearchOutput<SearchResult>> {
        let start = Instant::now();
        let terms = self.query_terms(phrase);
        let total_documents = self.store.total_documents()?;
        let no_limit = self.config.fuzzy_no_limit;

        let mut scores: HashMap<DocId, f64> = HashMap::new();
        for (i, term) in terms.iter().enumerate() {
            let is_last = i + 1 == terms.len();
            let (num_docs, postings) = self.term_postings(term, is_last, no_limit)?;
            let idf = idf(total_documents, num_docs);
            for posting in postings {
                *scores.entry(posting.doc_id).or_insert(0.0) += partial_score(idf, posting.hit_count);
            }
        }

        let mut ranked: Vec<(DocId, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        let hits = ranked.len();
        let ids: Vec<DocId> = ranked.iter().take(max_results).map(|(id, _)| *id).collect();

        debug!(terms = terms.len(), hits, elapsed_us = start.elapsed().as_micros() as u64, "ranked search");

        if self.store.is_filesystem_index()? {
            return Ok(SearchOutput::Paths(self.store.map_ids_to_paths(&ids)?));
        }
        Ok(SearchOutput::Documents(SearchResult {
            ids,
            hits,
            doc_scores: ranked.into_iter().collect(),
            elapsed: start.elapsed(),
        }))
    }

    /// Evaluate `&`, `|`, `~` and parentheses over document sets.
    pub fn search_boolean(&self, phrase: &str, max_results: usize) -> Result<SearchOutput<BooleanResult>> {
        let start = Instant::now();
        let postfix = to_postfix(&format!("|{phrase}"));
        let docs = evaluate(&postfix, self)?;
        let ids: Vec<DocId> = docs.into_iter().take(max_results).collect();

        debug!(tokens = postfix.len(), hits = ids.len(), elapsed_us = start.elapsed().as_micros() as u64, "boolean search");

        if self.store.is_filesystem_index()? {
            return Ok(SearchOutput::Paths(self.store.map_ids_to_paths(&ids)?));
        }
        Ok(SearchOutput::Documents(BooleanResult { hits: ids.len(), ids, elapsed: start.elapsed() }))
    }

    /// Document frequency and postings for one query term. Only the last
    /// term of a phrase is expanded fuzzily.
    fn term_postings(&self, term: &str, is_last: bool, no_limit: bool) -> Result<(u32, Vec<Posting>)> {
        let wordlist = self.store.wordlist_by_keyword(term, is_last, no_limit)?;
        let exact = wordlist.first();

        if is_last && self.config.fuzziness {
            let expansions = self.fuzzy_expansions(term)?;
            if let Some(best) = expansions.first() {
                let num_docs = match exact {
                    Some(entry) => entry.num_docs,
                    None => self
                        .store
                        .wordlist_by_keyword(best, false, no_limit)?
                        .first()
                        .map_or(0, |entry| entry.num_docs),
                };
                let postings = self.store.documents_for_fuzzy_keyword(&expansions, no_limit)?;
                return Ok((num_docs, postings));
            }
        }

        match exact {
            Some(entry) => Ok((entry.num_docs, self.store.documents_for_strict_keyword(&entry.term, no_limit)?)),
            None => Ok((0, Vec::new())),
        }
    }

    fn fuzzy_expansions(&self, term: &str) -> Result<Vec<String>> {
        let candidates = self.store.candidate_terms(term, self.config.fuzzy_prefix_length)?;
        let candidates = candidates
            .into_iter()
            .filter(|candidate| strsim::levenshtein(term, candidate) <= self.config.fuzzy_distance);
        Ok(fuzzy_match(term, candidates)
            .into_iter()
            .filter(|(_, score)| *score >= self.config.fuzzy_min_score)
            .take(self.config.fuzzy_max_expansions)
            .map(|(candidate, _)| candidate)
            .collect())
    }

    /// A highlighter splitting on this searcher's tokenizer boundaries.
    pub fn highlighter(&self) -> Highlighter<'_> {
        Highlighter::new(self.tokenizer.as_ref())
    }

    pub fn highlight(&self, text: &str, needle: &str, tag: &str, options: &HighlightOptions) -> Result<String> {
        self.highlighter().highlight(text, needle, tag, options)
    }

    pub fn snippet(&self, words: &str, full_text: &str, rel_length: usize, prev_count: usize, indicator: &str) -> String {
        self.highlighter().extract_relevant(words, full_text, rel_length, prev_count, indicator)
    }

    fn boolean_stem(&self, keyword: &str) -> String {
        self.stemmer.stem(&keyword.to_lowercase())
    }
}

impl<S: IndexStore> DocSetSource for Searcher<S> {
    fn documents(&self, keyword: &str) -> Result<DocSet> {
        let stem = self.boolean_stem(keyword);
        let Some(entry) = self.store.wordlist_by_keyword(&stem, false, true)?.into_iter().next() else {
            return Ok(DocSet::new());
        };
        Ok(self
            .store
            .documents_for_strict_keyword(&entry.term, true)?
            .into_iter()
            .map(|posting| posting.doc_id)
            .collect())
    }

    fn documents_without(&self, keyword: &str) -> Result<DocSet> {
        let stem = self.boolean_stem(keyword);
        Ok(self.store.documents_where_keyword_not(&stem, true)?.into_iter().collect())
    }

    fn complement(&self, docs: &DocSet) -> Result<DocSet> {
        Ok(self.store.all_document_ids()?.into_iter().filter(|id| !docs.contains(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::index::MemoryStore;
    use crate::store::INFO_DRIVER;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        let index = store.create_index("articles");
        index.add_terms(1, ["rust", "rust", "fast"]);
        index.add_terms(2, ["rust", "safe"]);
        index.add_terms(3, ["rusty", "rusty", "rusty", "fast"]);
        index.add_terms(4, ["go"]);
        store
    }

    fn searcher(config: SearchConfig) -> Searcher<MemoryStore> {
        let mut searcher = Searcher::new(store(), config).unwrap();
        searcher.select_index("articles").unwrap();
        searcher
    }

    fn ranked(output: SearchOutput<SearchResult>) -> SearchResult {
        output.documents().expect("document results")
    }

    #[test]
    fn idf_and_partial_score() {
        let idf = idf(10, 2);
        assert!((idf - 5f64.ln()).abs() < 1e-12);
        assert!((partial_score(idf, 3) - idf * 1.5).abs() < 1e-12);
        assert!((super::idf(10, 0) - 10f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn empty_collection_count_keeps_scores_finite() {
        assert_eq!(idf(0, 3), 0.0);

        let mut store = store();
        store.index_mut("articles").unwrap().set_info(crate::store::INFO_TOTAL_DOCUMENTS, "0");
        let mut searcher = Searcher::new(store, SearchConfig::default()).unwrap();
        searcher.select_index("articles").unwrap();
        let result = ranked(searcher.search("rust fast", 10).unwrap());
        assert_eq!(result.ids, vec![1, 2, 3]);
        assert!(result.doc_scores.values().all(|score| score.is_finite()));
    }

    #[test]
    fn fuzzy_expansions_stay_within_edit_distance() {
        let config = SearchConfig { fuzziness: true, fuzzy_distance: 1, ..Default::default() };
        let result = ranked(searcher(config).search("rus", 10).unwrap());
        // "rusty" is two edits away, so only "rust" expands.
        assert_eq!(result.ids, vec![1, 2]);
    }

    #[test]
    fn single_term_ranks_by_frequency() {
        let result = ranked(searcher(SearchConfig::default()).search("rust", 10).unwrap());
        assert_eq!(result.ids, vec![1, 2]);
        assert_eq!(result.hits, 2);
        let ln2 = 2f64.ln();
        assert!((result.doc_scores[&1] - ln2 * 4.0 / 3.0).abs() < 1e-12);
        assert!((result.doc_scores[&2] - ln2).abs() < 1e-12);
    }

    #[test]
    fn ties_break_on_doc_id_and_hits_count_before_truncation() {
        let result = ranked(searcher(SearchConfig::default()).search("fast rust", 2).unwrap());
        assert_eq!(result.ids, vec![1, 2]);
        assert_eq!(result.hits, 3);
        assert_eq!(result.doc_scores.len(), 3);
        assert!(result.execution_time().ends_with(" ms"));
    }

    #[test]
    fn unknown_terms_match_nothing() {
        let result = ranked(searcher(SearchConfig::default()).search("python", 10).unwrap());
        assert!(result.ids.is_empty());
        assert_eq!(result.hits, 0);
    }

    #[test]
    fn fuzziness_expands_last_term() {
        let strict = ranked(searcher(SearchConfig::default()).search("rus", 10).unwrap());
        assert_eq!(strict.hits, 0);

        let config = SearchConfig { fuzziness: true, fuzzy_no_limit: true, ..Default::default() };
        let fuzzy = ranked(searcher(config).search("rus", 10).unwrap());
        assert_eq!(fuzzy.hits, 3);
        assert_eq!(fuzzy.ids[0], 3);
    }

    #[test]
    fn stopwords_are_dropped() {
        let config = SearchConfig { stopwords: vec!["FAST".into()], ..Default::default() };
        let result = ranked(searcher(config).search("Fast rust", 10).unwrap());
        assert_eq!(result.ids, vec![1, 2]);
        assert_eq!(result.hits, 2);
    }

    #[test]
    fn filesystem_index_returns_paths() {
        let mut store = store();
        let index = store.index_mut("articles").unwrap();
        index.set_info(INFO_DRIVER, "filesystem");
        index.set_path(1, "/docs/one.txt");
        index.set_path(2, "/docs/two.txt");
        let mut searcher = Searcher::new(store, SearchConfig::default()).unwrap();
        searcher.select_index("articles").unwrap();

        let output = searcher.search("rust", 10).unwrap();
        assert_eq!(output.paths().unwrap(), ["/docs/one.txt", "/docs/two.txt"]);
    }

    #[test]
    fn boolean_set_algebra() {
        let searcher = searcher(SearchConfig::default());
        let ids = |q: &str| searcher.search_boolean(q, 10).unwrap().documents().unwrap().ids;
        assert_eq!(ids("rust fast"), vec![1]);
        assert_eq!(ids("rust | go"), vec![1, 2, 4]);
        assert_eq!(ids("~rust"), vec![3, 4]);
        assert_eq!(ids("~(rust | go)"), vec![3]);
        assert_eq!(ids("RUST & safe"), vec![2]);
    }

    #[test]
    fn boolean_hits_count_after_truncation() {
        let result = searcher(SearchConfig::default()).search_boolean("rust | go", 2).unwrap().documents().unwrap();
        assert_eq!(result.ids, vec![1, 2]);
        assert_eq!(result.hits, 2);
    }

    #[test]
    fn select_index_adopts_stored_stemmer() {
        let mut store = MemoryStore::new();
        let index = store.create_index("docs");
        index.set_info(INFO_STEMMER, "porter");
        index.add_document(1, "Connected to the network").unwrap();
        let mut searcher = Searcher::new(store, SearchConfig::default()).unwrap();
        searcher.select_index("docs").unwrap();

        let result = ranked(searcher.search("connections", 10).unwrap());
        assert_eq!(result.ids, vec![1]);
    }

    #[test]
    fn select_index_rejects_unknown_stored_stemmer() {
        let mut store = MemoryStore::new();
        store.create_index("docs").set_info(INFO_STEMMER, "App\\Stemmer\\Custom");
        let mut searcher = Searcher::new(store, SearchConfig::default()).unwrap();
        assert!(matches!(searcher.select_index("docs"), Err(Error::UnknownStemmer(_))));
    }

    #[test]
    fn querying_without_selection_fails() {
        let searcher = Searcher::new(store(), SearchConfig::default()).unwrap();
        assert!(matches!(searcher.search("rust", 10), Err(Error::IndexNotFound(_))));
    }

    #[test]
    fn highlight_uses_searcher_tokenizer() {
        let searcher = searcher(SearchConfig::default());
        let out = searcher.highlight("The cat sat", "cat", "em", &HighlightOptions::default()).unwrap();
        assert_eq!(out, "The <em>cat</em> sat");
        assert_eq!(searcher.snippet("cat", "short text", 300, 50, "..."), "short text");
    }
}
