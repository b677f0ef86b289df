use sieve_core::fuzzy::{cosine_similarity, fuzzy_match, fuzzy_match_lines, has_common_subsequence, word_to_vector};
use sieve_core::store::{INFO_STEMMER, INFO_TOKENIZER};
use sieve_core::{Error, IndexStore, MemoryStore, SearchConfig, SearchResult, Searcher};

const CORPUS: &[(u32, &str)] = &[
    (1, "Rust is a systems programming language focused on safety."),
    (2, "Programming in Rust means fighting the borrow checker."),
    (3, "Python programmers enjoy dynamic typing."),
    (4, "The borrow checker enforces memory safety."),
];

fn searcher(config: SearchConfig) -> Searcher<MemoryStore> {
    let mut store = config.store.open().unwrap();
    let index = store.create_index("articles");
    index.set_info(INFO_STEMMER, "porter");
    for (id, text) in CORPUS {
        index.add_document(*id, text).unwrap();
    }
    let mut searcher = Searcher::new(store, config).unwrap();
    searcher.select_index("articles").unwrap();
    searcher
}

fn ranked(searcher: &Searcher<MemoryStore>, phrase: &str, max: usize) -> SearchResult {
    searcher.search(phrase, max).unwrap().documents().unwrap()
}

#[test]
fn ranked_search_stems_queries() {
    let searcher = searcher(SearchConfig::default());
    let result = ranked(&searcher, "programs", 10);
    // "programs" and "programming" share the stem "program".
    assert_eq!(result.ids, vec![1, 2]);
    assert_eq!(result.hits, 2);
}

#[test]
fn rarer_terms_weigh_more() {
    let searcher = searcher(SearchConfig::default());
    let result = ranked(&searcher, "rust python", 10);
    assert_eq!(result.hits, 3);
    // Python appears once in the collection, so its document outranks the rest.
    assert_eq!(result.ids, vec![3, 1, 2]);
}

#[test]
fn max_results_truncates_ids_only() {
    let searcher = searcher(SearchConfig::default());
    let result = ranked(&searcher, "safety", 1);
    assert_eq!(result.ids.len(), 1);
    assert_eq!(result.hits, 2);
    assert_eq!(result.doc_scores.len(), 2);
}

#[test]
fn as_you_type_completes_last_term() {
    let mut config = SearchConfig::default();
    config.store.as_you_type = true;
    let searcher = searcher(config);
    let result = ranked(&searcher, "pyth", 10);
    assert_eq!(result.ids, vec![3]);
}

#[test]
fn fuzzy_expansion_respects_min_score() {
    let strict = searcher(SearchConfig { fuzziness: true, fuzzy_min_score: 2.0, ..Default::default() });
    assert_eq!(ranked(&strict, "chec", 10).hits, 0);

    let loose = searcher(SearchConfig { fuzziness: true, fuzzy_distance: 3, ..Default::default() });
    assert_eq!(ranked(&loose, "chec", 10).ids, vec![2, 4]);
}

#[test]
fn fuzzy_expansion_respects_edit_distance() {
    // "checker" is three edits from "chec".
    let capped = searcher(SearchConfig { fuzziness: true, ..Default::default() });
    assert_eq!(ranked(&capped, "chec", 10).hits, 0);
}

#[test]
fn boolean_search_combines_sets() {
    let searcher = searcher(SearchConfig::default());
    let ids = |q: &str| searcher.search_boolean(q, 10).unwrap().documents().unwrap().ids;
    assert_eq!(ids("borrow safety"), vec![4]);
    assert_eq!(ids("python or rust"), vec![1, 2, 3]);
    assert_eq!(ids("safety -rust"), vec![4]);
    // "programmers" stems to "programm", so document 3 survives the negation.
    assert_eq!(ids("(rust | python) & ~programming"), vec![3]);
}

#[test]
fn index_tokenizer_must_be_known() {
    let mut store = MemoryStore::new();
    store.create_index("broken").set_info(INFO_TOKENIZER, "Vendor\\Tokenizer");
    let mut searcher = Searcher::new(store, SearchConfig::default()).unwrap();
    assert!(matches!(searcher.select_index("broken"), Err(Error::UnknownTokenizer(_))));
}

#[test]
fn non_numeric_document_count_is_reported() {
    let mut store = MemoryStore::new();
    store.create_index("broken").set_info("total_documents", "many");
    store.select_index("broken").unwrap();
    assert!(matches!(store.total_documents(), Err(Error::InvalidInfo { .. })));
}

#[test]
fn fuzzy_matcher_properties() {
    assert!(has_common_subsequence("rst", "rust"));
    assert!(!has_common_subsequence("tsr", "rust"));

    let v = word_to_vector("search");
    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);

    let ranked = fuzzy_match("rust", ["rusty", "rust", "trust", "go"]);
    let names: Vec<&str> = ranked.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(names[0], "rust");
    assert!(!names.contains(&"go"));
    assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[test]
fn fuzzy_matcher_reads_lexicon_lines() {
    let lexicon = "rust\n\nrusty\r\ngo\n";
    let ranked = fuzzy_match_lines("rus", lexicon.as_bytes()).unwrap();
    let names: Vec<&str> = ranked.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(names, vec!["rust", "rusty"]);
}
