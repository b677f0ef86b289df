use crate::error::Error;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref WORD_BOUNDARY: Regex =
        Regex::new(r"[^\p{L}\p{N}\p{Pc}\p{Pd}@]+").expect("valid regex");
    static ref PRODUCT_BOUNDARY: Regex = Regex::new(r"[\s,\.]+").expect("valid regex");
}

/// Splits text into lowercase terms.
///
/// `pattern` describes the separators between terms. The highlighter splits
/// needles and trims snippet windows with the same pattern, so match
/// boundaries agree everywhere a tokenizer is used.
pub trait Tokenizer: Send + Sync {
    fn pattern(&self) -> &Regex;

    fn tokenize(&self, text: &str) -> Vec<String> {
        split_terms(self.pattern(), &text.to_lowercase())
    }
}

/// Split on `pattern`, dropping empty pieces.
pub fn split_terms(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .split(text)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Letters, digits, connector and dash punctuation, and `@` form terms.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn pattern(&self) -> &Regex {
        &WORD_BOUNDARY
    }
}

/// Splits only on whitespace, commas and periods, keeping symbols such as
/// `(1941)` or `test's` intact.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductTokenizer;

impl Tokenizer for ProductTokenizer {
    fn pattern(&self) -> &Regex {
        &PRODUCT_BOUNDARY
    }
}

/// Character n-grams of every product-tokenizer split.
#[derive(Debug, Clone, Copy)]
pub struct NGramTokenizer {
    pub min_gram: usize,
    pub max_gram: usize,
}

impl Default for NGramTokenizer {
    fn default() -> Self {
        Self { min_gram: 3, max_gram: 3 }
    }
}

impl NGramTokenizer {
    pub fn new(min_gram: usize, max_gram: usize) -> Self {
        Self { min_gram, max_gram }
    }
}

impl Tokenizer for NGramTokenizer {
    fn pattern(&self) -> &Regex {
        &PRODUCT_BOUNDARY
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut grams = Vec::new();
        for split in split_terms(self.pattern(), &text.to_lowercase()) {
            let chars: Vec<char> = split.chars().collect();
            for n in self.min_gram.max(1)..=self.max_gram {
                if n > chars.len() {
                    break;
                }
                for window in chars.windows(n) {
                    grams.push(window.iter().collect());
                }
            }
        }
        grams
    }
}

/// Closed registry of tokenizers that configuration and index metadata may
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizerKind {
    #[default]
    Word,
    Product,
    NGram,
}

impl TokenizerKind {
    pub fn build(self) -> Box<dyn Tokenizer> {
        match self {
            TokenizerKind::Word => Box::new(WordTokenizer),
            TokenizerKind::Product => Box::new(ProductTokenizer),
            TokenizerKind::NGram => Box::new(NGramTokenizer::default()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TokenizerKind::Word => "word",
            TokenizerKind::Product => "product",
            TokenizerKind::NGram => "ngram",
        }
    }
}

impl FromStr for TokenizerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" | "default" => Ok(TokenizerKind::Word),
            "product" => Ok(TokenizerKind::Product),
            "ngram" => Ok(TokenizerKind::NGram),
            _ => Err(Error::UnknownTokenizer(s.to_string())),
        }
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
