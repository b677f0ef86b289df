use crate::error::{Error, Result};
use crate::index::{MemoryStore, DEFAULT_MAX_DOCS};
use crate::stemmer::StemmerKind;
use crate::tokenizer::TokenizerKind;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Storage engines this crate can open from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Memory,
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(EngineKind::Memory),
            _ => Err(Error::InvalidEngine(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub engine: String,
    /// Posting list cap outside no-limit lookups.
    pub max_docs: usize,
    /// Resolve the last query term as a prefix.
    pub as_you_type: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { engine: "memory".to_string(), max_docs: DEFAULT_MAX_DOCS, as_you_type: false }
    }
}

impl StoreConfig {
    pub fn open(&self) -> Result<MemoryStore> {
        match self.engine.parse::<EngineKind>()? {
            EngineKind::Memory => Ok(MemoryStore::new()
                .with_max_docs(self.max_docs)
                .with_as_you_type(self.as_you_type)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub store: StoreConfig,
    /// Used when the selected index does not name a stemmer.
    pub stemmer: Option<String>,
    /// Used when the selected index does not name a tokenizer.
    pub tokenizer: Option<String>,
    /// Expand the last query term fuzzily.
    pub fuzziness: bool,
    /// Leading characters a fuzzy candidate must share with the term.
    pub fuzzy_prefix_length: usize,
    pub fuzzy_max_expansions: usize,
    /// Largest edit distance between a term and an expansion.
    pub fuzzy_distance: usize,
    /// Candidates scoring below this are not expanded.
    pub fuzzy_min_score: f64,
    /// Lift the store's posting cap for ranked search.
    pub fuzzy_no_limit: bool,
    /// Dropped from query phrases before lookup, ignoring case.
    pub stopwords: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            stemmer: None,
            tokenizer: None,
            fuzziness: false,
            fuzzy_prefix_length: 2,
            fuzzy_max_expansions: 50,
            fuzzy_distance: 2,
            fuzzy_min_score: 0.0,
            fuzzy_no_limit: false,
            stopwords: Vec::new(),
        }
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut f = File::open(path)?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;
        Self::from_json(&buf)
    }

    /// Reject names outside the engine, stemmer and tokenizer registries.
    pub fn validate(&self) -> Result<()> {
        self.store.engine.parse::<EngineKind>()?;
        self.stemmer_kind()?;
        self.tokenizer_kind()?;
        Ok(())
    }

    pub fn stemmer_kind(&self) -> Result<Option<StemmerKind>> {
        self.stemmer.as_deref().map(str::parse::<StemmerKind>).transpose()
    }

    pub fn tokenizer_kind(&self) -> Result<Option<TokenizerKind>> {
        self.tokenizer.as_deref().map(str::parse::<TokenizerKind>).transpose()
    }
}
