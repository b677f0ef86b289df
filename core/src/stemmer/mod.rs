//! Token normalization.
//!
//! Stemmers are chosen from a closed registry ([`StemmerKind`]); a name stored
//! in index metadata or configuration never constructs anything outside it.

mod porter;

pub use porter::PorterStemmer;

use crate::error::Error;
use rust_stemmers::Algorithm;
use std::fmt;
use std::str::FromStr;

pub trait Stemmer: Send + Sync {
    fn stem(&self, token: &str) -> String;
}

/// Identity stemmer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStemmer;

impl Stemmer for NoStemmer {
    fn stem(&self, token: &str) -> String {
        token.to_string()
    }
}

/// Snowball stemmers from `rust-stemmers`.
pub struct SnowballStemmer {
    inner: rust_stemmers::Stemmer,
}

impl SnowballStemmer {
    pub fn new(language: Language) -> Self {
        Self { inner: rust_stemmers::Stemmer::create(language.algorithm()) }
    }
}

impl Stemmer for SnowballStemmer {
    fn stem(&self, token: &str) -> String {
        self.inner.stem(token).into_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Arabic,
    Danish,
    Dutch,
    English,
    Finnish,
    French,
    German,
    Greek,
    Hungarian,
    Italian,
    Norwegian,
    Portuguese,
    Romanian,
    Russian,
    Spanish,
    Swedish,
    Tamil,
    Turkish,
}

const LANGUAGES: &[(&str, Language)] = &[
    ("arabic", Language::Arabic),
    ("danish", Language::Danish),
    ("dutch", Language::Dutch),
    ("english", Language::English),
    ("finnish", Language::Finnish),
    ("french", Language::French),
    ("german", Language::German),
    ("greek", Language::Greek),
    ("hungarian", Language::Hungarian),
    ("italian", Language::Italian),
    ("norwegian", Language::Norwegian),
    ("portuguese", Language::Portuguese),
    ("romanian", Language::Romanian),
    ("russian", Language::Russian),
    ("spanish", Language::Spanish),
    ("swedish", Language::Swedish),
    ("tamil", Language::Tamil),
    ("turkish", Language::Turkish),
];

impl Language {
    fn algorithm(self) -> Algorithm {
        match self {
            Language::Arabic => Algorithm::Arabic,
            Language::Danish => Algorithm::Danish,
            Language::Dutch => Algorithm::Dutch,
            Language::English => Algorithm::English,
            Language::Finnish => Algorithm::Finnish,
            Language::French => Algorithm::French,
            Language::German => Algorithm::German,
            Language::Greek => Algorithm::Greek,
            Language::Hungarian => Algorithm::Hungarian,
            Language::Italian => Algorithm::Italian,
            Language::Norwegian => Algorithm::Norwegian,
            Language::Portuguese => Algorithm::Portuguese,
            Language::Romanian => Algorithm::Romanian,
            Language::Russian => Algorithm::Russian,
            Language::Spanish => Algorithm::Spanish,
            Language::Swedish => Algorithm::Swedish,
            Language::Tamil => Algorithm::Tamil,
            Language::Turkish => Algorithm::Turkish,
        }
    }

    pub fn as_str(self) -> &'static str {
        LANGUAGES
            .iter()
            .find(|(_, lang)| *lang == self)
            .map(|(name, _)| *name)
            .unwrap_or("english")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StemmerKind {
    #[default]
    None,
    Porter,
    Snowball(Language),
}

impl StemmerKind {
    pub fn build(self) -> Box<dyn Stemmer> {
        match self {
            StemmerKind::None => Box::new(NoStemmer),
            StemmerKind::Porter => Box::new(PorterStemmer),
            StemmerKind::Snowball(language) => Box::new(SnowballStemmer::new(language)),
        }
    }
}

impl FromStr for StemmerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "none" | "no" => Ok(StemmerKind::None),
            "porter" => Ok(StemmerKind::Porter),
            other => LANGUAGES
                .iter()
                .find(|(key, _)| *key == other)
                .map(|(_, lang)| StemmerKind::Snowball(*lang))
                .ok_or_else(|| Error::UnknownStemmer(s.to_string())),
        }
    }
}

impl fmt::Display for StemmerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StemmerKind::None => f.write_str("none"),
            StemmerKind::Porter => f.write_str("porter"),
            StemmerKind::Snowball(language) => f.write_str(language.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_round_trips_names() {
        for name in ["none", "porter", "german", "russian"] {
            let kind: StemmerKind = name.parse().unwrap();
            assert_eq!(kind.to_string(), name);
        }
    }

    #[test]
    fn registry_rejects_class_paths() {
        let err = "App\\Stemmers\\Evil".parse::<StemmerKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownStemmer(_)));
    }

    #[test]
    fn snowball_english_stems() {
        let stemmer = StemmerKind::Snowball(Language::English).build();
        assert_eq!(stemmer.stem("running"), "run");
    }
}
