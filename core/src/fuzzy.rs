//! Approximate term matching.
//!
//! Candidates that contain the pattern as a subsequence are ranked by the
//! cosine similarity between their character vectors and a pattern vector
//! aligned to the candidate's length. A literal substring match earns a
//! flat bonus on top.

use lazy_static::lazy_static;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::BufRead;
use unicode_normalization::UnicodeNormalization;

const ALPHABET: &str = "aAbBcCčČćĆdDđĐeEfFgGhHiIjJkKlLmMnNoOpPqQrRsSšŠtTvVuUwWxXyYzZžŽ1234567890'+ /";
const VECTOR_BASE: u64 = 1_000_000;
const SUBSTRING_BONUS: f64 = 0.2;

lazy_static! {
    static ref ALPHABET_INDEX: HashMap<char, u64> = ALPHABET
        .chars()
        .enumerate()
        .map(|(i, c)| (c, i as u64))
        .collect();
    static ref ALPHABET_LEN: u64 = ALPHABET.chars().count() as u64;
}

pub type CharVector = Vec<u64>;

/// Character value for vectorization. Characters outside the table are placed
/// past its end, keyed by code point, so distinct characters stay distinct.
fn char_value(c: char) -> u64 {
    match ALPHABET_INDEX.get(&c) {
        Some(pos) => VECTOR_BASE + pos,
        None => VECTOR_BASE + *ALPHABET_LEN + c as u64,
    }
}

pub fn word_to_vector(word: &str) -> CharVector {
    word.nfc().map(char_value).collect()
}

pub fn norm(vec: &[u64]) -> f64 {
    vec.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt()
}

pub fn dot(a: &[u64], b: &[u64]) -> f64 {
    a.iter().zip(b).map(|(&x, &y)| (x as f64) * (y as f64)).sum()
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[u64], b: &[u64]) -> f64 {
    let denominator = norm(a) * norm(b);
    if denominator == 0.0 {
        return 0.0;
    }
    dot(a, b) / denominator
}

/// NFC, then lowercase.
fn fold(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

/// Whether every character of `pattern` appears in `candidate`, in order.
pub fn has_common_subsequence(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = fold(pattern).chars().collect();
    let mut j = 0;
    for c in fold(candidate).chars() {
        if j == pattern.len() {
            break;
        }
        if pattern[j] == c {
            j += 1;
        }
    }
    j == pattern.len()
}

/// Project `pattern` onto `word`: each position of `word` holds the word's
/// value where the next pattern character lines up with it, zero otherwise.
pub fn make_vector_same_length(word: &[u64], pattern: &[u64]) -> CharVector {
    let len = word.len().max(pattern.len());
    let mut aligned = Vec::with_capacity(len);
    let mut j = 0;
    for i in 0..len {
        match (pattern.get(j), word.get(i)) {
            (Some(p), Some(w)) if p == w => {
                aligned.push(*w);
                j += 1;
            }
            _ => aligned.push(0),
        }
    }
    aligned
}

/// Score of `candidate` against an already vectorized, lowercased pattern.
fn score(pattern: &str, pattern_vector: &[u64], candidate: &str) -> f64 {
    let word = fold(candidate.trim());
    let word_vector = word_to_vector(&word);
    let aligned = make_vector_same_length(&word_vector, pattern_vector);

    let mut similarity = cosine_similarity(&word_vector, &aligned);
    if word.contains(pattern) {
        similarity += SUBSTRING_BONUS;
    }
    similarity
}

/// Rank `candidates` by similarity to `pattern`, best first. Ties are broken
/// by ascending candidate.
pub fn fuzzy_match<I, S>(pattern: &str, candidates: I) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pattern = fold(pattern);
    let pattern_vector = word_to_vector(&pattern);

    let mut ranked: Vec<(String, f64)> = candidates
        .into_iter()
        .filter(|c| has_common_subsequence(&pattern, c.as_ref()))
        .map(|c| {
            let candidate = c.as_ref().trim().to_string();
            let s = score(&pattern, &pattern_vector, &candidate);
            (candidate, s)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.dedup_by(|a, b| a.0 == b.0);
    ranked
}

/// [`fuzzy_match`] over a lexicon read one term per line.
pub fn fuzzy_match_lines<R: BufRead>(pattern: &str, reader: R) -> std::io::Result<Vec<(String, f64)>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let term = line.trim_end();
        if !term.is_empty() {
            lines.push(term.to_string());
        }
    }
    Ok(fuzzy_match(pattern, lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subsequence_check() {
        assert!(has_common_subsequence("tst", "test"));
        assert!(has_common_subsequence("TST", "tEsT"));
        assert!(!has_common_subsequence("xyz", "test"));
        assert!(has_common_subsequence("", "test"));
    }

    #[test]
    fn vector_values_follow_alphabet() {
        assert_eq!(word_to_vector("aA1"), vec![1_000_000, 1_000_001, 1_000_062]);
    }

    #[test]
    fn decomposed_accents_are_composed_first() {
        assert_eq!(word_to_vector("c\u{30c}"), word_to_vector("č"));
    }

    #[test]
    fn decomposed_candidates_survive_the_prefilter() {
        assert!(has_common_subsequence("čev", "c\u{30c}evapi"));
        let ranked = fuzzy_match("čev", ["c\u{30c}evapi"]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].0, "c\u{30c}evapi");
        // Composed, the pattern is a substring and earns the bonus.
        assert!(ranked[0].1 > SUBSTRING_BONUS);
    }

    #[test]
    fn exact_match_earns_substring_bonus() {
        let ranked = fuzzy_match("rust", ["rust"]);
        assert!((ranked[0].1 - (1.0 + SUBSTRING_BONUS)).abs() < 1e-12);
    }

    #[test]
    fn ties_order_by_candidate() {
        let ranked = fuzzy_match("ab", ["ab", "AB"]);
        assert_eq!(ranked[0].1, ranked[1].1);
        let names: Vec<&str> = ranked.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["AB", "ab"]);
    }

    #[test]
    fn unknown_characters_stay_distinct() {
        let v = word_to_vector("ßø");
        assert_ne!(v[0], v[1]);
        assert!(v.iter().all(|&x| x > VECTOR_BASE + *ALPHABET_LEN));
    }

    #[test]
    fn alignment_zero_fills() {
        let word = word_to_vector("test");
        let pattern = word_to_vector("tt");
        let aligned = make_vector_same_length(&word, &pattern);
        assert_eq!(aligned, vec![word[0], 0, 0, word[3]]);
    }

    #[test]
    fn self_similarity_is_one() {
        let v = word_to_vector("search");
        let aligned = make_vector_same_length(&v, &v);
        assert!((cosine_similarity(&v, &aligned) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_norm_is_zero_similarity() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1, 2], &[0, 0]), 0.0);
    }
}
