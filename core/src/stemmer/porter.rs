//! Porter suffix-stripping stemmer for English.
//!
//! Works on bytes. Only ASCII suffix bytes are ever removed or appended, so
//! valid UTF-8 input stays valid UTF-8.

use super::Stemmer;

#[derive(Debug, Default, Clone, Copy)]
pub struct PorterStemmer;

impl Stemmer for PorterStemmer {
    fn stem(&self, token: &str) -> String {
        stem(token)
    }
}

pub fn stem(word: &str) -> String {
    if word.len() <= 2 {
        return word.to_string();
    }

    let mut w = word.as_bytes().to_vec();
    step1a(&mut w);
    step1b(&mut w);
    step1c(&mut w);
    step2(&mut w);
    step3(&mut w);
    step4(&mut w);
    step5(&mut w);

    String::from_utf8(w).unwrap_or_else(|_| word.to_string())
}

fn is_aeiou(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// `y` counts as a vowel unless it follows one.
fn is_vowel(s: &[u8], i: usize) -> bool {
    match s[i] {
        b'y' => i == 0 || !is_aeiou(s[i - 1]),
        c => is_aeiou(c),
    }
}

/// A leading `y` is also a consonant.
fn is_consonant(s: &[u8], i: usize) -> bool {
    match s[i] {
        b'y' => i == 0 || is_aeiou(s[i - 1]),
        c => c.is_ascii_lowercase() && !is_aeiou(c),
    }
}

fn contains_vowel(s: &[u8]) -> bool {
    (0..s.len()).any(|i| is_vowel(s, i))
}

/// Number of vowel-run/consonant-run pairs once the leading consonants and
/// trailing vowels are removed.
fn measure(s: &[u8]) -> usize {
    let mut start = 0;
    while start < s.len() && is_consonant(s, start) {
        start += 1;
    }
    let rest = &s[start..];

    let mut end = rest.len();
    while end > 0 && is_vowel(rest, end - 1) {
        end -= 1;
    }
    let core = &rest[..end];

    let mut count = 0;
    let mut p = 0;
    while p < core.len() {
        if is_vowel(core, p) {
            let mut q = p;
            while q < core.len() && is_vowel(core, q) {
                q += 1;
            }
            if q < core.len() && is_consonant(core, q) {
                while q < core.len() && is_consonant(core, q) {
                    q += 1;
                }
                count += 1;
                p = q;
                continue;
            }
        }
        p += 1;
    }
    count
}

fn double_consonant(s: &[u8]) -> bool {
    let n = s.len();
    n >= 2 && s[n - 1] == s[n - 2] && is_consonant(s, n - 1) && is_consonant(s, n - 2)
}

/// Ends consonant-vowel-consonant, the last one not `w`, `x` or `y`.
fn cvc(s: &[u8]) -> bool {
    let n = s.len();
    n >= 3
        && is_consonant(s, n - 3)
        && is_vowel(s, n - 2)
        && is_consonant(s, n - 1)
        && !matches!(s[n - 1], b'w' | b'x' | b'y')
}

fn penultimate(w: &[u8]) -> Option<u8> {
    w.len().checked_sub(2).map(|i| w[i])
}

/// Swap `suffix` for `repl` when the remaining stem's measure exceeds
/// `min_measure`. Returns whether the suffix matched, replaced or not: a match
/// ends the caller's rule chain either way.
fn replace(w: &mut Vec<u8>, suffix: &str, repl: &str, min_measure: Option<usize>) -> bool {
    if !w.ends_with(suffix.as_bytes()) {
        return false;
    }
    let stem_len = w.len() - suffix.len();
    if min_measure.map_or(true, |m| measure(&w[..stem_len]) > m) {
        w.truncate(stem_len);
        w.extend_from_slice(repl.as_bytes());
    }
    true
}

/// Try each `(suffix, replacement)` in order, stopping at the first suffix
/// that matches.
fn replace_first(w: &mut Vec<u8>, rules: &[(&str, &str)], min_measure: usize) {
    for (suffix, repl) in rules {
        if replace(w, suffix, repl, Some(min_measure)) {
            return;
        }
    }
}

fn step1a(w: &mut Vec<u8>) {
    if w.last() == Some(&b's') {
        let _ = replace(w, "sses", "ss", None)
            || replace(w, "ies", "i", None)
            || replace(w, "ss", "ss", None)
            || replace(w, "s", "", None);
    }
}

fn step1b(w: &mut Vec<u8>) {
    if penultimate(w) == Some(b'e') && replace(w, "eed", "ee", Some(0)) {
        return;
    }

    let stripped = (contains_vowel(&w[..w.len().saturating_sub(3)])
        && replace(w, "ing", "", None))
        || (contains_vowel(&w[..w.len().saturating_sub(2)]) && replace(w, "ed", "", None));
    if !stripped {
        return;
    }

    if replace(w, "at", "ate", None) || replace(w, "bl", "ble", None) || replace(w, "iz", "ize", None)
    {
        return;
    }

    if double_consonant(w) && !w.ends_with(b"ll") && !w.ends_with(b"ss") && !w.ends_with(b"zz") {
        w.pop();
    } else if measure(w) == 1 && cvc(w) {
        w.push(b'e');
    }
}

fn step1c(w: &mut Vec<u8>) {
    if w.last() == Some(&b'y') && contains_vowel(&w[..w.len() - 1]) {
        replace(w, "y", "i", None);
    }
}

fn step2(w: &mut Vec<u8>) {
    let rules: &[(&str, &str)] = match penultimate(w) {
        Some(b'a') => &[("ational", "ate"), ("tional", "tion")],
        Some(b'c') => &[("enci", "ence"), ("anci", "ance")],
        Some(b'e') => &[("izer", "ize")],
        Some(b'g') => &[("logi", "log")],
        Some(b'l') => &[("entli", "ent"), ("ousli", "ous"), ("alli", "al"), ("bli", "ble"), ("eli", "e")],
        Some(b'o') => &[("ization", "ize"), ("ation", "ate"), ("ator", "ate")],
        Some(b's') => &[("iveness", "ive"), ("fulness", "ful"), ("ousness", "ous"), ("alism", "al")],
        Some(b't') => &[("biliti", "ble"), ("aliti", "al"), ("iviti", "ive")],
        _ => return,
    };
    replace_first(w, rules, 0);
}

fn step3(w: &mut Vec<u8>) {
    let rules: &[(&str, &str)] = match penultimate(w) {
        Some(b'a') => &[("ical", "ic")],
        Some(b's') => &[("ness", "")],
        Some(b't') => &[("icate", "ic"), ("iciti", "ic")],
        Some(b'u') => &[("ful", "")],
        Some(b'v') => &[("ative", "")],
        Some(b'z') => &[("alize", "al")],
        _ => return,
    };
    replace_first(w, rules, 0);
}

fn step4(w: &mut Vec<u8>) {
    let rules: &[(&str, &str)] = match penultimate(w) {
        Some(b'a') => &[("al", "")],
        Some(b'c') => &[("ance", ""), ("ence", "")],
        Some(b'e') => &[("er", "")],
        Some(b'i') => &[("ic", "")],
        Some(b'l') => &[("able", ""), ("ible", "")],
        Some(b'n') => &[("ant", ""), ("ement", ""), ("ment", ""), ("ent", "")],
        Some(b'o') if w.ends_with(b"tion") || w.ends_with(b"sion") => &[("ion", "")],
        Some(b'o') => &[("ou", "")],
        Some(b's') => &[("ism", "")],
        Some(b't') => &[("ate", ""), ("iti", "")],
        Some(b'u') => &[("ous", "")],
        Some(b'v') => &[("ive", "")],
        Some(b'z') => &[("ize", "")],
        _ => return,
    };
    replace_first(w, rules, 1);
}

fn step5(w: &mut Vec<u8>) {
    if w.last() == Some(&b'e') {
        let stem = &w[..w.len() - 1];
        let m = measure(stem);
        if m > 1 || (m == 1 && !cvc(stem)) {
            w.pop();
        }
    }

    if w.last() == Some(&b'l') && double_consonant(w) && measure(w) > 1 {
        w.pop();
    }
}
