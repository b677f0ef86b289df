//! Match highlighting and relevant-excerpt extraction over stored text.

use crate::error::Result;
use crate::tokenizer::{split_terms, Tokenizer, WordTokenizer};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub const DEFAULT_REL_LENGTH: usize = 300;
pub const DEFAULT_PREV_COUNT: usize = 50;
pub const DEFAULT_INDICATOR: &str = "...";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightOptions {
    /// Match anywhere, including inside markup tags.
    pub simple: bool,
    pub whole_word: bool,
    pub case_sensitive: bool,
    /// Unwrap `<a ...>term</a>` before highlighting the term.
    pub strip_links: bool,
    /// Attributes added to the highlight tag, in order.
    pub tag_attributes: Vec<(String, String)>,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self { simple: false, whole_word: true, case_sensitive: false, strip_links: false, tag_attributes: Vec::new() }
    }
}

pub struct Highlighter<'a> {
    tokenizer: &'a dyn Tokenizer,
}

impl Default for Highlighter<'static> {
    fn default() -> Self {
        Self { tokenizer: &WordTokenizer }
    }
}

impl<'a> Highlighter<'a> {
    /// Needles and snippet windows are split with `tokenizer`'s pattern.
    pub fn new(tokenizer: &'a dyn Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Wrap every term of `needle` found in `text` in `<tag>`.
    pub fn highlight(&self, text: &str, needle: &str, tag: &str, options: &HighlightOptions) -> Result<String> {
        let attributes: String = options
            .tag_attributes
            .iter()
            .map(|(name, value)| format!(" {name}=\"{value}\""))
            .collect();
        let open = format!("<{tag}{attributes}>");
        let close = format!("</{tag}>");

        let mut text = text.to_string();
        for term in split_terms(self.tokenizer.pattern(), needle) {
            let mut escaped = regex::escape(&term);
            if options.whole_word {
                escaped = format!(r"\b{escaped}\b");
            }

            if options.strip_links {
                let link = RegexBuilder::new(&format!(r"<a\s(?:.*?)>({escaped})</a>"))
                    .case_insensitive(!options.case_sensitive)
                    .build()?;
                text = link.replace_all(&text, "$1").into_owned();
            }

            let re = RegexBuilder::new(&escaped).case_insensitive(!options.case_sensitive).build()?;
            text = if options.simple {
                re.replace_all(&text, |caps: &regex::Captures| format!("{open}{}{close}", &caps[0]))
                    .into_owned()
            } else {
                wrap_outside_tags(&re, &text, &open, &close)
            };
        }
        Ok(text)
    }

    /// Cut the excerpt of `full_text` most relevant to `words`: centered on
    /// the densest cluster of matches and trimmed to whole tokens, with
    /// `indicator` marking each cut side.
    pub fn extract_relevant(
        &self,
        words: &str,
        full_text: &str,
        rel_length: usize,
        prev_count: usize,
        indicator: &str,
    ) -> String {
        let chars: Vec<char> = full_text.chars().collect();
        let text_len = chars.len();
        if text_len <= rel_length {
            return full_text.to_string();
        }

        let terms = split_terms(self.tokenizer.pattern(), words);
        let locations = extract_locations(&terms, &chars);
        let mut start = determine_snip_location(&locations, prev_count).unwrap_or(0);
        if start + rel_length > text_len {
            let overflow = start + rel_length - text_len;
            start = start.saturating_sub(overflow / 2);
        }

        let end = (start + rel_length).min(text_len);
        let window: String = chars[start..end].iter().collect();

        let separators: Vec<(usize, usize)> =
            self.tokenizer.pattern().find_iter(&window).map(|m| (m.start(), m.end())).collect();
        let last_cut = separators.last().map_or(window.len(), |&(s, _)| s);

        if locations.is_empty() {
            return format!("{}{indicator}", &window[..last_cut]);
        }

        let mut body_start = 0;
        let mut body_end = window.len();
        let mut prefix = "";
        let mut suffix = "";
        if start + rel_length < text_len {
            body_end = last_cut;
            suffix = indicator;
        }
        if start != 0 {
            body_start = separators.first().map_or(0, |&(_, e)| e).min(body_end);
            prefix = indicator;
        }
        format!("{prefix}{}{suffix}", &window[body_start..body_end])
    }

    /// [`Self::extract_relevant`] with the default window.
    pub fn snippet(&self, words: &str, full_text: &str) -> String {
        self.extract_relevant(words, full_text, DEFAULT_REL_LENGTH, DEFAULT_PREV_COUNT, DEFAULT_INDICATOR)
    }
}

/// Replace matches of `re` that are neither markup themselves nor inside a
/// tag's angle brackets.
fn wrap_outside_tags(re: &Regex, text: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;
    while let Some(m) = re.find_at(text, pos) {
        if m.as_str().is_empty() || m.as_str().starts_with('<') || inside_tag(&text[m.end()..]) {
            match text[m.start()..].chars().next() {
                Some(c) => pos = m.start() + c.len_utf8(),
                None => break,
            }
            continue;
        }
        out.push_str(&text[copied..m.start()]);
        out.push_str(open);
        out.push_str(m.as_str());
        out.push_str(close);
        copied = m.end();
        pos = m.end();
    }
    out.push_str(&text[copied..]);
    out
}

/// The next angle bracket after a match closes a tag.
fn inside_tag(rest: &str) -> bool {
    rest.chars().find(|&c| c == '<' || c == '>') == Some('>')
}

fn lower_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Character offsets of every case-insensitive, non-overlapping occurrence of
/// each term, deduplicated and ascending.
pub fn extract_locations(terms: &[String], text: &[char]) -> Vec<usize> {
    let haystack: Vec<char> = text.iter().copied().map(lower_char).collect();
    let mut locations = Vec::new();
    for term in terms {
        let needle: Vec<char> = term.chars().map(lower_char).collect();
        if needle.is_empty() || needle.len() > haystack.len() {
            continue;
        }
        let mut i = 0;
        while i + needle.len() <= haystack.len() {
            if haystack[i..i + needle.len()] == needle[..] {
                locations.push(i);
                i += needle.len();
            } else {
                i += 1;
            }
        }
    }
    locations.sort_unstable();
    locations.dedup();
    locations
}

/// Start of the excerpt: `prev_count` characters before the match that sits
/// next to the smallest gap between matches. With one or two matches the
/// first one is used. `None` when nothing matched.
pub fn determine_snip_location(locations: &[usize], prev_count: usize) -> Option<usize> {
    let mut start = *locations.first()?;
    let n = locations.len();
    if n > 2 {
        let mut smallest = usize::MAX;
        for i in 1..n {
            let diff = if i == n - 1 {
                locations[i] - locations[i - 1]
            } else {
                locations[i + 1] - locations[i]
            };
            if smallest > diff {
                smallest = diff;
                start = locations[i];
            }
        }
    }
    Some(start.saturating_sub(prev_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "aaa bbb ccc ddd eee fff ggg hhh iii jjj";

    #[test]
    fn snip_location_prefers_densest_cluster() {
        assert_eq!(determine_snip_location(&[10, 50, 52, 200], 5), Some(45));
        assert_eq!(determine_snip_location(&[10, 12], 5), Some(5));
        assert_eq!(determine_snip_location(&[3], 50), Some(0));
        assert_eq!(determine_snip_location(&[], 50), None);
    }

    #[test]
    fn locations_are_case_insensitive_and_deduplicated() {
        let chars: Vec<char> = "Cat cat CAT".chars().collect();
        let terms = vec!["cat".to_string(), "CAT".to_string()];
        assert_eq!(extract_locations(&terms, &chars), vec![0, 4, 8]);
    }

    #[test]
    fn excerpt_trims_partial_tokens() {
        let hl = Highlighter::default();
        assert_eq!(hl.extract_relevant("eee", TEXT, 15, 4, "..."), "...eee fff...");
    }

    #[test]
    fn excerpt_shifts_back_near_the_end() {
        let hl = Highlighter::default();
        assert_eq!(hl.extract_relevant("jjj", TEXT, 15, 4, "..."), "...iii jjj");
    }

    #[test]
    fn excerpt_without_match_keeps_leading_window() {
        let hl = Highlighter::default();
        assert_eq!(hl.extract_relevant("zzz", TEXT, 15, 4, "..."), "aaa bbb ccc...");
    }

    #[test]
    fn attributes_render_in_order() {
        let hl = Highlighter::default();
        let options = HighlightOptions {
            tag_attributes: vec![("class".into(), "hit".into()), ("title".into(), "match".into())],
            ..Default::default()
        };
        let out = hl.highlight("a dog", "dog", "mark", &options).unwrap();
        assert_eq!(out, r#"a <mark class="hit" title="match">dog</mark>"#);
    }
}
