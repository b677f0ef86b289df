//! Boolean queries: infix → postfix conversion and a set-algebra stack
//! machine over document ids.
//!
//! Operators are `&` (and), `|` (or) and unary `~` (not), with parentheses
//! for grouping. The lexer also reads the word `or`, a leading `-` on a term,
//! and plain adjacency (`rust safe` means `rust & safe`).

use crate::error::Result;
use crate::DocId;
use std::collections::BTreeSet;
use tracing::warn;

pub type DocSet = BTreeSet<DocId>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostfixToken {
    And,
    Or,
    Not,
    Operand(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexeme {
    Op(PostfixToken),
    Open,
    Close,
}

fn precedence(op: &PostfixToken) -> u8 {
    match op {
        PostfixToken::Or => 1,
        PostfixToken::And => 2,
        PostfixToken::Not => 3,
        PostfixToken::Operand(_) => 0,
    }
}

fn lex(expression: &str) -> Vec<Lexeme> {
    let mut raw = Vec::new();
    let mut word = String::new();

    fn flush(word: &mut String, raw: &mut Vec<Lexeme>) {
        if word.is_empty() {
            return;
        }
        let token = if word.eq_ignore_ascii_case("or") {
            PostfixToken::Or
        } else {
            PostfixToken::Operand(word.clone())
        };
        raw.push(Lexeme::Op(token));
        word.clear();
    }

    for c in expression.chars() {
        match c {
            '&' | '|' | '~' | '(' | ')' => {
                flush(&mut word, &mut raw);
                raw.push(match c {
                    '&' => Lexeme::Op(PostfixToken::And),
                    '|' => Lexeme::Op(PostfixToken::Or),
                    '~' => Lexeme::Op(PostfixToken::Not),
                    '(' => Lexeme::Open,
                    _ => Lexeme::Close,
                });
            }
            '-' if word.is_empty() => raw.push(Lexeme::Op(PostfixToken::Not)),
            c if c.is_whitespace() => flush(&mut word, &mut raw),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut raw);

    // Adjacent operands are joined with an implicit AND.
    let mut lexemes = Vec::with_capacity(raw.len());
    for lexeme in raw {
        let ends_operand = matches!(lexemes.last(), Some(Lexeme::Op(PostfixToken::Operand(_))) | Some(Lexeme::Close));
        let starts_operand = matches!(
            lexeme,
            Lexeme::Op(PostfixToken::Operand(_)) | Lexeme::Op(PostfixToken::Not) | Lexeme::Open
        );
        if ends_operand && starts_operand {
            lexemes.push(Lexeme::Op(PostfixToken::And));
        }
        lexemes.push(lexeme);
    }
    lexemes
}

/// Shunting-yard conversion. Unbalanced parentheses are dropped rather than
/// reported; the evaluator turns whatever remains malformed into an empty
/// result.
pub fn to_postfix(expression: &str) -> Vec<PostfixToken> {
    let mut output = Vec::new();
    let mut stack: Vec<Lexeme> = Vec::new();

    for lexeme in lex(expression) {
        match lexeme {
            Lexeme::Op(PostfixToken::Operand(word)) => output.push(PostfixToken::Operand(word)),
            Lexeme::Open => stack.push(Lexeme::Open),
            Lexeme::Close => {
                while let Some(top) = stack.pop() {
                    match top {
                        Lexeme::Open => break,
                        Lexeme::Op(op) => output.push(op),
                        Lexeme::Close => {}
                    }
                }
            }
            Lexeme::Op(op) => {
                while let Some(Lexeme::Op(top)) = stack.last() {
                    let right_assoc = op == PostfixToken::Not;
                    let pops = precedence(top) > precedence(&op)
                        || (precedence(top) == precedence(&op) && !right_assoc);
                    if !pops {
                        break;
                    }
                    if let Some(Lexeme::Op(top)) = stack.pop() {
                        output.push(top);
                    }
                }
                stack.push(Lexeme::Op(op));
            }
        }
    }

    while let Some(top) = stack.pop() {
        if let Lexeme::Op(op) = top {
            output.push(op);
        }
    }
    output
}

/// Where the stack machine gets document sets from.
pub trait DocSetSource {
    /// Documents containing `keyword`.
    fn documents(&self, keyword: &str) -> Result<DocSet>;

    /// Documents lacking `keyword`, as reported by the store.
    fn documents_without(&self, keyword: &str) -> Result<DocSet>;

    /// Complement of an already evaluated sub-expression.
    fn complement(&self, docs: &DocSet) -> Result<DocSet>;
}

#[derive(Debug)]
enum StackValue {
    Keyword(String),
    Docs(DocSet),
}

fn resolve<R: DocSetSource + ?Sized>(value: Option<StackValue>, source: &R) -> Result<DocSet> {
    match value {
        Some(StackValue::Keyword(keyword)) => source.documents(&keyword),
        Some(StackValue::Docs(docs)) => Ok(docs),
        None => Ok(DocSet::new()),
    }
}

/// Run `postfix` against `source`. Missing operands count as empty sets, so
/// malformed expressions narrow to no results instead of failing.
pub fn evaluate<R: DocSetSource + ?Sized>(postfix: &[PostfixToken], source: &R) -> Result<DocSet> {
    let mut stack: Vec<StackValue> = Vec::new();

    for token in postfix {
        match token {
            PostfixToken::Operand(keyword) => stack.push(StackValue::Keyword(keyword.clone())),
            PostfixToken::And | PostfixToken::Or => {
                let right = resolve(stack.pop(), source)?;
                let left = resolve(stack.pop(), source)?;
                let merged = if *token == PostfixToken::And {
                    left.intersection(&right).copied().collect()
                } else {
                    left.union(&right).copied().collect()
                };
                stack.push(StackValue::Docs(merged));
            }
            PostfixToken::Not => {
                let negated = match stack.pop() {
                    Some(StackValue::Keyword(keyword)) => source.documents_without(&keyword)?,
                    Some(StackValue::Docs(docs)) => source.complement(&docs)?,
                    None => DocSet::new(),
                };
                stack.push(StackValue::Docs(negated));
            }
        }
    }

    if stack.len() > 1 {
        warn!(leftover = stack.len() - 1, "boolean expression left unused operands");
    }
    resolve(stack.pop(), source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use super::PostfixToken::{And, Not, Operand, Or};

    fn op(word: &str) -> PostfixToken {
        Operand(word.to_string())
    }

    struct Fixture {
        terms: HashMap<&'static str, DocSet>,
        universe: DocSet,
    }

    impl Fixture {
        fn new() -> Self {
            let mut terms = HashMap::new();
            terms.insert("a", [1, 2, 3].into_iter().collect());
            terms.insert("b", [2, 3, 4].into_iter().collect());
            Self { terms, universe: (1..=6).collect() }
        }
    }

    impl DocSetSource for Fixture {
        fn documents(&self, keyword: &str) -> Result<DocSet> {
            Ok(self.terms.get(keyword).cloned().unwrap_or_default())
        }

        fn documents_without(&self, keyword: &str) -> Result<DocSet> {
            let with = self.documents(keyword)?;
            Ok(self.universe.difference(&with).copied().collect())
        }

        fn complement(&self, docs: &DocSet) -> Result<DocSet> {
            Ok(self.universe.difference(docs).copied().collect())
        }
    }

    fn run(query: &str) -> Vec<DocId> {
        let postfix = to_postfix(&format!("|{query}"));
        evaluate(&postfix, &Fixture::new()).unwrap().into_iter().collect()
    }

    #[test]
    fn postfix_respects_precedence() {
        assert_eq!(to_postfix("a | b & c"), vec![op("a"), op("b"), op("c"), And, Or]);
        assert_eq!(to_postfix("(a | b) & c"), vec![op("a"), op("b"), Or, op("c"), And]);
        assert_eq!(to_postfix("a & ~b"), vec![op("a"), op("b"), Not, And]);
        assert_eq!(to_postfix("~~a"), vec![op("a"), Not, Not]);
    }

    #[test]
    fn lexer_reads_words_and_adjacency() {
        assert_eq!(to_postfix("a or b"), vec![op("a"), op("b"), Or]);
        assert_eq!(to_postfix("a b"), vec![op("a"), op("b"), And]);
        assert_eq!(to_postfix("a -b"), vec![op("a"), op("b"), Not, And]);
        assert_eq!(to_postfix("e-mail"), vec![op("e-mail")]);
    }

    #[test]
    fn leading_or_normalizes_single_terms() {
        assert_eq!(to_postfix("|a"), vec![op("a"), Or]);
        assert_eq!(run("a"), vec![1, 2, 3]);
    }

    #[test]
    fn and_intersects() {
        assert_eq!(run("a & b"), vec![2, 3]);
    }

    #[test]
    fn or_unions_without_duplicates() {
        assert_eq!(run("a | b"), vec![1, 2, 3, 4]);
    }

    #[test]
    fn not_uses_store_complement() {
        assert_eq!(run("~a"), vec![4, 5, 6]);
        assert_eq!(run("~(a | b)"), vec![5, 6]);
    }

    #[test]
    fn malformed_expressions_are_empty() {
        assert!(run("&").is_empty());
        assert!(run("").is_empty());
        assert!(evaluate(&[Not, And], &Fixture::new()).unwrap().is_empty());
    }
}
