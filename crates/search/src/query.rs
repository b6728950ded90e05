//! Free-text search query grammar.
//!
//! ```text
//! query       := alternative ( " or " alternative )*
//! alternative := term ( (" and " | whitespace) term )*
//! term        := '"' chars '"' | word
//! ```
//!
//! Matching is case-insensitive. Quoted terms must equal a field value
//! exactly; bare words only need to be contained in it.

use crate::{FieldPath, MatchMode, Predicate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub text: String,
    pub quoted: bool,
}

impl Term {
    pub fn mode(&self) -> MatchMode {
        if self.quoted {
            MatchMode::Exact
        } else {
            MatchMode::Contains
        }
    }
}

/// Split `query` into OR-ed alternatives of AND-ed terms.
///
/// A blank query yields no alternatives. An unterminated quote runs to the
/// end of the input.
pub fn parse_query(query: &str) -> Vec<Vec<Term>> {
    let mut alternatives = Vec::new();
    let mut current: Vec<Term> = Vec::new();

    for token in tokenize(&query.to_lowercase()) {
        match token {
            Term { ref text, quoted: false } if text == "or" => {
                if !current.is_empty() {
                    alternatives.push(std::mem::take(&mut current));
                }
            }
            Term { ref text, quoted: false } if text == "and" => {}
            term => current.push(term),
        }
    }
    if !current.is_empty() {
        alternatives.push(current);
    }
    alternatives
}

fn tokenize(input: &str) -> Vec<Term> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' if in_quotes => {
                in_quotes = false;
                let text = std::mem::take(&mut buf);
                if !text.trim().is_empty() {
                    tokens.push(Term { text: text.trim().to_string(), quoted: true });
                }
            }
            '"' => {
                flush_word(&mut buf, &mut tokens);
                in_quotes = true;
            }
            c if c.is_whitespace() && !in_quotes => flush_word(&mut buf, &mut tokens),
            c => buf.push(c),
        }
    }
    if in_quotes {
        if !buf.trim().is_empty() {
            tokens.push(Term { text: buf.trim().to_string(), quoted: true });
        }
    } else {
        flush_word(&mut buf, &mut tokens);
    }
    tokens
}

fn flush_word(buf: &mut String, tokens: &mut Vec<Term>) {
    if !buf.is_empty() {
        tokens.push(Term { text: std::mem::take(buf), quoted: false });
    }
}

/// Build the predicate for `query` applied to `fields`, which are alternative
/// spellings of the same attribute (OR-ed per term).
pub fn query_predicate(query: &str, fields: &[FieldPath]) -> Predicate {
    Predicate::any_of(parse_query(query).into_iter().map(|terms| {
        Predicate::all_of(terms.into_iter().map(|term| {
            Predicate::any_of(
                fields
                    .iter()
                    .map(|f| Predicate::text(f.clone(), term.mode(), &term.text)),
            )
        }))
    }))
}
