//! Query literals ("terms") with lazy type coercions.
//!
//! A query is typically matched against many log records. When a term is
//! compared against a number or boolean field value it has to be converted
//! first; those conversions are attempted once and cached.

use regex::Regex;
use std::sync::OnceLock;

/// A literal value from a KQL query.
///
/// For wildcard terms `value` holds an anchored regex pattern (`^…$`) and
/// `regex` holds its compiled form; otherwise `value` is the escape-expanded
/// literal text. Terms are immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct Term {
    pub value: String,
    pub wildcard: bool,
    pub quoted: bool,
    regex: Option<Regex>,
    num: OnceLock<Option<f64>>,
    boolean: OnceLock<Option<bool>>,
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.wildcard == other.wildcard && self.quoted == other.quoted
    }
}

enum Piece {
    Literal(String),
    Star,
}

/// Expands unquoted-literal escapes into literal/wildcard pieces.
///
/// Outside quotes the recognized escapes are `\t` `\n` `\r`, the special
/// characters `\ ( ) : < > " * { }`, and the whole-token keywords `\and`
/// `\or` `\not` (handled by the caller). An unrecognized escape keeps its
/// backslash. Unescaped `*` becomes a wildcard piece.
fn unquoted_pieces(raw: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut lit = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('t') => lit.push('\t'),
                Some('n') => lit.push('\n'),
                Some('r') => lit.push('\r'),
                Some(e @ ('\\' | '(' | ')' | ':' | '<' | '>' | '"' | '*' | '{' | '}')) => {
                    lit.push(e)
                }
                Some(other) => {
                    lit.push('\\');
                    lit.push(other);
                }
                None => lit.push('\\'),
            },
            '*' => {
                pieces.push(Piece::Literal(std::mem::take(&mut lit)));
                pieces.push(Piece::Star);
            }
            _ => lit.push(c),
        }
    }
    pieces.push(Piece::Literal(lit));
    pieces
}

impl Term {
    /// Builds a term from an unquoted literal token, expanding escapes and
    /// compiling a wildcard matcher if any unescaped `*` is present.
    pub fn unquoted(raw: &str) -> Result<Term, regex::Error> {
        // Whole-token keyword escapes. Longer sequences such as `\andMORE`
        // fall through to regular escape expansion.
        if let keyword @ ("\\and" | "\\or" | "\\not") = raw {
            return Ok(Term {
                value: keyword[1..].to_string(),
                ..Term::default()
            });
        }

        let pieces = unquoted_pieces(raw);
        let wildcard = pieces.iter().any(|p| matches!(p, Piece::Star));
        if !wildcard {
            let value = pieces
                .into_iter()
                .map(|p| match p {
                    Piece::Literal(s) => s,
                    Piece::Star => unreachable!(),
                })
                .collect();
            return Ok(Term {
                value,
                ..Term::default()
            });
        }

        let mut pattern = String::from("^");
        for piece in &pieces {
            match piece {
                Piece::Literal(s) => pattern.push_str(&regex::escape(s)),
                Piece::Star => pattern.push_str(".*"),
            }
        }
        pattern.push('$');
        let regex = Regex::new(&pattern)?;
        Ok(Term {
            value: pattern,
            wildcard: true,
            regex: Some(regex),
            ..Term::default()
        })
    }

    /// Builds a term from a quoted literal token (quotes still attached).
    /// Inside quotes only `\t` `\r` `\n` `\\` `\"` are escapes and `*` is
    /// an ordinary character.
    pub fn from_quoted(raw: &str) -> Term {
        let inner = raw
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(raw);
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('t') => value.push('\t'),
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some(e @ ('\\' | '"')) => value.push(e),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => value.push('\\'),
                },
                _ => value.push(c),
            }
        }
        Term {
            value,
            quoted: true,
            ..Term::default()
        }
    }

    /// The term as a 64-bit float, if it parses as one. Computed once.
    pub fn as_number(&self) -> Option<f64> {
        *self.num.get_or_init(|| self.value.parse().ok())
    }

    /// The term as a boolean: exactly "true" or "false". Computed once.
    pub fn as_bool(&self) -> Option<bool> {
        *self.boolean.get_or_init(|| match self.value.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        })
    }

    /// Matches a string field value: anchored regex match for wildcard
    /// terms, byte equality otherwise.
    pub fn matches_str(&self, s: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(s),
            None => self.value == s,
        }
    }
}
