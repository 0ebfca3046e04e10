//! Tokenizing of a KQL query string.
//!
//! A hand-written scanner, pulled one token at a time by the parser. The
//! scanner always terminates: every token stream ends with either a single
//! `EndOfInput` token or a single terminal `Error` token, after which
//! `next_token` keeps returning `EndOfInput`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Error,
    EndOfInput,
    UnquotedLiteral,
    QuotedLiteral,
    Or,
    And,
    Not,
    OpenParen,
    CloseParen,
    Colon,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Error => "error",
            TokenKind::EndOfInput => "EOF",
            TokenKind::UnquotedLiteral => "unquoted literal",
            TokenKind::QuotedLiteral => "quoted literal",
            TokenKind::Or => "or",
            TokenKind::And => "and",
            TokenKind::Not => "not",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::Colon => ":",
            TokenKind::Gt => ">",
            TokenKind::Gte => ">=",
            TokenKind::Lt => "<",
            TokenKind::Lte => "<=",
        };
        f.write_str(name)
    }
}

/// A single lexed token. `val` is the raw source slice for regular tokens
/// and a human-readable message for `Error` tokens. `pos` is the byte
/// offset of the token in the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub val: String,
    pub pos: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    start: usize,
    pos: usize,
    paren_depth: usize,
    pending: Option<Token>,
    done: bool,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

// From the KQL PEG, SpecialCharacter = [\\():<>"*{}]. The backslash is
// handled by escape scanning and '*' is a valid part of an unquoted literal.
fn is_delimiting_special(c: char) -> bool {
    matches!(c, '(' | ')' | ':' | '<' | '>' | '"' | '{' | '}')
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            start: 0,
            pos: 0,
            paren_depth: 0,
            pending: None,
            done: false,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn accept(&mut self, want: char) -> bool {
        if self.peek_char() == Some(want) {
            self.pos += want.len_utf8();
            true
        } else {
            false
        }
    }

    fn token(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            val: self.input[self.start..self.pos].to_string(),
            pos: self.start,
        }
    }

    fn error_token(&mut self, message: impl Into<String>) -> Token {
        self.done = true;
        Token {
            kind: TokenKind::Error,
            val: message.into(),
            pos: self.start,
        }
    }

    /// Returns the next token. After the terminal `Error` or `EndOfInput`
    /// token, keeps returning `EndOfInput`.
    pub fn next_token(&mut self) -> Token {
        if let Some(tok) = self.pending.take() {
            if tok.kind == TokenKind::Error {
                self.done = true;
            }
            return tok;
        }
        if self.done {
            return Token {
                kind: TokenKind::EndOfInput,
                val: String::new(),
                pos: self.input.len(),
            };
        }

        loop {
            self.start = self.pos;
            let Some(c) = self.next_char() else {
                self.done = true;
                return match self.paren_depth {
                    0 => self.token(TokenKind::EndOfInput),
                    1 => self.error_token("unclosed open parenthesis"),
                    n => self.error_token(format!("unclosed open parentheses ({n})")),
                };
            };
            match c {
                c if is_space(c) => continue,
                '(' => {
                    self.paren_depth += 1;
                    return self.token(TokenKind::OpenParen);
                }
                ')' => {
                    let tok = self.token(TokenKind::CloseParen);
                    if self.paren_depth == 0 {
                        self.pending = Some(Token {
                            kind: TokenKind::Error,
                            val: "unmatched close parenthesis".to_string(),
                            pos: self.start,
                        });
                    } else {
                        self.paren_depth -= 1;
                    }
                    return tok;
                }
                ':' => return self.token(TokenKind::Colon),
                '<' => {
                    let kind = if self.accept('=') {
                        TokenKind::Lte
                    } else {
                        TokenKind::Lt
                    };
                    return self.token(kind);
                }
                '>' => {
                    let kind = if self.accept('=') {
                        TokenKind::Gte
                    } else {
                        TokenKind::Gt
                    };
                    return self.token(kind);
                }
                '"' => return self.quoted_literal(),
                '{' | '}' => {
                    return self.error_token(format!(
                        "do not support KQL nested field queries: '{c}'"
                    ));
                }
                // JSON strings may not contain NUL, not even escaped.
                '\0' => return self.error_token("unrecognized character: NUL"),
                _ => {
                    self.pos = self.start;
                    return self.literal_or_bool_op();
                }
            }
        }
    }

    /// Scans an unquoted literal or one of the boolean operator words
    /// "and", "or", "not".
    fn literal_or_bool_op(&mut self) -> Token {
        loop {
            match self.peek_char() {
                None => break,
                Some(c) if is_space(c) || is_delimiting_special(c) => break,
                Some('\\') => {
                    self.next_char();
                    if self.next_char().is_none() {
                        return self.error_token("unterminated character escape");
                    }
                }
                Some(_) => {
                    self.next_char();
                }
            }
        }

        let val = &self.input[self.start..self.pos];
        // An escaped keyword such as `\and` still contains its backslash
        // here, so it can never compare equal to the bare word.
        let kind = match val.to_ascii_lowercase().as_str() {
            "or" => TokenKind::Or,
            "and" => TokenKind::And,
            "not" => TokenKind::Not,
            _ => TokenKind::UnquotedLiteral,
        };
        self.token(kind)
    }

    /// Scans a double-quoted literal. The emitted token value includes the
    /// surrounding quotes; escape expansion happens in term construction.
    fn quoted_literal(&mut self) -> Token {
        loop {
            match self.next_char() {
                None => return self.error_token("unterminated quoted literal"),
                Some('\\') => {
                    if self.next_char().is_none() {
                        return self.error_token("unterminated quoted literal");
                    }
                }
                Some('"') => return self.token(TokenKind::QuotedLiteral),
                Some(_) => {}
            }
        }
    }
}
