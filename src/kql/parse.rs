//! Compiling a token stream into an RPN filter program.
//!
//! The parser is a small state machine over the lexer's tokens. Boolean
//! operators are staged on an auxiliary stack (classic shunting-yard) so
//! they can be emitted *after* their operands; a sentinel open-paren entry
//! on that stack marks where a close paren must stop popping.

use super::error::CompileError;
use super::lex::{Lexer, Token, TokenKind};
use super::rpn::{RangeOp, RpnStep};
use super::term::Term;

pub(crate) fn parse(kql: &str) -> Result<Vec<RpnStep>, CompileError> {
    Parser::new(kql).parse()
}

/// An entry on the staged-operator stack. Open parens are staged alongside
/// the boolean operators but never become program steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StagedOp {
    Or,
    And,
    Not,
    OpenParen,
}

impl StagedOp {
    fn precedence(self) -> u8 {
        match self {
            StagedOp::OpenParen => 0,
            StagedOp::Or => 1,
            StagedOp::And => 2,
            StagedOp::Not => 3,
        }
    }
}

fn bool_step(op: StagedOp) -> RpnStep {
    match op {
        StagedOp::And => RpnStep::And,
        StagedOp::Or => RpnStep::Or,
        StagedOp::Not => RpnStep::Not,
        StagedOp::OpenParen => unreachable!("open paren is never emitted as a program step"),
    }
}

/// The parse position between token handling steps. Query states carry the
/// already-consumed field token.
enum State {
    BeforeQuery,
    RangeQuery(Token),
    TermsQuery(Token),
    AfterQuery,
    EndOfInput,
}

struct Parser<'a> {
    kql: &'a str,
    lexer: Lexer<'a>,
    look_ahead: Option<Token>,
    staged: Vec<StagedOp>,
    steps: Vec<RpnStep>,
    /// True if a boolean operator has been staged but the query following
    /// it has not been parsed yet.
    incomplete_bool_op: bool,
}

impl<'a> Parser<'a> {
    fn new(kql: &'a str) -> Self {
        Parser {
            kql,
            lexer: Lexer::new(kql),
            look_ahead: None,
            staged: Vec::new(),
            steps: Vec::new(),
            incomplete_bool_op: false,
        }
    }

    fn next(&mut self) -> Token {
        match self.look_ahead.take() {
            Some(tok) => tok,
            None => self.lexer.next_token(),
        }
    }

    fn peek(&mut self) -> &Token {
        let lexer = &mut self.lexer;
        self.look_ahead.get_or_insert_with(|| lexer.next_token())
    }

    fn backup(&mut self, tok: Token) {
        debug_assert!(self.look_ahead.is_none(), "cannot back up two tokens");
        self.look_ahead = Some(tok);
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> CompileError {
        CompileError::new(self.kql, pos, message)
    }

    fn make_term(&self, tok: &Token) -> Result<Term, CompileError> {
        match tok.kind {
            TokenKind::QuotedLiteral => Ok(Term::from_quoted(&tok.val)),
            _ => Term::unquoted(&tok.val)
                .map_err(|err| self.error_at(tok.pos, format!("invalid wildcard pattern: {err}"))),
        }
    }

    /// Pop staged operators of equal or higher precedence into the program,
    /// stopping at an open paren, then stage `op`.
    fn stage_bool_op(&mut self, op: StagedOp) {
        let precedence = op.precedence();
        while let Some(&top) = self.staged.last() {
            if top == StagedOp::OpenParen || top.precedence() < precedence {
                break;
            }
            self.staged.pop();
            self.steps.push(bool_step(top));
        }
        self.staged.push(op);
    }

    fn parse(mut self) -> Result<Vec<RpnStep>, CompileError> {
        let mut state = State::BeforeQuery;
        loop {
            state = match state {
                State::BeforeQuery => self.before_query()?,
                State::RangeQuery(field) => self.range_query(field)?,
                State::TermsQuery(field) => self.terms_query(field)?,
                State::AfterQuery => self.after_query()?,
                State::EndOfInput => {
                    self.finish()?;
                    return Ok(self.steps);
                }
            };
        }
    }

    /// Handles tokens at the start of a query: a field or bare term, `not`,
    /// or an opening paren.
    fn before_query(&mut self) -> Result<State, CompileError> {
        let tok = self.next();
        match tok.kind {
            TokenKind::Error => Err(self.error_at(tok.pos, tok.val)),
            TokenKind::EndOfInput => {
                self.backup(tok);
                Ok(State::EndOfInput)
            }
            TokenKind::OpenParen => {
                // The marker at which a ')' stops popping staged ops.
                self.staged.push(StagedOp::OpenParen);
                Ok(State::BeforeQuery)
            }
            TokenKind::Not => {
                self.stage_bool_op(StagedOp::Not);
                self.incomplete_bool_op = true;
                Ok(State::BeforeQuery)
            }
            TokenKind::UnquotedLiteral | TokenKind::QuotedLiteral => {
                self.incomplete_bool_op = false;
                match self.peek().kind {
                    TokenKind::Error => {
                        let err = self.next();
                        Err(self.error_at(err.pos, err.val))
                    }
                    TokenKind::Gt | TokenKind::Gte | TokenKind::Lt | TokenKind::Lte => {
                        if tok.kind == TokenKind::QuotedLiteral {
                            return Err(self.error_at(
                                tok.pos,
                                "a quoted field for a range query is not yet supported",
                            ));
                        }
                        Ok(State::RangeQuery(tok))
                    }
                    TokenKind::Colon => {
                        if tok.kind == TokenKind::QuotedLiteral {
                            return Err(self.error_at(
                                tok.pos,
                                "a quoted field for a term query is not yet supported",
                            ));
                        }
                        Ok(State::TermsQuery(tok))
                    }
                    _ => {
                        // No colon and no range operator: these terms match
                        // against the default fields.
                        let mut terms = vec![self.make_term(&tok)?];
                        loop {
                            let tok = self.next();
                            match tok.kind {
                                TokenKind::UnquotedLiteral | TokenKind::QuotedLiteral => {
                                    terms.push(self.make_term(&tok)?);
                                }
                                _ => {
                                    self.backup(tok);
                                    break;
                                }
                            }
                        }
                        self.steps.push(RpnStep::DefaultFieldsTerms { terms });
                        Ok(State::AfterQuery)
                    }
                }
            }
            _ => Err(self.error_at(
                tok.pos,
                format!("expecting a literal, 'not', or '('; got {}", tok.kind),
            )),
        }
    }

    /// Parses `field > value` and friends. The next token is known to be a
    /// range operator.
    fn range_query(&mut self, field: Token) -> Result<State, CompileError> {
        let op_tok = self.next();
        let op = match op_tok.kind {
            TokenKind::Gt => RangeOp::Gt,
            TokenKind::Gte => RangeOp::Gte,
            TokenKind::Lt => RangeOp::Lt,
            TokenKind::Lte => RangeOp::Lte,
            _ => unreachable!("range query entered without a range operator"),
        };
        let val_tok = self.next();
        match val_tok.kind {
            TokenKind::Error => Err(self.error_at(val_tok.pos, val_tok.val)),
            TokenKind::UnquotedLiteral | TokenKind::QuotedLiteral => {
                let term = self.make_term(&val_tok)?;
                if term.wildcard {
                    return Err(
                        self.error_at(val_tok.pos, "cannot have a wildcard in range query token")
                    );
                }
                self.steps.push(RpnStep::Range {
                    op,
                    field: field.val,
                    term,
                });
                Ok(State::AfterQuery)
            }
            _ => Err(self.error_at(
                val_tok.pos,
                format!("expected a literal after '{}'; got {}", op_tok.val, val_tok.kind),
            )),
        }
    }

    /// Parses the value side of `field:...`: a run of terms, `*` as an
    /// exists query, or a parenthesized or/and value group.
    fn terms_query(&mut self, field: Token) -> Result<State, CompileError> {
        self.next(); // the ':' token

        match self.peek().kind {
            TokenKind::Error => {
                let err = self.next();
                Err(self.error_at(err.pos, err.val))
            }
            TokenKind::UnquotedLiteral | TokenKind::QuotedLiteral => {
                // E.g. `foo:val1 val2` or `foo:*`. A bare `*` among the
                // values turns the whole query into an exists query.
                let mut terms = Vec::new();
                let mut have_exists_term = false;
                loop {
                    let tok = self.next();
                    match tok.kind {
                        TokenKind::UnquotedLiteral | TokenKind::QuotedLiteral => {
                            if tok.kind == TokenKind::UnquotedLiteral && tok.val == "*" {
                                have_exists_term = true;
                            }
                            terms.push(self.make_term(&tok)?);
                        }
                        _ => {
                            self.backup(tok);
                            break;
                        }
                    }
                }
                if have_exists_term {
                    self.steps.push(RpnStep::Exists { field: field.val });
                } else {
                    self.steps.push(RpnStep::Terms {
                        field: field.val,
                        terms,
                    });
                }
                Ok(State::AfterQuery)
            }
            TokenKind::OpenParen => {
                // E.g. `foo:(a or b)` or `foo:(a and b and c)`. The first
                // operator decides the group kind; mixing is an error.
                self.next(); // the '(' token
                let mut terms = Vec::new();
                let mut match_all = false;
                let mut index = 0usize;
                loop {
                    let term_tok = self.next();
                    match term_tok.kind {
                        TokenKind::UnquotedLiteral | TokenKind::QuotedLiteral => {
                            terms.push(self.make_term(&term_tok)?);
                        }
                        _ => {
                            return Err(self.error_at(
                                term_tok.pos,
                                format!("expected literal, got {}", term_tok.kind),
                            ));
                        }
                    }
                    let op_tok = self.next();
                    match op_tok.kind {
                        TokenKind::CloseParen => {
                            let step = if match_all {
                                RpnStep::MatchAllTerms {
                                    field: field.val,
                                    terms,
                                }
                            } else {
                                RpnStep::Terms {
                                    field: field.val,
                                    terms,
                                }
                            };
                            self.steps.push(step);
                            return Ok(State::AfterQuery);
                        }
                        TokenKind::Or => {
                            if index == 0 {
                                match_all = false;
                            } else if match_all {
                                return Err(self.error_at(
                                    op_tok.pos,
                                    "cannot mix 'and' and 'or' in parenthesized value group",
                                ));
                            }
                        }
                        TokenKind::And => {
                            if index == 0 {
                                match_all = true;
                            } else if !match_all {
                                return Err(self.error_at(
                                    op_tok.pos,
                                    "cannot mix 'and' and 'or' in parenthesized value group",
                                ));
                            }
                        }
                        _ => {
                            return Err(self.error_at(
                                op_tok.pos,
                                format!("expected ')', 'or', or 'and'; got {}", op_tok.kind),
                            ));
                        }
                    }
                    index += 1;
                }
            }
            _ => {
                let tok = self.next();
                Err(self.error_at(
                    tok.pos,
                    format!("expected a literal or '('; got {}", tok.kind),
                ))
            }
        }
    }

    /// Handles tokens after a complete query: boolean operators chaining to
    /// the next query, or closing parens.
    fn after_query(&mut self) -> Result<State, CompileError> {
        let tok = self.next();
        match tok.kind {
            TokenKind::Error => Err(self.error_at(tok.pos, tok.val)),
            TokenKind::EndOfInput => {
                self.backup(tok);
                Ok(State::EndOfInput)
            }
            TokenKind::CloseParen => {
                if self.incomplete_bool_op {
                    return Err(self.error_at(tok.pos, "incomplete boolean operator"));
                }
                // Pop ops up to, and including, the matching open paren.
                loop {
                    match self.staged.pop() {
                        None => {
                            return Err(self.error_at(tok.pos, "unmatched close parenthesis"));
                        }
                        Some(StagedOp::OpenParen) => break,
                        Some(op) => self.steps.push(bool_step(op)),
                    }
                }
                Ok(State::AfterQuery)
            }
            TokenKind::And => {
                self.stage_bool_op(StagedOp::And);
                self.incomplete_bool_op = true;
                Ok(State::BeforeQuery)
            }
            TokenKind::Or => {
                self.stage_bool_op(StagedOp::Or);
                self.incomplete_bool_op = true;
                Ok(State::BeforeQuery)
            }
            _ => Err(self.error_at(
                tok.pos,
                format!("expect 'and', 'or', or ')'; got {}", tok.kind),
            )),
        }
    }

    /// Completes the parse on the end-of-input token.
    fn finish(&mut self) -> Result<(), CompileError> {
        let tok = self.next();
        debug_assert_eq!(tok.kind, TokenKind::EndOfInput);
        if self.incomplete_bool_op {
            // E.g. "foo and".
            return Err(self.error_at(tok.pos, "incomplete boolean operator"));
        }
        // Unclosed open parens are a lexer error, so only boolean operators
        // can remain staged here.
        while let Some(op) = self.staged.pop() {
            self.steps.push(bool_step(op));
        }
        Ok(())
    }
}
