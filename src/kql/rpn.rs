//! The compiled form of a query: a Reverse Polish Notation step list.
//!
//! Each step either pushes the result of a field query onto a bool stack or
//! combines the top of the stack with a boolean operator. The parser
//! guarantees that executing a complete program leaves exactly one value on
//! the stack.

use serde_json::Value;

use super::LogLevelLessFn;
use super::term::Term;
use crate::lookup::{lookup_value, split_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A single step of a compiled filter program.
#[derive(Debug, Clone, PartialEq)]
pub enum RpnStep {
    /// `field:*` — the field path resolves to something.
    Exists { field: String },
    /// `field:a b` — at least one term matches the field value.
    Terms { field: String, terms: Vec<Term> },
    /// `field:(a and b)` — every term appears in an array-valued field.
    MatchAllTerms { field: String, terms: Vec<Term> },
    /// `a b` — terms matched against the filter's default fields.
    DefaultFieldsTerms { terms: Vec<Term> },
    /// `field > value` and friends.
    Range {
        op: RangeOp,
        field: String,
        term: Term,
    },
    And,
    Or,
    Not,
}

pub(crate) struct EvalContext<'a> {
    pub log_level_less: Option<LogLevelLessFn>,
    pub default_fields: &'a [String],
}

fn pop(stack: &mut Vec<bool>) -> bool {
    stack
        .pop()
        .expect("KQL evaluation underflow: the parser emitted an invalid program")
}

/// Per-kind term matching shared by the terms queries.
fn term_matches_value(term: &Term, value: &Value) -> bool {
    match value {
        Value::Null => term.value == "null",
        Value::Bool(b) => term.as_bool() == Some(*b),
        Value::Number(n) => match (term.as_number(), n.as_f64()) {
            (Some(t), Some(v)) => t == v,
            _ => false,
        },
        Value::String(s) => term.matches_str(s),
        // No term matches an object or an array.
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn terms_match_field(terms: &[Term], rec: &Value, field: &str) -> bool {
    match lookup_value(rec, &split_path(field)) {
        Some(value) => terms.iter().any(|t| term_matches_value(t, value)),
        None => false,
    }
}

fn range_matches(op: RangeOp, field: &str, term: &Term, rec: &Value, ctx: &EvalContext) -> bool {
    let Some(value) = lookup_value(rec, &split_path(field)) else {
        return false;
    };

    // Special case: "log.level" string values order by level rank, not by
    // byte comparison, when the host supplied a comparator.
    if let (Some(less), Value::String(level)) = (ctx.log_level_less, value)
        && field == "log.level"
    {
        return match op {
            // level > t  ≡  less(t, level)
            RangeOp::Gt => less(&term.value, level),
            // level >= t  ≡  !(level < t)
            RangeOp::Gte => !less(level, &term.value),
            RangeOp::Lt => less(level, &term.value),
            // level <= t  ≡  !(t < level)
            RangeOp::Lte => !less(&term.value, level),
        };
    }

    match value {
        Value::String(s) => match op {
            RangeOp::Gt => s.as_str() > term.value.as_str(),
            RangeOp::Gte => s.as_str() >= term.value.as_str(),
            RangeOp::Lt => s.as_str() < term.value.as_str(),
            RangeOp::Lte => s.as_str() <= term.value.as_str(),
        },
        Value::Number(n) => match (term.as_number(), n.as_f64()) {
            (Some(t), Some(v)) => match op {
                RangeOp::Gt => v > t,
                RangeOp::Gte => v >= t,
                RangeOp::Lt => v < t,
                RangeOp::Lte => v <= t,
            },
            // E.g. `foo > bar` against {"foo": 42}.
            _ => false,
        },
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => false,
    }
}

impl RpnStep {
    pub(crate) fn exec(&self, stack: &mut Vec<bool>, rec: &Value, ctx: &EvalContext) {
        match self {
            RpnStep::Exists { field } => {
                stack.push(lookup_value(rec, &split_path(field)).is_some());
            }
            RpnStep::Terms { field, terms } => {
                stack.push(terms_match_field(terms, rec, field));
            }
            RpnStep::MatchAllTerms { field, terms } => {
                let matched = match lookup_value(rec, &split_path(field)) {
                    Some(Value::Array(items)) => terms
                        .iter()
                        .all(|t| items.iter().any(|item| term_matches_value(t, item))),
                    _ => false,
                };
                stack.push(matched);
            }
            RpnStep::DefaultFieldsTerms { terms } => {
                let matched = ctx
                    .default_fields
                    .iter()
                    .any(|field| terms_match_field(terms, rec, field));
                stack.push(matched);
            }
            RpnStep::Range { op, field, term } => {
                stack.push(range_matches(*op, field, term, rec, ctx));
            }
            RpnStep::And => {
                let (a, b) = (pop(stack), pop(stack));
                stack.push(a && b);
            }
            RpnStep::Or => {
                let (a, b) = (pop(stack), pop(stack));
                stack.push(a || b);
            }
            RpnStep::Not => {
                let a = pop(stack);
                stack.push(!a);
            }
        }
    }
}
