//! KQL filtering of log records.
//!
//! This module compiles a subset of the Kibana Query Language into a filter
//! that can be matched against parsed JSON log records.
//!
//! # Syntax
//!
//! ```text
//! foo:bar                  field "foo" equals "bar"
//! foo:bar baz              field "foo" equals "bar" or "baz"
//! foo:*                    field "foo" exists
//! foo:ba*                  wildcard match
//! tags:(a and b)           array field "tags" contains both "a" and "b"
//! status >= 500            range query
//! timeout                  bare terms match the default fields (message)
//! a and (b or not c)       boolean composition
//! ```
//!
//! Field names may be dotted (`log.level`, `http.response.status_code`) and
//! resolve against both nested and flattened record shapes.
//!
//! # Usage
//!
//! ```no_run
//! use ecsview::kql;
//! use ecsview::levels::log_level_less;
//!
//! let filter = kql::compile("log.level >= warn", Some(log_level_less)).unwrap();
//! let rec = serde_json::json!({"log.level": "error", "message": "boom"});
//! assert!(filter.matches(&rec));
//! ```

pub mod error;
pub mod lex;
mod parse;
pub mod rpn;
pub mod term;

pub use error::CompileError;
pub use rpn::{RangeOp, RpnStep};
pub use term::Term;

use rpn::EvalContext;
use serde_json::Value;

/// Comparator for the `log.level` range-query special case: returns true
/// iff the first level orders strictly below the second.
pub type LogLevelLessFn = fn(&str, &str) -> bool;

/// A compiled KQL filter: an RPN program plus the bits of host context the
/// queries need. Immutable once built; matching never mutates it, so a
/// filter can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct Filter {
    steps: Vec<RpnStep>,
    log_level_less: Option<LogLevelLessFn>,
    default_fields: Vec<String>,
}

/// Compiles a KQL string. The comparator, when given, is used by range
/// queries on the `log.level` field; without it those queries fall back to
/// plain string ordering.
pub fn compile(kql: &str, log_level_less: Option<LogLevelLessFn>) -> Result<Filter, CompileError> {
    Ok(Filter {
        steps: parse::parse(kql)?,
        log_level_less,
        default_fields: vec!["message".to_string()],
    })
}

impl Filter {
    /// Replaces the fields that bare terms (no `field:` prefix) match
    /// against. The default is just `message`.
    pub fn with_default_fields(mut self, fields: Vec<String>) -> Self {
        self.default_fields = fields;
        self
    }

    /// The compiled program, in evaluation order.
    pub fn steps(&self) -> &[RpnStep] {
        &self.steps
    }

    /// Returns true iff the record matches. An empty filter matches every
    /// record.
    pub fn matches(&self, rec: &Value) -> bool {
        if self.steps.is_empty() {
            return true;
        }
        let ctx = EvalContext {
            log_level_less: self.log_level_less,
            default_fields: &self.default_fields,
        };
        let mut stack = Vec::with_capacity(self.steps.len() / 2 + 1);
        for step in &self.steps {
            step.exec(&mut stack, rec, &ctx);
        }
        assert_eq!(
            stack.len(),
            1,
            "KQL evaluation must end with exactly one value on the stack"
        );
        stack[0]
    }
}
