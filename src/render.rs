//! The streaming record pipeline.
//!
//! Per input line: bounded read, JSON parse, validity classification,
//! level filter, KQL filter, format dispatch. Lines that are not valid ECS
//! log records pass through unchanged, or are suppressed in strict mode.
//! Records are emitted in input order.

use crate::cli::{ColorMode, OutputFormat};
use crate::format::{FormatContext, Formatter, formatter_for};
use crate::kql::{self, CompileError, Filter};
use crate::levels::log_level_less;
use crate::lookup::{extract_value, lookup_value, split_path};
use crate::painter::Painter;
use crate::reader::{Line, LineScanner};
use serde_json::Value;
use std::io::{self, Read, Write};

pub const DEFAULT_MAX_LINE_LEN: usize = 16_384;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub color: ColorMode,
    pub level: Option<String>,
    pub kql: Option<String>,
    pub max_line_len: usize,
    pub strict: bool,
    pub lenient: bool,
    pub include_fields: Vec<String>,
    pub exclude_fields: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            format: OutputFormat::Default,
            color: ColorMode::Auto,
            level: None,
            kql: None,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            strict: false,
            lenient: false,
            include_fields: Vec::new(),
            exclude_fields: Vec::new(),
        }
    }
}

/// Validity classification of a parsed record.
///
/// The default policy requires string `@timestamp`, `ecs.version` and
/// `log.level` (nested or dotted), with `message` optional but a string if
/// present. The lenient policy accepts a record carrying any one of the
/// three. Returns the record's `log.level`, when it has one, so the level
/// filter and the title line do not look it up again.
fn classify(rec: &Value, lenient: bool) -> Option<Option<String>> {
    let timestamp_ok = matches!(lookup_value(rec, &["@timestamp"]), Some(Value::String(_)));
    let version_ok = matches!(
        lookup_value(rec, &["ecs", "version"]),
        Some(Value::String(_))
    );
    let log_level = match lookup_value(rec, &["log", "level"]) {
        Some(Value::String(level)) => Some(level.clone()),
        _ => None,
    };

    let valid = if lenient {
        timestamp_ok || version_ok || log_level.is_some()
    } else {
        let message_ok = match lookup_value(rec, &["message"]) {
            None | Some(Value::String(_)) => true,
            Some(_) => false,
        };
        timestamp_ok && version_ok && log_level.is_some() && message_ok
    };
    valid.then_some(log_level)
}

pub struct Renderer {
    formatter: Box<dyn Formatter>,
    painter: Painter,
    level_filter: Option<String>,
    kql_filter: Option<Filter>,
    max_line_len: usize,
    strict: bool,
    lenient: bool,
    include_fields: Vec<String>,
    exclude_fields: Vec<String>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("painter", &self.painter)
            .field("level_filter", &self.level_filter)
            .field("kql_filter", &self.kql_filter)
            .field("max_line_len", &self.max_line_len)
            .field("strict", &self.strict)
            .field("lenient", &self.lenient)
            .field("include_fields", &self.include_fields)
            .field("exclude_fields", &self.exclude_fields)
            .finish()
    }
}

impl Renderer {
    /// Builds a renderer, compiling the KQL filter if one is configured.
    pub fn new(opts: RenderOptions) -> Result<Self, CompileError> {
        let kql_filter = match opts.kql.as_deref() {
            Some(query) if !query.is_empty() => Some(kql::compile(query, Some(log_level_less))?),
            _ => None,
        };
        Ok(Renderer {
            formatter: formatter_for(opts.format),
            painter: Painter::new(opts.color),
            level_filter: opts.level.filter(|l| !l.is_empty()),
            kql_filter,
            max_line_len: opts.max_line_len,
            strict: opts.strict,
            lenient: opts.lenient,
            include_fields: opts.include_fields,
            exclude_fields: opts.exclude_fields,
        })
    }

    fn passthrough(&self, line: &[u8], out: &mut dyn Write) -> io::Result<()> {
        if !self.strict {
            out.write_all(line)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Renders log records from `input` to `out`.
    pub fn render_stream(&self, input: impl Read, out: &mut dyn Write) -> io::Result<()> {
        let mut scanner = LineScanner::new(input, self.max_line_len);
        loop {
            match scanner.next_line()? {
                None => break,
                Some(Line::Overlong(fragment)) => {
                    // Never buffered whole: either streamed through or
                    // dropped as it is read.
                    if self.strict {
                        scanner.drain_rest_of_line(None)?;
                    } else {
                        out.write_all(fragment)?;
                        scanner.drain_rest_of_line(Some(&mut *out))?;
                        out.write_all(b"\n")?;
                    }
                }
                Some(Line::Full(line)) => {
                    if line.is_empty() || line[0] != b'{' {
                        self.passthrough(line, out)?;
                        continue;
                    }
                    let Ok(raw) = std::str::from_utf8(line) else {
                        self.passthrough(line, out)?;
                        continue;
                    };
                    let Ok(mut rec) = serde_json::from_str::<Value>(raw) else {
                        self.passthrough(line, out)?;
                        continue;
                    };
                    let Some(log_level) = classify(&rec, self.lenient) else {
                        self.passthrough(line, out)?;
                        continue;
                    };

                    if let (Some(threshold), Some(level)) = (&self.level_filter, &log_level)
                        && log_level_less(level, threshold)
                    {
                        continue;
                    }
                    if let Some(filter) = &self.kql_filter
                        && !filter.matches(&rec)
                    {
                        continue;
                    }

                    for field in &self.exclude_fields {
                        extract_value(&mut rec, &split_path(field));
                    }

                    let mut rendered = String::new();
                    let ctx = FormatContext {
                        painter: &self.painter,
                        log_level: log_level.as_deref(),
                        raw,
                        include_fields: &self.include_fields,
                    };
                    self.formatter.format_record(&ctx, &mut rec, &mut rendered);
                    out.write_all(rendered.as_bytes())?;
                    out.write_all(b"\n")?;
                }
            }
        }
        out.flush()
    }
}
