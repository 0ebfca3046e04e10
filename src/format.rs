//! Output formatters.
//!
//! Each formatter consumes the fields it renders specially (via the
//! extracting path lookup, so `log.level` disappears from the detail
//! section once it is on the title line) and then renders whatever is left.

use crate::cli::OutputFormat;
use crate::lookup::{JsonKind, extract_value, extract_value_of_kind};
use crate::painter::{Painter, Role};
use serde_json::Value;
use std::fmt::Write;

/// Per-record context handed to a formatter.
pub struct FormatContext<'a> {
    pub painter: &'a Painter,
    /// The record's `log.level`, cached during validity classification.
    pub log_level: Option<&'a str>,
    /// The raw input line, for formats that reproduce it.
    pub raw: &'a str,
    /// When non-empty, only these top-level fields appear in the detail
    /// section.
    pub include_fields: &'a [String],
}

pub trait Formatter {
    fn format_record(&self, ctx: &FormatContext<'_>, rec: &mut Value, out: &mut String);
}

pub fn formatter_for(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Default => Box::new(DefaultFormatter),
        OutputFormat::Compact => Box::new(CompactFormatter),
        OutputFormat::Ecs => Box::new(EcsFormatter),
        OutputFormat::Simple => Box::new(SimpleFormatter),
    }
}

fn extract_str(rec: &mut Value, path: &[&str]) -> Option<String> {
    match extract_value_of_kind(rec, path, JsonKind::String) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Title line pattern:
///
/// ```text
/// [@timestamp] LEVEL (log.logger/service.name on host.hostname): message
/// ```
fn format_title_line(ctx: &FormatContext<'_>, rec: &mut Value, out: &mut String) {
    let log_logger = extract_str(rec, &["log", "logger"]);
    let service_name = extract_str(rec, &["service", "name"]);
    let host_hostname = extract_str(rec, &["host", "hostname"]);
    let timestamp = extract_str(rec, &["@timestamp"]);
    let message = extract_str(rec, &["message"]);

    if let Some(ts) = &timestamp {
        let _ = write!(out, "[{ts}] ");
    }
    if let Some(level) = ctx.log_level {
        let padded = format!("{:>5}", level.to_uppercase());
        out.push_str(&ctx.painter.paint(Role::Level(level), &padded));
    }
    if log_logger.is_some() || service_name.is_some() || host_hostname.is_some() {
        out.push_str(" (");
        let mut wrote_some = false;
        if let Some(logger) = &log_logger {
            out.push_str(logger);
            wrote_some = true;
        }
        if let Some(service) = &service_name {
            if wrote_some {
                out.push('/');
            }
            out.push_str(service);
            wrote_some = true;
        }
        if let Some(hostname) = &host_hostname {
            if wrote_some {
                out.push(' ');
            }
            out.push_str("on ");
            out.push_str(hostname);
        }
        out.push(')');
    }
    if !out.is_empty() {
        out.push(':');
    }
    if let Some(msg) = &message {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&ctx.painter.paint(Role::Message, msg));
    }
}

/// Renders the fields left on the record as
///
/// ```text
///     $key: <$value as indented JSON-ish>
/// ```
///
/// In compact mode a value that roughly fits the line stays on it.
fn format_remaining_fields(
    ctx: &FormatContext<'_>,
    rec: &Value,
    out: &mut String,
    compact: bool,
) {
    let Some(obj) = rec.as_object() else {
        return;
    };
    for (key, value) in obj {
        if !ctx.include_fields.is_empty() && !ctx.include_fields.iter().any(|f| f == key) {
            continue;
        }
        out.push_str("\n    ");
        out.push_str(&ctx.painter.paint(Role::ExtraField, key));
        out.push_str(": ");
        let one_line = compact && {
            // 80 columns minus the indentation, key, and ": ".
            value.to_string().len() + key.len() + 10 < 80
        };
        format_json_value(ctx.painter, value, "    ", "    ", out, one_line);
    }
}

/// JSON-ish rendering: 4-space indentation, multi-line strings spliced in
/// raw, values painted by kind.
fn format_json_value(
    painter: &Painter,
    value: &Value,
    curr_indent: &str,
    indent: &str,
    out: &mut String,
    compact: bool,
) {
    match value {
        Value::Object(obj) => {
            out.push('{');
            for (i, (key, sub)) in obj.iter().enumerate() {
                if i != 0 {
                    out.push(',');
                    if compact {
                        out.push(' ');
                    }
                }
                if !compact {
                    out.push('\n');
                    out.push_str(curr_indent);
                    out.push_str(indent);
                }
                out.push_str(&painter.paint(Role::JsonObjectKey, &format!("\"{key}\"")));
                out.push_str(": ");
                let deeper = format!("{curr_indent}{indent}");
                format_json_value(painter, sub, &deeper, indent, out, compact);
            }
            if !compact {
                out.push('\n');
                out.push_str(curr_indent);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, sub) in items.iter().enumerate() {
                if i != 0 {
                    out.push(',');
                    if compact {
                        out.push(' ');
                    }
                }
                if !compact {
                    out.push('\n');
                    out.push_str(curr_indent);
                    out.push_str(indent);
                }
                let deeper = format!("{curr_indent}{indent}");
                format_json_value(painter, sub, &deeper, indent, out, compact);
            }
            if !compact {
                out.push('\n');
                out.push_str(curr_indent);
            }
            out.push(']');
        }
        Value::String(s) => {
            if !compact && s.contains('\n') {
                // Multi-line strings (commonly error.stack_trace) are
                // spliced in raw, indented one level deeper.
                let mut spliced = String::new();
                spliced.push('\n');
                for (i, part) in s.split('\n').enumerate() {
                    if i != 0 {
                        spliced.push('\n');
                    }
                    spliced.push_str(curr_indent);
                    spliced.push_str(indent);
                    spliced.push_str(part);
                }
                out.push_str(&painter.paint(Role::JsonString, &spliced));
            } else {
                out.push_str(&painter.paint(Role::JsonString, &json_string(value)));
            }
        }
        Value::Number(_) => out.push_str(&painter.paint(Role::JsonNumber, &json_string(value))),
        Value::Bool(_) => out.push_str(&painter.paint(Role::JsonBool, &json_string(value))),
        Value::Null => out.push_str(&painter.paint(Role::JsonNull, &json_string(value))),
    }
}

fn json_string(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"<failed to serialize value>\"".to_string())
}

struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn format_record(&self, ctx: &FormatContext<'_>, rec: &mut Value, out: &mut String) {
        extract_value(rec, &["ecs", "version"]);
        extract_value(rec, &["log", "level"]);
        format_title_line(ctx, rec, out);
        format_remaining_fields(ctx, rec, out, false);
    }
}

struct CompactFormatter;

impl Formatter for CompactFormatter {
    fn format_record(&self, ctx: &FormatContext<'_>, rec: &mut Value, out: &mut String) {
        extract_value(rec, &["ecs", "version"]);
        extract_value(rec, &["log", "level"]);
        format_title_line(ctx, rec, out);
        format_remaining_fields(ctx, rec, out, true);
    }
}

/// Reproduces the raw original ECS JSON line.
struct EcsFormatter;

impl Formatter for EcsFormatter {
    fn format_record(&self, ctx: &FormatContext<'_>, _rec: &mut Value, out: &mut String) {
        out.push_str(ctx.raw);
    }
}

/// `LEVEL: message`, with an ellipsis when detail fields are elided.
struct SimpleFormatter;

impl Formatter for SimpleFormatter {
    fn format_record(&self, ctx: &FormatContext<'_>, rec: &mut Value, out: &mut String) {
        extract_value(rec, &["ecs", "version"]);
        extract_value(rec, &["log", "level"]);
        extract_value(rec, &["@timestamp"]);
        let message = extract_str(rec, &["message"]);

        if let Some(level) = ctx.log_level {
            let padded = format!("{:>5}", level.to_uppercase());
            out.push_str(&ctx.painter.paint(Role::Level(level), &padded));
        }
        if !out.is_empty() {
            out.push(':');
        }
        if let Some(msg) = &message {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&ctx.painter.paint(Role::Message, msg));
        }
        if rec.as_object().is_some_and(|obj| !obj.is_empty()) {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&ctx.painter.paint(Role::Ellipsis, "…"));
        }
    }
}
