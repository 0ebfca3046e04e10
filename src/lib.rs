pub mod cli;
pub mod config;
pub mod format;
pub mod kql;
pub mod levels;
pub mod lookup;
pub mod painter;
pub mod reader;
pub mod render;

pub use cli::{Cli, ColorMode, OutputFormat, cli_parse};
pub use kql::{CompileError, Filter, compile};
pub use render::{DEFAULT_MAX_LINE_LEN, RenderOptions, Renderer};

use clap::ValueEnum;
use std::error::Error;
use std::fs::File;
use std::io::{self, ErrorKind};

fn value_enum_from_config<T: ValueEnum>(key: &str, value: Option<&str>) -> Option<T> {
    let value = value?;
    match T::from_str(value, true) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            eprintln!("Warning: ignoring config value {key} = \"{value}\"");
            None
        }
    }
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = cli_parse();
    let file_config = if cli.no_config {
        config::FileConfig::default()
    } else {
        config::load_config()?
    };

    let format = cli
        .format
        .or_else(|| value_enum_from_config("format", file_config.format.as_deref()))
        .unwrap_or(OutputFormat::Default);
    let color = cli
        .color
        .or_else(|| value_enum_from_config("color", file_config.color.as_deref()))
        .unwrap_or(ColorMode::Auto);
    painter::configure_colors(color);

    if let Some(level) = &cli.level
        && !levels::is_known_level(level)
    {
        eprintln!(
            "Warning: unknown log level '{}'. Known levels are: {:?}",
            level,
            levels::KNOWN_LEVELS
        );
    }

    let renderer = Renderer::new(RenderOptions {
        format,
        color,
        level: cli.level,
        kql: cli.kql,
        max_line_len: cli
            .max_line_len
            .or(file_config.max_line_len)
            .unwrap_or(DEFAULT_MAX_LINE_LEN),
        strict: cli.strict,
        lenient: cli.lenient || file_config.lenient.unwrap_or(false),
        include_fields: cli.include_fields,
        exclude_fields: cli.exclude_fields,
    })?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = if cli.files.is_empty() {
        renderer.render_stream(io::stdin().lock(), &mut out)
    } else {
        cli.files.iter().try_for_each(|path| {
            let file = File::open(path).map_err(|err| {
                io::Error::new(err.kind(), format!("cannot open '{}': {err}", path.display()))
            })?;
            renderer.render_stream(file, &mut out)
        })
    };

    match result {
        // Output piped into a pager or `head` that stopped reading.
        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
        other => Ok(other?),
    }
}
