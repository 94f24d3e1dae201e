//! Formatter CLI
//!
//! Usage:
//!   formatter [OPTIONS] [MESSAGE] [ARGS]...
//!
//! Options:
//!   -c, --config <FILE>        Formatter settings (TOML format)
//!   -p, --placeholder <NAME>   Automatic placeholder name
//!       --left <DELIM>         Left delimiter
//!       --right <DELIM>        Right delimiter
//!   -n, --named <KEY=VALUE>    Named argument (repeatable)
//!   -j, --json                 Parse arguments as JSON
//!   -v, --verbose              Log resolution details to stderr
//!   -h, --help                 Print help

use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;

use formatter::{Argument, FormatError, Formatter, FormatterConfig, Named, Record, Value};

#[derive(Parser)]
#[command(name = "formatter")]
#[command(about = "Render a message template with placeholder arguments")]
struct Cli {
    /// Message template (reads from stdin if not provided)
    message: Option<String>,

    /// Arguments, available as {p}, {p0}, {p1}, ...
    args: Vec<String>,

    /// Formatter settings file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Automatic placeholder name
    #[arg(short, long)]
    placeholder: Option<String>,

    /// Left delimiter
    #[arg(long)]
    left: Option<String>,

    /// Right delimiter
    #[arg(long)]
    right: Option<String>,

    /// Named argument, usable as {KEY}
    #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_named)]
    named: Vec<(String, String)>,

    /// Parse each argument as JSON; objects become records
    #[arg(short, long)]
    json: bool,

    /// Log resolution details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_named(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(io::stderr)
            .init();
    }

    // Load config
    let config = match &cli.config {
        Some(path) => match FormatterConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FormatterConfig::default(),
    };

    let mut formatter = Formatter::with_config(config);
    if let Some(placeholder) = &cli.placeholder {
        formatter.set_placeholder(placeholder.as_str());
    }
    if let Some(left) = &cli.left {
        formatter.set_left_delimiter(left.as_str());
    }
    if let Some(right) = &cli.right {
        formatter.set_right_delimiter(right.as_str());
    }

    // Read message
    let message = match &cli.message {
        Some(message) => message.clone(),
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let mut args = Vec::with_capacity(cli.args.len() + 1);
    for raw in &cli.args {
        match parse_argument(raw, cli.json) {
            Ok(arg) => args.push(arg),
            Err(e) => {
                eprintln!("Error parsing argument '{}': {}", raw, e);
                std::process::exit(1);
            }
        }
    }
    if !cli.named.is_empty() {
        let named: Named = cli.named.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        args.push(Argument::from(named));
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = print_message(&mut out, &formatter, &message, &args);

    if let Err(e) = result {
        // partial output precedes the error report
        if let Err(flush) = out.flush() {
            eprintln!("Error writing output: {}", flush);
        }
        match &e {
            FormatError::Syntax(syntax) => eprint!("{}", syntax.report(&message, "message")),
            other => eprintln!("Error: {}", other),
        }
        std::process::exit(1);
    }
}

/// Format one line into `out` and flush it
fn print_message(
    out: &mut dyn Write,
    formatter: &Formatter,
    message: &str,
    args: &[Argument],
) -> Result<(), FormatError> {
    formatter.format_writer(&mut *out, message, args)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Plain arguments are strings; with `--json` they are JSON values and
/// objects become records
fn parse_argument(raw: &str, json: bool) -> Result<Argument, serde_json::Error> {
    if !json {
        return Ok(Argument::from(raw));
    }

    let value: serde_json::Value = serde_json::from_str(raw)?;
    Ok(match Value::from(value) {
        Value::Map(fields) => Argument::from(fields.into_iter().fold(
            Record::new(),
            |record, (name, value)| record.field(name, value),
        )),
        other => Argument::from(other),
    })
}
