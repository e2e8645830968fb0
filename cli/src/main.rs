use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

mod command_exec;
mod error;
mod input;
#[cfg(test)]
mod tests;

use error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ErrorFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "safe-rewrite")]
#[command(about = "Rewrite files in place atomically: the original survives unless the rewrite succeeds.")]
struct Cli {
    /// Options file (`.toml` or `.json`); defaults apply when omitted.
    #[arg(long)]
    options: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ErrorFormat::Text)]
    error_format: ErrorFormat,

    /// Pretty-print the JSON report.
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Discard the rewrite when the content would not change (overrides the options file).
    #[arg(long, default_value_t = false)]
    skip_unchanged: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replace every occurrence of `--from` with `--to`.
    Replace {
        path: PathBuf,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
    /// Replace the whole file with bytes read from `--input` (`-` for stdin).
    Write {
        path: PathBuf,
        #[arg(long, default_value = "-")]
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let error_format = cli.error_format;
    if let Err(err) = command_exec::run(&cli) {
        match error_format {
            ErrorFormat::Text => eprintln!("{err}"),
            ErrorFormat::Json => match serde_json::to_string(&error::error_json(&err)) {
                Ok(text) => eprintln!("{text}"),
                Err(_) => eprintln!("{err}"),
            },
        }
        std::process::exit(1);
    }
}

fn serialize_json(value: &serde_json::Value, pretty: bool) -> Result<String, CliError> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(out)
}

fn write_stdout_line(line: &str) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}").map_err(CliError::Stdout)?;
    stdout.flush().map_err(CliError::Stdout)
}
