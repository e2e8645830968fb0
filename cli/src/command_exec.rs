use std::io::{self, Read, Write};

use safe_rewrite::{RewriteOptions, RewriteReport, RewriteSession, rewrite_bytes, rewrite_file};

use crate::error::CliError;
use crate::input::load_bytes_limited;
use crate::{Cli, Command};

pub(crate) fn run(cli: &Cli) -> Result<(), CliError> {
    let options = effective_options(cli)?;
    let report = execute_command(&cli.command, options)?;
    let out = crate::serialize_json(&serde_json::to_value(&report)?, cli.pretty)?;
    crate::write_stdout_line(&out)
}

pub(crate) fn effective_options(cli: &Cli) -> Result<RewriteOptions, CliError> {
    let mut options = match &cli.options {
        Some(path) => safe_rewrite::options_io::load_options(path)?,
        None => RewriteOptions::default(),
    };
    if cli.skip_unchanged {
        options.skip_unchanged = true;
    }
    Ok(options)
}

pub(crate) fn execute_command(
    command: &Command,
    options: RewriteOptions,
) -> Result<RewriteReport, CliError> {
    match command {
        Command::Replace { path, from, to } => {
            if from.is_empty() {
                return Err(CliError::Usage("--from must not be empty".to_string()));
            }
            let report = rewrite_bytes(path, options, |original| {
                Ok(replace_all(original, from.as_bytes(), to.as_bytes()))
            })?;
            Ok(report)
        }
        Command::Write { path, input } => {
            let replacement = load_bytes_limited(input, options.max_input_bytes)?;
            let skip_unchanged = options.skip_unchanged;
            let report = rewrite_file(path, options, |session| {
                write_replacement(session, &replacement, skip_unchanged)
            })?;
            Ok(report)
        }
    }
}

// The original is only read when it could equal the replacement, so its size is never bounded by
// `max_input_bytes`.
fn write_replacement(
    session: &mut RewriteSession,
    replacement: &[u8],
    skip_unchanged: bool,
) -> io::Result<RewriteReport> {
    let replacement_len = u64::try_from(replacement.len()).unwrap_or(u64::MAX);
    let mut report = RewriteReport {
        path: session.target_path().to_path_buf(),
        bytes_read: 0,
        bytes_written: 0,
        changed: true,
    };

    if session.original_len()? == replacement_len {
        let mut original = Vec::with_capacity(replacement.len());
        Read::by_ref(&mut *session)
            .take(replacement_len.saturating_add(1))
            .read_to_end(&mut original)?;
        report.bytes_read = u64::try_from(original.len()).unwrap_or(u64::MAX);
        report.changed = original != replacement;
    }

    if !report.changed && skip_unchanged {
        session.abort().map_err(io::Error::other)?;
        return Ok(report);
    }
    session.write_all(replacement)?;
    report.bytes_written = replacement_len;
    Ok(report)
}

/// Replace every non-overlapping occurrence of `from`, scanning left to right.
pub(crate) fn replace_all(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut rest = haystack;
    while let Some(idx) = rest.windows(from.len()).position(|window| window == from) {
        out.extend_from_slice(&rest[..idx]);
        out.extend_from_slice(to);
        rest = &rest[idx + from.len()..];
    }
    out.extend_from_slice(rest);
    out
}
