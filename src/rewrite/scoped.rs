use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::options::RewriteOptions;

use super::RewriteSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteReport {
    pub path: PathBuf,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub changed: bool,
}

/// Run `transform` against a fresh session on `path` and commit only if it succeeds.
///
/// An `Err` from `transform` discards the rewrite and surfaces as [`Error::Transform`]; a panic
/// unwinds through the session's destructor, which also discards. If `transform` closes or aborts
/// the session itself, the final commit is a no-op.
pub fn rewrite_file<T, F>(path: impl AsRef<Path>, options: RewriteOptions, transform: F) -> Result<T>
where
    F: FnOnce(&mut RewriteSession) -> io::Result<T>,
{
    let mut session = RewriteSession::open_with_options(path, options)?;
    match transform(&mut session) {
        Ok(value) => {
            session.close()?;
            Ok(value)
        }
        Err(source) => Err(transform_failed(session, source)),
    }
}

/// Whole-buffer variant of [`rewrite_file`]: the original bytes (bounded by
/// `options.max_input_bytes`) go in, the replacement bytes come out.
///
/// With `options.skip_unchanged`, an identical replacement is discarded rather than committed.
pub fn rewrite_bytes<F>(
    path: impl AsRef<Path>,
    options: RewriteOptions,
    transform: F,
) -> Result<RewriteReport>
where
    F: FnOnce(&[u8]) -> io::Result<Vec<u8>>,
{
    let max_bytes = options.max_input_bytes;
    let skip_unchanged = options.skip_unchanged;
    let mut session = RewriteSession::open_with_options(path, options)?;

    let transformed = read_to_end_limited(&mut session, max_bytes).and_then(|original| {
        let replacement = transform(&original)?;
        Ok((original, replacement))
    });
    let (original, replacement) = match transformed {
        Ok(pair) => pair,
        Err(source) => return Err(transform_failed(session, source)),
    };

    let changed = original != replacement;
    let mut report = RewriteReport {
        path: session.target_path().to_path_buf(),
        bytes_read: len_u64(&original),
        bytes_written: 0,
        changed,
    };
    if !changed && skip_unchanged {
        session.abort()?;
        return Ok(report);
    }

    if let Err(source) = session.write_all(&replacement) {
        return Err(transform_failed(session, source));
    }
    session.close()?;
    report.bytes_written = len_u64(&replacement);
    Ok(report)
}

fn transform_failed(mut session: RewriteSession, source: io::Error) -> Error {
    let abort_error = session.abort().err().map(Box::new);
    Error::Transform {
        path: session.target_path().to_path_buf(),
        source,
        abort_error,
    }
}

fn read_to_end_limited(session: &mut RewriteSession, max_bytes: u64) -> io::Result<Vec<u8>> {
    let too_large = |size_bytes| io::Error::other(Error::InputTooLarge { size_bytes, max_bytes });

    let size_on_disk = session.original_len()?;
    if size_on_disk > max_bytes {
        return Err(too_large(size_on_disk));
    }

    let mut bytes = Vec::<u8>::new();
    Read::by_ref(&mut *session)
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut bytes)?;
    let size_read = len_u64(&bytes);
    if size_read > max_bytes {
        // The original grew after the size check.
        return Err(too_large(session.original_len()?.max(size_read)));
    }
    Ok(bytes)
}

fn len_u64(bytes: &[u8]) -> u64 {
    u64::try_from(bytes.len()).unwrap_or(u64::MAX)
}
