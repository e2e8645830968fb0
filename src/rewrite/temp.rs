use std::ffi::OsString;
use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Directory that will hold the temporary replacement for `target`.
///
/// A bare file name resolves to the current directory.
pub(super) fn parent_dir(target: &Path) -> Result<&Path> {
    if target.file_name().is_none() {
        return Err(Error::InvalidPath(format!(
            "invalid path {}: missing file name",
            target.display()
        )));
    }
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent),
        Some(_) => Ok(Path::new(".")),
        None => Err(Error::InvalidPath(format!(
            "invalid path {}: missing parent directory",
            target.display()
        ))),
    }
}

/// Hidden, collision-free name next to the target that keeps the target's extension:
/// `notes.md` becomes `.notes.md.<random>.md`.
fn temp_affixes(target: &Path) -> (OsString, OsString) {
    let mut prefix = OsString::from(".");
    if let Some(name) = target.file_name() {
        prefix.push(name);
    }
    prefix.push(".");

    let mut suffix = OsString::new();
    if let Some(ext) = target.extension() {
        suffix.push(".");
        suffix.push(ext);
    }
    (prefix, suffix)
}

pub(super) fn create_temp_file(
    dir: &Path,
    target: &Path,
    rand_bytes: usize,
) -> io::Result<NamedTempFile> {
    let (prefix, suffix) = temp_affixes(target);
    tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(&suffix)
        .rand_bytes(rand_bytes)
        .tempfile_in(dir)
}
