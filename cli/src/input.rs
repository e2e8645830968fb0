use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::Path;

#[cfg(unix)]
fn is_symlink_open_error(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(not(unix))]
fn is_symlink_open_error(_err: &io::Error) -> bool {
    false
}

#[cfg(unix)]
fn open_readonly_nofollow(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options
        .read(true)
        .custom_flags(libc::O_NOFOLLOW | libc::O_NONBLOCK);
    options.open(path)
}

#[cfg(not(unix))]
fn open_readonly_nofollow(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).open(path)
}

fn open_input_file(path: &Path) -> Result<(File, u64), safe_rewrite::Error> {
    let file = open_readonly_nofollow(path).map_err(|err| {
        if is_symlink_open_error(&err) {
            return safe_rewrite::Error::InvalidPath(format!(
                "path {} is a symlink; refusing to read replacement input from symlink paths",
                path.display()
            ));
        }
        safe_rewrite::Error::IoPath {
            op: "open_input",
            path: path.to_path_buf(),
            source: err,
        }
    })?;
    let meta = file.metadata().map_err(|err| safe_rewrite::Error::IoPath {
        op: "metadata",
        path: path.to_path_buf(),
        source: err,
    })?;
    if !meta.is_file() {
        return Err(safe_rewrite::Error::InvalidPath(format!(
            "path {} is not a regular file",
            path.display()
        )));
    }
    Ok((file, meta.len()))
}

/// Read replacement bytes from a file, or from stdin when `path` is `-`.
pub(crate) fn load_bytes_limited(
    path: &Path,
    max_bytes: u64,
) -> Result<Vec<u8>, safe_rewrite::Error> {
    let limit = max_bytes.saturating_add(1);
    let mut bytes = Vec::<u8>::new();

    if path.as_os_str() == "-" {
        let read_stdin = |err: io::Error| safe_rewrite::Error::IoPath {
            op: "read_stdin",
            path: path.to_path_buf(),
            source: err,
        };
        let mut stdin = io::stdin().lock();
        Read::by_ref(&mut stdin)
            .take(limit)
            .read_to_end(&mut bytes)
            .map_err(read_stdin)?;
        let size_read = len_u64(&bytes);
        if size_read > max_bytes {
            // Drain the rest without buffering it so the error carries the real size.
            let rest = io::copy(&mut stdin, &mut io::sink()).map_err(read_stdin)?;
            return Err(safe_rewrite::Error::InputTooLarge {
                size_bytes: size_read.saturating_add(rest),
                max_bytes,
            });
        }
        return Ok(bytes);
    }

    let (file, known_size) = open_input_file(path)?;
    if known_size > max_bytes {
        return Err(safe_rewrite::Error::InputTooLarge {
            size_bytes: known_size,
            max_bytes,
        });
    }
    file.take(limit)
        .read_to_end(&mut bytes)
        .map_err(|err| safe_rewrite::Error::IoPath {
            op: "read_input",
            path: path.to_path_buf(),
            source: err,
        })?;
    let size_read = len_u64(&bytes);
    if size_read > max_bytes {
        return Err(safe_rewrite::Error::InputTooLarge {
            size_bytes: size_read.max(known_size),
            max_bytes,
        });
    }
    Ok(bytes)
}

fn len_u64(bytes: &[u8]) -> u64 {
    u64::try_from(bytes.len()).unwrap_or(u64::MAX)
}
