use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::TempPath;

use crate::error::{Error, Result, StepFailure};
use crate::options::RewriteOptions;
use crate::platform_open;
use crate::platform_rename;

mod scoped;
mod temp;

pub use scoped::{RewriteReport, rewrite_bytes, rewrite_file};

/// Observable lifecycle state of a [`RewriteSession`].
///
/// Only `Open` holds resources. Every other state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Open,
    Committed,
    Aborted,
    Failed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Open => "open",
            SessionState::Committed => "committed",
            SessionState::Aborted => "aborted",
            SessionState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != SessionState::Open
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct OpenFiles {
    input: File,
    output: File,
    temp_path: TempPath,
    permissions: fs::Permissions,
}

#[derive(Debug)]
enum State {
    Open(OpenFiles),
    Committed,
    Aborted,
    Failed,
}

impl State {
    fn kind(&self) -> SessionState {
        match self {
            State::Open(_) => SessionState::Open,
            State::Committed => SessionState::Committed,
            State::Aborted => SessionState::Aborted,
            State::Failed => SessionState::Failed,
        }
    }
}

/// An in-flight rewrite of one file.
///
/// Reads come from the original file, writes go to a temporary file in the same directory. The
/// replacement becomes visible only through [`RewriteSession::close`]; [`RewriteSession::abort`]
/// (or dropping a session that is still open) leaves the original untouched and removes the
/// temporary file.
///
/// `close` is idempotent. `abort` is not: calling it on a session that is no longer open returns
/// [`Error::AlreadyClosed`], because it can no longer vouch for the original being untouched.
/// Reads and writes on a closed session fail with an [`io::Error`] wrapping
/// [`Error::AlreadyClosed`].
#[derive(Debug)]
pub struct RewriteSession {
    target_path: PathBuf,
    options: RewriteOptions,
    state: State,
}

impl RewriteSession {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, RewriteOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: RewriteOptions) -> Result<Self> {
        options.validate()?;

        let requested = path.as_ref();
        let target_path = if options.follow_symlinks {
            fs::canonicalize(requested).map_err(|err| Error::OpenFailed {
                path: requested.to_path_buf(),
                source: err,
            })?
        } else {
            requested.to_path_buf()
        };
        let parent = temp::parent_dir(&target_path)?;

        let input = platform_open::open_original(&target_path, options.follow_symlinks)
            .map_err(|err| {
                if !options.follow_symlinks && platform_open::is_symlink_open_error(&err) {
                    return Error::InvalidPath(format!(
                        "path {} is a symlink",
                        target_path.display()
                    ));
                }
                Error::OpenFailed {
                    path: target_path.clone(),
                    source: err,
                }
            })?;
        let meta = input
            .metadata()
            .map_err(|err| Error::io_path("metadata", &target_path, err))?;
        if !meta.is_file() {
            return Err(Error::InvalidPath(format!(
                "path {} is not a regular file",
                target_path.display()
            )));
        }

        // `input` is dropped on this error path, so a failed temp creation holds no handle.
        let (output, temp_path) =
            temp::create_temp_file(parent, &target_path, options.temp_rand_bytes)
                .map_err(|err| Error::TempCreateFailed {
                    path: target_path.clone(),
                    source: err,
                })?
                .into_parts();

        Ok(Self {
            target_path,
            options,
            state: State::Open(OpenFiles {
                input,
                output,
                temp_path,
                permissions: meta.permissions(),
            }),
        })
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Path of the pending replacement; `None` once the session is terminal.
    pub fn temp_path(&self) -> Option<&Path> {
        match &self.state {
            State::Open(files) => Some(&*files.temp_path),
            _ => None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.kind()
    }

    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Current size of the original file, taken from the handle opened at construction.
    pub fn original_len(&self) -> io::Result<u64> {
        match &self.state {
            State::Open(files) => Ok(files.input.metadata()?.len()),
            terminal => Err(io::Error::other(Error::AlreadyClosed {
                path: self.target_path.clone(),
                state: terminal.kind(),
            })),
        }
    }

    /// Commit the rewrite: the target is atomically replaced by everything written so far.
    ///
    /// Calling `close` on a terminal session is a no-op. Failures of the side steps (flush, sync,
    /// permission copy, parent directory sync) do not prevent the rename; they are reported through
    /// [`Error::CloseIncomplete`] once the target has been replaced. If the rename itself fails
    /// the target is unmodified, the replacement stays on disk under its temporary name, and
    /// [`Error::CommitFailed`] is returned.
    pub fn close(&mut self) -> Result<()> {
        let files = match std::mem::replace(&mut self.state, State::Failed) {
            State::Open(files) => files,
            terminal => {
                self.state = terminal;
                return Ok(());
            }
        };
        let OpenFiles {
            input,
            mut output,
            temp_path,
            permissions,
        } = files;

        let mut failures = Vec::<StepFailure>::new();

        drop(input);
        if self.options.preserve_permissions {
            record(
                &mut failures,
                "set_permissions",
                output.set_permissions(permissions),
            );
        }
        record(&mut failures, "flush", output.flush());
        if self.options.sync {
            record(&mut failures, "sync", output.sync_all());
        }
        drop(output);

        // Disarm delete-on-drop before the rename so a failed commit keeps the replacement.
        let temp_path = match temp_path.keep() {
            Ok(path) => path,
            Err(err) => {
                return Err(Error::CommitFailed {
                    path: self.target_path.clone(),
                    temp_path: err.path.to_path_buf(),
                    source: err.error,
                    earlier: failures,
                });
            }
        };

        if let Err(source) = platform_rename::rename_replace(&temp_path, &self.target_path) {
            return Err(Error::CommitFailed {
                path: self.target_path.clone(),
                temp_path,
                source,
                earlier: failures,
            });
        }
        self.state = State::Committed;

        if self.options.sync {
            record(
                &mut failures,
                "sync_parent",
                platform_rename::sync_parent_directory(&self.target_path),
            );
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::CloseIncomplete {
                path: self.target_path.clone(),
                failures,
            })
        }
    }

    /// Discard the rewrite: the original is left byte-for-byte unchanged and the temporary file is
    /// removed.
    ///
    /// Only valid while the session is open. A failure while discarding moves the session to
    /// [`SessionState::Failed`]; it must not be reused.
    pub fn abort(&mut self) -> Result<()> {
        let files = match std::mem::replace(&mut self.state, State::Failed) {
            State::Open(files) => files,
            terminal => {
                let state = terminal.kind();
                self.state = terminal;
                return Err(Error::AlreadyClosed {
                    path: self.target_path.clone(),
                    state,
                });
            }
        };

        discard(files, &self.target_path)?;
        self.state = State::Aborted;
        Ok(())
    }

    fn open_files(&mut self) -> io::Result<&mut OpenFiles> {
        match &mut self.state {
            State::Open(files) => Ok(files),
            terminal => Err(io::Error::other(Error::AlreadyClosed {
                path: self.target_path.clone(),
                state: terminal.kind(),
            })),
        }
    }
}

fn record(failures: &mut Vec<StepFailure>, op: &'static str, result: io::Result<()>) {
    #[cfg(test)]
    let result = result.and_then(|()| tests::injected_step_failure(op));
    if let Err(source) = result {
        failures.push(StepFailure { op, source });
    }
}

// Releasing a `File` cannot fail in std, so removing the temp file is the only step that can.
fn discard(files: OpenFiles, target_path: &Path) -> Result<()> {
    let OpenFiles {
        input,
        output,
        temp_path,
        permissions: _,
    } = files;
    drop(input);
    drop(output);
    temp_path.close().map_err(|source| Error::AbortFailed {
        op: "remove_temp",
        path: target_path.to_path_buf(),
        source,
    })
}

impl Read for RewriteSession {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.open_files()?.input.read(buf)
    }
}

impl Write for RewriteSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.open_files()?.output.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.open_files()?.output.flush()
    }
}

impl Drop for RewriteSession {
    fn drop(&mut self) {
        if let State::Open(files) = std::mem::replace(&mut self.state, State::Failed) {
            // Never commit from a destructor; a still-open session means the caller bailed out.
            let _ = discard(files, &self.target_path);
        }
    }
}
