use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::rewrite::SessionState;

/// One failed step of a close sequence that did not stop the commit.
#[derive(Debug)]
pub struct StepFailure {
    pub op: &'static str,
    pub source: std::io::Error,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.op, self.source)
    }
}

fn join_failures(failures: &[StepFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn earlier_suffix(earlier: &[StepFailure]) -> String {
    if earlier.is_empty() {
        String::new()
    } else {
        format!(" (earlier step failures: {})", join_failures(earlier))
    }
}

fn abort_suffix(abort_error: &Option<Box<Error>>) -> String {
    match abort_error {
        Some(err) => format!(" (discarding the rewrite also failed: {err})"),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open {path} for rewriting: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create temporary file next to {path}: {source}")]
    TempCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error during {op} ({path}): {source}")]
    IoPath {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "failed to commit rewrite of {path}; replacement left at {temp_path}: {source}{}",
        earlier_suffix(.earlier)
    )]
    CommitFailed {
        path: PathBuf,
        temp_path: PathBuf,
        #[source]
        source: std::io::Error,
        earlier: Vec<StepFailure>,
    },

    #[error("rewrite of {path} was committed, but {}", join_failures(.failures))]
    CloseIncomplete {
        path: PathBuf,
        failures: Vec<StepFailure>,
    },

    #[error("failed to abort rewrite of {path} during {op}: {source}")]
    AbortFailed {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rewrite of {path} is already closed (state: {state})")]
    AlreadyClosed { path: PathBuf, state: SessionState },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("input is too large ({size_bytes} bytes; max {max_bytes} bytes)")]
    InputTooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("transformation of {path} failed: {source}{}", abort_suffix(.abort_error))]
    Transform {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        abort_error: Option<Box<Error>>,
    },
}

impl Error {
    pub const CODE_OPEN_FAILED: &'static str = "open_failed";
    pub const CODE_TEMP_CREATE_FAILED: &'static str = "temp_create_failed";
    pub const CODE_IO: &'static str = "io";
    pub const CODE_COMMIT_FAILED: &'static str = "commit_failed";
    pub const CODE_ABORT_FAILED: &'static str = "abort_failed";
    pub const CODE_ALREADY_CLOSED: &'static str = "already_closed";
    pub const CODE_INVALID_PATH: &'static str = "invalid_path";
    pub const CODE_INVALID_OPTIONS: &'static str = "invalid_options";
    pub const CODE_INPUT_TOO_LARGE: &'static str = "input_too_large";
    pub const CODE_TRANSFORM: &'static str = "transform";

    pub fn code(&self) -> &'static str {
        match self {
            Error::OpenFailed { .. } => Self::CODE_OPEN_FAILED,
            Error::TempCreateFailed { .. } => Self::CODE_TEMP_CREATE_FAILED,
            // A committed close with failed side steps is still an I/O failure to the caller.
            Error::IoPath { .. } | Error::CloseIncomplete { .. } => Self::CODE_IO,
            Error::CommitFailed { .. } => Self::CODE_COMMIT_FAILED,
            Error::AbortFailed { .. } => Self::CODE_ABORT_FAILED,
            Error::AlreadyClosed { .. } => Self::CODE_ALREADY_CLOSED,
            Error::InvalidPath(_) => Self::CODE_INVALID_PATH,
            Error::InvalidOptions(_) => Self::CODE_INVALID_OPTIONS,
            Error::InputTooLarge { .. } => Self::CODE_INPUT_TOO_LARGE,
            Error::Transform { .. } => Self::CODE_TRANSFORM,
        }
    }

    pub(crate) fn io_path(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::IoPath {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
