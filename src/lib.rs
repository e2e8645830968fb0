//! `safe-rewrite` rewrites a file in place without ever exposing a half-written result.
//!
//! A [`RewriteSession`] reads the original file and writes the replacement to a temporary file in
//! the same directory. [`RewriteSession::close`] atomically renames the replacement over the
//! original; [`RewriteSession::abort`] (or dropping an open session) throws it away and leaves the
//! original untouched.
//!
//! ```no_run
//! use std::io::{Read, Write};
//!
//! let mut session = safe_rewrite::RewriteSession::open("notes.txt")?;
//! let mut text = String::new();
//! session.read_to_string(&mut text)?;
//! session.write_all(text.replace("is", "was").as_bytes())?;
//! session.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod options;
#[cfg(feature = "options-io")]
pub mod options_io;
mod platform_open;
#[path = "platform/rename.rs"]
mod platform_rename;
pub mod rewrite;

pub use error::{Error, Result, StepFailure};

pub use options::RewriteOptions;
pub use rewrite::{RewriteReport, RewriteSession, SessionState, rewrite_bytes, rewrite_file};
