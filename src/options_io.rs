//! Reading [`RewriteOptions`] from `.toml` / `.json` files.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::platform_open;
use crate::{Error, Result, RewriteOptions};

/// Options files larger than this are refused before parsing.
pub const OPTIONS_FILE_MAX_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsFormat {
    Toml,
    Json,
}

impl OptionsFormat {
    /// `.json` selects JSON; `.toml` or a missing extension selects TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") | None => Ok(Self::Toml),
            Some(other) => Err(Error::InvalidOptions(format!(
                "{}: options files must be .toml or .json, not .{other}",
                path.display()
            ))),
        }
    }
}

/// Parse options text and check it with [`RewriteOptions::validate`].
///
/// Missing fields take their defaults; unknown fields are an error.
pub fn parse_options(raw: &str, format: OptionsFormat) -> Result<RewriteOptions> {
    let parsed = match format {
        OptionsFormat::Toml => toml::from_str::<RewriteOptions>(raw).map_err(|err| err.to_string()),
        OptionsFormat::Json => {
            serde_json::from_str::<RewriteOptions>(raw).map_err(|err| err.to_string())
        }
    };
    let options = parsed.map_err(|message| {
        Error::InvalidOptions(format!("cannot parse {format:?} options: {message}"))
    })?;
    options.validate()?;
    Ok(options)
}

/// Load options for a rewrite from `path`.
///
/// The file is opened without following a final symlink and must be a regular file of at most
/// [`OPTIONS_FILE_MAX_BYTES`].
pub fn load_options(path: impl AsRef<Path>) -> Result<RewriteOptions> {
    read_options_file(path.as_ref(), OPTIONS_FILE_MAX_BYTES)
}

fn read_options_file(path: &Path, max_bytes: u64) -> Result<RewriteOptions> {
    let format = OptionsFormat::from_path(path)?;
    let file = open_options_file(path)?;

    let size_bytes = file
        .metadata()
        .map_err(|err| Error::io_path("metadata", path, err))?
        .len();
    if size_bytes > max_bytes {
        return Err(Error::InputTooLarge {
            size_bytes,
            max_bytes,
        });
    }

    let mut raw = String::new();
    file.take(max_bytes)
        .read_to_string(&mut raw)
        .map_err(|err| match err.kind() {
            io::ErrorKind::InvalidData => {
                Error::InvalidOptions(format!("{} is not valid utf-8", path.display()))
            }
            _ => Error::io_path("read_options", path, err),
        })?;
    parse_options(&raw, format)
}

fn open_options_file(path: &Path) -> Result<File> {
    let file = platform_open::open_readonly_nofollow(path).map_err(|err| {
        if platform_open::is_symlink_open_error(&err) {
            Error::InvalidPath(format!("options path {} is a symlink", path.display()))
        } else {
            Error::io_path("open_options", path, err)
        }
    })?;
    let is_file = file
        .metadata()
        .map_err(|err| Error::io_path("metadata", path, err))?
        .is_file();
    if !is_file {
        return Err(Error::InvalidPath(format!(
            "options path {} is not a regular file",
            path.display()
        )));
    }
    Ok(file)
}
