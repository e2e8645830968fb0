use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Knobs for a single rewrite session.
///
/// Every field has a serde default, so an empty TOML/JSON document yields
/// [`RewriteOptions::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteOptions {
    /// `sync_all` the replacement before the rename and sync the parent directory after it.
    #[serde(default = "default_true")]
    pub sync: bool,
    /// Copy the original file's permission bits onto the replacement before committing.
    #[serde(default = "default_true")]
    pub preserve_permissions: bool,
    /// Rewrite the file a symlink points at instead of refusing the symlink.
    ///
    /// The link itself is left in place; the temp file is created next to the resolved target so
    /// the commit rename stays on one filesystem.
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Number of random characters in the temporary file name.
    #[serde(default = "default_temp_rand_bytes")]
    pub temp_rand_bytes: usize,
    /// Upper bound for whole-file reads done by [`crate::rewrite_bytes`] and the CLI.
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,
    /// When the transformed bytes equal the original, discard instead of committing.
    #[serde(default)]
    pub skip_unchanged: bool,
}

const fn default_true() -> bool {
    true
}

const fn default_temp_rand_bytes() -> usize {
    6
}

const fn default_max_input_bytes() -> u64 {
    64 * 1024 * 1024
}

const MIN_TEMP_RAND_BYTES: usize = 4;
const MAX_TEMP_RAND_BYTES: usize = 32;
const MAX_INPUT_BYTES_HARD_CAP: u64 = 1024 * 1024 * 1024;

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            sync: default_true(),
            preserve_permissions: default_true(),
            follow_symlinks: false,
            temp_rand_bytes: default_temp_rand_bytes(),
            max_input_bytes: default_max_input_bytes(),
            skip_unchanged: false,
        }
    }
}

impl RewriteOptions {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_TEMP_RAND_BYTES..=MAX_TEMP_RAND_BYTES).contains(&self.temp_rand_bytes) {
            return Err(Error::InvalidOptions(format!(
                "temp_rand_bytes must be within {MIN_TEMP_RAND_BYTES}..={MAX_TEMP_RAND_BYTES} (got {})",
                self.temp_rand_bytes
            )));
        }
        if self.max_input_bytes == 0 {
            return Err(Error::InvalidOptions(
                "max_input_bytes must be > 0".to_string(),
            ));
        }
        if self.max_input_bytes > MAX_INPUT_BYTES_HARD_CAP {
            return Err(Error::InvalidOptions(format!(
                "max_input_bytes must be <= {MAX_INPUT_BYTES_HARD_CAP} (got {})",
                self.max_input_bytes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_valid() {
        RewriteOptions::default().validate().expect("valid");
    }

    #[test]
    fn empty_document_deserializes_to_defaults() {
        let options: RewriteOptions = serde_json::from_str("{}").expect("parse");
        assert_eq!(options, RewriteOptions::default());
    }

    #[test]
    fn validate_rejects_out_of_range_temp_rand_bytes() {
        for value in [0, 3, 33] {
            let options = RewriteOptions {
                temp_rand_bytes: value,
                ..RewriteOptions::default()
            };
            let err = options.validate().expect_err("should reject");
            assert_eq!(err.code(), Error::CODE_INVALID_OPTIONS, "value {value}");
        }
    }

    #[test]
    fn validate_rejects_zero_and_oversized_input_limits() {
        let zero = RewriteOptions {
            max_input_bytes: 0,
            ..RewriteOptions::default()
        };
        assert!(matches!(zero.validate(), Err(Error::InvalidOptions(_))));

        let huge = RewriteOptions {
            max_input_bytes: MAX_INPUT_BYTES_HARD_CAP + 1,
            ..RewriteOptions::default()
        };
        assert!(matches!(huge.validate(), Err(Error::InvalidOptions(_))));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<RewriteOptions>(r#"{"fsync": true}"#)
            .expect_err("unknown field");
        assert!(err.to_string().contains("fsync"), "{err}");
    }
}
