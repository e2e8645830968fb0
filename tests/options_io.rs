#[cfg(feature = "options-io")]
mod options_io {
    use safe_rewrite::options_io::{OPTIONS_FILE_MAX_BYTES, OptionsFormat, load_options, parse_options};
    use safe_rewrite::{Error, RewriteOptions};

    #[test]
    fn load_options_toml_and_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let toml_path = dir.path().join("rewrite.toml");
        let json_path = dir.path().join("rewrite.json");

        std::fs::write(
            &toml_path,
            r#"
sync = false
follow_symlinks = true
temp_rand_bytes = 10
"#,
        )
        .expect("write toml");

        let expected = RewriteOptions {
            sync: false,
            follow_symlinks: true,
            temp_rand_bytes: 10,
            ..RewriteOptions::default()
        };
        std::fs::write(
            &json_path,
            serde_json::to_string(&expected).expect("serialize"),
        )
        .expect("write json");

        assert_eq!(load_options(&toml_path).expect("toml"), expected);
        assert_eq!(load_options(&json_path).expect("json"), expected);
    }

    #[test]
    fn parse_options_validates_after_parsing() {
        let err = parse_options("temp_rand_bytes = 1", OptionsFormat::Toml).expect_err("invalid");
        assert_eq!(err.code(), Error::CODE_INVALID_OPTIONS);

        let err = parse_options("{\"sync\": 1}", OptionsFormat::Json).expect_err("bad type");
        assert!(err.to_string().contains("cannot parse Json options"), "{err}");
    }

    #[test]
    fn load_options_rejects_unknown_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rewrite.yaml");
        std::fs::write(&path, "sync: false").expect("write");

        let err = load_options(&path).expect_err("yaml");
        assert_eq!(err.code(), Error::CODE_INVALID_OPTIONS);
    }

    #[test]
    fn load_options_rejects_oversized_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rewrite.toml");
        let padding = "#".repeat(usize::try_from(OPTIONS_FILE_MAX_BYTES).expect("fits usize"));
        std::fs::write(&path, format!("{padding}\n")).expect("write");

        let err = load_options(&path).expect_err("too large");
        match err {
            Error::InputTooLarge {
                size_bytes,
                max_bytes,
            } => {
                assert_eq!(size_bytes, OPTIONS_FILE_MAX_BYTES + 1);
                assert_eq!(max_bytes, OPTIONS_FILE_MAX_BYTES);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_options_file_is_all_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rewrite.toml");
        std::fs::write(&path, "").expect("write");

        assert_eq!(load_options(&path).expect("empty"), RewriteOptions::default());
    }

    #[test]
    #[cfg(unix)]
    fn load_options_rejects_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("conf.toml");
        std::fs::create_dir(&path).expect("mkdir");

        let err = load_options(&path).expect_err("directory");
        assert_eq!(err.code(), Error::CODE_INVALID_PATH);
    }

    #[test]
    #[cfg(unix)]
    fn load_options_rejects_symlink() {
        let dir = tempfile::tempdir().expect("tempdir");
        let real = dir.path().join("real.toml");
        std::fs::write(&real, "sync = true").expect("write");
        let link = dir.path().join("link.toml");
        std::os::unix::fs::symlink(&real, &link).expect("symlink");

        let err = load_options(&link).expect_err("symlink");
        assert_eq!(err.code(), Error::CODE_INVALID_PATH);
    }
}
