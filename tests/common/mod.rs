#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub fn create(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

pub fn read_all(path: &Path) -> String {
    fs::read_to_string(path).expect("read back")
}

/// File names in `dir`, sorted, so leftovers from a rewrite show up in assertions.
pub fn entry_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read_dir")
        .map(|entry| {
            entry
                .expect("entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

pub fn replace_is_with_was(data: &[u8]) -> Vec<u8> {
    String::from_utf8_lossy(data)
        .replace("is", "was")
        .into_bytes()
}
