use std::fs;
use std::path::Path;

#[cfg(unix)]
pub(crate) fn sync_parent_directory(path: &Path) -> std::io::Result<()> {
    // A bare file name lives in the current directory.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let parent_dir = fs::File::open(parent)?;
    parent_dir.sync_all()
}

#[cfg(not(unix))]
pub(crate) fn sync_parent_directory(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Atomically replace `dest_path` with `src_path`.
///
/// Both paths must live in the same directory; the rename is only atomic within one filesystem.
/// Directory durability is handled separately by [`sync_parent_directory`].
#[cfg(windows)]
pub(crate) fn rename_replace(src_path: &Path, dest_path: &Path) -> std::io::Result<()> {
    use std::os::windows::ffi::OsStrExt;

    use windows_sys::Win32::Storage::FileSystem::{
        MOVEFILE_REPLACE_EXISTING, MOVEFILE_WRITE_THROUGH, MoveFileExW,
    };

    fn to_wide_null(p: &Path) -> Vec<u16> {
        let mut wide: Vec<u16> = p.as_os_str().encode_wide().collect();
        wide.push(0);
        wide
    }

    let src_w = to_wide_null(src_path);
    let dest_w = to_wide_null(dest_path);

    // DESIGN INVARIANT (Windows atomic replacement):
    // - A rewrite commit must never leave a window where the target is missing.
    // - Delete-then-rename creates exactly that window on Windows.
    // - `MoveFileExW(..., MOVEFILE_REPLACE_EXISTING)` replaces in one step; std alone does not
    //   expose a stronger overwrite-atomic API for this case.
    //
    // SAFETY:
    // - `src_w` and `dest_w` are owned, NUL-terminated UTF-16 buffers.
    // - Passed pointers stay valid for this synchronous call and do not escape.
    // - Win32 does not retain these pointers after return.
    let moved = unsafe {
        MoveFileExW(
            src_w.as_ptr(),
            dest_w.as_ptr(),
            MOVEFILE_REPLACE_EXISTING | MOVEFILE_WRITE_THROUGH,
        )
    };
    if moved == 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(windows))]
pub(crate) fn rename_replace(src_path: &Path, dest_path: &Path) -> std::io::Result<()> {
    fs::rename(src_path, dest_path)
}
