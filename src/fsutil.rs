//! Filesystem helpers for moving dependency trees between build and cache

use crate::error::{NodepackError, NodepackResult};
use std::fs;
use std::io;
use std::path::Path;

/// Recursively copy a directory, preserving symlinks as symlinks.
///
/// `node_modules/.bin` is made of relative symlinks that must survive the
/// round trip through the cache.
pub fn copy_dir_recursive(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;

    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let dest = to.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir_recursive(&entry.path(), &dest)?;
        } else if file_type.is_symlink() {
            copy_symlink(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), dest)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    let target = fs::read_link(from)?;
    std::os::unix::fs::symlink(target, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to).map(|_| ())
}

/// Remove a file, symlink or directory tree; missing paths are fine
pub fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Move every entry of `from` into `to`, copying when rename crosses devices
pub fn move_dir_contents(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;

    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        remove_path(&dest)?;

        if fs::rename(entry.path(), &dest).is_err() {
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                copy_dir_recursive(&entry.path(), &dest)?;
            } else if file_type.is_symlink() {
                copy_symlink(&entry.path(), &dest)?;
            } else {
                fs::copy(entry.path(), &dest)?;
            }
            remove_path(&entry.path())?;
        }
    }

    Ok(())
}

/// Mark every file in `dir` executable (0755)
#[cfg(unix)]
pub fn make_executable(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        // Follows symlinks, so bin/npm marks its target
        if path.is_file() {
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn make_executable(_dir: &Path) -> io::Result<()> {
    Ok(())
}

/// Run blocking filesystem work off the async runtime and wait for it
pub async fn blocking<T, F>(context: impl Into<String>, f: F) -> NodepackResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> io::Result<T> + Send + 'static,
{
    let context = context.into();
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(|e| NodepackError::io(context, e)),
        Err(e) => Err(NodepackError::Internal(format!("{}: {}", context, e))),
    }
}
