use std::fs;
use std::path::Path;

use anyhow::Result;

use util::PathEncodingError;

use super::Error;

/// Copy the file `src` to `tgt`, following symlinks so that `tgt` is a real file.
pub fn copy(src: &Path, tgt: &Path) -> Result<()> {
    if src.is_file() {
        fs::copy(src, tgt)?;
        make_executable_like(src, tgt)?;
    } else {
        return Err(
            Error::UnknownPathType(src.to_str().ok_or(PathEncodingError)?.to_owned()).into(),
        );
    }
    Ok(())
}

/// Symlink the given `link` to `tgt`; works for unix and windows.
pub fn symlink(tgt: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    std::os::unix::fs::symlink(tgt, link)?;

    #[cfg(windows)]
    if tgt.is_dir() {
        std::os::windows::fs::symlink_dir(tgt, link)?;
    } else {
        std::os::windows::fs::symlink_file(tgt, link)?;
    }
    Ok(())
}

/// rwxr-xr-x
pub fn make_executable(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// `fs::copy` keeps permission bits on unix, but not through every filesystem.
fn make_executable_like(src: &Path, tgt: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if fs::metadata(src)?.permissions().mode() & 0o111 != 0 {
            make_executable(tgt)?;
        }
    }
    #[cfg(not(unix))]
    let _ = (src, tgt);
    Ok(())
}
