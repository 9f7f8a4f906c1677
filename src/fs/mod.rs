use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use util::PathEncodingError;

/// Utility fns
mod ops;

/// Defines fns for creating common paths in the validation directory
mod paths;
pub use paths::{CONDOR_SUB, TEMPLATED_CFG, VALIDATION_JSON};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Path is neither file nor dir: {0}")]
    UnknownPathType(String),
    #[error("\"{0}\" exists but is not a directory")]
    NotDirectory(String),
    #[error("Can't perform IO operation: \"{0}\" is not whitelisted")]
    NotWhitelisted(String),
}

/// All file operations in the crate should go through this struct.
///
/// All destructive operations check that the path in question is a child of
/// one of the whitelisted prefixes (the validation directory and the job
/// output root), otherwise they will not be performed.
#[derive(Debug, Default)]
pub struct Fs {
    /// The directories we are allowed to modify
    whitelist: Vec<PathBuf>,
}

impl Fs {
    /// Create a new `Fs` with nothing whitelisted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `prefix` if it doesn't exist and allow modifications below it.
    /// Returns the canonical path.
    pub fn allow(&mut self, prefix: &Path, verbose: bool) -> Result<PathBuf> {
        if !prefix.exists() {
            if verbose {
                eprintln!("Directory {:?} doesn't exist. Creating.", prefix);
            }
            fs::create_dir_all(prefix)
                .with_context(|| format!("creating directory {:?}", prefix))?;
        } else if !prefix.is_dir() {
            return Err(
                Error::NotDirectory(prefix.to_str().ok_or(PathEncodingError)?.to_owned()).into(),
            );
        }

        let canonical = prefix.canonicalize()?;
        // job paths are derived from the path as given, which may differ
        // from the canonical one when it crosses a symlink:
        self.whitelist.push(prefix.to_path_buf());
        if canonical != prefix {
            self.whitelist.push(canonical.clone());
        }
        Ok(canonical)
    }

    /// Check if path exists on disk.
    pub fn exists<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        path.exists() || path.is_symlink()
    }

    /// Create a directory (uses `std::fs::create_dir_all`, so an entire tree of dirs can be created).
    pub fn create_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::create_dir_all(path).with_context(|| format!("creating dir {:?}", path))?;
        Ok(())
    }

    /// Create a file, and return a writable `File` handle.
    pub fn create_file<T: AsRef<Path>>(&self, path: T) -> Result<fs::File> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        let f = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        Ok(f)
    }

    /// Write entire str to a file.
    pub fn write_file<T: AsRef<Path>>(&self, path: T, text: &str) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::write(path, text).with_context(|| format!("writing file {:?}", path))?;
        Ok(())
    }

    /// Write entire str to a file and make it executable.
    pub fn write_script<T: AsRef<Path>>(&self, path: T, text: &str) -> Result<()> {
        let path = path.as_ref();
        self.write_file(path, text)?;
        ops::make_executable(path).with_context(|| format!("setting permissions of {:?}", path))?;
        Ok(())
    }

    /// Recursively delete a directory.
    pub fn delete_dir<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.check_whitelist(path)?;
        fs::remove_dir_all(path).with_context(|| format!("deleting dir {:?}", path))?;
        Ok(())
    }

    /// Symlink `symlink` to `tgt`, replacing whatever `symlink` pointed to before.
    pub fn symlink<T: AsRef<Path>, U: AsRef<Path>>(&self, tgt: T, symlink: U) -> Result<()> {
        let (tgt, symlink) = (tgt.as_ref(), symlink.as_ref());
        self.check_whitelist(symlink)?;
        if symlink.is_symlink() || symlink.is_file() {
            fs::remove_file(symlink)?;
        }
        ops::symlink(tgt, symlink)
            .with_context(|| format!("symlinking {:?} to {:?}", symlink, tgt))?;
        Ok(())
    }

    /// Copy the file `src` to `tgt`, overwriting it.
    pub fn copy<T: AsRef<Path>, U: AsRef<Path>>(&self, src: T, tgt: U) -> Result<()> {
        let (src, tgt) = (src.as_ref(), tgt.as_ref());
        self.check_whitelist(tgt)?;
        if tgt.is_symlink() {
            fs::remove_file(tgt)?;
        }
        ops::copy(src, tgt).with_context(|| format!("copying {:?} to {:?}", src, tgt))?;
        Ok(())
    }

    fn is_whitelisted<T: AsRef<Path>>(&self, path: T) -> bool {
        let path = path.as_ref();
        self.whitelist.iter().any(|prefix| path.starts_with(prefix))
    }

    fn check_whitelist(&self, path: &Path) -> Result<()> {
        if !self.is_whitelisted(path) {
            Err(Error::NotWhitelisted(path.to_str().ok_or(PathEncodingError)?.to_owned()).into())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_whitelist() -> Result<()> {
        let dir = tempdir()?;
        let allowed = dir.path().join("allowed");
        let mut fs = Fs::new();
        fs.allow(&allowed, false)?;
        assert!(allowed.is_dir());

        fs.write_file(allowed.join("a.txt"), "a")?;
        let err = fs.write_file(dir.path().join("b.txt"), "b").unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotWhitelisted(_))));
        assert!(!dir.path().join("b.txt").exists());
        Ok(())
    }

    #[test]
    fn test_symlink_replaces() -> Result<()> {
        let dir = tempdir()?;
        let mut fs = Fs::new();
        let root = fs.allow(dir.path(), false)?;
        let (a, b, link) = (root.join("a"), root.join("b"), root.join("link"));
        fs.write_file(&a, "a")?;
        fs.write_file(&b, "b")?;
        fs.symlink(&a, &link)?;
        fs.symlink(&b, &link)?;
        assert_eq!(std::fs::read_link(&link)?, b);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_write_script() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir()?;
        let mut fs = Fs::new();
        let root = fs.allow(dir.path(), false)?;
        let script = root.join("run.sh");
        fs.write_script(&script, "#!/usr/bin/env bash\n")?;
        assert_eq!(std::fs::metadata(&script)?.permissions().mode() & 0o777, 0o755);
        Ok(())
    }
}
