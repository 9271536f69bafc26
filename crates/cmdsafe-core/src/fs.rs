//! Filesystem helpers for the store file.

use std::fs;
use std::io;
use std::path::Path;

/// Create the parent directory of `path` if it is missing.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Create `path` as an empty file readable and writable only by the owner.
///
/// Does nothing if the file already exists. On non-unix platforms the file is
/// created with default permissions.
pub fn create_private_file(path: &Path) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    match options.open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_parent_dir_nested() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("store.db");

        ensure_parent_dir(&path).unwrap();

        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn test_ensure_parent_dir_bare_filename() {
        ensure_parent_dir(Path::new("store.db")).unwrap();
    }

    #[test]
    fn test_create_private_file_keeps_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");
        fs::File::create(&path).unwrap().write_all(b"keep").unwrap();

        create_private_file(&path).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"keep");
    }

    #[cfg(unix)]
    #[test]
    fn test_create_private_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");
        create_private_file(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
