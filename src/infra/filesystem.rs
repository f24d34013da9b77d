//! Filesystem operations
//!
//! Handles file and directory operations.

use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Remove a file if it exists
pub fn remove_file(path: &Path) -> Result<(), FilesystemError> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(FilesystemError::RemoveFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Write content to a file, replacing any previous content
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Resolve `.` and `..` components without touching the filesystem
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Whether `relative` names a folder strictly below its base: non-empty,
/// not absolute, and never climbing out through `..`
pub fn is_strictly_inside(relative: &Path) -> bool {
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

/// Hex-encoded SHA-256 of a string
pub fn sha256_hex(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Hex-encoded SHA-256 of a file's content
pub fn sha256_file(path: &Path) -> Result<String, FilesystemError> {
    let bytes = std::fs::read(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_file_overwrites() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested/out.cmake");

        write_file(&path, "first\n").unwrap();
        write_file(&path, "second\n").unwrap();

        assert_eq!(read_file(&path).unwrap(), "second\n");
    }

    #[test]
    fn test_sha256_of_file_matches_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("f");
        write_file(&path, "abc").unwrap();

        assert_eq!(sha256_file(&path).unwrap(), sha256_hex("abc"));
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_strictly_inside_rejects_root_and_escapes() {
        for ok in ["package", "build/generators", "./dist", "a/../b"] {
            assert!(is_strictly_inside(Path::new(ok)), "{ok}");
        }
        for bad in ["", ".", "./", "..", "a/..", "../sibling", "/tmp/package"] {
            assert!(!is_strictly_inside(Path::new(bad)), "{bad}");
        }
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(normalize_lexically(Path::new("/p/./x/../y")), PathBuf::from("/p/y"));
        assert_eq!(normalize_lexically(Path::new("/p/.")), PathBuf::from("/p"));
        assert_eq!(normalize_lexically(Path::new("/p/..")), PathBuf::from("/"));
    }

    #[test]
    fn test_remove_missing_dir_is_ok() {
        let dir = tempfile::TempDir::new().unwrap();
        remove_dir_all(&dir.path().join("absent")).unwrap();
    }
}
