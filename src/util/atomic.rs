//! Atomic file writing via tempfile + rename.
//!
//! Writes go to a [`tempfile::NamedTempFile`] in the target's directory
//! and are then persisted over the target in one rename, so a crash or
//! kill mid-write never leaves a half-written file behind.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Atomically write `content` to `path`.
///
/// The temp file is created next to `path` so the final rename stays on
/// one filesystem (cross-device renames are not atomic).
///
/// # Errors
///
/// Returns an error if the parent directory doesn't exist, writing
/// fails, or the rename fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("no parent directory for {}", path.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temp file in {}", parent.display()))?;

    tmp.write_all(content.as_bytes())
        .with_context(|| format!("failed to write to temp file for {}", path.display()))?;

    tmp.flush()
        .with_context(|| format!("failed to flush temp file for {}", path.display()))?;

    tmp.persist(path)
        .with_context(|| format!("failed to atomically replace {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_new_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("out.txt");
        atomic_write(&target, "hello").expect("write");
        assert_eq!(std::fs::read_to_string(&target).expect("read"), "hello");
    }

    #[test]
    fn test_overwrite_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("out.txt");
        std::fs::write(&target, "old").expect("seed");
        atomic_write(&target, "new").expect("write");
        assert_eq!(std::fs::read_to_string(&target).expect("read"), "new");
    }

    #[test]
    fn test_missing_parent_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("missing/out.txt");
        assert!(atomic_write(&target, "x").is_err());
    }
}
