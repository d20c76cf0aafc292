//! Path Guard — validation and resolution of client-supplied paths.
//!
//! Every path argument reaching a tool is relative to a governing root
//! (the project root, or an artifact base directory) and must resolve
//! to that root or a descendant of it. Resolution is canonical, not
//! textual: `.`/`..` segments are normalized lexically first (a `..`
//! that would climb above the root is rejected immediately), then
//! symlinks are resolved by canonicalizing the deepest existing
//! ancestor, so a link pointing outside the root cannot smuggle a path
//! past a prefix check on the raw string.
//!
//! Absolute client paths are rejected outright — accepting them would
//! let a caller substitute its own root.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::error::{ServerError, ServerResult};

/// Resolve and validate a project path under `root`.
///
/// The root itself is an acceptable result (`"."`, `""`). The target
/// does not have to exist.
///
/// # Errors
///
/// [`ServerError::OutOfBounds`] when the canonical result leaves
/// `root`; [`ServerError::Io`] when the root cannot be canonicalized.
pub fn resolve_project_path(root: &Path, input: &str) -> ServerResult<PathBuf> {
    resolve_within(root, input)
}

/// Resolve and validate a file path under `root`.
///
/// Like [`resolve_project_path`], but the result must name something
/// strictly below the root: write and edit operations need a non-root
/// target.
///
/// # Errors
///
/// [`ServerError::OutOfBounds`] when the canonical result leaves
/// `root` or is the root itself.
pub fn resolve_file_path(root: &Path, input: &str) -> ServerResult<PathBuf> {
    let canonical_root = canonicalize_root(root)?;
    let resolved = resolve_within(root, input)?;
    if resolved == canonical_root {
        return Err(out_of_bounds(root, input));
    }
    Ok(resolved)
}

/// Core resolution: normalize, join, canonicalize, verify containment.
fn resolve_within(root: &Path, input: &str) -> ServerResult<PathBuf> {
    // NUL bytes can truncate paths in C-based APIs further down.
    if input.contains('\0') {
        return Err(out_of_bounds(root, input));
    }

    // Only relative paths are accepted from clients.
    if Path::new(input).is_absolute() {
        return Err(out_of_bounds(root, input));
    }

    let relative = normalize_relative(root, input)?;

    let canonical_root = canonicalize_root(root)?;
    let joined = canonical_root.join(&relative);

    // Resolve symlinks. Targets of write operations may not exist yet,
    // so canonicalize the deepest existing ancestor and re-append the
    // rest (`relative` is already free of `.`/`..`).
    let resolved = if joined.exists() {
        joined.canonicalize().map_err(|source| ServerError::Io {
            path: joined.clone(),
            source,
        })?
    } else {
        let mut ancestor = joined.clone();
        let mut suffix: Vec<OsString> = Vec::new();
        while !ancestor.exists() {
            // A dangling symlink passes lstat but not stat; its
            // canonical form is unknowable, so refuse to resolve
            // through it.
            if ancestor.symlink_metadata().is_ok() {
                return Err(out_of_bounds(root, input));
            }
            match (ancestor.file_name(), ancestor.parent()) {
                (Some(name), Some(parent)) => {
                    suffix.push(name.to_os_string());
                    ancestor = parent.to_path_buf();
                }
                // Unreachable: the walk bottoms out at the canonical
                // root, which exists.
                _ => return Err(out_of_bounds(root, input)),
            }
        }
        let canonical = ancestor.canonicalize().map_err(|source| ServerError::Io {
            path: ancestor.clone(),
            source,
        })?;
        suffix.iter().rev().fold(canonical, |p, part| p.join(part))
    };

    // Component-wise containment: equal to the root, or below it.
    if !resolved.starts_with(&canonical_root) {
        return Err(out_of_bounds(root, input));
    }

    Ok(resolved)
}

/// Lexically normalize a relative path: drop `.`, fold `..` into the
/// preceding segment, and reject a `..` that would climb above the
/// root. Runs before any filesystem access, so traversal through
/// non-existent intermediate components is caught too.
fn normalize_relative(root: &Path, input: &str) -> ServerResult<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(input).components() {
        match component {
            Component::Normal(name) => parts.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(out_of_bounds(root, input));
                }
            }
            // Prefix/RootDir only occur in absolute-ish inputs.
            Component::Prefix(_) | Component::RootDir => {
                return Err(out_of_bounds(root, input));
            }
        }
    }
    Ok(parts.into_iter().collect())
}

fn canonicalize_root(root: &Path) -> ServerResult<PathBuf> {
    root.canonicalize().map_err(|source| ServerError::Io {
        path: root.to_path_buf(),
        source,
    })
}

fn out_of_bounds(root: &Path, input: &str) -> ServerError {
    ServerError::OutOfBounds {
        root: root.to_path_buf(),
        path: input.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> tempfile::TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    #[test]
    fn test_resolves_inside_root() {
        let dir = root();
        let canonical = dir.path().canonicalize().expect("canonicalize");
        // Existence is not required.
        let resolved = resolve_project_path(dir.path(), "a/b.txt").expect("resolve");
        assert_eq!(resolved, canonical.join("a/b.txt"));
    }

    #[test]
    fn test_dot_resolves_to_root_for_project_paths() {
        let dir = root();
        let canonical = dir.path().canonicalize().expect("canonicalize");
        assert_eq!(resolve_project_path(dir.path(), ".").expect("resolve"), canonical);
        assert_eq!(resolve_project_path(dir.path(), "").expect("resolve"), canonical);
    }

    #[test]
    fn test_root_target_rejected_for_file_paths() {
        let dir = root();
        assert!(matches!(
            resolve_file_path(dir.path(), "."),
            Err(ServerError::OutOfBounds { .. })
        ));
        assert!(matches!(
            resolve_file_path(dir.path(), ""),
            Err(ServerError::OutOfBounds { .. })
        ));
        // Non-root targets still pass.
        assert!(resolve_file_path(dir.path(), "bar/baz.txt").is_ok());
    }

    #[test]
    fn test_parent_traversal_rejected() {
        let dir = root();
        for input in ["..", "../etc/passwd", "a/../../etc/passwd", "foo/../../etc"] {
            assert!(
                matches!(
                    resolve_project_path(dir.path(), input),
                    Err(ServerError::OutOfBounds { .. })
                ),
                "expected OutOfBounds for {input:?}"
            );
        }
    }

    #[test]
    fn test_traversal_through_missing_components_rejected() {
        let dir = root();
        // "missing" does not exist; the escape must still be caught.
        assert!(matches!(
            resolve_project_path(dir.path(), "missing/../../etc"),
            Err(ServerError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_embedded_dotdot_that_cancels_is_allowed() {
        let dir = root();
        let canonical = dir.path().canonicalize().expect("canonicalize");
        let resolved = resolve_project_path(dir.path(), "a/../b.txt").expect("resolve");
        assert_eq!(resolved, canonical.join("b.txt"));
    }

    #[test]
    fn test_absolute_input_rejected() {
        let dir = root();
        assert!(matches!(
            resolve_project_path(dir.path(), "/etc/passwd"),
            Err(ServerError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_nul_byte_rejected() {
        let dir = root();
        assert!(matches!(
            resolve_project_path(dir.path(), "a\0b"),
            Err(ServerError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_idempotent() {
        let dir = root();
        let first = resolve_project_path(dir.path(), "x/y/z.txt").expect("resolve");
        let second = resolve_project_path(dir.path(), "x/y/z.txt").expect("resolve");
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_path_resolves_canonically() {
        let dir = root();
        std::fs::create_dir_all(dir.path().join("sub")).expect("mkdir");
        std::fs::write(dir.path().join("sub/f.txt"), "x").expect("write");
        let resolved = resolve_project_path(dir.path(), "sub/./f.txt").expect("resolve");
        assert_eq!(
            resolved,
            dir.path().canonicalize().expect("canonicalize").join("sub/f.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let outside = tempfile::tempdir().expect("tempdir");
        let dir = root();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).expect("symlink");

        assert!(matches!(
            resolve_project_path(dir.path(), "link/secret.txt"),
            Err(ServerError::OutOfBounds { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_allowed() {
        let dir = root();
        std::fs::create_dir_all(dir.path().join("real")).expect("mkdir");
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias"))
            .expect("symlink");

        let resolved = resolve_project_path(dir.path(), "alias/f.txt").expect("resolve");
        assert!(resolved.starts_with(dir.path().canonicalize().expect("canonicalize")));
    }
}
