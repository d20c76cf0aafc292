//! Artifact Resolver — the filesystem tree is the registry.
//!
//! Artifacts live under `<artifacts-root>/{context}/{type}/...`:
//!
//! - context: flexible grouping chosen by the maintainer (`default`,
//!   `fastapi`, `react`, `internal-admin`, ...)
//! - type: `templates`, `configs`, `snippets`, `assets`, `components`,
//!   `iac`, ...
//!
//! Adding a context, type, or artifact means adding a directory or
//! file — no code or configuration change. There is no manifest: the
//! listing and read operations walk the tree directly. The walk sits
//! behind the [`ArtifactStore`] trait so tests can substitute an
//! in-memory stand-in.
//!
//! Reads are guarded: the client-supplied relative path is resolved by
//! the Path Guard scoped to `<artifacts-root>/{context}/{type}`, so it
//! cannot escape into a sibling type or context, and `context`/`type`
//! themselves must each be a single plain path segment.

use std::path::{Component, Path, PathBuf};

use crate::error::{ServerError, ServerResult};
use crate::paths;

/// Maximum recursion depth for the artifact tree walker.
const MAX_WALK_DEPTH: usize = 50;

/// MIME types by extension (extend as needed).
const MIME_TYPES: &[(&str, &str)] = &[
    ("py", "text/x-python"),
    ("tsx", "text/tsx"),
    ("ts", "text/typescript"),
    ("js", "text/javascript"),
    ("jsx", "text/jsx"),
    ("json", "application/json"),
    ("toml", "text/x-toml"),
    ("yaml", "text/yaml"),
    ("yml", "text/yaml"),
    ("md", "text/markdown"),
    ("svg", "image/svg+xml"),
    ("html", "text/html"),
    ("css", "text/css"),
    ("sh", "text/x-shellscript"),
];

/// Infer a MIME type from a file extension. Unknown → `text/plain`.
pub fn mime_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return "text/plain";
    };
    let ext = ext.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map_or("text/plain", |(_, mime)| mime)
}

/// A resolved artifact: textual content plus its MIME type.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub text: String,
    pub mime: &'static str,
}

/// The artifact registry interface.
///
/// Listings are best-effort (a missing tree yields empty results);
/// reads are strict and return [`ServerError::NotFound`] or
/// [`ServerError::OutOfBounds`].
pub trait ArtifactStore: Send + Sync {
    /// Sorted `(context, type)` pairs that exist in the registry.
    fn list_kinds(&self) -> Vec<(String, String)>;

    /// Sorted relative artifact paths (forward slashes) under one
    /// `(context, type)` pair.
    fn list_paths(&self, context: &str, kind: &str) -> Vec<String>;

    /// Read one artifact. A directory resolves to its `README.md` if
    /// present, otherwise to a synthesized markdown listing of its
    /// files.
    fn read(&self, context: &str, kind: &str, path: &str) -> ServerResult<Artifact>;
}

/// Filesystem-backed [`ArtifactStore`] rooted at a fixed directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ArtifactStore for FsArtifactStore {
    fn list_kinds(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for context in visible_dirs(&self.root) {
            let context_dir = self.root.join(&context);
            for kind in visible_dirs(&context_dir) {
                out.push((context.clone(), kind));
            }
        }
        out
    }

    fn list_paths(&self, context: &str, kind: &str) -> Vec<String> {
        if !is_single_segment(context) || !is_single_segment(kind) {
            return Vec::new();
        }
        let base = self.root.join(context).join(kind);
        let mut out = Vec::new();
        collect_files(&base, &base, 0, &mut out);
        out.sort();
        out
    }

    fn read(&self, context: &str, kind: &str, path: &str) -> ServerResult<Artifact> {
        if !is_single_segment(context) || !is_single_segment(kind) {
            return Err(ServerError::OutOfBounds {
                root: self.root.clone(),
                path: format!("{context}/{kind}"),
            });
        }

        let base = self.root.join(context).join(kind);
        if !base.is_dir() {
            return Err(ServerError::NotFound(format!("artifact {context}/{kind}")));
        }

        // Guard scoped to the (context, type) directory: `path` cannot
        // reach a sibling type or context. An empty path names the
        // directory itself.
        let full = paths::resolve_project_path(&base, path)?;
        if !full.exists() {
            return Err(ServerError::NotFound(format!(
                "artifact {context}/{kind}/{path}"
            )));
        }

        if full.is_dir() {
            return read_directory(&full, context, kind, path);
        }

        Ok(Artifact {
            text: read_text_lossy(&full)?,
            mime: mime_for(&full),
        })
    }
}

/// Directory artifact: prefer its `README.md`, else synthesize a
/// markdown listing with each file's contents fenced.
fn read_directory(dir: &Path, context: &str, kind: &str, path: &str) -> ServerResult<Artifact> {
    let readme = dir.join("README.md");
    if readme.is_file() {
        return Ok(Artifact {
            text: read_text_lossy(&readme)?,
            mime: "text/markdown",
        });
    }

    let mut parts = vec![format!("# Artifact: {context}/{kind}/{path}\n")];
    let mut files = Vec::new();
    collect_files(dir, dir, 0, &mut files);
    files.sort();
    for rel in files {
        let text = read_text_lossy(&dir.join(&rel))?;
        parts.push(format!("## {rel}\n```\n{text}\n```"));
    }

    Ok(Artifact {
        text: parts.join("\n"),
        mime: "text/markdown",
    })
}

/// Read a file as UTF-8, replacing invalid sequences.
fn read_text_lossy(path: &Path) -> ServerResult<String> {
    let bytes = std::fs::read(path).map_err(|source| ServerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `true` when `s` is exactly one plain path segment (no separators,
/// not `.`/`..`, no NUL).
fn is_single_segment(s: &str) -> bool {
    if s.contains('\0') {
        return false;
    }
    let mut components = Path::new(s).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == std::ffi::OsStr::new(s)
    )
}

/// Sorted non-hidden subdirectory names of `dir`. Missing or unreadable
/// directories yield an empty list.
fn visible_dirs(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut out: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();
    out.sort();
    out
}

/// Recursively collect relative file paths (forward slashes) under
/// `base`. Dotfiles are included (templates carry `.gitignore` and the
/// like); symlinks are skipped via `entry.file_type()`, which does not
/// follow them, and the depth cap prevents loops.
pub(crate) fn collect_files(base: &Path, dir: &Path, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_WALK_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let Ok(ft) = entry.file_type() else { continue };
        if ft.is_dir() {
            collect_files(base, &path, depth + 1, out);
        } else if ft.is_file() {
            if let Ok(rel) = path.strip_prefix(base) {
                let rel = rel
                    .components()
                    .filter_map(|c| c.as_os_str().to_str())
                    .collect::<Vec<_>>()
                    .join("/");
                out.push(rel);
            }
        }
        // Symlinks are skipped.
    }
}
