//! Resolving request paths to files under a root directory.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use crate::path;

/// Resolves request paths to readable files confined to a root directory.
///
/// A request path is percent-decoded and cleaned of traversal segments, then
/// a small list of candidates is probed in order:
///
/// - the path itself,
/// - the path with the page-cache extension appended (`/about` -> `about.html`),
/// - an index file below it (`/blog` -> `blog/index.html`).
///
/// The first candidate that is a regular file and can be opened for reading
/// wins.
///
/// Probing touches the filesystem and blocks; the [`Static`](crate::Static)
/// service runs it on tokio's blocking pool.
///
/// # Example
///
/// ```no_run
/// let resolver = static_root::Resolver::new("/srv/public", ".html");
///
/// if let Some(found) = resolver.resolve("/blog") {
///     // e.g. "blog/index.html"
///     println!("{}", found);
/// }
/// ```
pub struct Resolver {
    root: PathBuf,
    extension: String,
    candidates: OnceLock<Candidates>,
}

impl Resolver {
    /// Create a resolver for `root`, trying `extension` (such as `".html"`)
    /// for paths that don't name a file exactly.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Resolver {
        // collecting components drops a trailing separator
        let root = root.into().components().collect::<PathBuf>();
        Resolver {
            root,
            extension: extension.into(),
            candidates: OnceLock::new(),
        }
    }

    /// The directory every resolved file lives under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self) -> &Candidates {
        self.candidates
            .get_or_init(|| Candidates::new(&self.extension))
    }

    /// Find the file a request path refers to.
    ///
    /// `path` is the raw, percent-encoded URI path. An empty path means the
    /// root itself. Returns `None` when nothing usable matches, including
    /// when the path can't be decoded.
    pub fn resolve(&self, path: &str) -> Option<ResolvedPath> {
        let relative = if path.is_empty() {
            PathBuf::new()
        } else {
            let decoded = match path::decode(path) {
                Ok(decoded) => decoded,
                Err(err) => {
                    tracing::debug!("resolve: failed to decode path={:?}: {}", path, err);
                    return None;
                }
            };
            let cleaned = path::clean(&decoded);
            tracing::trace!("resolve? root={:?}, path={}", self.root, cleaned);
            if cleaned.is_root() {
                PathBuf::new()
            } else {
                cleaned.to_relative()?
            }
        };

        let at_root = relative.as_os_str().is_empty();
        let base = if at_root {
            self.root.clone()
        } else {
            self.root.join(&relative)
        };

        let found = self
            .candidates()
            .iter()
            // "<root>.html" would be a sibling of the root
            .filter(|suffix| !at_root || suffix.is_empty() || suffix.starts_with('/'))
            .map(|suffix| {
                let mut candidate = OsString::from(base.as_os_str());
                candidate.push(suffix);
                PathBuf::from(candidate)
            })
            .find(|candidate| is_readable_file(candidate))?;

        self.matched(found)
    }

    fn matched(&self, file: PathBuf) -> Option<ResolvedPath> {
        let escaped = match file.strip_prefix(&self.root) {
            Ok(relative) => path::escape(relative),
            Err(_) => None,
        };
        match escaped {
            Some(escaped) => {
                tracing::trace!("resolve: matched {:?} as {:?}", file, escaped);
                Some(ResolvedPath { escaped, file })
            }
            None => {
                tracing::error!("resolve: match {:?} is not below root {:?}", file, self.root);
                None
            }
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("root", &self.root)
            .field("extension", &self.extension)
            .finish()
    }
}

fn is_readable_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            tracing::trace!("resolve: not a regular file: {:?}", path);
            return false;
        }
        Err(err) => {
            probe_error(path, &err);
            return false;
        }
    }

    match fs::File::open(path) {
        Ok(_) => true,
        Err(err) => {
            probe_error(path, &err);
            false
        }
    }
}

fn probe_error(path: &Path, err: &io::Error) {
    match err.kind() {
        io::ErrorKind::NotFound => {
            tracing::trace!("resolve: no file at {:?}", path);
        }
        io::ErrorKind::PermissionDenied => {
            tracing::warn!("resolve: permission denied: {:?}", path);
        }
        _ => {
            tracing::debug!("resolve: probe error (path={:?}): {}", path, err);
        }
    }
}

/// The ordered suffixes tried after a cleaned path: none, the extension, and
/// an index file with the extension.
#[derive(Debug, PartialEq, Eq)]
struct Candidates {
    suffixes: Vec<String>,
}

impl Candidates {
    fn new(extension: &str) -> Candidates {
        let mut suffixes = vec![String::new()];
        for suffix in [extension.to_owned(), format!("/index{}", extension)] {
            if Path::new(&suffix)
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                tracing::warn!("resolve: ignoring suffix with '..': {:?}", suffix);
                continue;
            }
            if !suffixes.contains(&suffix) {
                suffixes.push(suffix);
            }
        }
        Candidates { suffixes }
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        self.suffixes.iter().map(String::as_str)
    }
}

/// A file found by [`Resolver::resolve`].
///
/// Displays as the root-relative, percent-escaped path, without a leading
/// slash (`blog/index.html`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPath {
    escaped: String,
    file: PathBuf,
}

impl ResolvedPath {
    /// The escaped path relative to the root.
    pub fn as_str(&self) -> &str {
        &self.escaped
    }

    /// The file on disk.
    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.escaped)
    }
}

impl AsRef<str> for ResolvedPath {
    fn as_ref(&self) -> &str {
        &self.escaped
    }
}

impl PartialEq<str> for ResolvedPath {
    fn eq(&self, other: &str) -> bool {
        self.escaped == other
    }
}

impl PartialEq<&str> for ResolvedPath {
    fn eq(&self, other: &&str) -> bool {
        self.escaped == *other
    }
}
