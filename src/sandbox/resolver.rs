//! Path sandbox resolver
//!
//! Turns an untrusted, caller-supplied path string into a [`SandboxedPath`]
//! that is guaranteed to lie inside the sandbox root. A `SandboxedPath` can
//! only be obtained from [`SandboxRoot::resolve`], so file operations that
//! take one cannot bypass the check.
//!
//! Resolution is purely lexical:
//! 1. `.` segments and duplicate separators are dropped, `..` cancels the
//!    preceding segment, and a leading root or drive prefix is discarded so
//!    absolute caller paths are re-rooted under the sandbox.
//! 2. Any `..` segments left at the front are stripped.
//! 3. The remainder is joined onto the root and the result must be the root
//!    itself or nested under it by whole path components.
//!
//! Symlinks inside the sandbox are not followed during resolution.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};

/// Message carried by every sandbox escape rejection
const OUTSIDE_WORKSPACE: &str = "Path is outside the allowed workspace.";

/// The directory every file operation is confined to
#[derive(Debug, Clone)]
pub struct SandboxRoot {
    root: PathBuf,
}

impl SandboxRoot {
    /// Wrap an absolute directory path, normalizing `.` and `..` away
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(Error::Config(format!(
                "Sandbox root must be absolute: {}",
                root.display()
            )));
        }
        Ok(SandboxRoot {
            root: normalize_root(&root),
        })
    }

    /// Create the directory if it is missing, then pin its canonical path
    pub async fn prepare(dir: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(dir).await? {
            tokio::fs::create_dir_all(dir).await?;
            info!("Base directory created at: {}", dir.display());
        }

        let canonical = tokio::fs::canonicalize(dir).await?;
        if !tokio::fs::metadata(&canonical).await?.is_dir() {
            return Err(Error::Config(format!(
                "Sandbox root is not a directory: {}",
                canonical.display()
            )));
        }

        Self::new(canonical)
    }

    /// The root directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve a caller-supplied path against the root
    ///
    /// An absent path resolves to the root itself.
    pub fn resolve(&self, user_path: Option<&str>) -> Result<SandboxedPath> {
        let Some(user_path) = user_path else {
            return Ok(SandboxedPath(self.root.clone()));
        };

        let relative = sanitize(user_path);
        let candidate = if relative.as_os_str().is_empty() {
            self.root.clone()
        } else {
            self.root.join(&relative)
        };

        if !is_within(&self.root, &candidate) {
            warn!(path = %user_path, "Rejected path outside sandbox");
            return Err(Error::AccessDenied(OUTSIDE_WORKSPACE.to_string()));
        }

        Ok(SandboxedPath(candidate))
    }
}

/// An absolute path proven to lie within a [`SandboxRoot`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxedPath(PathBuf);

impl SandboxedPath {
    /// The resolved absolute path
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for SandboxedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SandboxedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Lexically normalize a caller path and strip leading parent segments
fn sanitize(user_path: &str) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    let mut rooted = false;

    for component in Path::new(user_path).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => rooted = true,
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                } else if !rooted {
                    // `/..` is `/`, so only unrooted paths keep the segment
                    parts.push(component);
                }
            }
            Component::Normal(_) => parts.push(component),
        }
    }

    let start = parts
        .iter()
        .position(|c| !matches!(c, Component::ParentDir))
        .unwrap_or(parts.len());

    parts[start..].iter().collect()
}

/// Lexically fold `.` and `..` out of an absolute path
fn normalize_root(root: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in root.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                }
            }
            _ => parts.push(component),
        }
    }

    parts.iter().collect()
}

/// Component-wise containment: `/a/b-evil` is not within `/a/b`
fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
        && !candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
}
