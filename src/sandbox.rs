//! Path resolution beneath the sandbox root
//!
//! Every `path` argument is joined onto the root and canonicalized, so `..`
//! segments, absolute paths and symlinks pointing outside are all caught by a
//! single prefix check on the canonical form.

use std::fs::{self, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::config::SandboxConfig;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("path does not resolve: {0}")]
    NotFound(#[from] io::Error),

    #[error("path escapes the sandbox root")]
    Escapes,
}

/// A path known to lie inside the sandbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPath {
    /// Canonical absolute path
    pub absolute: PathBuf,
    /// Same path relative to the canonical root (empty for the root itself)
    pub relative: PathBuf,
}

/// Result of a recursive listing
#[derive(Debug, Default)]
pub struct Listing {
    pub paths: Vec<String>,
    /// Set when `max_list_entries` cut the listing short
    pub truncated: bool,
}

#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
    max_depth: usize,
    max_entries: usize,
}

impl Sandbox {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            root: config.root.clone(),
            max_depth: config.max_list_depth.max(1),
            max_entries: config.max_list_entries,
        }
    }

    /// Resolve a caller-supplied path beneath the root.
    ///
    /// The target must exist: canonicalization needs it, and a missing file
    /// is reported the same way as an unreadable one.
    pub fn resolve(&self, path: &str) -> Result<SandboxPath, SandboxError> {
        let root = self.root.canonicalize()?;
        let absolute = root.join(path).canonicalize()?;

        let relative = absolute
            .strip_prefix(&root)
            .map_err(|_| SandboxError::Escapes)?
            .to_path_buf();

        Ok(SandboxPath { absolute, relative })
    }

    /// Depth-first, pre-order listing of everything below `start`.
    ///
    /// The worklist holds one open `ReadDir` per pending directory; an entry
    /// that is a directory gets pushed and drained before its siblings.
    /// Symlinks are recorded but never descended into. A `start` that is not
    /// a directory yields an empty listing.
    pub fn walk(&self, start: &SandboxPath) -> Listing {
        let mut listing = Listing::default();

        let root_entries = match fs::read_dir(&start.absolute) {
            Ok(entries) => entries,
            Err(_) => return listing,
        };

        let mut stack: Vec<(ReadDir, PathBuf)> = vec![(root_entries, start.relative.clone())];

        while let Some((entries, dir)) = stack.last_mut() {
            let entry = match entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
                None => {
                    stack.pop();
                    continue;
                }
            };

            if listing.paths.len() >= self.max_entries {
                warn!(
                    "Listing of {} truncated at {} entries",
                    start.relative.display(),
                    self.max_entries
                );
                listing.truncated = true;
                break;
            }

            let relative = dir.join(entry.file_name());
            listing.paths.push(slash_path(&relative));

            // file_type() does not follow symlinks
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                if stack.len() >= self.max_depth {
                    warn!(
                        "Not descending into {}: depth limit {} reached",
                        relative.display(),
                        self.max_depth
                    );
                    continue;
                }
                match fs::read_dir(entry.path()) {
                    Ok(children) => stack.push((children, relative)),
                    Err(e) => warn!("Cannot descend into {}: {}", relative.display(), e),
                }
            }
        }

        listing
    }
}

/// Render a relative path with `/` separators regardless of platform
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
