// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! An index from bare source file names to the directories containing them.
//!
//! The [JaCoCo resolver](crate::jacoco) only knows a source file's package and bare name. The
//! index lets it find candidate directories for that name in a real source tree. The resolver
//! talks to the [`SourceIndex`] trait so it can be exercised with a synthetic index; the usual
//! implementation is a [`SourceTreeIndex`] built by walking a directory.

use crate::errors::SourceIndexError;
use camino::{Utf8Component, Utf8Path};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use walkdir::WalkDir;

/// Looks up candidate directories for a bare source file name.
pub trait SourceIndex {
    /// Returns the directories containing a file with this name, in sorted order.
    ///
    /// Directories are `/`-separated and relative to the indexed root. The root itself is the
    /// empty string.
    fn candidates(&self, file_name: &str) -> Option<&BTreeSet<String>>;
}

/// Controls which parts of a source tree are indexed.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct SourceIndexConfig {
    /// Directory names that are never descended into, wherever they occur.
    #[serde(default)]
    pub skip_dirs: BTreeSet<String>,

    /// File extensions (without the leading dot) that are indexed. If empty, every file is
    /// indexed.
    #[serde(default)]
    pub extensions: BTreeSet<String>,
}

impl SourceIndexConfig {
    fn is_indexed(&self, file_name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        file_name
            .rsplit_once('.')
            .is_some_and(|(_, ext)| self.extensions.contains(ext))
    }
}

/// A [`SourceIndex`] built from a directory tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceTreeIndex {
    by_name: BTreeMap<String, BTreeSet<String>>,
}

impl SourceTreeIndex {
    /// Walks the tree under `root` and indexes every matching file.
    ///
    /// Paths that aren't valid UTF-8 are skipped. Symbolic links are not followed.
    pub fn build(root: &Utf8Path, config: &SourceIndexConfig) -> Result<Self, SourceIndexError> {
        let mut index = Self::default();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let skip = entry.depth() > 0
                    && entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| config.skip_dirs.contains(name));
                if skip {
                    debug!("skipping directory `{}`", entry.path().display());
                }
                !skip
            });

        for entry in walker {
            let entry = entry.map_err(|err| SourceIndexError::new(root, err))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(path) = Utf8Path::from_path(entry.path()) else {
                debug!("skipping non-UTF-8 path `{}`", entry.path().display());
                continue;
            };
            let Some(file_name) = path.file_name() else {
                continue;
            };
            if !config.is_indexed(file_name) {
                continue;
            }

            let dir = path
                .parent()
                .and_then(|parent| parent.strip_prefix(root).ok())
                .map(join_components)
                .unwrap_or_default();
            index.insert(dir, file_name.to_owned());
        }

        debug!(
            "indexed {} distinct file names under `{root}`",
            index.by_name.len()
        );
        Ok(index)
    }

    /// Builds an index from `(directory, file name)` pairs.
    pub fn from_entries<D, N>(entries: impl IntoIterator<Item = (D, N)>) -> Self
    where
        D: Into<String>,
        N: Into<String>,
    {
        let mut index = Self::default();
        for (dir, name) in entries {
            index.insert(dir.into(), name.into());
        }
        index
    }

    /// Returns the number of distinct file names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true if nothing was indexed.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn insert(&mut self, dir: String, file_name: String) {
        self.by_name.entry(file_name).or_default().insert(dir);
    }
}

impl SourceIndex for SourceTreeIndex {
    fn candidates(&self, file_name: &str) -> Option<&BTreeSet<String>> {
        self.by_name.get(file_name)
    }
}

/// Joins the normal components of a relative path with `/`, regardless of platform.
fn join_components(path: &Utf8Path) -> String {
    let components: Vec<_> = path
        .components()
        .filter_map(|component| match component {
            Utf8Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect();
    components.join("/")
}
