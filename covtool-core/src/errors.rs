// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by covtool-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// An error that occurred while walking a source tree to build a
/// [`SourceTreeIndex`](crate::source_index::SourceTreeIndex).
#[derive(Debug, Error)]
#[error("failed to index source tree at `{root}`")]
pub struct SourceIndexError {
    root: Utf8PathBuf,
    #[source]
    err: walkdir::Error,
}

impl SourceIndexError {
    pub(crate) fn new(root: impl Into<Utf8PathBuf>, err: walkdir::Error) -> Self {
        Self {
            root: root.into(),
            err,
        }
    }

    /// Returns the root of the source tree that was being indexed.
    pub fn root(&self) -> &Utf8PathBuf {
        &self.root
    }
}

/// An error that occurred while parsing a JaCoCo XML report.
#[derive(Debug, Error)]
pub enum JacocoParseError {
    /// The document is not well-formed XML.
    #[error("malformed XML at byte offset {position}")]
    Xml {
        /// The byte offset at which the reader failed.
        position: usize,

        /// The underlying error.
        #[source]
        err: quick_xml::Error,
    },

    /// A `<package>` or `<sourcefile>` element was missing its `name` attribute.
    #[error("<{element}> element at byte offset {position} has no `name` attribute")]
    MissingName {
        /// The element name.
        element: &'static str,

        /// The byte offset of the element.
        position: usize,
    },

    /// A `<sourcefile>` element appeared outside of a `<package>`.
    #[error("<sourcefile name=\"{name}\"> at byte offset {position} is not inside a <package>")]
    SourceFileOutsidePackage {
        /// The source file name.
        name: String,

        /// The byte offset of the element.
        position: usize,
    },
}

/// An error that occurred while deriving a test name from a tracefile path.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TestNameError {
    /// The path is too short for the configured prefix and suffix lengths.
    #[error(
        "path `{path}` is {len} bytes long, which is too short to strip a {strip_prefix_len}-byte \
         prefix and a {strip_suffix_len}-byte suffix"
    )]
    PathTooShort {
        /// The path.
        path: String,
        /// The length of the path in bytes.
        len: usize,
        /// The configured prefix length.
        strip_prefix_len: usize,
        /// The configured suffix length.
        strip_suffix_len: usize,
    },

    /// An offset falls inside a multi-byte character.
    #[error("path `{path}` cannot be split at byte offset {offset}: not a character boundary")]
    NotCharBoundary {
        /// The path.
        path: String,
        /// The offending byte offset.
        offset: usize,
    },
}
