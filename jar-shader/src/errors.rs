// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by jar-shader.

use camino::Utf8PathBuf;
use std::{io, string::FromUtf8Error};
use thiserror::Error;
use zip::result::ZipError;

/// An error that occurred while parsing a rules file.
#[derive(Debug, Error)]
#[error("line {line_number}: invalid rule `{line}`")]
pub struct RuleParseError {
    line_number: usize,
    line: String,
    #[source]
    kind: RuleParseErrorKind,
}

impl RuleParseError {
    pub(crate) fn new(line_number: usize, line: impl Into<String>, kind: RuleParseErrorKind) -> Self {
        Self {
            line_number,
            line: line.into(),
            kind,
        }
    }

    /// Returns the 1-based line number of the offending rule.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Returns the offending line.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &RuleParseErrorKind {
        &self.kind
    }
}

/// The kind of a [`RuleParseError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuleParseErrorKind {
    /// A `zap` rule was found. Removing classes is not supported.
    #[error("`zap` rules are not supported")]
    UnsupportedZap,

    /// A rule had the wrong number of whitespace-separated tokens.
    #[error("`{kind}` rules take {expected} tokens, found {found}")]
    WrongTokenCount {
        /// The rule kind.
        kind: &'static str,
        /// The expected number of tokens, including the kind.
        expected: usize,
        /// The number of tokens found.
        found: usize,
    },

    /// A backreference in a replacement couldn't be parsed, or was `@0`.
    #[error("invalid backreference `{token}` (backreferences are numbered from @1)")]
    InvalidBackreference {
        /// The backreference as written.
        token: String,
    },

    /// A backreference refers to a capture group that the pattern doesn't have.
    #[error("backreference @{index} is out of range: the pattern has {group_count} `**` groups")]
    BackreferenceOutOfRange {
        /// The 1-based backreference.
        index: usize,
        /// The number of capture groups in the pattern.
        group_count: usize,
    },

    /// The pattern couldn't be compiled to a regex.
    #[error("pattern `{pattern}` could not be compiled")]
    InvalidPattern {
        /// The pattern as written.
        pattern: String,
        /// The underlying error.
        #[source]
        err: regex::Error,
    },
}

/// An error that occurred while rewriting an archive.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShadeArchiveError {
    /// The input archive couldn't be opened.
    #[error("error opening input archive `{path}`")]
    OpenInput {
        /// The input path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The input isn't a readable zip archive.
    #[error("error reading input archive")]
    ReadArchive(#[source] ZipError),

    /// An entry couldn't be read from the input archive.
    #[error("error reading entry {index} of input archive")]
    ReadEntry {
        /// The index of the entry.
        index: usize,
        /// The underlying error.
        #[source]
        source: ZipError,
    },

    /// The contents of an entry couldn't be read.
    #[error("error reading contents of `{name}`")]
    ReadEntryContents {
        /// The entry name.
        name: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A service registration file isn't valid UTF-8.
    #[error("service registration `{name}` is not valid UTF-8")]
    ServiceNotUtf8 {
        /// The entry name.
        name: String,
        /// The underlying error.
        #[source]
        source: FromUtf8Error,
    },

    /// A shaded registration name is also the name of another entry in the output.
    #[error("service registration `{original}` would be renamed to `{shaded}`, which already exists")]
    DuplicateServiceEntry {
        /// The registration's name in the input archive.
        original: String,
        /// The shaded name shared with another entry.
        shaded: String,
    },

    /// An entry couldn't be copied unchanged to the output archive.
    #[error("error copying `{name}` to output archive")]
    CopyEntry {
        /// The entry name.
        name: String,
        /// The underlying error.
        #[source]
        source: ZipError,
    },

    /// An entry couldn't be started in the output archive.
    #[error("error adding `{name}` to output archive")]
    StartEntry {
        /// The output entry name.
        name: String,
        /// The underlying error.
        #[source]
        source: ZipError,
    },

    /// An entry's contents couldn't be written to the output archive.
    #[error("error writing `{name}` to output archive")]
    WriteEntry {
        /// The output entry name.
        name: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The output archive couldn't be finalized.
    #[error("error finalizing output archive")]
    Finalize(#[source] ZipError),

    /// The output archive couldn't be written atomically.
    #[error("error writing output archive to `{path}`")]
    AtomicWrite {
        /// The output path.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// An error returned by [`shade`](crate::shade).
#[derive(Debug, Error)]
pub enum ShadeError {
    /// The rules couldn't be parsed. No output was written.
    #[error("error parsing shading rules")]
    Rules(#[from] RuleParseError),

    /// The archive couldn't be rewritten.
    #[error("error shading archive")]
    Archive(#[from] ShadeArchiveError),
}
