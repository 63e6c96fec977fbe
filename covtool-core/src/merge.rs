// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging coverage across tracefiles and across tests.
//!
//! All merges take the union of instrumented lines and OR the covered state: a line reported as
//! executed by any input is executed in the result.
//!
//! There are three modes:
//!
//! * [`merge_tracefiles`] combines several tracefiles into one, discarding test names.
//! * [`flatten`] discards the test dimension of a single record.
//! * [`merge_named`] combines per-test tracefiles into one record, naming each input's test after
//!   its path (see [`TestNameExtractor`]).
//!
//! Each mode drops files and tests that end up with no instrumented lines.

use crate::{errors::TestNameError, record::CoverageRecord};
use serde::Deserialize;
use tracing::debug;

/// Merges two records test by test, OR-ing the covered state of every line.
///
/// This operation is commutative and associative.
pub fn merge(a: &CoverageRecord, b: &CoverageRecord) -> CoverageRecord {
    let mut merged = a.clone();
    merged.merge_from(b);
    merged
}

/// Collapses every test of a record into the unnamed test.
pub fn flatten(record: &CoverageRecord) -> CoverageRecord {
    let mut flat = CoverageRecord::new();
    let target = flat.test_mut(None);
    for (_, test) in record.tests() {
        target.merge_from(test);
    }
    flat.prune_empty()
}

/// Merges several tracefiles into a single record with no test dimension.
pub fn merge_tracefiles<'a>(
    records: impl IntoIterator<Item = &'a CoverageRecord>,
) -> CoverageRecord {
    let mut merged = CoverageRecord::new();
    for record in records {
        merged.merge_from(&flatten(record));
    }
    merged.prune_empty()
}

/// Merges per-test tracefiles, filing each input under the given test name.
///
/// Each input is flattened first. Inputs that share a name are OR-merged.
pub fn merge_named<'a>(
    records: impl IntoIterator<Item = (String, &'a CoverageRecord)>,
) -> CoverageRecord {
    let mut merged = CoverageRecord::new();
    for (name, record) in records {
        let flat = flatten(record);
        if let Some(test) = flat.test(None) {
            debug!("merging {} files under test `{name}`", test.len());
            merged.test_mut(Some(name)).merge_from(test);
        }
    }
    merged.prune_empty()
}

/// Derives a test name from a tracefile path by stripping fixed-length prefix and suffix.
///
/// Build systems write per-test coverage to paths such as
/// `bazel-testlogs/tools/base/foo_tests/coverage.dat`; with a 15-byte prefix
/// (`bazel-testlogs/`) and a 13-byte suffix (`/coverage.dat`) the test name is
/// `tools/base/foo_tests`. The offsets are not validated against the actual path contents.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TestNameExtractor {
    /// Number of bytes to strip from the start of the path.
    pub strip_prefix_len: usize,
    /// Number of bytes to strip from the end of the path.
    pub strip_suffix_len: usize,
}

impl TestNameExtractor {
    /// Creates a new extractor.
    pub fn new(strip_prefix_len: usize, strip_suffix_len: usize) -> Self {
        Self {
            strip_prefix_len,
            strip_suffix_len,
        }
    }

    /// Extracts the test name from a path.
    pub fn extract<'a>(&self, path: &'a str) -> Result<&'a str, TestNameError> {
        let len = path.len();
        let end = len
            .checked_sub(self.strip_suffix_len)
            .filter(|end| *end >= self.strip_prefix_len)
            .ok_or_else(|| TestNameError::PathTooShort {
                path: path.to_owned(),
                len,
                strip_prefix_len: self.strip_prefix_len,
                strip_suffix_len: self.strip_suffix_len,
            })?;

        for offset in [self.strip_prefix_len, end] {
            if !path.is_char_boundary(offset) {
                return Err(TestNameError::NotCharBoundary {
                    path: path.to_owned(),
                    offset,
                });
            }
        }

        Ok(&path[self.strip_prefix_len..end])
    }
}
