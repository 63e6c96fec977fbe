// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The coverage record model shared by every covtool operation.
//!
//! A [`CoverageRecord`] is a nested mapping of test → file → line → covered. The test dimension
//! is optional: data that isn't attributed to a test (for example a tracefile with no `TN:`
//! lines, or the output of a flatten) lives under the `None` test.
//!
//! Records are assembled through a [`CoverageRecordBuilder`] and are read-only afterwards. The
//! filter and merge operations elsewhere in this crate consume a record and produce a new one.

use std::collections::{BTreeMap, BTreeSet};

/// Line coverage for a single source file.
///
/// Maps each instrumented line number to whether it was executed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileCoverage {
    lines: BTreeMap<u32, bool>,
}

impl FileCoverage {
    /// Creates an empty file record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of instrumented lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if no lines are instrumented.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the covered state of a line, or `None` if the line isn't instrumented.
    pub fn get(&self, line: u32) -> Option<bool> {
        self.lines.get(&line).copied()
    }

    /// Iterates over `(line, covered)` pairs in ascending line order.
    pub fn lines(&self) -> impl Iterator<Item = (u32, bool)> + '_ {
        self.lines.iter().map(|(&line, &covered)| (line, covered))
    }

    /// Returns the number of covered lines.
    pub fn covered_count(&self) -> usize {
        self.lines.values().filter(|covered| **covered).count()
    }

    pub(crate) fn set_line(&mut self, line: u32, covered: bool) {
        self.lines.insert(line, covered);
    }

    pub(crate) fn merge_line(&mut self, line: u32, covered: bool) {
        *self.lines.entry(line).or_insert(false) |= covered;
    }

    pub(crate) fn merge_from(&mut self, other: &FileCoverage) {
        for (line, covered) in other.lines() {
            self.merge_line(line, covered);
        }
    }

    /// Removes every line in `start..=end`, returning how many were removed.
    pub(crate) fn remove_range(&mut self, start: u32, end: u32) -> usize {
        let before = self.lines.len();
        self.lines.retain(|line, _| !(start..=end).contains(line));
        before - self.lines.len()
    }
}

/// Coverage for every file observed by one test.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestCoverage {
    files: BTreeMap<String, FileCoverage>,
}

impl TestCoverage {
    /// Returns the number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if this test has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the record for a file.
    pub fn file(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(path)
    }

    /// Iterates over files in lexicographic path order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &FileCoverage)> + '_ {
        self.files.iter().map(|(path, file)| (path.as_str(), file))
    }

    pub(crate) fn file_mut(&mut self, path: &str) -> &mut FileCoverage {
        self.files.entry(path.to_owned()).or_default()
    }

    pub(crate) fn files_mut(&mut self) -> &mut BTreeMap<String, FileCoverage> {
        &mut self.files
    }

    pub(crate) fn merge_from(&mut self, other: &TestCoverage) {
        for (path, file) in other.files() {
            self.file_mut(path).merge_from(file);
        }
    }
}

/// Coverage data keyed by test, then file, then line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageRecord {
    tests: BTreeMap<Option<String>, TestCoverage>,
}

impl CoverageRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a builder for a new record.
    pub fn builder() -> CoverageRecordBuilder {
        CoverageRecordBuilder::new()
    }

    /// Returns true if the record has no tests at all.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Iterates over tests. The unnamed test, if present, comes first; named tests follow in
    /// lexicographic order.
    pub fn tests(&self) -> impl Iterator<Item = (Option<&str>, &TestCoverage)> + '_ {
        self.tests
            .iter()
            .map(|(name, test)| (name.as_deref(), test))
    }

    /// Returns the coverage for a test, where `None` is the unnamed test.
    pub fn test(&self, name: Option<&str>) -> Option<&TestCoverage> {
        self.tests.get(&name.map(str::to_owned))
    }

    /// Iterates over the names of named tests, in sorted order.
    pub fn test_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tests.keys().filter_map(|name| name.as_deref())
    }

    /// Returns every distinct file path seen under any test, in sorted order.
    pub fn file_paths(&self) -> BTreeSet<&str> {
        self.tests
            .values()
            .flat_map(|test| test.files.keys().map(String::as_str))
            .collect()
    }

    /// Returns the covered state of a line for a test and file.
    pub fn line(&self, test: Option<&str>, path: &str, line: u32) -> Option<bool> {
        self.test(test)?.file(path)?.get(line)
    }

    /// Returns the total number of instrumented lines across all tests and files.
    pub fn line_count(&self) -> usize {
        self.tests
            .values()
            .flat_map(|test| test.files.values())
            .map(FileCoverage::len)
            .sum()
    }

    /// Drops files with no instrumented lines, then tests with no files.
    pub fn prune_empty(mut self) -> Self {
        for test in self.tests.values_mut() {
            test.files.retain(|_, file| !file.is_empty());
        }
        self.tests.retain(|_, test| !test.is_empty());
        self
    }

    pub(crate) fn test_mut(&mut self, name: Option<String>) -> &mut TestCoverage {
        self.tests.entry(name).or_default()
    }

    pub(crate) fn tests_mut(&mut self) -> impl Iterator<Item = &mut TestCoverage> + '_ {
        self.tests.values_mut()
    }

    pub(crate) fn merge_from(&mut self, other: &CoverageRecord) {
        for (name, test) in &other.tests {
            self.test_mut(name.clone()).merge_from(test);
        }
    }
}

/// Incrementally assembles a [`CoverageRecord`].
///
/// The builder keeps a cursor (the selected test and file), mirroring the way LCOV text is laid
/// out: `TN:` selects a test, `SF:` selects a file within it, and `DA:` lines land in the selected
/// file.
#[derive(Debug, Default)]
pub struct CoverageRecordBuilder {
    record: CoverageRecord,
    current_test: Option<String>,
    current_file: Option<String>,
}

impl CoverageRecordBuilder {
    /// Creates a new builder. The unnamed test is selected and no file is selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a test, creating it if absent. Clears the file selection.
    pub fn add_test(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.record.test_mut(Some(name.clone()));
        self.current_test = Some(name);
        self.current_file = None;
        self
    }

    /// Selects a file within the selected test, creating an empty file record if absent.
    pub fn add_file(&mut self, path: impl Into<String>) -> &mut Self {
        let path = path.into();
        self.record
            .test_mut(self.current_test.clone())
            .file_mut(&path);
        self.current_file = Some(path);
        self
    }

    /// Records a line in the selected file. A line that was already recorded is overwritten.
    ///
    /// Returns false, recording nothing, if no file is selected.
    pub fn add_line(&mut self, line: u32, covered: bool) -> bool {
        match self.current_file_mut() {
            Some(file) => {
                file.set_line(line, covered);
                true
            }
            None => false,
        }
    }

    /// Records a line in the selected file, OR-ing with any earlier observation of that line.
    ///
    /// Returns false, recording nothing, if no file is selected.
    pub fn merge_line(&mut self, line: u32, covered: bool) -> bool {
        match self.current_file_mut() {
            Some(file) => {
                file.merge_line(line, covered);
                true
            }
            None => false,
        }
    }

    /// Finishes the record.
    pub fn build(self) -> CoverageRecord {
        self.record
    }

    fn current_file_mut(&mut self) -> Option<&mut FileCoverage> {
        let path = self.current_file.as_deref()?;
        Some(
            self.record
                .test_mut(self.current_test.clone())
                .file_mut(path),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_tracks_cursor() {
        let mut builder = CoverageRecord::builder();
        builder.add_file("a.java");
        assert!(builder.add_line(1, true));
        builder.add_test("t1").add_file("b.java");
        assert!(builder.add_line(2, false));
        builder.add_test("t2");
        assert!(!builder.add_line(3, true), "no file selected after a test switch");
        let record = builder.build();

        assert_eq!(record.line(None, "a.java", 1), Some(true));
        assert_eq!(record.line(Some("t1"), "b.java", 2), Some(false));
        assert_eq!(record.test_names().collect::<Vec<_>>(), vec!["t1", "t2"]);
        assert!(record.test(Some("t2")).expect("t2 exists").is_empty());
    }

    #[test]
    fn add_line_overwrites_merge_line_ors() {
        let mut builder = CoverageRecord::builder();
        builder.add_file("a.java");
        builder.add_line(1, true);
        builder.add_line(1, false);
        builder.merge_line(2, true);
        builder.merge_line(2, false);
        let record = builder.build();

        assert_eq!(record.line(None, "a.java", 1), Some(false));
        assert_eq!(record.line(None, "a.java", 2), Some(true));
    }

    #[test]
    fn reselecting_keeps_existing_data() {
        let mut builder = CoverageRecord::builder();
        builder.add_test("t").add_file("a.java");
        builder.add_line(1, true);
        builder.add_test("other").add_file("a.java");
        builder.add_test("t").add_file("a.java");
        builder.add_line(2, false);
        let record = builder.build();

        let file = record
            .test(Some("t"))
            .and_then(|test| test.file("a.java"))
            .expect("file exists");
        assert_eq!(file.lines().collect::<Vec<_>>(), vec![(1, true), (2, false)]);
    }

    #[test]
    fn prune_empty_drops_files_and_tests() {
        let mut builder = CoverageRecord::builder();
        builder.add_test("empty").add_file("nothing.java");
        builder.add_test("full").add_file("nothing.java");
        builder.add_file("something.java");
        builder.add_line(4, true);
        let record = builder.build().prune_empty();

        assert_eq!(record.test_names().collect::<Vec<_>>(), vec!["full"]);
        assert_eq!(
            record.file_paths().into_iter().collect::<Vec<_>>(),
            vec!["something.java"]
        );
        assert_eq!(record.line_count(), 1);
    }
}
