// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Including and excluding files from a record by path prefix.
//!
//! Prefixes are compared as plain strings, not path components: the prefix `tools/base` matches
//! `tools/base/Foo.java` and also `tools/basement/Foo.java`.

use crate::record::CoverageRecord;
use tracing::debug;

/// A set of include and exclude path prefixes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathFilter {
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl PathFilter {
    /// Creates a new filter.
    ///
    /// A path is excluded if it starts with any exclude prefix. Otherwise, if there are include
    /// prefixes, it is kept only if it starts with one of them; with no include prefixes every
    /// non-excluded path is kept.
    pub fn new(
        includes: impl IntoIterator<Item = impl Into<String>>,
        excludes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            includes: includes.into_iter().map(Into::into).collect(),
            excludes: excludes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the include prefixes.
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// Returns the exclude prefixes.
    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// Returns true if the path passes the filter.
    pub fn is_match(&self, path: &str) -> bool {
        if self
            .excludes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return false;
        }
        self.includes.is_empty()
            || self
                .includes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Drops every file that doesn't pass the filter, from every test.
    pub fn apply(&self, mut record: CoverageRecord) -> CoverageRecord {
        for test in record.tests_mut() {
            test.files_mut().retain(|path, _| {
                let keep = self.is_match(path);
                if !keep {
                    debug!("filtering out `{path}`");
                }
                keep
            });
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcov;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("tools/base/Foo.java", true ; "under include")]
    #[test_case("tools/base/test/FooTest.java", false ; "under exclude")]
    #[test_case("tools/basement/X.java", true ; "literal prefix match")]
    #[test_case("tools/other/Bar.java", false ; "outside include")]
    #[test_case("tools/base", true ; "exactly the prefix")]
    fn include_and_exclude(path: &str, expected: bool) {
        let filter = PathFilter::new(["tools/base"], ["tools/base/test"]);
        assert_eq!(filter.is_match(path), expected);
    }

    #[test_case("anything/at/all.java", true ; "no excludes hit")]
    #[test_case("gen/Generated.java", false ; "excluded")]
    fn excludes_only(path: &str, expected: bool) {
        let filter = PathFilter::new(Vec::<String>::new(), ["gen/"]);
        assert_eq!(filter.excludes(), ["gen/"]);
        assert_eq!(filter.is_match(path), expected);
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = PathFilter::default();
        assert!(filter.includes().is_empty() && filter.excludes().is_empty());
        assert!(filter.is_match(""));
        assert!(filter.is_match("/abs/path.java"));
    }

    #[test]
    fn apply_filters_every_test() {
        let input = indoc! {"
            TN:a
            SF:tools/base/A.java
            DA:1,1
            SF:tools/base/test/ATest.java
            DA:1,1
            TN:b
            SF:tools/basement/B.java
            DA:2,0
            SF:vendor/C.java
            DA:3,1
        "};
        let filter = PathFilter::new(["tools/base"], ["tools/base/test"]);
        let record = filter.apply(lcov::parse(input));

        let expected = indoc! {"
            TN:a
            SF:tools/base/A.java
            DA:1,1
            end_of_record
            TN:b
            SF:tools/basement/B.java
            DA:2,0
            end_of_record
        "};
        assert_eq!(lcov::to_string(&record), expected);
    }
}
