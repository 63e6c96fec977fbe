// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Projecting coverage records down to a component list.
//!
//! A component list names a component and lists every test and source file that contributed to
//! its coverage, ignoring line data:
//!
//! ```text
//! CN:<component name>
//! TN:<test name>
//! ...
//! SF:<source file>
//! ...
//! end_of_record
//! ```

use crate::record::CoverageRecord;
use std::{collections::BTreeSet, fmt, io};

/// The tests and files that make up one component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentList {
    name: String,
    tests: BTreeSet<String>,
    files: BTreeSet<String>,
}

impl ComponentList {
    /// Creates an empty list for a component.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: BTreeSet::new(),
            files: BTreeSet::new(),
        }
    }

    /// Projects a record onto a component list.
    pub fn generate(record: &CoverageRecord, name: impl Into<String>) -> Self {
        let mut list = Self::new(name);
        list.extend_from(record);
        list
    }

    /// Adds the tests and files of another record.
    ///
    /// Files are listed whether or not they have instrumented lines. The unnamed test is not
    /// listed.
    pub fn extend_from(&mut self, record: &CoverageRecord) {
        self.tests
            .extend(record.test_names().map(str::to_owned));
        self.files
            .extend(record.file_paths().into_iter().map(str::to_owned));
    }

    /// Returns the component name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sorted test names.
    pub fn tests(&self) -> &BTreeSet<String> {
        &self.tests
    }

    /// Returns the sorted file paths.
    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    /// Writes the list to the given writer.
    pub fn write_to(&self, mut writer: impl io::Write) -> io::Result<()> {
        write!(writer, "{self}")?;
        writer.flush()
    }
}

impl fmt::Display for ComponentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CN:{}", self.name)?;
        for test in &self.tests {
            writeln!(f, "TN:{test}")?;
        }
        for file in &self.files {
            writeln!(f, "SF:{file}")?;
        }
        writeln!(f, "end_of_record")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcov;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn generate_projects_tests_and_files() {
        let first = lcov::parse(indoc! {"
            TN:z_test
            SF:b/B.java
            DA:1,1
            end_of_record
            TN:a_test
            SF:a/A.java
            end_of_record
        "});
        let second = lcov::parse(indoc! {"
            SF:c/C.java
            DA:4,0
            end_of_record
            TN:a_test
            SF:b/B.java
            DA:2,0
            end_of_record
        "});

        let mut list = ComponentList::generate(&first, "tools.base");
        list.extend_from(&second);

        let expected = indoc! {"
            CN:tools.base
            TN:a_test
            TN:z_test
            SF:a/A.java
            SF:b/B.java
            SF:c/C.java
            end_of_record
        "};
        assert_eq!(list.to_string(), expected);
    }

    #[test]
    fn empty_record() {
        let list = ComponentList::generate(&CoverageRecord::new(), "empty");
        assert_eq!(list.to_string(), "CN:empty\nend_of_record\n");
    }
}
