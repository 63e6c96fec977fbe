// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregate line counts for a coverage record.

use crate::{merge::flatten, record::CoverageRecord};
use std::{collections::BTreeMap, fmt};

/// Instrumented and covered line counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineCounts {
    /// The number of instrumented lines (`LF` in LCOV terms).
    pub found: usize,
    /// The number of covered lines (`LH` in LCOV terms).
    pub hit: usize,
}

impl LineCounts {
    /// Returns the covered percentage, or `None` if no lines are instrumented.
    pub fn percentage(&self) -> Option<f64> {
        (self.found > 0).then(|| self.hit as f64 * 100.0 / self.found as f64)
    }
}

/// Per-file line counts over the flattened record, plus totals.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    files: BTreeMap<String, LineCounts>,
    total: LineCounts,
}

impl CoverageSummary {
    /// Summarizes a record. A line covered by any test counts as covered once.
    pub fn new(record: &CoverageRecord) -> Self {
        let flat = flatten(record);
        let mut files = BTreeMap::new();
        let mut total = LineCounts::default();

        for (_, test) in flat.tests() {
            for (path, file) in test.files() {
                let counts = LineCounts {
                    found: file.len(),
                    hit: file.covered_count(),
                };
                total.found += counts.found;
                total.hit += counts.hit;
                files.insert(path.to_owned(), counts);
            }
        }

        Self { files, total }
    }

    /// Iterates over files in sorted order.
    pub fn files(&self) -> impl Iterator<Item = (&str, LineCounts)> + '_ {
        self.files.iter().map(|(path, counts)| (path.as_str(), *counts))
    }

    /// Returns the totals.
    pub fn total(&self) -> LineCounts {
        self.total
    }
}

impl fmt::Display for CoverageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .files
            .keys()
            .map(|path| path.len())
            .max()
            .unwrap_or(0)
            .max("total".len());

        for (path, counts) in self.files() {
            write_row(f, path, counts, width)?;
        }
        write_row(f, "total", self.total, width)
    }
}

fn write_row(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    counts: LineCounts,
    width: usize,
) -> fmt::Result {
    write!(f, "{label:<width$}  {:>6}/{:<6}", counts.hit, counts.found)?;
    match counts.percentage() {
        Some(percentage) => writeln!(f, " {percentage:>6.1}%"),
        None => writeln!(f, "      -"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcov;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_counts_flattened_lines() {
        let record = lcov::parse(indoc! {"
            TN:t1
            SF:b.java
            DA:1,0
            DA:2,0
            TN:t2
            SF:b.java
            DA:2,1
            SF:a.java
            DA:1,1
            DA:2,1
            DA:3,0
            DA:4,0
        "});
        let summary = CoverageSummary::new(&record);

        assert_eq!(
            summary.files().collect::<Vec<_>>(),
            vec![
                ("a.java", LineCounts { found: 4, hit: 2 }),
                ("b.java", LineCounts { found: 2, hit: 1 }),
            ]
        );
        assert_eq!(summary.total(), LineCounts { found: 6, hit: 3 });
        assert_eq!(summary.total().percentage(), Some(50.0));

        let expected = indoc! {"
            a.java       2/4        50.0%
            b.java       1/2        50.0%
            total        3/6        50.0%
        "};
        assert_eq!(summary.to_string(), expected);
    }

    #[test]
    fn empty_summary() {
        let summary = CoverageSummary::new(&CoverageRecord::new());
        assert_eq!(summary.total().percentage(), None);
        assert_eq!(summary.to_string(), "total       0/0           -\n");
    }
}
