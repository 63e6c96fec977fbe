// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Removing coverage-exempt source ranges from a record.
//!
//! Exempt regions are delimited by marker comments in source files. The markers are found
//! externally (typically with a grep over the source tree) and handed to covtool as lines of the
//! form:
//!
//! ```text
//! <file path>:<line number>:<marker type>:<tag>
//! ```
//!
//! A tag starting with `off` opens a region and a tag starting with `on` closes it.
//!
//! Ranges are formed by scanning *adjacent* markers in line order: a start immediately followed by
//! an end yields a range, and every other adjacent pairing is skipped. Nested or interleaved
//! markers are not resolved with a stack, so for `off@10, off@15, on@20` only lines 15-20 are
//! exempt.

use crate::record::CoverageRecord;
use std::collections::BTreeMap;
use tracing::debug;

/// Whether a marker opens or closes an exempt region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerKind {
    /// Coverage is turned off from this line.
    Start,
    /// Coverage is turned back on at this line.
    End,
}

impl MarkerKind {
    /// Classifies a raw marker tag. Returns `None` for tags that are neither `off` nor `on`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim_start();
        if tag.starts_with("off") {
            Some(Self::Start)
        } else if tag.starts_with("on") {
            Some(Self::End)
        } else {
            None
        }
    }
}

/// A single exemption marker found in a source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExemptionMarker {
    /// The file containing the marker.
    pub path: String,
    /// The line the marker is on.
    pub line: u32,
    /// Whether the marker opens or closes a region.
    pub kind: MarkerKind,
}

impl ExemptionMarker {
    /// Parses a `<path>:<line>:<marker type>:<tag>` line.
    ///
    /// The tag is everything after the third colon, so it may contain colons itself. Returns
    /// `None` for lines with fewer than four fields, a line number that isn't a positive integer,
    /// or a tag that's neither `off` nor `on`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.splitn(4, ':');
        let path = fields.next()?;
        let line_number = fields.next()?;
        let _marker_type = fields.next()?;
        let tag = fields.next()?;

        let line_number: u32 = line_number.trim().parse().ok()?;
        if path.is_empty() || line_number == 0 {
            return None;
        }
        let kind = MarkerKind::from_tag(tag)?;

        Some(Self {
            path: path.to_owned(),
            line: line_number,
            kind,
        })
    }
}

/// Parses every well-formed marker in a marker file, skipping malformed lines.
pub fn parse_markers(text: &str) -> Vec<ExemptionMarker> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let marker = ExemptionMarker::parse_line(line);
            if marker.is_none() {
                debug!("skipping malformed exemption marker `{line}`");
            }
            marker
        })
        .collect()
}

/// An inclusive range of exempt lines within one file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExemptRange {
    /// The first exempt line (the `off` marker's line).
    pub start: u32,
    /// The last exempt line (the `on` marker's line).
    pub end: u32,
}

impl ExemptRange {
    /// Returns true if the line falls within this range.
    pub fn contains(&self, line: u32) -> bool {
        (self.start..=self.end).contains(&line)
    }
}

/// Exempt ranges for every file that has any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExemptRanges {
    by_file: BTreeMap<String, Vec<ExemptRange>>,
}

impl ExemptRanges {
    /// Computes exempt ranges from markers using the adjacent-pair scan described in the module
    /// documentation.
    pub fn from_markers<'a>(markers: impl IntoIterator<Item = &'a ExemptionMarker>) -> Self {
        let mut markers_by_file: BTreeMap<&str, Vec<(u32, MarkerKind)>> = BTreeMap::new();
        for marker in markers {
            markers_by_file
                .entry(marker.path.as_str())
                .or_default()
                .push((marker.line, marker.kind));
        }

        let mut by_file = BTreeMap::new();
        for (path, mut markers) in markers_by_file {
            // A stable sort, so markers on the same line keep their input order.
            markers.sort_by_key(|(line, _)| *line);

            let ranges: Vec<_> = markers
                .windows(2)
                .filter_map(|pair| match pair {
                    [(start, MarkerKind::Start), (end, MarkerKind::End)] => Some(ExemptRange {
                        start: *start,
                        end: *end,
                    }),
                    _ => None,
                })
                .collect();

            if !ranges.is_empty() {
                by_file.insert(path.to_owned(), ranges);
            }
        }

        Self { by_file }
    }

    /// Returns true if no file has exempt ranges.
    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }

    /// Returns the exempt ranges for a file, in ascending order.
    pub fn for_file(&self, path: &str) -> &[ExemptRange] {
        self.by_file.get(path).map_or(&[], Vec::as_slice)
    }

    /// Iterates over files with exempt ranges.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ExemptRange])> + '_ {
        self.by_file
            .iter()
            .map(|(path, ranges)| (path.as_str(), ranges.as_slice()))
    }

    /// Returns true if the given line of the given file is exempt.
    pub fn is_exempt(&self, path: &str, line: u32) -> bool {
        self.for_file(path).iter().any(|range| range.contains(line))
    }

    /// Removes every exempt line from every test's record of its file.
    ///
    /// Exempt lines are deleted outright: they count as neither covered nor uncovered.
    pub fn apply(&self, mut record: CoverageRecord) -> CoverageRecord {
        let mut removed = 0;
        for test in record.tests_mut() {
            for (path, ranges) in &self.by_file {
                let Some(file) = test.files_mut().get_mut(path) else {
                    continue;
                };
                for range in ranges {
                    removed += file.remove_range(range.start, range.end);
                }
            }
        }
        debug!("removed {removed} exempt line records");
        record
    }
}

/// Removes lines covered by the given markers from a record.
pub fn drop_exempt<'a>(
    record: CoverageRecord,
    markers: impl IntoIterator<Item = &'a ExemptionMarker>,
) -> CoverageRecord {
    ExemptRanges::from_markers(markers).apply(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcov;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn marker(line: u32, kind: MarkerKind) -> ExemptionMarker {
        ExemptionMarker {
            path: "X.java".to_owned(),
            line,
            kind,
        }
    }

    fn record_with_lines(lines: std::ops::RangeInclusive<u32>) -> CoverageRecord {
        let mut builder = CoverageRecord::builder();
        for test in ["t1", "t2"] {
            builder.add_test(test).add_file("X.java");
            for line in lines.clone() {
                builder.add_line(line, true);
            }
        }
        builder.build()
    }

    fn surviving_lines(record: &CoverageRecord, test: &str) -> Vec<u32> {
        record
            .test(Some(test))
            .and_then(|t| t.file("X.java"))
            .map(|f| f.lines().map(|(line, _)| line).collect())
            .unwrap_or_default()
    }

    #[test_case("src/A.java:12:  // coverage:off", Some(MarkerKind::Start) ; "off")]
    #[test_case("src/A.java:40:  // coverage:on", Some(MarkerKind::End) ; "on")]
    #[test_case("src/A.java:40:x:off: reason: flaky", Some(MarkerKind::Start) ; "tag with colons")]
    #[test_case("src/A.java:40:x:maybe", None ; "unknown tag")]
    #[test_case("src/A.java:40:off", None ; "three fields")]
    #[test_case("src/A.java:zero:x:off", None ; "bad line number")]
    #[test_case("src/A.java:0:x:off", None ; "line zero")]
    fn parse_marker_line(input: &str, expected: Option<MarkerKind>) {
        assert_eq!(
            ExemptionMarker::parse_line(input).map(|marker| marker.kind),
            expected
        );
    }

    #[test_case("off", Some(MarkerKind::Start) ; "off")]
    #[test_case("on", Some(MarkerKind::End) ; "on")]
    #[test_case(" off", Some(MarkerKind::Start) ; "leading space")]
    #[test_case("\ton", Some(MarkerKind::End) ; "leading tab")]
    #[test_case("offline", Some(MarkerKind::Start) ; "prefix only")]
    #[test_case("once", Some(MarkerKind::End) ; "on prefix")]
    #[test_case("Off", None ; "case sensitive")]
    #[test_case("of f", None ; "split")]
    #[test_case("", None ; "empty")]
    fn marker_kind_from_tag(tag: &str, expected: Option<MarkerKind>) {
        assert_eq!(MarkerKind::from_tag(tag), expected);
    }

    #[test]
    fn parse_marker_fields() {
        let marker = ExemptionMarker::parse_line("a/B.kt:7:// cov:off:until:later").expect("valid");
        assert_eq!(
            marker,
            ExemptionMarker {
                path: "a/B.kt".to_owned(),
                line: 7,
                kind: MarkerKind::Start,
            }
        );
    }

    #[test]
    fn simple_range_removed_from_every_test() {
        let record = record_with_lines(8..=22);
        let ranges = ExemptRanges::from_markers(&[
            marker(10, MarkerKind::Start),
            marker(20, MarkerKind::End),
        ]);
        let record = ranges.apply(record);

        for test in ["t1", "t2"] {
            assert_eq!(surviving_lines(&record, test), vec![8, 9, 21, 22]);
        }
    }

    #[test]
    fn two_starts_only_exempts_last_pair() {
        // Adjacent-pair scan: (10, 15) is start/start and is skipped; (15, 20) is a range.
        let markers = [
            marker(15, MarkerKind::Start),
            marker(20, MarkerKind::End),
            marker(10, MarkerKind::Start),
        ];
        let ranges = ExemptRanges::from_markers(&markers);
        assert_eq!(ranges.for_file("X.java"), &[ExemptRange { start: 15, end: 20 }]);

        let record = ranges.apply(record_with_lines(9..=21));
        assert_eq!(
            surviving_lines(&record, "t1"),
            vec![9, 10, 11, 12, 13, 14, 21]
        );
    }

    #[test]
    fn nested_blocks_are_not_resolved() {
        // off@1 off@5 on@10 on@20: only (5, 10) is an adjacent start/end pair, so lines 1-4
        // and 11-20 stay in the record.
        let markers = [
            marker(1, MarkerKind::Start),
            marker(5, MarkerKind::Start),
            marker(10, MarkerKind::End),
            marker(20, MarkerKind::End),
        ];
        let ranges = ExemptRanges::from_markers(&markers);
        assert_eq!(ranges.for_file("X.java"), &[ExemptRange { start: 5, end: 10 }]);
    }

    #[test]
    fn multiple_ranges_and_unpaired_markers() {
        let markers = [
            marker(3, MarkerKind::End),
            marker(5, MarkerKind::Start),
            marker(6, MarkerKind::End),
            marker(30, MarkerKind::Start),
            marker(31, MarkerKind::End),
            marker(40, MarkerKind::Start),
        ];
        let ranges = ExemptRanges::from_markers(&markers);
        assert_eq!(
            ranges.for_file("X.java"),
            &[
                ExemptRange { start: 5, end: 6 },
                ExemptRange { start: 30, end: 31 },
            ]
        );
        assert!(ranges.is_exempt("X.java", 30));
        assert!(!ranges.is_exempt("X.java", 40));
        assert!(!ranges.is_exempt("Y.java", 5));
    }

    #[test]
    fn markers_only_affect_their_file() {
        let input = indoc! {"
            TN:t
            SF:X.java
            DA:1,1
            DA:2,0
            SF:Y.java
            DA:1,1
            DA:2,0
        "};
        let markers = parse_markers(indoc! {"
            X.java:1:// cov:off
            garbage line
            X.java:2:// cov:on

        "});
        assert_eq!(markers.len(), 2);

        let record = drop_exempt(lcov::parse(input), &markers);
        let expected = indoc! {"
            TN:t
            SF:X.java
            end_of_record
            TN:t
            SF:Y.java
            DA:1,1
            DA:2,0
            end_of_record
        "};
        assert_eq!(lcov::to_string(&record), expected);
    }
}
