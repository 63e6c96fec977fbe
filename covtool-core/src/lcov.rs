// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading and writing LCOV tracefiles.
//!
//! Only the line-coverage subset of LCOV is understood:
//!
//! ```text
//! TN:<test name>
//! SF:<source file>
//! DA:<line number>,<execution count>
//! end_of_record
//! ```
//!
//! Every other line (function and branch records, summaries, blank lines) is skipped on input and
//! never produced on output.

use crate::record::{CoverageRecord, CoverageRecordBuilder};
use std::io;
use tracing::debug;

const TEST_NAME_PREFIX: &str = "TN:";
const SOURCE_FILE_PREFIX: &str = "SF:";
const LINE_DATA_PREFIX: &str = "DA:";
const END_OF_RECORD: &str = "end_of_record";

/// Parses LCOV text into a [`CoverageRecord`].
///
/// Parsing is cumulative and never fails: `end_of_record` is not required to close a block, and
/// unknown or malformed lines are skipped. A later `DA:` for a line that was already seen in the
/// same test and file overwrites the earlier one.
pub fn parse(text: &str) -> CoverageRecord {
    let mut builder = CoverageRecordBuilder::new();

    for (line_idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix(TEST_NAME_PREFIX) {
            builder.add_test(name);
        } else if let Some(path) = line.strip_prefix(SOURCE_FILE_PREFIX) {
            builder.add_file(path);
        } else if let Some(data) = line.strip_prefix(LINE_DATA_PREFIX) {
            match parse_line_data(data) {
                Some((line_number, covered)) => {
                    if !builder.add_line(line_number, covered) {
                        debug!("line {}: DA record outside of a source file", line_idx + 1);
                    }
                }
                None => {
                    debug!("line {}: skipping malformed DA record `{line}`", line_idx + 1);
                }
            }
        }
        // end_of_record and anything else is ignored.
    }

    builder.build()
}

/// Serializes a record as LCOV text.
///
/// Tests are written in sorted order (the unnamed test first, without a `TN:` line), files in
/// lexicographic order and lines in ascending order. Every test/file block ends with
/// `end_of_record`, even if the file has no instrumented lines.
pub fn to_string(record: &CoverageRecord) -> String {
    let mut out = Vec::new();
    write_to(record, &mut out).expect("writing to a Vec never fails");
    // Only ever written from &str pieces and integers.
    String::from_utf8(out).expect("LCOV output is valid UTF-8")
}

/// Writes a record as LCOV text to the given writer. See [`to_string`] for the ordering.
pub fn write_to(record: &CoverageRecord, mut writer: impl io::Write) -> io::Result<()> {
    for (test_name, test) in record.tests() {
        for (path, file) in test.files() {
            if let Some(test_name) = test_name {
                writeln!(writer, "{TEST_NAME_PREFIX}{test_name}")?;
            }
            writeln!(writer, "{SOURCE_FILE_PREFIX}{path}")?;
            for (line, covered) in file.lines() {
                writeln!(writer, "{LINE_DATA_PREFIX}{line},{}", u8::from(covered))?;
            }
            writeln!(writer, "{END_OF_RECORD}")?;
        }
    }
    writer.flush()
}

/// Parses the part of a `DA:` line after the prefix: `<line>,<hits>[,<checksum>]`.
fn parse_line_data(data: &str) -> Option<(u32, bool)> {
    let mut fields = data.split(',');
    let line_number: u32 = fields.next()?.trim().parse().ok()?;
    if line_number == 0 {
        return None;
    }
    let covered = parse_hits(fields.next()?.trim())?;
    Some((line_number, covered))
}

/// Canonicalizes an execution count to `hits != 0`.
///
/// Counts can exceed any fixed-width integer in tracefiles produced by long-running tests, so
/// this checks the digits rather than parsing them.
fn parse_hits(hits: &str) -> Option<bool> {
    let digits = hits
        .strip_prefix('-')
        .or_else(|| hits.strip_prefix('+'))
        .unwrap_or(hits);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.bytes().any(|b| b != b'0'))
}
