// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconstructing LCOV coverage from JaCoCo XML reports.
//!
//! JaCoCo reports coverage per `(package, source file name)` rather than per source path:
//!
//! ```xml
//! <report name="example">
//!   <package name="com/foo">
//!     <class name="com/foo/Bar" sourcefilename="Bar.java">...</class>
//!     <sourcefile name="Bar.java">
//!       <line nr="3" mi="0" ci="4" mb="0" cb="0"/>
//!     </sourcefile>
//!   </package>
//! </report>
//! ```
//!
//! The [`JacocoResolver`] recovers a real path for each source file by looking the bare name up
//! in a [`SourceIndex`] and keeping the candidate directories that end with the package path.
//! Entries that can't be resolved are reported as [`UnmatchedSource`]s rather than dropped.

use crate::{
    errors::JacocoParseError,
    record::{CoverageRecord, CoverageRecordBuilder},
    source_index::SourceIndex,
};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};
use tracing::{debug, warn};

/// Line coverage for one `<sourcefile>` element of a JaCoCo report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JacocoSourceFile {
    /// The package, exactly as written in the report (`com/foo` or `com.foo`).
    pub package: String,
    /// The bare source file name.
    pub name: String,
    /// Instrumented lines and whether any instruction on them was covered.
    pub lines: BTreeMap<u32, bool>,
}

impl JacocoSourceFile {
    /// Returns the package as a `/`-separated directory path.
    pub fn package_path(&self) -> String {
        self.package.replace('.', "/")
    }
}

/// The parts of a JaCoCo XML report that are used for resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JacocoReport {
    source_files: Vec<JacocoSourceFile>,
}

impl JacocoReport {
    /// Parses a JaCoCo XML report.
    ///
    /// Only `<package name>`, `<sourcefile name>` and `<line nr ci>` are consulted. A `<line>`
    /// whose `nr` is missing or not a positive integer is skipped. A `<line>` is covered unless
    /// its `ci` attribute is exactly `0`.
    pub fn parse(xml: &str) -> Result<Self, JacocoParseError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut parser = ReportParser::default();

        loop {
            let position = reader.buffer_position();
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(err) => {
                    return Err(JacocoParseError::Xml {
                        position: reader.buffer_position(),
                        err,
                    });
                }
            };

            match event {
                Event::Start(start) => parser.start_element(&start, false, position)?,
                Event::Empty(start) => parser.start_element(&start, true, position)?,
                Event::End(end) => match end.local_name().as_ref() {
                    b"package" => parser.package = None,
                    b"sourcefile" => parser.source_files.extend(parser.current.take()),
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self {
            source_files: parser.source_files,
        })
    }

    /// Returns the source files in document order.
    pub fn source_files(&self) -> &[JacocoSourceFile] {
        &self.source_files
    }
}

#[derive(Default)]
struct ReportParser {
    source_files: Vec<JacocoSourceFile>,
    package: Option<String>,
    current: Option<JacocoSourceFile>,
}

impl ReportParser {
    fn start_element(
        &mut self,
        start: &BytesStart<'_>,
        is_empty: bool,
        position: usize,
    ) -> Result<(), JacocoParseError> {
        match start.local_name().as_ref() {
            b"package" if !is_empty => {
                self.package = Some(required_name(start, "package", position)?);
            }
            b"sourcefile" => {
                let name = required_name(start, "sourcefile", position)?;
                let Some(package) = &self.package else {
                    return Err(JacocoParseError::SourceFileOutsidePackage { name, position });
                };
                let source_file = JacocoSourceFile {
                    package: package.clone(),
                    name,
                    lines: BTreeMap::new(),
                };
                if is_empty {
                    self.source_files.push(source_file);
                } else {
                    self.current = Some(source_file);
                }
            }
            b"line" => {
                if let Some(source_file) = &mut self.current
                    && let Some((nr, covered)) = parse_line(start, position)?
                {
                    *source_file.lines.entry(nr).or_insert(false) |= covered;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn attribute(
    start: &BytesStart<'_>,
    name: &str,
    position: usize,
) -> Result<Option<String>, JacocoParseError> {
    let attr = start
        .try_get_attribute(name)
        .map_err(|err| JacocoParseError::Xml {
            position,
            err: err.into(),
        })?;
    attr.map(|attr| {
        attr.unescape_value()
            .map(|value| value.into_owned())
            .map_err(|err| JacocoParseError::Xml {
                position,
                err: err.into(),
            })
    })
    .transpose()
}

fn required_name(
    start: &BytesStart<'_>,
    element: &'static str,
    position: usize,
) -> Result<String, JacocoParseError> {
    attribute(start, "name", position)?
        .ok_or(JacocoParseError::MissingName { element, position })
}

fn parse_line(
    start: &BytesStart<'_>,
    position: usize,
) -> Result<Option<(u32, bool)>, JacocoParseError> {
    let nr = attribute(start, "nr", position)?;
    let Some(nr) = nr.as_deref().and_then(|nr| nr.parse::<u32>().ok()) else {
        debug!("byte offset {position}: skipping <line> with invalid nr {nr:?}");
        return Ok(None);
    };
    if nr == 0 {
        return Ok(None);
    }
    let ci = attribute(start, "ci", position)?;
    Ok(Some((nr, ci.as_deref() != Some("0"))))
}

/// Why a source file couldn't be attributed to a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum UnmatchedReason {
    /// No file with this name exists in the source tree.
    NoCandidates,
    /// Files with this name exist, but none is in a directory ending with the package path.
    PackageMismatch,
}

impl fmt::Display for UnmatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidates => write!(f, "no-candidates"),
            Self::PackageMismatch => write!(f, "package-mismatch"),
        }
    }
}

/// A source file from a report that couldn't be resolved.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnmatchedSource {
    /// The package as a `/`-separated path.
    pub package_path: String,
    /// The bare source file name.
    pub name: String,
    /// Why resolution failed.
    pub reason: UnmatchedReason,
}

impl fmt::Display for UnmatchedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package_path.is_empty() {
            write!(f, "{}\t{}", self.name, self.reason)
        } else {
            write!(f, "{}/{}\t{}", self.package_path, self.name, self.reason)
        }
    }
}

/// The outcome of resolving one or more reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Coverage for every resolved source file.
    pub record: CoverageRecord,
    /// Unresolved source files, sorted and deduplicated.
    pub unmatched: Vec<UnmatchedSource>,
}

/// Resolves JaCoCo source files against a [`SourceIndex`].
pub struct JacocoResolver<'a> {
    index: &'a dyn SourceIndex,
    test_name: Option<String>,
}

impl<'a> JacocoResolver<'a> {
    /// Creates a resolver that files coverage under the unnamed test.
    pub fn new(index: &'a dyn SourceIndex) -> Self {
        Self {
            index,
            test_name: None,
        }
    }

    /// Files resolved coverage under the given test name.
    pub fn with_test_name(mut self, test_name: impl Into<String>) -> Self {
        self.test_name = Some(test_name.into());
        self
    }

    /// Finds the real path of a source file.
    ///
    /// Of the directories containing a file with this name, the first one (in sorted order)
    /// whose path ends with the package path wins.
    pub fn resolve_path(
        &self,
        source_file: &JacocoSourceFile,
    ) -> Result<String, UnmatchedReason> {
        let candidates = self
            .index
            .candidates(&source_file.name)
            .filter(|candidates| !candidates.is_empty())
            .ok_or(UnmatchedReason::NoCandidates)?;

        let package_path = source_file.package_path();
        let dir = candidates
            .iter()
            .find(|dir| dir.ends_with(package_path.as_str()))
            .ok_or(UnmatchedReason::PackageMismatch)?;

        if dir.is_empty() {
            Ok(source_file.name.clone())
        } else {
            Ok(format!("{dir}/{}", source_file.name))
        }
    }

    /// Resolves a single report.
    pub fn resolve(&self, report: &JacocoReport) -> Resolution {
        self.resolve_all([report])
    }

    /// Resolves several reports into one record. Source files that resolve to the same path are
    /// OR-merged.
    pub fn resolve_all<'r>(
        &self,
        reports: impl IntoIterator<Item = &'r JacocoReport>,
    ) -> Resolution {
        let mut builder = CoverageRecordBuilder::new();
        let mut unmatched = BTreeSet::new();

        for source_file in reports
            .into_iter()
            .flat_map(|report| report.source_files())
        {
            match self.resolve_path(source_file) {
                Ok(path) => {
                    debug!(
                        "resolved {}/{} to `{path}`",
                        source_file.package, source_file.name
                    );
                    if let Some(test_name) = &self.test_name {
                        builder.add_test(test_name.as_str());
                    }
                    builder.add_file(path);
                    for (&line, &covered) in &source_file.lines {
                        builder.merge_line(line, covered);
                    }
                }
                Err(reason) => {
                    let entry = UnmatchedSource {
                        package_path: source_file.package_path(),
                        name: source_file.name.clone(),
                        reason,
                    };
                    warn!(
                        "could not resolve {}/{}: {reason}",
                        entry.package_path, entry.name
                    );
                    unmatched.insert(entry);
                }
            }
        }

        Resolution {
            record: builder.build(),
            unmatched: unmatched.into_iter().collect(),
        }
    }
}
