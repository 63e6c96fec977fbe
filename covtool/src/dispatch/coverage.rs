// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommands that transform LCOV tracefiles.

use super::common::{OutputFileOpts, read_input, read_tracefile, read_tracefiles};
use crate::{Result, config::CovtoolConfig};
use camino::Utf8PathBuf;
use clap::Args;
use covtool_core::{
    component_list::ComponentList,
    exempt::{self, ExemptRanges},
    merge::{self, TestNameExtractor},
    path_filter::PathFilter,
    summary::CoverageSummary,
};
use tracing::{debug, info};

/// Removes lines inside exempt regions.
#[derive(Debug, Args)]
pub(super) struct DropExemptOpts {
    /// File listing exemption markers, one `<path>:<line>:<type>:<tag>` per line
    #[arg(long, value_name = "FILE")]
    markers: Utf8PathBuf,

    /// Tracefile to read [default: stdin]
    #[arg(value_name = "INPUT")]
    input: Option<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputFileOpts,
}

impl DropExemptOpts {
    pub(super) fn exec(self) -> Result<()> {
        let (_, marker_text) = read_input(Some(&self.markers))?;
        let markers = exempt::parse_markers(&marker_text);
        let ranges = ExemptRanges::from_markers(&markers);
        debug!(
            "found {} markers forming exempt ranges in {} files",
            markers.len(),
            ranges.iter().count()
        );

        let record = read_tracefile(self.input.as_deref())?;
        self.output.write_record(&ranges.apply(record))
    }
}

/// Keeps or drops files by path prefix.
#[derive(Debug, Args)]
pub(super) struct FilterOpts {
    /// Keep only files starting with this prefix (may be repeated)
    #[arg(long = "include", value_name = "PREFIX")]
    includes: Vec<String>,

    /// Drop files starting with this prefix (may be repeated)
    #[arg(long = "exclude", value_name = "PREFIX")]
    excludes: Vec<String>,

    /// Tracefile to read [default: stdin]
    #[arg(value_name = "INPUT")]
    input: Option<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputFileOpts,
}

impl FilterOpts {
    pub(super) fn exec(self) -> Result<()> {
        let filter = PathFilter::new(self.includes, self.excludes);
        debug!(
            "filtering with includes {:?} and excludes {:?}",
            filter.includes(),
            filter.excludes()
        );
        let record = read_tracefile(self.input.as_deref())?;
        self.output.write_record(&filter.apply(record))
    }
}

/// Merges tracefiles, discarding test names.
#[derive(Debug, Args)]
pub(super) struct MergeOpts {
    /// Tracefiles to merge
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputFileOpts,
}

impl MergeOpts {
    pub(super) fn exec(self) -> Result<()> {
        let records = read_tracefiles(&self.inputs)?;
        let merged = merge::merge_tracefiles(&records);
        info!(
            "merged {} tracefiles into {} files",
            records.len(),
            merged.file_paths().len()
        );
        self.output.write_record(&merged)
    }
}

/// Merges all tests of a tracefile into one.
#[derive(Debug, Args)]
pub(super) struct FlattenOpts {
    /// Tracefile to read [default: stdin]
    #[arg(value_name = "INPUT")]
    input: Option<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputFileOpts,
}

impl FlattenOpts {
    pub(super) fn exec(self) -> Result<()> {
        let record = read_tracefile(self.input.as_deref())?;
        self.output.write_record(&merge::flatten(&record))
    }
}

/// Merges per-test tracefiles, naming each test after its tracefile path.
#[derive(Debug, Args)]
pub(super) struct MergeTestsOpts {
    /// Bytes to strip from the start of each path [default: from config]
    #[arg(long, value_name = "N")]
    strip_prefix_len: Option<usize>,

    /// Bytes to strip from the end of each path [default: from config]
    #[arg(long, value_name = "N")]
    strip_suffix_len: Option<usize>,

    /// Per-test tracefiles to merge
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputFileOpts,
}

impl MergeTestsOpts {
    pub(super) fn exec(self, config: &CovtoolConfig) -> Result<()> {
        let extractor = self.extractor(config.test_name);
        let names = self
            .inputs
            .iter()
            .map(|input| Ok(extractor.extract(input.as_str())?.to_owned()))
            .collect::<Result<Vec<_>>>()?;
        let records = read_tracefiles(&self.inputs)?;

        let merged = merge::merge_named(names.into_iter().zip(&records));
        info!(
            "merged {} tracefiles into {} tests",
            records.len(),
            merged.test_names().count()
        );
        self.output.write_record(&merged)
    }

    fn extractor(&self, from_config: TestNameExtractor) -> TestNameExtractor {
        TestNameExtractor::new(
            self.strip_prefix_len
                .unwrap_or(from_config.strip_prefix_len),
            self.strip_suffix_len
                .unwrap_or(from_config.strip_suffix_len),
        )
    }
}

/// Lists the tests and files a component's tracefiles mention.
#[derive(Debug, Args)]
pub(super) struct ListOpts {
    /// Component name, printed as the `CN:` header
    #[arg(long, value_name = "COMPONENT")]
    name: String,

    /// Tracefiles to read
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputFileOpts,
}

impl ListOpts {
    pub(super) fn exec(self) -> Result<()> {
        let mut list = ComponentList::new(self.name);
        for record in read_tracefiles(&self.inputs)? {
            list.extend_from(&record);
        }
        self.output.write_str(&list.to_string())
    }
}

/// Prints instrumented and covered line counts per file.
#[derive(Debug, Args)]
pub(super) struct SummaryOpts {
    /// Tracefile to read [default: stdin]
    #[arg(value_name = "INPUT")]
    input: Option<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputFileOpts,
}

impl SummaryOpts {
    pub(super) fn exec(self) -> Result<()> {
        let record = read_tracefile(self.input.as_deref())?;
        let summary = CoverageSummary::new(&record);
        self.output.write_str(&summary.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_override_config_offsets() {
        let opts = MergeTestsOpts {
            strip_prefix_len: Some(3),
            strip_suffix_len: None,
            inputs: vec!["a/b.dat".into()],
            output: OutputFileOpts { output: None },
        };
        assert_eq!(
            opts.extractor(TestNameExtractor::new(15, 13)),
            TestNameExtractor::new(3, 13)
        );
    }
}
