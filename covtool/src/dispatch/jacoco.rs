// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::common::{OutputFileOpts, read_input, write_atomic};
use crate::{ExpectedError, Result, config::CovtoolConfig};
use camino::Utf8PathBuf;
use clap::Args;
use covtool_core::{
    jacoco::{JacocoReport, JacocoResolver, UnmatchedSource},
    source_index::SourceTreeIndex,
};
use swrite::{SWrite, swriteln};
use tracing::{debug, info};

/// Converts JaCoCo XML reports to an LCOV tracefile.
#[derive(Debug, Args)]
pub(super) struct JacocoOpts {
    /// Root of the source tree that report entries are resolved against
    #[arg(long, value_name = "DIR")]
    source_root: Utf8PathBuf,

    /// File the coverage under this test name
    #[arg(long, value_name = "NAME")]
    test_name: Option<String>,

    /// Also write unresolved source files to this file
    #[arg(long, value_name = "PATH")]
    unmatched_output: Option<Utf8PathBuf>,

    /// JaCoCo XML reports to convert
    #[arg(value_name = "XML", required = true)]
    reports: Vec<Utf8PathBuf>,

    #[clap(flatten)]
    output: OutputFileOpts,
}

impl JacocoOpts {
    pub(super) fn exec(self, config: &CovtoolConfig) -> Result<()> {
        let index = SourceTreeIndex::build(&self.source_root, &config.source_index)?;
        debug!(
            "indexed {} file names under `{}`",
            index.len(),
            self.source_root
        );

        let reports = self
            .reports
            .iter()
            .map(|path| {
                let (input, xml) = read_input(Some(path))?;
                JacocoReport::parse(&xml).map_err(|err| ExpectedError::JacocoParse { input, err })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut resolver = JacocoResolver::new(&index);
        if let Some(test_name) = self.test_name {
            resolver = resolver.with_test_name(test_name);
        }
        let resolution = resolver.resolve_all(&reports);
        info!(
            "resolved {} source files ({} unmatched)",
            resolution.record.file_paths().len(),
            resolution.unmatched.len()
        );

        if let Some(path) = &self.unmatched_output {
            write_atomic(path, &unmatched_text(&resolution.unmatched))?;
        }
        self.output.write_record(&resolution.record)
    }
}

fn unmatched_text(unmatched: &[UnmatchedSource]) -> String {
    let mut text = String::new();
    for entry in unmatched {
        swriteln!(text, "{entry}");
    }
    text
}
