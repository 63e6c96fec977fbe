// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Options and helpers shared by every subcommand.

use crate::{
    ExpectedError, Result,
    config::CovtoolConfig,
    errors::InputSource,
    output::OutputOpts,
};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use covtool_core::{lcov, record::CoverageRecord};
use std::io::{self, Read, Write};
use tracing::debug;

/// Input path that stands for standard input.
pub(super) const STDIN_PATH: &str = "-";

#[derive(Debug, Args)]
pub(super) struct CommonOpts {
    #[clap(flatten)]
    pub(super) output: OutputOpts,

    #[clap(flatten)]
    pub(super) config_opts: ConfigOpts,
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
pub(super) struct ConfigOpts {
    /// Config file [default: workspace-root/.config/covtool.toml]
    #[arg(long, global = true, value_name = "PATH")]
    pub(super) config_file: Option<Utf8PathBuf>,

    /// Directory containing `.config/covtool.toml`
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub(super) workspace_root: Utf8PathBuf,
}

impl ConfigOpts {
    /// Reads the config, layering the repository config over the defaults.
    pub(super) fn make_config(&self) -> Result<CovtoolConfig> {
        let config =
            CovtoolConfig::from_sources(&self.workspace_root, self.config_file.as_deref())?;
        Ok(config)
    }
}

/// Where a subcommand writes its output.
#[derive(Debug, Args)]
pub(super) struct OutputFileOpts {
    /// Write output to this file instead of stdout
    ///
    /// The file is replaced atomically once the output is complete.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub(super) output: Option<Utf8PathBuf>,
}

impl OutputFileOpts {
    pub(super) fn write_str(&self, text: &str) -> Result<()> {
        match &self.output {
            Some(path) => write_atomic(path, text),
            None => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(text.as_bytes())
                    .and_then(|()| stdout.flush())
                    .map_err(|err| ExpectedError::write_output(None, err))
            }
        }
    }

    pub(super) fn write_record(&self, record: &CoverageRecord) -> Result<()> {
        self.write_str(&lcov::to_string(record))
    }
}

/// Writes `text` to `path` through a temporary file in the same directory.
pub(super) fn write_atomic(path: &Utf8Path, text: &str) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(text.as_bytes()))
        .map_err(|err| {
            let err = match err {
                atomicwrites::Error::Internal(err) | atomicwrites::Error::User(err) => err,
            };
            ExpectedError::write_output(Some(path), err)
        })?;
    debug!("wrote {} bytes to `{path}`", text.len());
    Ok(())
}

/// Returns the source an optional input argument refers to.
pub(super) fn input_source(path: Option<&Utf8Path>) -> InputSource {
    match path {
        None => InputSource::Stdin,
        Some(path) if path.as_str() == STDIN_PATH => InputSource::Stdin,
        Some(path) => InputSource::File(path.to_owned()),
    }
}

/// Reads an input to a string.
pub(super) fn read_input(path: Option<&Utf8Path>) -> Result<(InputSource, String)> {
    let source = input_source(path);
    let text = match &source {
        InputSource::Stdin => {
            let mut text = String::new();
            io::stdin()
                .lock()
                .read_to_string(&mut text)
                .map(|_| text)
        }
        InputSource::File(path) => std::fs::read_to_string(path),
    };
    match text {
        Ok(text) => Ok((source, text)),
        Err(err) => Err(ExpectedError::read_input(source, err)),
    }
}

/// Reads and parses an LCOV tracefile.
pub(super) fn read_tracefile(path: Option<&Utf8Path>) -> Result<CoverageRecord> {
    let (source, text) = read_input(path)?;
    let record = lcov::parse(&text);
    debug!("read {} line records from {source}", record.line_count());
    Ok(record)
}

/// Reads and parses several LCOV tracefiles, in order.
pub(super) fn read_tracefiles(paths: &[Utf8PathBuf]) -> Result<Vec<CoverageRecord>> {
    paths
        .iter()
        .map(|path| read_tracefile(Some(path)))
        .collect()
}
