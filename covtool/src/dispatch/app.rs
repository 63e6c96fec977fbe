// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level application and command routing.

use super::{
    common::CommonOpts,
    coverage::{
        DropExemptOpts, FilterOpts, FlattenOpts, ListOpts, MergeOpts, MergeTestsOpts,
        SummaryOpts,
    },
    jacoco::JacocoOpts,
    shade::ShadeServicesOpts,
};
use crate::{CovtoolExitCode, Result, output::OutputContext};
use clap::Subcommand;
use tracing::debug;

/// Process LCOV tracefiles, resolve JaCoCo reports and shade jar service registrations.
///
/// Subcommands that take a single tracefile read it from stdin if it's omitted or `-`, and write
/// to stdout unless `--output` is given.
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct CovtoolApp {
    #[clap(flatten)]
    common: CommonOpts,

    #[clap(subcommand)]
    command: Command,
}

impl CovtoolApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.common.output.init()
    }

    /// Executes the app.
    ///
    /// Returns the exit code.
    pub fn exec(self, output: OutputContext) -> Result<i32> {
        debug!("output context: {output:?}");
        let config = self.common.config_opts.make_config()?;

        match self.command {
            Command::DropExempt(opts) => opts.exec()?,
            Command::Filter(opts) => opts.exec()?,
            Command::Merge(opts) => opts.exec()?,
            Command::Flatten(opts) => opts.exec()?,
            Command::MergeTests(opts) => opts.exec(&config)?,
            Command::List(opts) => opts.exec()?,
            Command::Summary(opts) => opts.exec()?,
            Command::Jacoco(opts) => opts.exec(&config)?,
            Command::ShadeServices(opts) => opts.exec(&config)?,
        }
        Ok(CovtoolExitCode::OK)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Remove lines inside coverage-exempt regions from a tracefile
    DropExempt(DropExemptOpts),
    /// Keep or drop files in a tracefile by path prefix
    Filter(FilterOpts),
    /// Merge tracefiles into one, discarding test names
    Merge(MergeOpts),
    /// Merge every test of a tracefile into one
    Flatten(FlattenOpts),
    /// Merge per-test tracefiles, naming each test after its path
    MergeTests(MergeTestsOpts),
    /// List the tests and source files mentioned by a component's tracefiles
    List(ListOpts),
    /// Print instrumented and covered line counts per file
    Summary(SummaryOpts),
    /// Convert JaCoCo XML reports to an LCOV tracefile
    Jacoco(JacocoOpts),
    /// Rename service-provider registrations inside a shaded jar
    ShadeServices(ShadeServicesOpts),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser, error::ErrorKind};
    use test_case::test_case;

    #[test]
    fn verify_app() {
        CovtoolApp::command().debug_assert();
    }

    #[test]
    fn workspace_root_help_names_config_path() {
        let help = CovtoolApp::command().render_long_help().to_string();
        assert!(
            help.contains("Directory containing `.config/covtool.toml`"),
            "{help}"
        );
    }

    #[test_case(&["covtool", "merge", "a.dat", "b.dat"] ; "merge")]
    #[test_case(&["covtool", "filter", "--include", "a/", "--exclude", "a/b"] ; "filter from stdin")]
    #[test_case(&["covtool", "drop-exempt", "--markers", "m.txt", "-"] ; "drop exempt")]
    #[test_case(&["covtool", "merge-tests", "--strip-prefix-len", "4", "x.dat"] ; "merge tests")]
    #[test_case(&["covtool", "list", "--name", "base", "x.dat"] ; "list")]
    #[test_case(&["covtool", "--color", "never", "summary"] ; "summary with global flag")]
    #[test_case(&["covtool", "jacoco", "--source-root", "src", "a.xml", "b.xml", "-o", "out.dat"] ; "jacoco")]
    #[test_case(&["covtool", "shade-services", "--rules", "r.txt", "--output", "o.jar", "--compression", "stored", "i.jar"] ; "shade services")]
    fn valid_args(args: &[&str]) {
        if let Err(err) = CovtoolApp::try_parse_from(args) {
            panic!("{args:?} should have parsed, but failed: {err}");
        }
    }

    #[test_case(&["covtool", "merge"], ErrorKind::MissingRequiredArgument ; "merge without inputs")]
    #[test_case(&["covtool", "list", "x.dat"], ErrorKind::MissingRequiredArgument ; "list without name")]
    #[test_case(&["covtool", "shade-services", "--rules", "r.txt", "i.jar"], ErrorKind::MissingRequiredArgument ; "shade without output")]
    #[test_case(&["covtool", "shade-services", "--rules", "r.txt", "-o", "o.jar", "--compression", "zstd", "i.jar"], ErrorKind::InvalidValue ; "unknown compression")]
    #[test_case(&["covtool", "frobnicate"], ErrorKind::InvalidSubcommand ; "unknown subcommand")]
    fn invalid_args(args: &[&str], kind: ErrorKind) {
        match CovtoolApp::try_parse_from(args) {
            Ok(_) => panic!("{args:?} should have failed to parse"),
            Err(err) => assert_eq!(err.kind(), kind, "{args:?}: {err}"),
        }
    }
}
