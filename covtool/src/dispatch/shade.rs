// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::common::read_input;
use crate::{ExpectedError, Result, config::CovtoolConfig};
use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use jar_shader::{
    archive::{Compression, ServiceShader},
    rules::RuleSet,
};
use tracing::info;

/// Compression for entries in the shaded jar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CompressionOpt {
    /// Deflate every entry
    Deflate,
    /// Store every entry uncompressed
    Stored,
}

impl From<CompressionOpt> for Compression {
    fn from(opt: CompressionOpt) -> Self {
        match opt {
            CompressionOpt::Deflate => Compression::Deflate,
            CompressionOpt::Stored => Compression::Stored,
        }
    }
}

/// Renames service-provider registrations inside a jar.
#[derive(Debug, Args)]
pub(super) struct ShadeServicesOpts {
    /// Shading rules file
    #[arg(long, value_name = "FILE")]
    rules: Utf8PathBuf,

    /// Path to write the shaded jar to
    #[arg(long, short = 'o', value_name = "JAR")]
    output: Utf8PathBuf,

    /// Compression for entries in the output [default: from config]
    #[arg(long, value_enum, value_name = "METHOD")]
    compression: Option<CompressionOpt>,

    /// Directory holding registration files [default: from config]
    #[arg(long, value_name = "DIR")]
    services_dir: Option<String>,

    /// Jar to read
    #[arg(value_name = "JAR")]
    input: Utf8PathBuf,
}

impl ShadeServicesOpts {
    pub(super) fn exec(self, config: &CovtoolConfig) -> Result<()> {
        let (_, rules_text) = read_input(Some(&self.rules))?;
        let rules = RuleSet::parse(&rules_text).map_err(|err| ExpectedError::RuleParse {
            path: self.rules.clone(),
            err,
        })?;

        let compression = self
            .compression
            .map_or(config.shader.compression, Compression::from);
        let services_dir = self
            .services_dir
            .unwrap_or_else(|| config.shader.services_dir.clone());

        let summary = ServiceShader::new(&rules)
            .with_services_dir(services_dir)
            .with_compression(compression)
            .shade_file(&self.input, &self.output)?;
        info!(
            "wrote {} entries to `{}` ({} service registrations, {} renamed)",
            summary.entries,
            self.output,
            summary.services,
            summary.renamed.len()
        );
        Ok(())
    }
}
