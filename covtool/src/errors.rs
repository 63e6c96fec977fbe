// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use covtool_core::errors::{JacocoParseError, SourceIndexError, TestNameError};
use jar_shader::errors::{RuleParseError, ShadeArchiveError};
use owo_colors::OwoColorize;
use std::{error::Error, fmt, io};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Exit codes returned by covtool.
pub enum CovtoolExitCode {}

impl CovtoolExitCode {
    /// The command succeeded.
    pub const OK: i32 = 0;

    /// The command failed: bad input, a bad rule, a bad config file or an I/O error.
    pub const FAILURE: i32 = 1;
}

/// An error that occurred while reading or deserializing a config file.
#[derive(Debug, Error)]
#[error("failed to parse covtool config at `{config_file}`")]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of a [`ConfigParseError`].
#[derive(Debug, Error)]
pub enum ConfigParseErrorKind {
    /// The config sources couldn't be read or merged.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// The merged config couldn't be deserialized.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// Where an input was read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    /// Standard input.
    Stdin,
    /// A file.
    File(Utf8PathBuf),
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => write!(f, "<stdin>"),
            Self::File(path) => write!(f, "{path}"),
        }
    }
}

// The #[error()] strings are placeholders: errors are printed with display_to_stderr.

/// An error that covtool reports to the user before exiting.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("error reading input")]
    ReadInput {
        input: InputSource,
        #[source]
        err: io::Error,
    },
    #[error("error writing output")]
    WriteOutput {
        /// `None` for stdout.
        path: Option<Utf8PathBuf>,
        #[source]
        err: io::Error,
    },
    #[error("error indexing source tree")]
    SourceIndex {
        #[from]
        err: SourceIndexError,
    },
    #[error("error parsing JaCoCo report")]
    JacocoParse {
        input: InputSource,
        #[source]
        err: JacocoParseError,
    },
    #[error("error deriving test name")]
    TestName {
        #[from]
        err: TestNameError,
    },
    #[error("error parsing shading rules")]
    RuleParse {
        path: Utf8PathBuf,
        #[source]
        err: RuleParseError,
    },
    #[error("error shading archive")]
    ShadeArchive {
        #[from]
        err: ShadeArchiveError,
    },
}

impl ExpectedError {
    pub(crate) fn read_input(input: InputSource, err: io::Error) -> Self {
        Self::ReadInput { input, err }
    }

    pub(crate) fn write_output(path: Option<&Utf8Path>, err: io::Error) -> Self {
        Self::WriteOutput {
            path: path.map(ToOwned::to_owned),
            err,
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::ReadInput { .. }
            | Self::WriteOutput { .. }
            | Self::SourceIndex { .. }
            | Self::JacocoParse { .. }
            | Self::TestName { .. }
            | Self::RuleParse { .. }
            | Self::ShadeArchive { .. } => CovtoolExitCode::FAILURE,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse covtool config at `{}`",
                    err.config_file().style(styles.bold)
                );
                match err.kind() {
                    ConfigParseErrorKind::BuildError(err) => Some(&**err as &dyn Error),
                    ConfigParseErrorKind::DeserializeError(err) => {
                        error!(
                            target: crate::output::NO_HEADING_TARGET,
                            "  at key `{}`",
                            err.path().style(styles.bold)
                        );
                        Some(err.inner() as &dyn Error)
                    }
                }
            }
            Self::ReadInput { input, err } => {
                error!("failed to read `{}`", input.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::WriteOutput { path, err } => {
                match path {
                    Some(path) => error!("failed to write `{}`", path.style(styles.bold)),
                    None => error!("failed to write to stdout"),
                }
                Some(err as &dyn Error)
            }
            Self::SourceIndex { err } => {
                error!(
                    "failed to index source tree at `{}`",
                    err.root().style(styles.bold)
                );
                err.source()
            }
            Self::JacocoParse { input, err } => {
                error!(
                    "failed to parse JaCoCo report `{}`",
                    input.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::TestName { err } => {
                error!("failed to derive test name from tracefile path");
                Some(err as &dyn Error)
            }
            Self::RuleParse { path, err } => {
                error!(
                    "invalid rule in `{}` at line {}: {}",
                    path.style(styles.bold),
                    err.line_number(),
                    err.line().style(styles.warning_text),
                );
                Some(err.kind() as &dyn Error)
            }
            Self::ShadeArchive { err } => {
                error!("failed to shade archive");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: crate::output::NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
