// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration for covtool.
//!
//! The embedded default config is always read first. On top of it goes either the file passed in
//! with `--config-file`, which must exist, or `.config/covtool.toml` under the workspace root, if
//! it exists.

use crate::errors::{ConfigParseError, ConfigParseErrorKind};
use camino::Utf8Path;
use config::{
    Config, ConfigError, File, FileFormat,
    builder::{ConfigBuilder, DefaultState},
};
use covtool_core::{merge::TestNameExtractor, source_index::SourceIndexConfig};
use jar_shader::archive::Compression;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Configuration for covtool, after merging every source.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CovtoolConfig {
    /// How source trees are indexed for JaCoCo resolution.
    pub source_index: SourceIndexConfig,
    /// How test names are derived from tracefile paths.
    pub test_name: TestNameExtractor,
    /// Jar shading settings.
    pub shader: ShaderConfig,
}

/// The `[shader]` section.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ShaderConfig {
    /// The directory holding service-provider registration files.
    pub services_dir: String,
    /// The compression method for the output jar.
    pub compression: Compression,
}

impl CovtoolConfig {
    /// The default location of the config within the workspace root.
    pub const CONFIG_PATH: &'static str = ".config/covtool.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config, warning about any unknown keys.
    pub fn from_sources(
        workspace_root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config, unknown) = Self::read_from_sources(workspace_root, config_file)?;
        for key in &unknown {
            warn!("ignoring unknown configuration key `{key}`");
        }
        Ok(config)
    }

    /// Returns the default config.
    pub fn default_config() -> Self {
        let (config, _) = Self::build_and_deserialize_config(&Self::make_default_config())
            .expect("default config is always valid");
        config
    }

    /// Reads the config, returning it along with the set of unknown keys.
    pub(crate) fn read_from_sources(
        workspace_root: &Utf8Path,
        config_file: Option<&Utf8Path>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file, kind))
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: Self = serde_path_to_error::deserialize(ignored_de).map_err(|error| {
            // serde_path_to_error already reports the key, so drop it from the config error.
            let path = error.path().clone();
            let error = match error.into_inner() {
                ConfigError::At { error, .. } => *error,
                other => other,
            };
            ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                path, error,
            )))
        })?;

        Ok((config, ignored))
    }
}
