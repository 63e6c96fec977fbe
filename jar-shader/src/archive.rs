// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rewriting service-provider registrations inside a jar.
//!
//! Shading tools rename classes but leave `META-INF/services/<interface>` files alone, so the
//! registrations keep pointing at the old names. [`ServiceShader`] renames each registration
//! file and every class listed in it. Every other entry is copied through with identical
//! contents. Two entries ending up with the same name is an error.

use crate::{errors::ShadeArchiveError, rules::RuleSet};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::Utf8Path;
use itertools::Itertools;
use serde::Deserialize;
use std::{
    collections::{HashMap, hash_map::Entry},
    fmt,
    fs::File,
    io::{self, Read, Seek, Write},
};
use tracing::debug;
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};

/// The directory that holds service-provider registration files.
pub const DEFAULT_SERVICES_DIR: &str = "META-INF/services";

/// The compression method used for entries in the output archive.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Compression {
    /// Deflate every entry.
    #[default]
    Deflate,
    /// Store every entry uncompressed.
    Stored,
}

impl Compression {
    fn method(self) -> CompressionMethod {
        match self {
            Self::Deflate => CompressionMethod::Deflated,
            Self::Stored => CompressionMethod::Stored,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deflate => write!(f, "deflate"),
            Self::Stored => write!(f, "stored"),
        }
    }
}

/// What a rewrite did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShadeSummary {
    /// The number of entries written, which is always the number of entries read.
    pub entries: usize,
    /// The number of service registration files rewritten.
    pub services: usize,
    /// Registration files whose names changed, as `(old, new)` pairs in archive order.
    pub renamed: Vec<(String, String)>,
}

/// Rewrites the service registrations of an archive according to a [`RuleSet`].
#[derive(Clone, Debug)]
pub struct ServiceShader<'a> {
    rules: &'a RuleSet,
    services_dir: String,
    compression: Compression,
}

impl<'a> ServiceShader<'a> {
    /// Creates a shader that rewrites entries under [`DEFAULT_SERVICES_DIR`] and deflates its
    /// output.
    pub fn new(rules: &'a RuleSet) -> Self {
        Self {
            rules,
            services_dir: DEFAULT_SERVICES_DIR.to_owned(),
            compression: Compression::default(),
        }
    }

    /// Sets the directory holding registration files.
    pub fn with_services_dir(mut self, services_dir: impl Into<String>) -> Self {
        let services_dir = services_dir.into();
        self.services_dir = services_dir.trim_end_matches('/').to_owned();
        self
    }

    /// Sets the compression method for the output archive.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Returns true if the entry is a registration file: a non-directory entry under the services
    /// directory.
    pub fn is_service_entry(&self, name: &str) -> bool {
        !name.ends_with('/')
            && name
                .strip_prefix(self.services_dir.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Computes the new name of a registration file by shading its base name.
    pub fn shade_entry_name(&self, name: &str) -> String {
        match name.rsplit_once('/') {
            Some((dir, base)) => format!("{dir}/{}", self.rules.shade_name(base)),
            None => self.rules.shade_name(name).into_owned(),
        }
    }

    /// Shades every line of a registration file, keeping each line's `\n` or `\r\n` ending.
    pub fn shade_contents(&self, contents: &str) -> String {
        let mut shaded = String::with_capacity(contents.len());
        for line in contents.split_inclusive('\n') {
            let (body, ending) = split_line_ending(line);
            shaded.push_str(&self.rules.shade_name(body));
            shaded.push_str(ending);
        }
        shaded
    }

    /// Rewrites an archive from a reader into a writer, returning the writer.
    ///
    /// Entries other than registrations are copied without recompression when they already use
    /// the chosen compression method, keeping their metadata.
    pub fn rewrite<R, W>(
        &self,
        input: R,
        output: W,
    ) -> Result<(W, ShadeSummary), ShadeArchiveError>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        let mut archive = ZipArchive::new(input).map_err(ShadeArchiveError::ReadArchive)?;
        debug!(
            "shading with rules: [{}]",
            self.rules
                .rules()
                .iter()
                .map(|rule| format!("{} -> {}", rule.pattern(), rule.replacement()))
                .join(", ")
        );
        let out_names = self.output_names(&mut archive)?;

        let mut writer = ZipWriter::new(output);
        let mut summary = ShadeSummary::default();

        for (index, out_name) in out_names.into_iter().enumerate() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|source| ShadeArchiveError::ReadEntry { index, source })?;
            let name = entry.name().to_owned();
            let is_service = self.is_service_entry(&name);

            if entry.is_dir() || (!is_service && entry.compression() == self.compression.method())
            {
                writer
                    .raw_copy_file(entry)
                    .map_err(|source| ShadeArchiveError::CopyEntry { name, source })?;
                summary.entries += 1;
                continue;
            }

            let mut options =
                SimpleFileOptions::default().compression_method(self.compression.method());
            if let Some(mode) = entry.unix_mode() {
                options = options.unix_permissions(mode);
            }
            if let Some(mtime) = entry.last_modified() {
                options = options.last_modified_time(mtime);
            }
            drop(entry);

            let mut contents = Vec::new();
            archive
                .by_index(index)
                .map_err(|source| ShadeArchiveError::ReadEntry { index, source })?
                .read_to_end(&mut contents)
                .map_err(|source| ShadeArchiveError::ReadEntryContents {
                    name: name.clone(),
                    source,
                })?;

            let contents = if is_service {
                let text = String::from_utf8(contents).map_err(|source| {
                    ShadeArchiveError::ServiceNotUtf8 {
                        name: name.clone(),
                        source,
                    }
                })?;
                summary.services += 1;
                if out_name != name {
                    debug!("renaming `{name}` to `{out_name}`");
                    summary.renamed.push((name, out_name.clone()));
                }
                self.shade_contents(&text).into_bytes()
            } else {
                contents
            };

            writer
                .start_file(out_name.as_str(), options)
                .map_err(|source| ShadeArchiveError::StartEntry {
                    name: out_name.clone(),
                    source,
                })?;
            writer
                .write_all(&contents)
                .map_err(|source| ShadeArchiveError::WriteEntry {
                    name: out_name,
                    source,
                })?;
            summary.entries += 1;
        }

        let output = writer.finish().map_err(ShadeArchiveError::Finalize)?;
        Ok((output, summary))
    }

    /// Computes the output name of every entry in archive order.
    ///
    /// Fails if two entries would end up with the same name.
    fn output_names<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<Vec<String>, ShadeArchiveError> {
        // Output name to input name.
        let mut seen: HashMap<String, String> = HashMap::with_capacity(archive.len());
        let mut out_names = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let name = archive
                .by_index_raw(index)
                .map_err(|source| ShadeArchiveError::ReadEntry { index, source })?
                .name()
                .to_owned();
            let out_name = if self.is_service_entry(&name) {
                self.shade_entry_name(&name)
            } else {
                name.clone()
            };

            match seen.entry(out_name.clone()) {
                Entry::Occupied(prev) => {
                    let original = if out_name != name {
                        name
                    } else {
                        prev.get().clone()
                    };
                    return Err(ShadeArchiveError::DuplicateServiceEntry {
                        original,
                        shaded: out_name,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(name);
                }
            }
            out_names.push(out_name);
        }

        Ok(out_names)
    }

    /// Rewrites the archive at `input` into `output`.
    ///
    /// The output is written to a temporary file and moved into place once complete, so a
    /// failure never leaves a partial archive at `output`.
    pub fn shade_file(
        &self,
        input: &Utf8Path,
        output: &Utf8Path,
    ) -> Result<ShadeSummary, ShadeArchiveError> {
        let input_file = File::open(input).map_err(|source| ShadeArchiveError::OpenInput {
            path: input.to_owned(),
            source,
        })?;
        let input_file = io::BufReader::new(input_file);

        let atomic_file = AtomicFile::new(output, OverwriteBehavior::AllowOverwrite);
        let summary = atomic_file
            .write(|temp_file| {
                let (_, summary) = self.rewrite(input_file, temp_file)?;
                Ok(summary)
            })
            .map_err(|err| match err {
                atomicwrites::Error::Internal(source) => ShadeArchiveError::AtomicWrite {
                    path: output.to_owned(),
                    source,
                },
                atomicwrites::Error::User(err) => err,
            })?;

        debug!(
            "wrote {} entries ({} service registrations) to `{output}`",
            summary.entries, summary.services
        );
        Ok(summary)
    }
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}
