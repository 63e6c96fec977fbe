// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rewrites Java service-provider registrations inside a shaded jar.
//!
//! Class-shading tools rename classes inside a jar but don't touch the
//! `META-INF/services/<interface>` registration files that `ServiceLoader` reads. This crate
//! applies the same renaming rules to those files: each registration is renamed after its
//! shaded interface name, and each implementation class it lists is shaded too.
//!
//! Rules use the jarjar syntax described in [`rules`]. `zap` rules are rejected.
//!
//! # Examples
//!
//! ```
//! use jar_shader::rules::RuleSet;
//!
//! let rules = RuleSet::parse("rule com.example.** com.android.example.@1").unwrap();
//! assert_eq!(rules.shade_name("com.example.Foo"), "com.android.example.Foo");
//! assert_eq!(rules.shade_name("org.other.Bar"), "org.other.Bar");
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod errors;
pub mod rules;

use archive::{Compression, ServiceShader, ShadeSummary};
use camino::Utf8Path;
use errors::ShadeError;
use rules::RuleSet;

/// Shades the registrations of the jar at `input` with the given rules text, writing the result
/// to `output`.
///
/// The rules are parsed before anything is written, so a rules error leaves `output` untouched.
pub fn shade(
    input: &Utf8Path,
    rules_text: &str,
    output: &Utf8Path,
    compression: Compression,
) -> Result<ShadeSummary, ShadeError> {
    let rules = RuleSet::parse(rules_text)?;
    let summary = ServiceShader::new(&rules)
        .with_compression(compression)
        .shade_file(input, output)?;
    Ok(summary)
}
