// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests
//!
//! These tests run `covtool-dup`, a binary built by this crate that's identical to `covtool`, so
//! that a test run never has to replace a binary that's currently executing. Each invocation runs
//! from the `fixtures` directory at the root of the workspace, which carries a
//! `.config/covtool.toml` of its own.

use camino::Utf8PathBuf;
use integration_tests::covtool_cli::{CovtoolCli, fixtures_dir};

mod coverage;
mod jacoco;
mod shade;

fn covtool() -> CovtoolCli {
    CovtoolCli::new(env!("CARGO_BIN_EXE_covtool-dup"))
}

fn fixture(path: &str) -> Utf8PathBuf {
    fixtures_dir().join(path)
}

#[test]
fn help_and_version_exit_zero() {
    let output = covtool().arg("--help").output();
    assert!(
        output.stdout_as_str().contains("shade-services"),
        "help lists subcommands:\n{output}"
    );

    let output = covtool().arg("--version").output();
    assert!(
        output.stdout_as_str().starts_with("covtool "),
        "version is printed:\n{output}"
    );
}

#[test]
fn missing_required_argument_exits_one() {
    let output = covtool().arg("merge").unchecked(true).output();
    assert_eq!(output.exit_code(), Some(1), "{output}");
    assert!(output.stdout.is_empty(), "{output}");
}

#[test]
fn unknown_config_keys_are_warned_about() {
    let dir = camino_tempfile::tempdir().expect("created temp dir");
    let config_file = dir.path().join("covtool.toml");
    fs_err::write(&config_file, "[shader]\nfrobnicate = true\n").expect("wrote config");

    let output = covtool()
        .args(["--config-file", config_file.as_str(), "flatten"])
        .stdin("SF:a.java\nDA:1,1\n")
        .output();
    assert!(
        output
            .stderr_as_str()
            .contains("warning: ignoring unknown configuration key `shader.frobnicate`"),
        "{output}"
    );
    assert_eq!(output.stdout_as_str(), "SF:a.java\nDA:1,1\nend_of_record\n");
}

#[test]
fn missing_config_file_is_an_error() {
    let output = covtool()
        .args(["--config-file", "does-not-exist.toml", "flatten"])
        .stdin("")
        .unchecked(true)
        .output();
    assert_eq!(output.exit_code(), Some(1), "{output}");
    assert!(
        output
            .stderr_as_str()
            .contains("error: failed to parse covtool config at `does-not-exist.toml`"),
        "{output}"
    );
}
