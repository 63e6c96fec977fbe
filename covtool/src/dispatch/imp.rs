// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Main entry point implementation.

use super::app::CovtoolApp;
use crate::CovtoolExitCode;
use clap::Parser;

/// Main entry point for covtool.
///
/// Both the main binary and the integration test duplicate use this.
pub fn main_impl() -> ! {
    match CovtoolApp::try_parse() {
        Ok(opts) => {
            let output = opts.init_output();
            match opts.exec(output) {
                Ok(code) => std::process::exit(code),
                Err(error) => {
                    error.display_to_stderr(&output.stderr_styles());
                    std::process::exit(error.process_exit_code())
                }
            }
        }
        Err(err) => {
            // --help and --version are reported as errors with exit code 0.
            let code = if err.exit_code() == 0 {
                CovtoolExitCode::OK
            } else {
                CovtoolExitCode::FAILURE
            };
            // There's nothing useful left to do if stderr is gone.
            let _ = err.print();
            std::process::exit(code)
        }
    }
}
