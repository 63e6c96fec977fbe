// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for covtool's integration tests.

pub mod covtool_cli;
