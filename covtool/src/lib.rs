// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `covtool` command-line interface.
//!
//! This crate is an implementation detail of the `covtool` binary and is not meant to be used as
//! a library. Use [`covtool_core`] and [`jar_shader`] instead.

#![warn(missing_docs)]

pub mod config;
mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{Color, OutputContext, StderrStyles};
