// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod app;
mod common;
mod coverage;
mod imp;
mod jacoco;
mod shade;

pub use app::CovtoolApp;
pub use imp::main_impl;
