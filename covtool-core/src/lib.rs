// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core logic for covtool: LCOV tracefile processing and JaCoCo resolution.
//!
//! Every operation works over a [`CoverageRecord`](record::CoverageRecord), a nested
//! test → file → line → covered mapping. Records are built by the [LCOV codec](lcov) or the
//! [JaCoCo resolver](jacoco), transformed by the filters and merge operations in this crate, and
//! written back out as LCOV text.
//!
//! All enumerations over tests, files and lines are sorted so that output is reproducible.

#![warn(missing_docs)]

pub mod component_list;
pub mod errors;
pub mod exempt;
pub mod jacoco;
pub mod lcov;
pub mod merge;
pub mod path_filter;
pub mod record;
pub mod source_index;
pub mod summary;
