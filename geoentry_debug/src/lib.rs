// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, recording, and tree rendering for geoentry diagnostics.
//!
//! This crate provides [`EntryObserver`](geoentry_core::observer::EntryObserver)
//! implementations and helpers for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintObserver`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderObserver`]: keeps every event in memory and writes
//!   them out as JSON lines.
//! - [`tree::render_tree`]: draws a tree with statuses as indented text.

pub mod pretty;
pub mod recorder;
pub mod tree;
