// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer-entry configuration tree for web map viewers.
//!
//! `geoentry_core` describes which geospatial layers and layer groups belong
//! to a map, in what order, under what parent, and in what lifecycle state.
//! It does no network I/O and renders nothing: loaders and UI stores are
//! collaborators that call into the tree. It is `no_std` compatible (with
//! `alloc`) and uses struct-of-arrays storage with generational index
//! handles.
//!
//! # Architecture
//!
//! A raw map configuration flows through the builder into a tree, which
//! loaders then drive and UI stores watch:
//!
//! ```text
//!   raw record (JSON)
//!       │
//!       ▼
//!   EntryTreeBuilder::build() ──► EntryTree ──► to_json()
//!                                   ▲    │
//!   loader ── set_status() ─────────┘    ├──► EntryObserver / status handlers
//!                                        │
//!                                        └──► drain_changes() ──► EntryChanges
//! ```
//!
//! **[`entry`]**: the [`EntryTree`](entry::EntryTree) arena with generational
//! [`EntryId`](entry::EntryId) handles, layer paths, the status cascade,
//! group lookups, leaf data, deep clones, and change draining.
//!
//! **[`status`]**: the [`LayerStatus`](status::LayerStatus) lifecycle and the
//! group [`cascade`](status::cascade) rule.
//!
//! **[`settings`]**: inheritable [`InitialSettings`](settings::InitialSettings).
//!
//! **[`layer_type`]**: geoview layer types and the explicit
//! [`EntryTypeRegistry`](layer_type::EntryTypeRegistry).
//!
//! **[`build`]** / **[`export`]**: construction from and export to raw
//! records.
//!
//! **[`fields`]**: schema-field traits shared by raw records and built
//! entries.
//!
//! **[`observer`]**: the [`EntryObserver`](observer::EntryObserver) trait and
//! event types.
//!
//! **[`dirty`]**: change-tracking channels via `understory_dirty`.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies and
//!   the [`SharedEntryTree`](shared::SharedEntryTree) lock wrapper.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod build;
pub mod dirty;
pub mod entry;
pub mod error;
pub mod export;
pub mod fields;
pub mod layer_type;
pub mod observer;
pub mod settings;
#[cfg(feature = "std")]
pub mod shared;
pub mod status;

pub use build::{BuildOutcome, EntryTreeBuilder, RejectedEntry};
pub use entry::{EntryId, EntryTree};
pub use error::ConfigError;
pub use status::LayerStatus;
