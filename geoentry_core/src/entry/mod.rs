// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer-entry tree data model.
//!
//! An *entry* is a node in the configuration tree of one geoview layer. Each
//! entry has:
//!
//! - An identity ([`EntryId`]), a generational handle that becomes stale when
//!   the entry is destroyed, and a [layer path](EntryTree::layer_path), the
//!   `/`-joined chain of layer ids from the geoview layer id down.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree. Child order is legend order and is preserved by cloning and
//!   export.
//! - **Schema fields** set by the caller: layer id and name, scale bounds,
//!   [initial settings](EntryTree::set_initial_settings), and for leaves a
//!   [`LeafConfig`] with source, style, and filter.
//! - **Derived state** kept current by every mutation: merged initial
//!   settings (ancestors overridden by the entry) and cached layer paths.
//! - A [`LayerStatus`](crate::status::LayerStatus), set by the loading
//!   pipeline on leaves and cascaded up to groups synchronously.
//!
//! Entries are stored in struct-of-arrays layout with index-based handles.
//!
//! # Change tracking
//!
//! Mutations mark dirty channels (see [`dirty`](crate::dirty)) that
//! [`drain_changes`](EntryTree::drain_changes) turns into an
//! [`EntryChanges`] set. Observers registered with
//! [`subscribe`](EntryTree::subscribe) are told about the same changes as
//! they happen.

mod cascade;
mod changes;
mod clone;
mod group;
mod id;
mod leaf;
mod leaf_ops;
mod path;
mod store;
mod traverse;

pub use changes::EntryChanges;
pub use id::{EntryId, INVALID};
pub use leaf::{DataSource, FilterEquation, LeafConfig, SourceDetails, TimeDimension};
pub use path::{SEPARATOR, join_layer_path, path_segment};
pub(crate) use path::check_segment;
pub use store::{EntryKind, EntryTree};
pub use traverse::{Children, Descendants};
