// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Entry mutations mark one of these channels (via [`understory_dirty`]) so
//! that a UI store can ask for everything that changed since it last looked,
//! instead of rebuilding its view of the whole tree.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`SETTINGS`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and has dependency edges
//!   from child to parent, because merged initial settings are inherited.
//!   Changing a group's settings marks its whole subtree.
//! - **Local-only**: [`STATUS`], [`SOURCE`], and [`STYLE`] are marked with
//!   the default policy. A status cascade marks each ancestor it actually
//!   changed, one by one.
//! - **Structural**: [`TOPOLOGY`] is marked on the parent whenever children
//!   are added, removed, or reordered.
//!
//! # Consumption
//!
//! Callers never query dirty state directly. Each
//! [`EntryTree::drain_changes`](crate::entry::EntryTree::drain_changes) call
//! drains all channels into an [`EntryChanges`](crate::entry::EntryChanges).

use understory_dirty::Channel;

/// Status changed, directly or by cascade.
pub const STATUS: Channel = Channel::new(0);

/// Merged initial settings changed; propagates to descendants.
pub const SETTINGS: Channel = Channel::new(1);

/// Leaf data source changed (including data-access-path propagation).
pub const SOURCE: Channel = Channel::new(2);

/// Leaf style, filter, or filter equation changed.
pub const STYLE: Channel = Channel::new(3);

/// Child list changed: add, remove, or reorder.
pub const TOPOLOGY: Channel = Channel::new(4);
