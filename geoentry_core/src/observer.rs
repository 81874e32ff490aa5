// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notification for layer entries.
//!
//! UI stores and diagnostics learn about tree changes in two ways:
//!
//! - An [`EntryObserver`] registered with
//!   [`EntryTree::subscribe`](crate::entry::EntryTree::subscribe) sees every
//!   event of the tree. All methods default to no-ops, so implementing only
//!   the events you care about is fine.
//! - A per-entry handler registered with
//!   [`EntryTree::on_status_changed`](crate::entry::EntryTree::on_status_changed)
//!   sees status changes of that one entry.
//!
//! Both are called synchronously, inside the mutation that caused the event
//! and before it returns. Events carry plain data and never the tree itself.
//! Observers and handlers must not mutate the tree that called them. With a
//! `SharedEntryTree` (feature `std`) the lock is held during the call and is
//! not reentrant, so locking the same tree from an observer deadlocks.
//! Record what happened and act on it after the mutation returns.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::entry::EntryId;
use crate::status::LayerStatus;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when an entry's status changes.
#[derive(Clone, Copy, Debug)]
pub struct StatusChangedEvent<'a> {
    /// The entry whose status changed.
    pub entry: EntryId,
    /// Its layer path at the time of the change.
    pub layer_path: &'a str,
    /// Status before the change.
    pub previous: LayerStatus,
    /// Status after the change.
    pub status: LayerStatus,
    /// Whether the change was derived from children rather than set
    /// directly.
    pub cascaded: bool,
}

/// Emitted when an entry is attached to or detached from the tree.
#[derive(Clone, Copy, Debug)]
pub struct TopologyEvent<'a> {
    /// The entry that moved.
    pub entry: EntryId,
    /// Its layer path after the move.
    pub layer_path: &'a str,
    /// The parent it was attached to or detached from, `None` for
    /// top-level entries.
    pub parent: Option<EntryId>,
}

// ---------------------------------------------------------------------------
// EntryObserver trait
// ---------------------------------------------------------------------------

/// Receives events from an [`EntryTree`](crate::entry::EntryTree).
pub trait EntryObserver: Send {
    /// Called after an entry's status changed.
    fn on_status_changed(&mut self, e: &StatusChangedEvent<'_>) {
        _ = e;
    }

    /// Called after an entry was attached under a parent or at the top level.
    fn on_entry_attached(&mut self, e: &TopologyEvent<'_>) {
        _ = e;
    }

    /// Called after an entry was detached from its parent or the top level.
    fn on_entry_detached(&mut self, e: &TopologyEvent<'_>) {
        _ = e;
    }
}

/// An [`EntryObserver`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl EntryObserver for NoopObserver {}

/// Handle returned by [`EntryTree::subscribe`](crate::entry::EntryTree::subscribe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Handle returned by
/// [`EntryTree::on_status_changed`](crate::entry::EntryTree::on_status_changed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Boxed per-entry status handler.
pub type StatusHandler = Box<dyn FnMut(&StatusChangedEvent<'_>) + Send>;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registered observers and per-entry handlers of one tree.
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn EntryObserver>)>,
    handlers: Vec<(HandlerId, u32, StatusHandler)>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("observers", &self.observers.len())
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Box<dyn EntryObserver>) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn EntryObserver>> {
        let pos = self.observers.iter().position(|(o, _)| *o == id)?;
        Some(self.observers.remove(pos).1)
    }

    pub(crate) fn add_handler(&mut self, idx: u32, handler: StatusHandler) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.handlers.push((id, idx, handler));
        id
    }

    pub(crate) fn remove_handler(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _, _)| *h != id);
        self.handlers.len() != before
    }

    /// Drops every handler attached to slot `idx`.
    pub(crate) fn forget_entry(&mut self, idx: u32) {
        self.handlers.retain(|(_, i, _)| *i != idx);
    }

    pub(crate) fn status_changed(&mut self, e: &StatusChangedEvent<'_>) {
        for (_, observer) in &mut self.observers {
            observer.on_status_changed(e);
        }
        for (_, idx, handler) in &mut self.handlers {
            if *idx == e.entry.idx {
                handler(e);
            }
        }
    }

    pub(crate) fn attached(&mut self, e: &TopologyEvent<'_>) {
        for (_, observer) in &mut self.observers {
            observer.on_entry_attached(e);
        }
    }

    pub(crate) fn detached(&mut self, e: &TopologyEvent<'_>) {
        for (_, observer) in &mut self.observers {
            observer.on_entry_detached(e);
        }
    }
}
