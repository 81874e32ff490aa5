// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording with JSON-lines output.
//!
//! [`RecorderObserver`] implements [`EntryObserver`] and appends every event
//! to a shared buffer as an owned [`RecordedEvent`]. The tree owns the boxed
//! observer once it is subscribed, so recording goes through a cloneable
//! handle: keep one clone, subscribe the other, and read the events back
//! from the clone you kept.

use std::io::{self, Write};
use std::sync::Arc;

use geoentry_core::entry::EntryId;
use geoentry_core::observer::{EntryObserver, StatusChangedEvent, TopologyEvent};
use geoentry_core::LayerStatus;
use parking_lot::Mutex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// RecordedEvent
// ---------------------------------------------------------------------------

/// Slot index and generation of an entry at the time of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RecordedId {
    /// Slot index.
    pub index: u32,
    /// Slot generation.
    pub generation: u32,
}

impl From<EntryId> for RecordedId {
    fn from(id: EntryId) -> Self {
        Self {
            index: id.index(),
            generation: id.generation(),
        }
    }
}

/// An owned copy of one observer event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum RecordedEvent {
    /// An entry's status changed.
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        /// The entry.
        entry: RecordedId,
        /// Its layer path at the time.
        layer_path: String,
        /// Status before the change.
        previous: LayerStatus,
        /// Status after the change.
        status: LayerStatus,
        /// Whether the change came from the group cascade.
        cascaded: bool,
    },
    /// An entry was attached.
    #[serde(rename_all = "camelCase")]
    Attached {
        /// The entry.
        entry: RecordedId,
        /// Its layer path after attaching.
        layer_path: String,
        /// The new parent, `None` at the top level.
        parent: Option<RecordedId>,
    },
    /// An entry was detached.
    #[serde(rename_all = "camelCase")]
    Detached {
        /// The entry.
        entry: RecordedId,
        /// Its layer path after detaching.
        layer_path: String,
        /// The former parent, `None` at the top level.
        parent: Option<RecordedId>,
    },
}

impl RecordedEvent {
    /// Returns the layer path carried by the event.
    #[must_use]
    pub fn layer_path(&self) -> &str {
        match self {
            Self::StatusChanged { layer_path, .. }
            | Self::Attached { layer_path, .. }
            | Self::Detached { layer_path, .. } => layer_path,
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderObserver
// ---------------------------------------------------------------------------

/// An [`EntryObserver`] that keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct RecorderObserver {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecorderObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Returns the number of events recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Removes and returns all recorded events.
    pub fn take(&self) -> Vec<RecordedEvent> {
        core::mem::take(&mut *self.events.lock())
    }

    /// Writes the recorded events as JSON lines, one object per line.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_json_lines<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for event in self.events.lock().iter() {
            serde_json::to_writer(&mut writer, event)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Returns the recorded events as JSON lines.
    #[must_use]
    pub fn to_json_lines(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec only fails on serialization errors, which the
        // event types cannot produce.
        let _ = self.write_json_lines(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.lock().push(event);
    }
}

impl EntryObserver for RecorderObserver {
    fn on_status_changed(&mut self, e: &StatusChangedEvent<'_>) {
        self.push(RecordedEvent::StatusChanged {
            entry: e.entry.into(),
            layer_path: e.layer_path.to_owned(),
            previous: e.previous,
            status: e.status,
            cascaded: e.cascaded,
        });
    }

    fn on_entry_attached(&mut self, e: &TopologyEvent<'_>) {
        self.push(RecordedEvent::Attached {
            entry: e.entry.into(),
            layer_path: e.layer_path.to_owned(),
            parent: e.parent.map(Into::into),
        });
    }

    fn on_entry_detached(&mut self, e: &TopologyEvent<'_>) {
        self.push(RecordedEvent::Detached {
            entry: e.entry.into(),
            layer_path: e.layer_path.to_owned(),
            parent: e.parent.map(Into::into),
        });
    }
}
