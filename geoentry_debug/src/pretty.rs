// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable event output.
//!
//! [`PrettyPrintObserver`] implements [`EntryObserver`] and writes one line
//! per event to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use geoentry_core::observer::{EntryObserver, StatusChangedEvent, TopologyEvent};

/// Writes human-readable event lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintObserver<W: Write + Send = Box<dyn Write + Send>> {
    writer: W,
}

impl<W: Write + Send> std::fmt::Debug for PrettyPrintObserver<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintObserver").finish_non_exhaustive()
    }
}

impl PrettyPrintObserver {
    /// Creates an observer that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates an observer that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> PrettyPrintObserver<W> {
    /// Creates an observer that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the observer and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn topology_line(&mut self, tag: &str, e: &TopologyEvent<'_>) {
        let _ = match e.parent {
            Some(parent) => writeln!(
                self.writer,
                "[{tag}] {} parent={}:{}",
                e.layer_path,
                parent.index(),
                parent.generation()
            ),
            None => writeln!(self.writer, "[{tag}] {} top-level", e.layer_path),
        };
    }
}

impl<W: Write + Send> EntryObserver for PrettyPrintObserver<W> {
    fn on_status_changed(&mut self, e: &StatusChangedEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[status] {} {} -> {}{}",
            e.layer_path,
            e.previous,
            e.status,
            if e.cascaded { " (cascaded)" } else { "" }
        );
    }

    fn on_entry_attached(&mut self, e: &TopologyEvent<'_>) {
        self.topology_line("attach", e);
    }

    fn on_entry_detached(&mut self, e: &TopologyEvent<'_>) {
        self.topology_line("detach", e);
    }
}

#[cfg(test)]
mod tests {
    use geoentry_core::entry::EntryTree;
    use geoentry_core::layer_type::GeoviewLayerType;
    use geoentry_core::LayerStatus;

    use super::*;

    #[test]
    fn pretty_print_status() {
        let mut observer = PrettyPrintObserver::with_writer(Vec::<u8>::new());
        let mut tree = EntryTree::new("geo", GeoviewLayerType::Csv);
        let id = tree.create_group("g");
        observer.on_status_changed(&StatusChangedEvent {
            entry: id,
            layer_path: "geo/g",
            previous: LayerStatus::Loading,
            status: LayerStatus::Loaded,
            cascaded: true,
        });
        let output = String::from_utf8(observer.into_writer()).unwrap();
        assert_eq!(output, "[status] geo/g loading -> loaded (cascaded)\n");
    }

    #[test]
    fn pretty_print_topology() {
        let mut observer = PrettyPrintObserver::with_writer(Vec::<u8>::new());
        let mut tree = EntryTree::new("geo", GeoviewLayerType::Csv);
        let group = tree.create_group("g");
        observer.on_entry_attached(&TopologyEvent {
            entry: group,
            layer_path: "geo/g",
            parent: None,
        });
        let child = tree.create_group("c");
        observer.on_entry_detached(&TopologyEvent {
            entry: child,
            layer_path: "geo/c",
            parent: Some(group),
        });
        let output = String::from_utf8(observer.into_writer()).unwrap();
        assert!(output.contains("[attach] geo/g top-level"), "got: {output}");
        assert!(output.contains("[detach] geo/c parent=0:0"), "got: {output}");
    }
}
