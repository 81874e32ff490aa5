// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text rendering of a whole tree.
//!
//! ```text
//! geo (ogcFeature)
//! ├── g [group] loading
//! │   ├── a [vector] loaded
//! │   └── b [vector] loading
//! └── c [vector] notSet
//! ```

use std::fmt::Write as _;

use geoentry_core::entry::{EntryId, EntryTree};

/// Renders the attached entries of `tree` as indented text, one entry per
/// line with its entry type and status.
#[must_use]
pub fn render_tree(tree: &EntryTree) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({})",
        tree.geoview_layer_id(),
        tree.geoview_layer_type().as_str()
    );
    let top = tree.top_level();
    render_level(tree, &top, "", &mut out);
    out
}

/// Renders `id` and its subtree, with `id` itself as the first line.
#[must_use]
pub fn render_subtree(tree: &EntryTree, id: EntryId) -> String {
    let mut out = String::new();
    render_line(tree, id, &mut out);
    let children: Vec<_> = tree.children(id).collect();
    render_level(tree, &children, "", &mut out);
    out
}

fn render_level(tree: &EntryTree, ids: &[EntryId], prefix: &str, out: &mut String) {
    for (i, &id) in ids.iter().enumerate() {
        let last = i + 1 == ids.len();
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        render_line(tree, id, out);

        let children: Vec<_> = tree.children(id).collect();
        if !children.is_empty() {
            let nested = format!("{prefix}{}", if last { "    " } else { "│   " });
            render_level(tree, &children, &nested, out);
        }
    }
}

fn render_line(tree: &EntryTree, id: EntryId, out: &mut String) {
    let segment = geoentry_core::entry::path_segment(tree.layer_id(id), tree.layer_id_extension(id));
    let _ = writeln!(
        out,
        "{segment} [{}] {}",
        tree.entry_type(id).as_str(),
        tree.status(id)
    );
}
