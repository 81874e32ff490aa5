// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{EntryId, INVALID};
use super::store::EntryTree;

/// An iterator over the direct children of an entry.
///
/// Created by [`EntryTree::children`].
#[derive(Debug)]
pub struct Children<'a> {
    tree: &'a EntryTree,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a EntryTree, first: u32) -> Self {
        Self {
            tree,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = EntryId;

    fn next(&mut self) -> Option<EntryId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.tree.next_sibling[idx as usize];
        Some(self.tree.id_at(idx))
    }
}

/// A depth-first pre-order iterator over a set of subtrees.
///
/// Created by [`EntryTree::descendants`] and [`EntryTree::iter`]. Children
/// are visited in order, so the sequence matches legend order.
#[derive(Debug)]
pub struct Descendants<'a> {
    tree: &'a EntryTree,
    stack: Vec<u32>,
}

impl Iterator for Descendants<'_> {
    type Item = EntryId;

    fn next(&mut self) -> Option<EntryId> {
        let idx = self.stack.pop()?;
        let first = self.stack.len();
        let mut child = self.tree.first_child[idx as usize];
        while child != INVALID {
            self.stack.push(child);
            child = self.tree.next_sibling[child as usize];
        }
        // Pushed in order; reverse so the first child pops first.
        self.stack[first..].reverse();
        Some(self.tree.id_at(idx))
    }
}

impl EntryTree {
    /// Returns `id` followed by every entry below it, depth-first.
    #[must_use]
    pub fn descendants(&self, id: EntryId) -> Descendants<'_> {
        self.validate(id);
        Descendants {
            tree: self,
            stack: alloc::vec![id.idx],
        }
    }

    /// Returns every attached entry, depth-first, starting from the
    /// top-level entries in order. Detached entries are skipped.
    #[must_use]
    pub fn iter(&self) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: self.top_level.iter().rev().copied().collect(),
        }
    }
}
