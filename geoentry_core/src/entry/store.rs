// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays entry storage with allocation, topology, and field management.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{EntryId, INVALID};
use super::leaf::LeafConfig;
use super::path::check_segment;
use super::traverse::Children;
use crate::dirty;
use crate::error::ConfigError;
use crate::layer_type::{EntryType, GeoviewLayerType};
use crate::observer::{
    EntryObserver, HandlerId, ObserverId, Observers, StatusChangedEvent, TopologyEvent,
};
use crate::settings::InitialSettings;
use crate::status::LayerStatus;

/// Sibling scope used for layer id uniqueness.
#[derive(Clone, Copy, Debug)]
enum Scope {
    TopLevel,
    Under(u32),
}

/// What an entry is: a group of entries or one renderable layer.
#[derive(Clone, Debug, PartialEq)]
pub enum EntryKind {
    /// A group; its children live in the tree's topology arrays.
    Group,
    /// A leaf layer.
    Leaf(Box<LeafConfig>),
}

impl EntryKind {
    /// Returns the entry classification.
    #[must_use]
    pub fn entry_type(&self) -> EntryType {
        match self {
            Self::Group => EntryType::Group,
            Self::Leaf(leaf) => leaf.entry_type,
        }
    }

    /// Returns whether this is a group.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group)
    }

    /// Returns the leaf data, if this is a leaf.
    #[must_use]
    pub fn as_leaf(&self) -> Option<&LeafConfig> {
        match self {
            Self::Group => None,
            Self::Leaf(leaf) => Some(leaf),
        }
    }
}

/// The layer-entry configuration tree of one geoview layer.
///
/// Entries are addressed by [`EntryId`] handles. Internally, each entry
/// occupies a slot in parallel arrays. Destroyed entries are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// The tree owns every entry. A parent owns the order of its children; each
/// child only records its parent's slot index, which is used for layer paths
/// and status cascades, never for lifetime management.
///
/// An entry is in one of three places: under a group, in the ordered list of
/// top-level entries, or detached (freshly created, cloned, or removed).
/// Detached entries keep their data and subtree until they are attached
/// again or [destroyed](Self::destroy).
#[derive(Debug)]
pub struct EntryTree {
    // -- Geoview layer --
    pub(crate) geoview_layer_id: String,
    pub(crate) geoview_layer_name: Option<String>,
    pub(crate) geoview_layer_type: GeoviewLayerType,
    pub(crate) metadata_access_path: Option<String>,
    pub(crate) base_settings: InitialSettings,
    pub(crate) top_level: Vec<u32>,

    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Schema fields (set by callers) --
    pub(crate) layer_id: Vec<String>,
    pub(crate) layer_id_extension: Vec<Option<String>>,
    pub(crate) layer_name: Vec<Option<String>>,
    pub(crate) local_settings: Vec<InitialSettings>,
    pub(crate) min_scale: Vec<Option<f64>>,
    pub(crate) max_scale: Vec<Option<f64>>,
    pub(crate) metadata_group: Vec<bool>,
    pub(crate) kind: Vec<EntryKind>,

    // -- Lifecycle --
    pub(crate) status: Vec<LayerStatus>,

    // -- Derived (kept current by every mutation) --
    pub(crate) settings: Vec<InitialSettings>,
    pub(crate) layer_path: Vec<String>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Change tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) pending_added: Vec<EntryId>,
    pub(crate) pending_removed: Vec<EntryId>,

    // -- Notification --
    pub(crate) observers: Observers,
}

impl EntryTree {
    /// Creates an empty tree for the geoview layer `geoview_layer_id`.
    #[must_use]
    pub fn new(geoview_layer_id: impl Into<String>, geoview_layer_type: GeoviewLayerType) -> Self {
        Self {
            geoview_layer_id: geoview_layer_id.into(),
            geoview_layer_name: None,
            geoview_layer_type,
            metadata_access_path: None,
            base_settings: InitialSettings::default(),
            top_level: Vec::new(),
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            layer_id: Vec::new(),
            layer_id_extension: Vec::new(),
            layer_name: Vec::new(),
            local_settings: Vec::new(),
            min_scale: Vec::new(),
            max_scale: Vec::new(),
            metadata_group: Vec::new(),
            kind: Vec::new(),
            status: Vec::new(),
            settings: Vec::new(),
            layer_path: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            observers: Observers::default(),
        }
    }

    // -- Geoview layer API --

    /// Returns the geoview layer id, the prefix of every layer path.
    #[must_use]
    pub fn geoview_layer_id(&self) -> &str {
        &self.geoview_layer_id
    }

    /// Renames the geoview layer. Every cached layer path is refreshed.
    pub fn set_geoview_layer_id(&mut self, id: impl Into<String>) {
        self.geoview_layer_id = id.into();
        for idx in 0..self.len {
            if self.parent[idx as usize] == INVALID && self.alive[idx as usize] {
                self.refresh_paths(idx);
            }
        }
    }

    /// Returns the geoview layer's display name.
    #[must_use]
    pub fn geoview_layer_name(&self) -> Option<&str> {
        self.geoview_layer_name.as_deref()
    }

    /// Sets the geoview layer's display name.
    pub fn set_geoview_layer_name(&mut self, name: Option<String>) {
        self.geoview_layer_name = name;
    }

    /// Returns the service type every leaf of this tree is read from.
    #[must_use]
    pub fn geoview_layer_type(&self) -> GeoviewLayerType {
        self.geoview_layer_type
    }

    /// Returns the service root URL used when a leaf has no data access path.
    #[must_use]
    pub fn metadata_access_path(&self) -> Option<&str> {
        self.metadata_access_path.as_deref()
    }

    /// Sets the service root URL.
    pub fn set_metadata_access_path(&mut self, path: Option<String>) {
        self.metadata_access_path = path;
    }

    /// Returns the settings inherited by every top-level entry.
    #[must_use]
    pub fn base_settings(&self) -> &InitialSettings {
        &self.base_settings
    }

    /// Replaces the settings inherited by every top-level entry and
    /// re-merges the settings of all top-level subtrees.
    pub fn set_base_settings(&mut self, settings: InitialSettings) {
        self.base_settings = settings;
        for i in 0..self.top_level.len() {
            let idx = self.top_level[i];
            self.recompute_settings(idx);
            self.dirty.mark_with(idx, dirty::SETTINGS, &EagerPolicy);
        }
    }

    // -- Allocation API --

    /// Creates a detached group entry and returns its handle.
    pub fn create_group(&mut self, layer_id: impl Into<String>) -> EntryId {
        self.create_entry(layer_id.into(), EntryKind::Group)
    }

    /// Creates a detached leaf entry and returns its handle.
    pub fn create_leaf(&mut self, layer_id: impl Into<String>, leaf: LeafConfig) -> EntryId {
        self.create_entry(layer_id.into(), EntryKind::Leaf(Box::new(leaf)))
    }

    /// Creates a detached entry of the given kind.
    ///
    /// The entry starts with status [`NotSet`](LayerStatus::NotSet), no
    /// name, no scale bounds, and the tree's base settings. The layer id is
    /// checked when the entry is attached: an empty id or one containing `/`
    /// is refused there with [`ConfigError::InvalidConfiguration`].
    pub fn create_entry(&mut self, layer_id: String, kind: EntryKind) -> EntryId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.alive[i] = true;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.layer_id[i] = layer_id;
            self.layer_id_extension[i] = None;
            self.layer_name[i] = None;
            self.local_settings[i] = InitialSettings::default();
            self.min_scale[i] = None;
            self.max_scale[i] = None;
            self.metadata_group[i] = false;
            self.kind[i] = kind;
            self.status[i] = LayerStatus::NotSet;
            self.settings[i] = self.base_settings.clone();
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.layer_id.push(layer_id);
            self.layer_id_extension.push(None);
            self.layer_name.push(None);
            self.local_settings.push(InitialSettings::default());
            self.min_scale.push(None);
            self.max_scale.push(None);
            self.metadata_group.push(false);
            self.kind.push(kind);
            self.status.push(LayerStatus::NotSet);
            self.settings.push(self.base_settings.clone());
            self.layer_path.push(String::new());
            self.generation.push(0);
            self.alive.push(true);
            idx
        };
        self.refresh_paths(idx);

        let id = self.id_at(idx);
        self.pending_added.push(id);
        self.dirty.mark(idx, dirty::TOPOLOGY);
        id
    }

    /// Destroys an entry and its whole subtree, freeing the slots for reuse.
    ///
    /// An attached entry is detached first, which cascades status to its
    /// former parent. Per-entry status handlers of destroyed entries are
    /// dropped.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy(&mut self, id: EntryId) {
        self.validate(id);
        self.detach(id);

        let doomed = self.subtree_slots(id.idx);
        // Children first so parents never point at freed slots.
        for &idx in doomed.iter().rev() {
            self.dirty.remove_key(idx);
            self.observers.forget_entry(idx);
            let old = self.id_at(idx);
            self.generation[idx as usize] += 1;
            self.alive[idx as usize] = false;
            self.parent[idx as usize] = INVALID;
            self.first_child[idx as usize] = INVALID;
            self.next_sibling[idx as usize] = INVALID;
            self.prev_sibling[idx as usize] = INVALID;
            self.free_list.push(idx);
            self.pending_removed.push(old);
        }
        tracing::debug!(entry = ?id, freed = doomed.len(), "destroyed layer entry subtree");
    }

    /// Returns whether the given handle refers to a live entry.
    #[must_use]
    pub fn is_alive(&self, id: EntryId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    /// Returns the number of live entries, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns whether the tree holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Topology API --

    /// Appends a detached entry to the top-level entries.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DuplicateLayerId`] if another top-level entry has
    ///   the same path segment.
    /// - [`ConfigError::InvalidConfiguration`] if the layer id is empty or
    ///   the id or extension contains `/`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the entry is already attached.
    pub fn add_top_level(&mut self, entry: EntryId) -> Result<(), ConfigError> {
        self.validate(entry);
        let e = entry.idx;
        assert!(!self.is_attached_idx(e), "entry is already attached");
        self.check_unique(Some(Scope::TopLevel), e, e)?;

        self.top_level.push(e);
        self.after_attach(e, INVALID);
        Ok(())
    }

    /// Appends a detached entry as the last child of `group`.
    ///
    /// The child's settings are re-merged under the group, its layer paths
    /// are refreshed, and the group's status is recomputed.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::KindMismatch`] if `group` is a leaf.
    /// - [`ConfigError::DuplicateLayerId`] if a sibling has the same layer id.
    /// - [`ConfigError::InvalidConfiguration`] if `group` lies inside
    ///   `child`'s subtree, or if `child`'s layer id is empty or its id or
    ///   extension contains `/`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` is already attached.
    pub fn add_child(&mut self, group: EntryId, child: EntryId) -> Result<(), ConfigError> {
        self.validate(group);
        self.validate(child);
        let (p, c) = (group.idx, child.idx);
        assert!(!self.is_attached_idx(c), "child already has a parent");
        self.check_can_adopt(p, c)?;

        self.link_last(p, c);
        self.after_attach(c, p);
        Ok(())
    }

    /// Inserts a detached `entry` right before `sibling`, under the same
    /// parent (or among the top-level entries).
    ///
    /// # Errors
    ///
    /// Same as [`add_child`](Self::add_child), plus
    /// [`ConfigError::InvalidConfiguration`] if `sibling` is detached.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale or `entry` is already attached.
    pub fn insert_before(&mut self, entry: EntryId, sibling: EntryId) -> Result<(), ConfigError> {
        self.validate(entry);
        self.validate(sibling);
        let (e, s) = (entry.idx, sibling.idx);
        assert!(!self.is_attached_idx(e), "entry is already attached");

        let p = self.parent[s as usize];
        if p == INVALID {
            let Some(pos) = self.top_level.iter().position(|&t| t == s) else {
                return Err(ConfigError::invalid(
                    self.layer_path[s as usize].clone(),
                    "cannot insert next to a detached entry",
                ));
            };
            self.check_unique(Some(Scope::TopLevel), e, e)?;
            self.top_level.insert(pos, e);
        } else {
            self.check_can_adopt(p, e)?;
            self.parent[e as usize] = p;
            self.next_sibling[e as usize] = s;
            self.prev_sibling[e as usize] = self.prev_sibling[s as usize];
            if self.prev_sibling[s as usize] != INVALID {
                self.next_sibling[self.prev_sibling[s as usize] as usize] = e;
            } else {
                // `sibling` was the first child.
                self.first_child[p as usize] = e;
            }
            self.prev_sibling[s as usize] = e;
            let _ = self.dirty.add_dependency(e, p, dirty::SETTINGS);
        }
        self.after_attach(e, p);
        Ok(())
    }

    /// Removes the child with `layer_id` from `group` and returns it.
    ///
    /// The removed entry keeps its subtree and is left detached: its parent
    /// link is cleared, it no longer shows up among `group`'s children or
    /// anyone's siblings, and `group`'s status is recomputed from the
    /// remaining children before the cascade continues upward.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `group` has no such child.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn remove_child(&mut self, group: EntryId, layer_id: &str) -> Result<EntryId, ConfigError> {
        self.validate(group);
        let child = self.find_child(group, layer_id).ok_or_else(|| {
            ConfigError::not_found(alloc::format!(
                "{}/{layer_id}",
                self.layer_path[group.idx as usize]
            ))
        })?;
        self.detach(child);
        Ok(child)
    }

    /// Removes the top-level entry with `layer_id` and returns it detached.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if there is no such entry.
    pub fn remove_top_level(&mut self, layer_id: &str) -> Result<EntryId, ConfigError> {
        let idx = self
            .top_level
            .iter()
            .copied()
            .find(|&t| self.layer_id[t as usize] == layer_id)
            .ok_or_else(|| {
                ConfigError::not_found(alloc::format!("{}/{layer_id}", self.geoview_layer_id))
            })?;
        let id = self.id_at(idx);
        self.detach(id);
        Ok(id)
    }

    /// Detaches an entry from wherever it is attached. Does nothing for a
    /// detached entry.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn detach(&mut self, entry: EntryId) {
        self.validate(entry);
        let e = entry.idx;
        let p = self.parent[e as usize];
        if p != INVALID {
            self.unlink_from_parent(e);
            self.dirty.remove_dependency(e, p, dirty::SETTINGS);
            self.dirty.mark(p, dirty::TOPOLOGY);
        } else if let Some(pos) = self.top_level.iter().position(|&t| t == e) {
            self.top_level.remove(pos);
            self.dirty.mark(e, dirty::TOPOLOGY);
        } else {
            return;
        }
        self.refresh_paths(e);

        let parent = (p != INVALID).then(|| self.id_at(p));
        tracing::debug!(
            layer_path = %self.layer_path[e as usize],
            "detached layer entry"
        );
        self.observers.detached(&TopologyEvent {
            entry,
            layer_path: &self.layer_path[e as usize],
            parent,
        });

        if p != INVALID {
            self.recompute_group(p);
        }
    }

    /// Moves `entry` to be the last child of `new_parent`.
    ///
    /// If `entry` is attached elsewhere it is detached first, which cascades
    /// status to its old parent.
    ///
    /// # Errors
    ///
    /// Same as [`add_child`](Self::add_child). On error nothing moves.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn reparent(&mut self, entry: EntryId, new_parent: EntryId) -> Result<(), ConfigError> {
        self.validate(entry);
        self.validate(new_parent);
        if self.parent[entry.idx as usize] == new_parent.idx {
            return Ok(());
        }
        self.check_can_adopt(new_parent.idx, entry.idx)?;
        self.detach(entry);
        self.link_last(new_parent.idx, entry.idx);
        self.after_attach(entry.idx, new_parent.idx);
        Ok(())
    }

    /// Returns the parent of an entry, if any.
    #[must_use]
    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of an entry, in order.
    ///
    /// Leaves have no children.
    #[must_use]
    pub fn children(&self, id: EntryId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the number of direct children of an entry.
    #[must_use]
    pub fn child_count(&self, id: EntryId) -> usize {
        self.children(id).count()
    }

    /// Returns the top-level entries, in order.
    #[must_use]
    pub fn top_level(&self) -> Vec<EntryId> {
        self.top_level.iter().map(|&idx| self.id_at(idx)).collect()
    }

    /// Returns whether the entry sits under a parent or at the top level.
    #[must_use]
    pub fn is_attached(&self, id: EntryId) -> bool {
        self.validate(id);
        self.is_attached_idx(id.idx)
    }

    /// Returns the direct child of `parent` with the given layer id.
    #[must_use]
    pub fn find_child(&self, parent: EntryId, layer_id: &str) -> Option<EntryId> {
        self.children(parent)
            .find(|c| self.layer_id[c.idx as usize] == layer_id)
    }

    // -- Field getters --

    /// Returns the entry's layer id.
    #[must_use]
    pub fn layer_id(&self, id: EntryId) -> &str {
        self.validate(id);
        &self.layer_id[id.idx as usize]
    }

    /// Returns the suffix joined to the layer id in layer paths.
    #[must_use]
    pub fn layer_id_extension(&self, id: EntryId) -> Option<&str> {
        self.validate(id);
        self.layer_id_extension[id.idx as usize].as_deref()
    }

    /// Returns the entry's display name.
    #[must_use]
    pub fn layer_name(&self, id: EntryId) -> Option<&str> {
        self.validate(id);
        self.layer_name[id.idx as usize].as_deref()
    }

    /// Returns what the entry is.
    #[must_use]
    pub fn kind(&self, id: EntryId) -> &EntryKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    /// Returns the entry classification.
    #[must_use]
    pub fn entry_type(&self, id: EntryId) -> EntryType {
        self.kind(id).entry_type()
    }

    /// Returns whether the entry is a group.
    #[must_use]
    pub fn is_group(&self, id: EntryId) -> bool {
        self.kind(id).is_group()
    }

    /// Returns the leaf data of a leaf entry.
    #[must_use]
    pub fn leaf(&self, id: EntryId) -> Option<&LeafConfig> {
        self.kind(id).as_leaf()
    }

    /// Returns the merged initial settings (ancestors overridden by the
    /// entry's own).
    #[must_use]
    pub fn initial_settings(&self, id: EntryId) -> &InitialSettings {
        self.validate(id);
        &self.settings[id.idx as usize]
    }

    /// Returns the entry's own settings overrides, before merging.
    #[must_use]
    pub fn local_settings(&self, id: EntryId) -> &InitialSettings {
        self.validate(id);
        &self.local_settings[id.idx as usize]
    }

    /// Returns the minimum visible scale.
    #[must_use]
    pub fn min_scale(&self, id: EntryId) -> Option<f64> {
        self.validate(id);
        self.min_scale[id.idx as usize]
    }

    /// Returns the maximum visible scale.
    #[must_use]
    pub fn max_scale(&self, id: EntryId) -> Option<f64> {
        self.validate(id);
        self.max_scale[id.idx as usize]
    }

    /// Returns whether the entry is a group synthesized from service
    /// metadata, which may be regenerated.
    #[must_use]
    pub fn is_metadata_layer_group(&self, id: EntryId) -> bool {
        self.validate(id);
        self.metadata_group[id.idx as usize]
    }

    // -- Field setters --

    /// Changes the entry's layer id. Layer paths of the whole subtree change.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DuplicateLayerId`] if the resulting path segment
    ///   collides with a sibling's.
    /// - [`ConfigError::InvalidConfiguration`] if the id is empty or
    ///   contains `/`.
    ///
    /// Nothing changes on error.
    pub fn set_layer_id(&mut self, id: EntryId, layer_id: impl Into<String>) -> Result<(), ConfigError> {
        self.validate(id);
        let layer_id = layer_id.into();
        let old = core::mem::replace(&mut self.layer_id[id.idx as usize], layer_id);
        if let Err(err) = self.check_unique(self.scope_of(id.idx), id.idx, id.idx) {
            self.layer_id[id.idx as usize] = old;
            return Err(err);
        }
        self.refresh_paths(id.idx);
        self.mark_parent_topology(id.idx);
        Ok(())
    }

    /// Changes the suffix joined to the layer id in layer paths.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DuplicateLayerId`] if the resulting path segment
    ///   collides with a sibling's.
    /// - [`ConfigError::InvalidConfiguration`] if the extension contains `/`.
    ///
    /// Nothing changes on error.
    pub fn set_layer_id_extension(
        &mut self,
        id: EntryId,
        extension: Option<String>,
    ) -> Result<(), ConfigError> {
        self.validate(id);
        let old = core::mem::replace(&mut self.layer_id_extension[id.idx as usize], extension);
        if let Err(err) = self.check_unique(self.scope_of(id.idx), id.idx, id.idx) {
            self.layer_id_extension[id.idx as usize] = old;
            return Err(err);
        }
        self.refresh_paths(id.idx);
        self.mark_parent_topology(id.idx);
        Ok(())
    }

    /// Sets the display name.
    pub fn set_layer_name(&mut self, id: EntryId, name: Option<String>) {
        self.validate(id);
        self.layer_name[id.idx as usize] = name;
    }

    /// Sets the minimum visible scale.
    pub fn set_min_scale(&mut self, id: EntryId, scale: Option<f64>) {
        self.validate(id);
        self.min_scale[id.idx as usize] = scale;
        self.dirty.mark(id.idx, dirty::STYLE);
    }

    /// Sets the maximum visible scale.
    pub fn set_max_scale(&mut self, id: EntryId, scale: Option<f64>) {
        self.validate(id);
        self.max_scale[id.idx as usize] = scale;
        self.dirty.mark(id.idx, dirty::STYLE);
    }

    /// Marks or unmarks the entry as synthesized from service metadata.
    pub fn set_metadata_layer_group(&mut self, id: EntryId, value: bool) {
        self.validate(id);
        self.metadata_group[id.idx as usize] = value;
    }

    /// Replaces the entry's own settings overrides.
    ///
    /// Merged settings are recomputed for the entry and every descendant,
    /// and the SETTINGS channel is marked for the whole subtree.
    pub fn set_initial_settings(&mut self, id: EntryId, settings: InitialSettings) {
        self.validate(id);
        self.local_settings[id.idx as usize] = settings;
        self.recompute_settings(id.idx);
        self.dirty.mark_with(id.idx, dirty::SETTINGS, &EagerPolicy);
    }

    // -- Observer API --

    /// Registers an observer for every event of this tree.
    pub fn subscribe(&mut self, observer: Box<dyn EntryObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Removes an observer and hands it back.
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn EntryObserver>> {
        self.observers.unsubscribe(id)
    }

    /// Registers a handler called whenever `entry`'s status changes.
    ///
    /// The handler is dropped when the entry is destroyed. It is not copied
    /// by [`clone_subtree`](Self::clone_subtree).
    pub fn on_status_changed<F>(&mut self, entry: EntryId, handler: F) -> HandlerId
    where
        F: FnMut(&StatusChangedEvent<'_>) + Send + 'static,
    {
        self.validate(entry);
        self.observers.add_handler(entry.idx, Box::new(handler))
    }

    /// Removes a per-entry handler. Returns whether it was registered.
    pub fn remove_status_handler(&mut self, id: HandlerId) -> bool {
        self.observers.remove_handler(id)
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: EntryId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale EntryId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Returns the current handle for slot `idx`.
    pub(crate) fn id_at(&self, idx: u32) -> EntryId {
        EntryId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    pub(crate) fn is_attached_idx(&self, idx: u32) -> bool {
        self.parent[idx as usize] != INVALID || self.top_level.contains(&idx)
    }

    /// Returns the sibling scope of a slot. Detached slots have none.
    fn scope_of(&self, idx: u32) -> Option<Scope> {
        let p = self.parent[idx as usize];
        if p != INVALID {
            Some(Scope::Under(p))
        } else if self.top_level.contains(&idx) {
            Some(Scope::TopLevel)
        } else {
            None
        }
    }

    /// Fails if a slot in `scope` other than `skip` has the same path
    /// segment as `candidate`. Without a scope there is nothing to clash with.
    fn check_unique(
        &self,
        scope: Option<Scope>,
        candidate: u32,
        skip: u32,
    ) -> Result<(), ConfigError> {
        let c = candidate as usize;
        check_segment(
            &self.layer_id[c],
            self.layer_id_extension[c].as_deref(),
            &self.layer_path[c],
        )?;
        let Some(scope) = scope else {
            return Ok(());
        };
        let slots: Vec<u32> = match scope {
            Scope::Under(p) => Children::new(self, self.first_child[p as usize])
                .map(|c| c.idx)
                .collect(),
            Scope::TopLevel => self.top_level.clone(),
        };
        let clash = slots
            .into_iter()
            .filter(|&s| s != skip)
            .any(|s| self.segment_eq(s, candidate));
        if clash {
            let parent_path = match scope {
                Scope::Under(p) => self.layer_path[p as usize].clone(),
                Scope::TopLevel => self.geoview_layer_id.clone(),
            };
            return Err(ConfigError::DuplicateLayerId {
                parent_path,
                layer_id: self.layer_id[candidate as usize].clone(),
            });
        }
        Ok(())
    }

    /// Checks that `child` may become a child of `p`.
    fn check_can_adopt(&self, p: u32, child: u32) -> Result<(), ConfigError> {
        if !self.kind[p as usize].is_group() {
            return Err(ConfigError::mismatch(
                self.layer_path[p as usize].clone(),
                "a leaf entry cannot have children",
            ));
        }
        let mut cursor = p;
        while cursor != INVALID {
            if cursor == child {
                return Err(ConfigError::invalid(
                    self.layer_path[p as usize].clone(),
                    "an entry cannot be attached inside its own subtree",
                ));
            }
            cursor = self.parent[cursor as usize];
        }
        self.check_unique(Some(Scope::Under(p)), child, child)
    }

    /// Compares rendered segments, so `"a.b"` clashes with `"a"` + `"b"`.
    fn segment_eq(&self, a: u32, b: u32) -> bool {
        self.segment(a) == self.segment(b)
    }

    /// Links `c` as the last child of `p`.
    pub(crate) fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        // Child depends on parent for inherited settings.
        let _ = self.dirty.add_dependency(c, p, dirty::SETTINGS);
    }

    /// Common bookkeeping after `e` was linked under `p` (or `INVALID` for
    /// the top level).
    fn after_attach(&mut self, e: u32, p: u32) {
        self.recompute_settings(e);
        self.refresh_paths(e);
        self.dirty.mark_with(e, dirty::SETTINGS, &EagerPolicy);
        self.mark_parent_topology(e);

        let entry = self.id_at(e);
        let parent = (p != INVALID).then(|| self.id_at(p));
        tracing::debug!(layer_path = %self.layer_path[e as usize], "attached layer entry");
        self.observers.attached(&TopologyEvent {
            entry,
            layer_path: &self.layer_path[e as usize],
            parent,
        });

        if p != INVALID {
            self.recompute_group(p);
        }
    }

    fn mark_parent_topology(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        self.dirty.mark(if p == INVALID { idx } else { p }, dirty::TOPOLOGY);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            // Was first child.
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Re-merges settings for `idx` and its subtree, parent first.
    pub(crate) fn recompute_settings(&mut self, idx: u32) {
        for slot in self.subtree_slots(idx) {
            let p = self.parent[slot as usize];
            let inherited = if p == INVALID {
                &self.base_settings
            } else {
                &self.settings[p as usize]
            };
            let merged = inherited.merged_with(&self.local_settings[slot as usize]);
            self.settings[slot as usize] = merged;
        }
    }

    /// Returns `idx` and all its descendants in depth-first pre-order.
    pub(crate) fn subtree_slots(&self, idx: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![idx];
        while let Some(slot) = stack.pop() {
            out.push(slot);
            let mut child = self.first_child[slot as usize];
            let mut kids = Vec::new();
            while child != INVALID {
                kids.push(child);
                child = self.next_sibling[child as usize];
            }
            stack.extend(kids.into_iter().rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::entry::leaf::DataSource;

    fn tree() -> EntryTree {
        EntryTree::new("geo", GeoviewLayerType::GeoJson)
    }

    fn leaf(tree: &mut EntryTree, id: &str) -> EntryId {
        tree.create_leaf(id, LeafConfig::new(EntryType::Vector, DataSource::default()))
    }

    #[test]
    fn create_and_destroy() {
        let mut tree = tree();
        let id = leaf(&mut tree, "a");
        assert!(tree.is_alive(id));
        assert_eq!(tree.len(), 1);
        tree.destroy(id);
        assert!(!tree.is_alive(id));
        assert!(tree.is_empty());
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = tree();
        let id1 = leaf(&mut tree, "a");
        tree.destroy(id1);
        let id2 = leaf(&mut tree, "b");
        // id2 reuses the same slot but has a different generation.
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn add_child_and_query() {
        let mut tree = tree();
        let group = tree.create_group("g");
        let a = leaf(&mut tree, "a");
        let b = leaf(&mut tree, "b");
        tree.add_top_level(group).unwrap();
        tree.add_child(group, a).unwrap();
        tree.add_child(group, b).unwrap();

        assert_eq!(tree.parent(a), Some(group));
        assert_eq!(tree.parent(group), None);
        let kids: Vec<_> = tree.children(group).collect();
        assert_eq!(kids, vec![a, b]);
        assert_eq!(tree.find_child(group, "b"), Some(b));
        assert_eq!(tree.top_level(), vec![group]);
    }

    #[test]
    fn duplicate_sibling_id_is_rejected() {
        let mut tree = tree();
        let group = tree.create_group("g");
        let a = leaf(&mut tree, "a");
        let dup = leaf(&mut tree, "a");
        tree.add_child(group, a).unwrap();
        let err = tree.add_child(group, dup).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateLayerId { .. }));
        assert!(!tree.is_attached(dup), "failed add leaves entry detached");
    }

    #[test]
    fn same_id_under_different_parents_is_fine() {
        let mut tree = tree();
        let g1 = tree.create_group("g1");
        let g2 = tree.create_group("g2");
        let a1 = leaf(&mut tree, "0");
        let a2 = leaf(&mut tree, "0");
        tree.add_child(g1, a1).unwrap();
        tree.add_child(g2, a2).unwrap();
        assert_ne!(tree.layer_path(a1), tree.layer_path(a2));
    }

    #[test]
    fn dotted_id_clashes_with_extension() {
        let mut tree = tree();
        let g = tree.create_group("g");
        tree.add_top_level(g).unwrap();
        let dotted = tree.create_group("a.b");
        let plain = tree.create_group("a");
        tree.add_child(g, dotted).unwrap();
        tree.add_child(g, plain).unwrap();

        let err = tree
            .set_layer_id_extension(plain, Some("b".into()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateLayerId { .. }));
        assert_eq!(tree.layer_id_extension(plain), None, "rolled back");
        assert_eq!(tree.layer_path(plain), "geo/g/a");

        let extended = tree.create_group("a");
        tree.set_layer_id_extension(extended, Some("b".into())).unwrap();
        let err = tree.add_child(g, extended).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateLayerId { .. }));
        assert_eq!(tree.find_by_path("geo/g/a.b"), Some(dotted));
    }

    #[test]
    fn separator_in_layer_id_is_refused() {
        let mut tree = tree();
        let g = tree.create_group("g");
        tree.add_top_level(g).unwrap();
        let a = tree.create_group("a.b");
        tree.add_child(g, a).unwrap();

        let slashed = tree.create_group("g/a.b");
        let err = tree.add_top_level(slashed).unwrap_err();
        assert!(err.is_invalid_configuration());
        assert!(!tree.is_attached(slashed));

        let empty = tree.create_group("");
        assert!(tree.add_child(g, empty).unwrap_err().is_invalid_configuration());

        let err = tree.set_layer_id(a, "x/y").unwrap_err();
        assert!(err.is_invalid_configuration());
        assert_eq!(tree.layer_id(a), "a.b", "rolled back");

        let err = tree
            .set_layer_id_extension(a, Some("1/2".into()))
            .unwrap_err();
        assert!(err.is_invalid_configuration());
        assert_eq!(tree.layer_path(a), "geo/g/a.b");
        assert_eq!(tree.find_by_path("geo/g/a.b"), Some(a));
    }

    #[test]
    fn freed_slots_are_skipped_after_rename() {
        let mut tree = tree();
        let g = tree.create_group("g");
        let a = leaf(&mut tree, "a");
        tree.add_child(g, a).unwrap();
        let loose = leaf(&mut tree, "loose");
        tree.destroy(g);
        assert!(!tree.is_alive(g));
        assert!(!tree.is_alive(a));
        assert_eq!(tree.len(), 1);

        tree.set_geoview_layer_id("renamed");
        assert_eq!(tree.layer_path(loose), "renamed/loose");
    }

    #[test]
    fn leaf_cannot_adopt() {
        let mut tree = tree();
        let a = leaf(&mut tree, "a");
        let b = leaf(&mut tree, "b");
        let err = tree.add_child(a, b).unwrap_err();
        assert!(matches!(err, ConfigError::KindMismatch { .. }));
    }

    #[test]
    fn cannot_attach_inside_own_subtree() {
        let mut tree = tree();
        let outer = tree.create_group("outer");
        let inner = tree.create_group("inner");
        tree.add_child(outer, inner).unwrap();
        let err = tree.reparent(outer, inner).unwrap_err();
        assert!(err.is_invalid_configuration());
        assert_eq!(tree.parent(inner), Some(outer), "nothing moved");
    }

    #[test]
    fn remove_child_detaches() {
        let mut tree = tree();
        let group = tree.create_group("g");
        let a = leaf(&mut tree, "a");
        let b = leaf(&mut tree, "b");
        tree.add_child(group, a).unwrap();
        tree.add_child(group, b).unwrap();

        let removed = tree.remove_child(group, "a").unwrap();
        assert_eq!(removed, a);
        assert_eq!(tree.parent(a), None);
        assert!(!tree.is_attached(a));
        assert_eq!(tree.children(group).collect::<Vec<_>>(), vec![b]);
        assert_eq!(tree.layer_path(a), "geo/a", "detached path has no ancestors");
    }

    #[test]
    fn remove_missing_child_is_not_found() {
        let mut tree = tree();
        let group = tree.create_group("g");
        let err = tree.remove_child(group, "nope").unwrap_err();
        assert_eq!(err, ConfigError::not_found("geo/g/nope"));
        assert!(tree.remove_top_level("nope").is_err());
    }

    #[test]
    fn insert_before_works() {
        let mut tree = tree();
        let group = tree.create_group("g");
        let a = leaf(&mut tree, "a");
        let b = leaf(&mut tree, "b");
        let c = leaf(&mut tree, "c");
        tree.add_child(group, a).unwrap();
        tree.add_child(group, c).unwrap();
        tree.insert_before(b, c).unwrap();
        assert_eq!(tree.children(group).collect::<Vec<_>>(), vec![a, b, c]);

        let t1 = leaf(&mut tree, "t1");
        let t0 = leaf(&mut tree, "t0");
        tree.add_top_level(t1).unwrap();
        tree.insert_before(t0, t1).unwrap();
        assert_eq!(tree.top_level(), vec![t0, t1]);
    }

    #[test]
    fn reparent_works() {
        let mut tree = tree();
        let g1 = tree.create_group("g1");
        let g2 = tree.create_group("g2");
        let child = leaf(&mut tree, "c");
        tree.add_child(g1, child).unwrap();

        tree.reparent(child, g2).unwrap();
        assert_eq!(tree.parent(child), Some(g2));
        assert!(tree.children(g1).next().is_none());
        assert_eq!(tree.layer_path(child), "geo/g2/c");
    }

    #[test]
    fn destroy_frees_subtree() {
        let mut tree = tree();
        let group = tree.create_group("g");
        let a = leaf(&mut tree, "a");
        tree.add_top_level(group).unwrap();
        tree.add_child(group, a).unwrap();
        tree.destroy(group);
        assert!(!tree.is_alive(group));
        assert!(!tree.is_alive(a));
        assert!(tree.top_level().is_empty());
    }

    #[test]
    fn set_layer_id_rejects_collisions() {
        let mut tree = tree();
        let group = tree.create_group("g");
        let a = leaf(&mut tree, "a");
        let b = leaf(&mut tree, "b");
        tree.add_child(group, a).unwrap();
        tree.add_child(group, b).unwrap();
        assert!(tree.set_layer_id(b, "a").is_err());
        assert_eq!(tree.layer_id(b), "b");
        tree.set_layer_id(b, "c").unwrap();
        assert_eq!(tree.layer_path(b), "geo/g/c");
    }

    #[test]
    fn settings_merge_through_ancestors() {
        use crate::settings::LayerStates;

        let mut tree = tree();
        tree.set_base_settings(InitialSettings {
            min_zoom: Some(2.0),
            ..InitialSettings::default()
        });
        let group = tree.create_group("g");
        let a = leaf(&mut tree, "a");
        tree.set_initial_settings(
            group,
            InitialSettings {
                states: Some(LayerStates {
                    visible: Some(false),
                    ..LayerStates::default()
                }),
                ..InitialSettings::default()
            },
        );
        tree.add_top_level(group).unwrap();
        tree.add_child(group, a).unwrap();
        assert_eq!(tree.initial_settings(a).min_zoom, Some(2.0));
        assert!(!tree.initial_settings(a).is_visible());

        // Changing the group re-merges the child.
        tree.set_initial_settings(group, InitialSettings::default());
        assert!(tree.initial_settings(a).is_visible());
        assert_eq!(tree.local_settings(a), &InitialSettings::default());
    }

    #[test]
    #[should_panic(expected = "stale EntryId")]
    fn destroyed_handle_panics_on_parent() {
        let mut tree = tree();
        let id = leaf(&mut tree, "a");
        tree.destroy(id);
        let _ = tree.parent(id);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn attaching_twice_panics() {
        let mut tree = tree();
        let g1 = tree.create_group("g1");
        let g2 = tree.create_group("g2");
        let a = leaf(&mut tree, "a");
        tree.add_child(g1, a).unwrap();
        let _ = tree.add_child(g2, a);
    }
}
