// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types surfaced by tree construction and mutation.
//!
//! Status cascades never produce errors: they only read node state that was
//! already validated when the node entered the tree. The only way an entry
//! reaches [`LayerStatus::Error`](crate::status::LayerStatus::Error) is an
//! explicit call to [`EntryTree::set_status`](crate::entry::EntryTree::set_status).
//!
//! Stale [`EntryId`](crate::entry::EntryId) handles are programmer errors and
//! panic instead of returning a [`ConfigError`].

use alloc::string::String;

use thiserror::Error;

/// Errors produced while building or editing a layer-entry tree.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A layer path or layer id did not resolve to any entry.
    #[error("no layer entry found for '{target}'")]
    NotFound {
        /// The path or id that was looked up.
        target: String,
    },

    /// The geoview layer type has no registered entry classification.
    #[error("geoview layer type '{layer_type}' is not supported")]
    NotSupported {
        /// The layer type as written in the configuration.
        layer_type: String,
    },

    /// Two siblings share the same layer id.
    #[error("duplicate layer id '{layer_id}' under '{parent_path}'")]
    DuplicateLayerId {
        /// The path of the parent (or the geoview layer id for top-level entries).
        parent_path: String,
        /// The repeated layer id.
        layer_id: String,
    },

    /// An entry flagged as a group carries leaf-only fields, or the reverse.
    #[error("entry '{layer_path}' mixes group and leaf fields: {reason}")]
    KindMismatch {
        /// Path of the offending entry.
        layer_path: String,
        /// What was inconsistent.
        reason: String,
    },

    /// A required field is missing or has the wrong shape.
    #[error("invalid configuration at '{layer_path}': {reason}")]
    InvalidConfiguration {
        /// Path of the offending entry, or the closest known ancestor path.
        layer_path: String,
        /// What was wrong.
        reason: String,
    },
}

impl ConfigError {
    /// Returns `true` for the variants that signal an invalid configuration
    /// (duplicate ids, group/leaf mismatches, malformed fields).
    #[must_use]
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateLayerId { .. }
                | Self::KindMismatch { .. }
                | Self::InvalidConfiguration { .. }
        )
    }

    pub(crate) fn not_found(target: impl Into<String>) -> Self {
        Self::NotFound {
            target: target.into(),
        }
    }

    pub(crate) fn invalid(layer_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            layer_path: layer_path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(layer_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KindMismatch {
            layer_path: layer_path.into(),
            reason: reason.into(),
        }
    }
}
