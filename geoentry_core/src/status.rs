// Copyright 2026 the Geoentry Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer lifecycle status and the group cascade rule.
//!
//! A layer entry moves forward through
//! `NotSet → Registered → Processing → Processed → Loading → Loaded`.
//! [`LayerStatus::Error`] is a terminal side channel reachable from any
//! non-terminal state. It has no rank.
//!
//! Group status is never stored independently of its children in steady
//! state: [`cascade`] decides what a group's status becomes after one of its
//! children changed.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a layer entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayerStatus {
    /// Freshly constructed, nothing has happened yet.
    #[default]
    NotSet,
    /// Registered with the map's layer API.
    Registered,
    /// Service metadata is being fetched or processed.
    Processing,
    /// Metadata processing finished.
    Processed,
    /// Data is being fetched or rendered.
    Loading,
    /// Data is on the map.
    Loaded,
    /// The load attempt failed.
    Error,
}

impl LayerStatus {
    /// All statuses in lifecycle order, with `Error` last.
    pub const ALL: [Self; 7] = [
        Self::NotSet,
        Self::Registered,
        Self::Processing,
        Self::Processed,
        Self::Loading,
        Self::Loaded,
        Self::Error,
    ];

    /// Returns the lifecycle rank, or `None` for [`Error`](Self::Error).
    #[must_use]
    pub const fn rank(self) -> Option<u8> {
        match self {
            Self::NotSet => Some(0),
            Self::Registered => Some(1),
            Self::Processing => Some(2),
            Self::Processed => Some(3),
            Self::Loading => Some(4),
            Self::Loaded => Some(5),
            Self::Error => None,
        }
    }

    /// Returns whether this status is at least as advanced as `other`.
    ///
    /// `Error` satisfies every query since further progress is moot. Asking
    /// whether a non-error status is at least `Error` is always false.
    #[must_use]
    pub const fn is_at_least(self, other: Self) -> bool {
        match (self.rank(), other.rank()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a >= b,
        }
    }

    /// Returns whether this status ends a load attempt.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Error)
    }

    /// Returns the camel-case name used in serialized configurations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotSet => "notSet",
            Self::Registered => "registered",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies the group cascade rule to the statuses of a group's children.
///
/// Rules are evaluated in order:
///
/// 1. any child `Loading` → `Loading`;
/// 2. all children `Loaded` → `Loaded`;
/// 3. all children `Error` → `Error`;
/// 4. otherwise `None`: the group keeps its current status.
///
/// An empty child list matches none of the rules.
pub fn cascade<I>(children: I) -> Option<LayerStatus>
where
    I: IntoIterator<Item = LayerStatus>,
{
    let mut any = false;
    let mut all_loaded = true;
    let mut all_error = true;
    for status in children {
        any = true;
        match status {
            LayerStatus::Loading => return Some(LayerStatus::Loading),
            LayerStatus::Loaded => all_error = false,
            LayerStatus::Error => all_loaded = false,
            _ => {
                all_loaded = false;
                all_error = false;
            }
        }
    }
    if !any {
        None
    } else if all_loaded {
        Some(LayerStatus::Loaded)
    } else if all_error {
        Some(LayerStatus::Error)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LayerStatus::*;

    #[test]
    fn ranks_follow_lifecycle_order() {
        let ranked: alloc::vec::Vec<u8> = LayerStatus::ALL
            .iter()
            .filter_map(|s| s.rank())
            .collect();
        assert_eq!(ranked, [0, 1, 2, 3, 4, 5], "non-error ranks are ordered");
        assert_eq!(Error.rank(), None);
    }

    #[test]
    fn is_at_least_compares_ranks() {
        assert!(Loaded.is_at_least(Processed));
        assert!(Processed.is_at_least(Processed));
        assert!(!Registered.is_at_least(Loading));
    }

    #[test]
    fn error_satisfies_every_query() {
        for status in LayerStatus::ALL {
            assert!(Error.is_at_least(status), "error >= {status}");
        }
        assert!(!Loaded.is_at_least(Error));
    }

    #[test]
    fn any_loading_dominates() {
        assert_eq!(cascade([Loaded, Loading, Error]), Some(Loading));
    }

    #[test]
    fn unanimous_success_and_failure() {
        assert_eq!(cascade([Loaded, Loaded]), Some(Loaded));
        assert_eq!(cascade([Error, Error]), Some(Error));
    }

    #[test]
    fn mixed_terminal_states_leave_group_alone() {
        assert_eq!(cascade([Loaded, Error]), None);
        assert_eq!(cascade([Loaded, NotSet]), None);
        assert_eq!(cascade([Processing, Processed]), None);
    }

    #[test]
    fn empty_children_match_nothing() {
        assert_eq!(cascade([]), None);
    }

    #[test]
    fn serializes_as_camel_case() {
        let json = serde_json::to_string(&NotSet).unwrap();
        assert_eq!(json, "\"notSet\"");
        let back: LayerStatus = serde_json::from_str("\"processed\"").unwrap();
        assert_eq!(back, Processed);
    }
}
