//! Identifiers used by the dock engine.
//!
//! There are two families:
//! - arena keys ([`NodeId`], [`WindowKey`]) that identify live objects inside
//!   one [`crate::window::DockManager`] and are never persisted;
//! - string identifiers ([`DockId`], [`WindowId`], [`ItemId`]) that survive a
//!   save/restore cycle and are used to cross-reference windows, groups and
//!   items in a [`crate::serialization::DockLayout`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::StructureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u64);

impl NodeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowKey(pub(crate) u64);

impl WindowKey {
    pub fn raw(self) -> u64 {
        self.0
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Serialization id of a dock group, independent of its tree position.
    DockId
);
string_id!(
    /// Serialization id of a window.
    WindowId
);
string_id!(
    /// Application-supplied id of a dock item.
    ItemId
);

/// Hands out unique [`DockId`]s and [`WindowId`]s and tracks the ones in use.
#[derive(Debug, Default)]
pub struct IdRegistry {
    dock_ids: BTreeSet<DockId>,
    window_ids: BTreeSet<WindowId>,
    next_seq: u64,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_free<T: Ord>(
        next_seq: &mut u64,
        used: &BTreeSet<T>,
        prefix: &str,
        make: impl Fn(String) -> T,
    ) -> T {
        loop {
            *next_seq = next_seq.saturating_add(1);
            let candidate = make(format!("{prefix}_{}", next_seq));
            if !used.contains(&candidate) {
                return candidate;
            }
        }
    }

    pub fn generate_dock_id(&mut self, prefix: &str) -> DockId {
        let id = Self::next_free(&mut self.next_seq, &self.dock_ids, prefix, DockId::new);
        self.dock_ids.insert(id.clone());
        id
    }

    pub fn generate_window_id(&mut self) -> WindowId {
        let id = Self::next_free(
            &mut self.next_seq,
            &self.window_ids,
            "Window",
            WindowId::new,
        );
        self.window_ids.insert(id.clone());
        id
    }

    pub fn claim_dock_id(&mut self, id: &DockId) -> Result<(), StructureError> {
        if !self.dock_ids.insert(id.clone()) {
            return Err(StructureError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    pub fn claim_window_id(&mut self, id: &WindowId) -> Result<(), StructureError> {
        if !self.window_ids.insert(id.clone()) {
            return Err(StructureError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    pub fn release_dock_id(&mut self, id: &DockId) -> bool {
        self.dock_ids.remove(id)
    }

    pub fn release_window_id(&mut self, id: &WindowId) -> bool {
        self.window_ids.remove(id)
    }

    pub fn dock_id_in_use(&self, id: &DockId) -> bool {
        self.dock_ids.contains(id)
    }

    pub fn window_id_in_use(&self, id: &WindowId) -> bool {
        self.window_ids.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_skip_claimed_values() {
        let mut ids = IdRegistry::new();
        ids.claim_dock_id(&DockId::new("Tabbed_1")).unwrap();
        let next = ids.generate_dock_id("Tabbed");
        assert_eq!(next.as_str(), "Tabbed_2");
        assert!(ids.dock_id_in_use(&DockId::new("Tabbed_1")));
    }

    #[test]
    fn duplicate_claim_is_rejected() {
        let mut ids = IdRegistry::new();
        let w = ids.generate_window_id();
        assert!(matches!(
            ids.claim_window_id(&w),
            Err(StructureError::DuplicateId(_))
        ));
        assert!(ids.release_window_id(&w));
        assert!(ids.claim_window_id(&w).is_ok());
    }

    #[test]
    fn string_ids_serialize_transparently() {
        let id = ItemId::new("editor");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"editor\"");
    }
}
