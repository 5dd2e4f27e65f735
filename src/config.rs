use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FLOATING_SIZE, MIN_DRAG_DISTANCE};
use crate::error::DockResult;

/// What happens to windows owned by a window that is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Owned windows move to the closing window's own owner, or become
    /// unowned when it has none.
    #[default]
    Reparent,
    /// Owned windows are closed along with their owner.
    CascadeClose,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockOptions {
    /// Displacement in (columns, rows) that arms a drag.
    pub min_drag_distance: (u16, u16),
    /// Size of windows created by tearing an item off.
    pub floating_size: (u16, u16),
    pub orphan_policy: OrphanPolicy,
    /// Hoist the only child of a single-child splitter after a cascade.
    pub auto_simplify: bool,
    /// Torn-off windows are owned by the window they came from.
    pub own_floating_windows: bool,
}

impl Default for DockOptions {
    fn default() -> Self {
        Self {
            min_drag_distance: MIN_DRAG_DISTANCE,
            floating_size: DEFAULT_FLOATING_SIZE,
            orphan_policy: OrphanPolicy::default(),
            auto_simplify: true,
            own_floating_windows: true,
        }
    }
}

impl DockOptions {
    pub fn from_json_str(text: &str) -> DockResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> DockResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let options =
            DockOptions::from_json_str(r#"{ "orphan_policy": "cascade_close" }"#).unwrap();
        assert_eq!(options.orphan_policy, OrphanPolicy::CascadeClose);
        assert_eq!(options.min_drag_distance, MIN_DRAG_DISTANCE);
        assert!(options.auto_simplify);
    }

    #[test]
    fn malformed_config_is_a_serialization_error() {
        let err = DockOptions::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, crate::error::DockError::Serialization(_)));
    }
}
