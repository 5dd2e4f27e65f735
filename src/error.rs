use thiserror::Error;

use crate::ids::{NodeId, WindowKey};

pub type DockResult<T> = Result<T, DockError>;

/// Invalid edits of the dock tree. The tree is left untouched when one of
/// these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("node {child:?} is already attached to {parent:?}; detach it first")]
    AlreadyAttached { child: NodeId, parent: NodeId },
    #[error("single-child group {group:?} is occupied; use set_child to replace")]
    SingleChildOccupied { group: NodeId },
    #[error("{parent:?} cannot hold {child:?}")]
    InvalidChild { parent: NodeId, child: NodeId },
    #[error("inserting {child:?} into {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("index {index} out of range for {parent:?} with {len} children")]
    IndexOutOfRange {
        parent: NodeId,
        index: usize,
        len: usize,
    },
    #[error("identifier {0:?} is already in use")]
    DuplicateId(String),
}

#[derive(Debug, Error)]
pub enum DockError {
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error("{item:?} is not a member of tabbed group {group:?}")]
    InvalidSelection { group: NodeId, item: NodeId },
    #[error("window type {0:?} is not registered")]
    TypeResolution(String),
    #[error("window {window:?} is a {live:?}, layout recorded {recorded:?}")]
    WindowTypeMismatch {
        window: WindowKey,
        live: String,
        recorded: String,
    },
    #[error("invalid argument: {0}")]
    Argument(String),
    #[error("layout serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DockError {
    pub(crate) fn unknown_node(node: NodeId) -> Self {
        DockError::Argument(format!("unknown node {node:?}"))
    }

    pub(crate) fn unknown_window(window: WindowKey) -> Self {
        DockError::Argument(format!("unknown window {window:?}"))
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, DockError::Structure(_))
    }
}
