use crate::ids::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    ChildAdded {
        parent: NodeId,
        child: NodeId,
        index: usize,
    },
    ChildRemoved {
        parent: NodeId,
        child: NodeId,
        index: usize,
    },
    ChildCountChanged {
        group: NodeId,
        count: usize,
    },
    /// A group lost its last child and asks to be removed from its parent.
    NoChildren {
        group: NodeId,
    },
    SelectionChanged {
        group: NodeId,
        previous: Option<NodeId>,
        current: Option<NodeId>,
    },
    RemoveRequested {
        item: NodeId,
    },
    NodeDestroyed {
        node: NodeId,
    },
}

/// Presentation-list edit the host must mirror, in the order produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualOp {
    Attach {
        parent: NodeId,
        child: NodeId,
        index: usize,
    },
    Detach {
        parent: NodeId,
        child: NodeId,
    },
}
