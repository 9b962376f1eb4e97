/// Stable identity of a syntax node within one parsed file.
///
/// Ids are handed out in parse order, so they double as a pre-order index.
/// Nodes created by the rewriter carry [`NodeId::SYNTHETIC`] and are never
/// keys of a context table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const SYNTHETIC: NodeId = NodeId(u32::MAX);

    pub fn is_synthetic(self) -> bool {
        self == Self::SYNTHETIC
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

/// Monotonic [`NodeId`] allocator
#[derive(Debug, Default)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn count(&self) -> u32 {
        self.next
    }
}
