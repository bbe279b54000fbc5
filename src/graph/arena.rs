//! Arena-indexed node storage (§9 redesign note: "cyclic graphs with
//! shared-ownership nodes → model as arena").
//!
//! `MethodCallGraph` (in [`crate::model`]) is the sealed, public
//! representation — a `BTreeMap<MethodId, MethodNode>` plus two
//! `BTreeMap<MethodId, BTreeSet<MethodId>>` adjacency maps, ordered by
//! `MethodId` so the cache's serialized blobs are byte-identical across
//! independent builds of the same content (§8 "cache determinism"). The
//! arena here is the
//! *construction-time* representation: nodes are pushed into an
//! append-only vector and referenced by a compact `NodeIndex` while edges
//! are being resolved, so building never needs `Rc`/`RefCell` cycles or
//! `Arc`-shared mutable nodes — only integers. [`Arena::seal`] performs the
//! one-time conversion into the public `MethodCallGraph` shape.

use crate::methodid::MethodId;
use crate::model::{MethodCallGraph, MethodNode};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

#[derive(Default)]
pub struct Arena {
    nodes: Vec<MethodNode>,
    index_of: HashMap<MethodId, NodeIndex>,
    forward: Vec<HashSet<NodeIndex>>,
    reverse: Vec<HashSet<NodeIndex>>,
}

impl Arena {
    pub fn new() -> Self {
        Arena::default()
    }

    /// Insert a node if its id isn't already present; returns its index
    /// either way. Call-graph construction may observe the same method
    /// more than once when resolving edges before node enumeration is
    /// complete, so this is idempotent by id.
    pub fn insert_node(&mut self, node: MethodNode) -> NodeIndex {
        if let Some(&idx) = self.index_of.get(&node.id) {
            return idx;
        }
        let idx = NodeIndex(self.nodes.len() as u32);
        self.index_of.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.forward.push(HashSet::new());
        self.reverse.push(HashSet::new());
        idx
    }

    pub fn index_for(&self, id: &MethodId) -> Option<NodeIndex> {
        self.index_of.get(id).copied()
    }

    /// Add a forward edge and its transpose in the same call, so the
    /// §8 invariant `∀ (a,b) ∈ forward ⇔ (b,a) ∈ reverse` holds by
    /// construction — there is no path that adds one without the other.
    pub fn add_edge(&mut self, caller: NodeIndex, callee: NodeIndex) {
        self.forward[caller.0 as usize].insert(callee);
        self.reverse[callee.0 as usize].insert(caller);
    }

    /// Consume the arena into the sealed, public `MethodCallGraph`
    /// representation (§4.3 Phase D).
    pub fn seal(self) -> MethodCallGraph {
        let mut nodes = BTreeMap::new();
        let mut forward = BTreeMap::new();
        let mut reverse = BTreeMap::new();

        let ids: Vec<MethodId> = self.nodes.iter().map(|n| n.id.clone()).collect();

        for (i, node) in self.nodes.into_iter().enumerate() {
            let id = ids[i].clone();
            let callees: BTreeSet<MethodId> = self.forward[i].iter().map(|idx| ids[idx.0 as usize].clone()).collect();
            let callers: BTreeSet<MethodId> = self.reverse[i].iter().map(|idx| ids[idx.0 as usize].clone()).collect();
            if !callees.is_empty() {
                forward.insert(id.clone(), callees);
            }
            if !callers.is_empty() {
                reverse.insert(id.clone(), callers);
            }
            nodes.insert(id, node);
        }

        MethodCallGraph {
            nodes,
            forward,
            reverse,
            diagnostics: crate::error::Diagnostics::default(),
        }
    }
}
