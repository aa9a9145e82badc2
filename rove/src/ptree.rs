//! Shared process tree recording every branch between execution states.
//!
//! The tree is a binary branch history: a leaf holds a live state, an
//! internal node marks a past split. It is shared across the whole engine
//! (`SharedPTree`), and several tree-walking explorers may be registered on
//! it at the same time.
//!
//! Each walker gets a [`WalkerTag`], one bit in the per-node `owners` mask.
//! The mask on a node describes who owns the *edge entering that node* (the
//! root's mask stands in for the root edge). A walker may only traverse
//! edges it owns, which gives every walker its own consistent subgraph view
//! of the one shared tree even when the walkers track different state
//! subsets. The mask is an explicit side-table kept in the node weight, so
//! up to [`MAX_WALKERS`] walkers are supported; [`PTree::register_walker`]
//! refuses to hand out more tags than that.

use std::cell::RefCell;
use std::rc::Rc;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;

use crate::rove_trace;
use crate::state::StateRef;

/// Index of a node in the process tree.
pub type PTreeNodeIx = NodeIndex;

/// Shared handle to the process tree.
pub type SharedPTree = Rc<RefCell<PTree>>;

/// Maximum number of concurrently registered tree walkers, one bit each in
/// the per-node owner mask.
pub const MAX_WALKERS: u32 = 32;

/// Convenience alias for the process tree [Result](std::result::Result) type.
pub type PTreeResult<T> = std::result::Result<T, PTreeError>;

/// Error variants for the process tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PTreeError {
    WalkerLimit,
}

impl PTreeError {
    /// Gets the string representation of the error.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WalkerLimit => "ptree: All walker tags are taken",
        }
    }
}

impl std::fmt::Display for PTreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::error::Error for PTreeError {}

/// Single-bit ownership mask identifying one registered tree walker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WalkerTag(u32);

impl WalkerTag {
    fn mask(self) -> u32 {
        self.0
    }

    /// Index of the walker's bit, for diagnostics.
    pub fn index(self) -> u32 {
        self.0.trailing_zeros()
    }
}

impl std::fmt::Display for WalkerTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w{}", self.index())
    }
}

#[derive(Debug)]
struct PTreeNode {
    /// `Some` for leaves, `None` once the node has split.
    state: Option<StateRef>,
    /// Walkers owning the edge entering this node.
    owners: u32,
}

/// The branch-history tree itself.
#[derive(Debug)]
pub struct PTree {
    graph: StableDiGraph<PTreeNode, ()>,
    root: PTreeNodeIx,
    /// Tags currently handed out to walkers.
    registered: u32,
}

impl PTree {
    /// Builds a tree whose root leaf holds the initial state and records the
    /// back-reference on the state.
    pub fn new(initial: &StateRef) -> PTree {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(PTreeNode {
            state: Some(initial.clone()),
            owners: 0,
        });
        initial.set_ptree_node(Some(root));
        PTree {
            graph,
            root,
            registered: 0,
        }
    }

    /// `new`, wrapped for sharing with the engine and every walker.
    pub fn shared(initial: &StateRef) -> SharedPTree {
        Rc::new(RefCell::new(PTree::new(initial)))
    }

    pub fn root(&self) -> PTreeNodeIx {
        self.root
    }

    /// The state held by a leaf, `None` for internal nodes.
    pub fn state_of(&self, node: PTreeNodeIx) -> Option<&StateRef> {
        self.graph[node].state.as_ref()
    }

    pub fn parent(&self, node: PTreeNodeIx) -> Option<PTreeNodeIx> {
        self.graph.neighbors_directed(node, Direction::Incoming).next()
    }

    pub fn children(&self, node: PTreeNodeIx) -> impl Iterator<Item = PTreeNodeIx> + '_ {
        self.graph.neighbors_directed(node, Direction::Outgoing)
    }

    pub fn is_leaf(&self, node: PTreeNodeIx) -> bool {
        self.children(node).next().is_none()
    }

    /// Whether `tag` owns the edge entering `node`.
    pub fn owned(&self, node: PTreeNodeIx, tag: WalkerTag) -> bool {
        self.graph[node].owners & tag.mask() != 0
    }

    /// Hands out the next free walker tag.
    pub fn register_walker(&mut self) -> PTreeResult<WalkerTag> {
        for bit in 0..MAX_WALKERS {
            let mask = 1u32 << bit;
            if self.registered & mask == 0 {
                self.registered |= mask;
                rove_trace!("ptree_register_walker|w{}", bit);
                return Ok(WalkerTag(mask));
            }
        }
        Err(PTreeError::WalkerLimit)
    }

    /// Returns a tag to the allocator, wiping any ownership bits the walker
    /// left behind.
    pub fn release_walker(&mut self, tag: WalkerTag) {
        assert!(
            self.registered & tag.mask() != 0,
            "release of an unregistered walker tag {}",
            tag
        );
        self.registered &= !tag.mask();
        let nodes: Vec<PTreeNodeIx> = self.graph.node_indices().collect();
        for node in nodes {
            self.graph[node].owners &= !tag.mask();
        }
        rove_trace!("ptree_release_walker|{}", tag);
    }

    /// Splits a leaf: `node` becomes internal and grows two fresh leaves,
    /// one for `new_state` (the branched-off child) and one for
    /// `trunk_state` (the state that just split and keeps running).
    ///
    /// The trunk leaf inherits the owner mask of the edge entering `node`,
    /// so every walker that could reach the old leaf can still reach the
    /// relocated state. The new leaf starts unowned; each walker claims it
    /// when the state shows up in its `added` notification.
    pub fn attach(
        &mut self,
        node: PTreeNodeIx,
        new_state: &StateRef,
        trunk_state: &StateRef,
    ) -> (PTreeNodeIx, PTreeNodeIx) {
        assert!(self.is_leaf(node), "attach requires a leaf node");
        let inherited = self.graph[node].owners;
        self.graph[node].state = None;
        let fresh = self.graph.add_node(PTreeNode {
            state: Some(new_state.clone()),
            owners: 0,
        });
        let trunk = self.graph.add_node(PTreeNode {
            state: Some(trunk_state.clone()),
            owners: inherited,
        });
        self.graph.add_edge(node, fresh, ());
        self.graph.add_edge(node, trunk, ());
        new_state.set_ptree_node(Some(fresh));
        trunk_state.set_ptree_node(Some(trunk));
        (fresh, trunk)
    }

    /// Removes a dead leaf, pruning upward through internal nodes left
    /// childless. Every walker must have released the subtree first.
    ///
    /// The root node is never physically removed: pruning the last live leaf
    /// leaves it behind as an empty, unowned leaf, so the tree handle (and
    /// every state's `ptree_node` back-reference into it) stays valid after
    /// the population drains.
    pub fn remove(&mut self, node: PTreeNodeIx) {
        let mut cursor = Some(node);
        while let Some(ix) = cursor {
            assert!(self.is_leaf(ix), "remove requires a childless node");
            assert_eq!(
                self.graph[ix].owners, 0,
                "removed node is still owned by a walker"
            );
            if ix == self.root {
                self.graph[ix].state = None;
                break;
            }
            let parent = self.parent(ix);
            self.graph.remove_node(ix);
            cursor = parent.filter(|&p| self.is_leaf(p));
        }
    }

    /// Claims the edges from `leaf` upward for `tag`, stopping at the first
    /// edge the walker already owns.
    pub fn claim_upward(&mut self, leaf: PTreeNodeIx, tag: WalkerTag) {
        let mut cursor = Some(leaf);
        while let Some(ix) = cursor {
            if self.owned(ix, tag) {
                break;
            }
            self.graph[ix].owners |= tag.mask();
            cursor = self.parent(ix);
        }
    }

    /// Releases the edges from `leaf` upward for `tag`, stopping once a node
    /// still has an owned child (the subtree is not yet entirely dead for
    /// this walker).
    pub fn release_upward(&mut self, leaf: PTreeNodeIx, tag: WalkerTag) {
        let mut cursor = Some(leaf);
        while let Some(ix) = cursor {
            let owned_child = self.children(ix).any(|c| self.owned(c, tag));
            if owned_child {
                break;
            }
            assert!(self.owned(ix, tag), "release of an unowned subtree");
            self.graph[ix].owners &= !tag.mask();
            cursor = self.parent(ix);
        }
    }
}
