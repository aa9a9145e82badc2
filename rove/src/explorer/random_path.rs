//! `Explorer` that samples a state by random-walking the process tree.

use rand::Rng;

use crate::explorer::{Explorer, ExplorerResult, SharedRng};
use crate::ptree::{PTreeNodeIx, SharedPTree, WalkerTag};
use crate::state::StateRef;

/// Walks the shared process tree from the root, flipping an unbiased coin
/// at every split, restricted to edges this walker owns, until it reaches a
/// leaf holding a live state.
///
/// That samples a state with probability proportional to the share of the
/// *whole* search space below it, not to how many siblings currently exist
/// at each level — a deliberately different fairness property than flat
/// weighting, favoring states near the root of sparse subtrees.
///
/// Ownership bits are maintained in `update`: an edge is claimed when a
/// branch happens under this walker's subtree and released once the subtree
/// below it holds no state this walker tracks.
pub struct RandomPathExplorer {
    tree: SharedPTree,
    rng: SharedRng,
    tag: WalkerTag,
}

impl RandomPathExplorer {
    /// Registers a walker on the shared tree. Fails once the tree's fixed
    /// tag space is exhausted.
    pub fn new(tree: SharedPTree, rng: SharedRng) -> ExplorerResult<RandomPathExplorer> {
        let tag = tree.borrow_mut().register_walker()?;
        Ok(RandomPathExplorer { tree, rng, tag })
    }

    pub fn tag(&self) -> WalkerTag {
        self.tag
    }
}

impl Explorer for RandomPathExplorer {
    fn select(&mut self) -> StateRef {
        let tree = self.tree.borrow();
        let mut node = tree.root();
        assert!(
            tree.owned(node, self.tag),
            "select on an empty RandomPathExplorer"
        );
        loop {
            if let Some(es) = tree.state_of(node) {
                return es.clone();
            }
            let owned: Vec<PTreeNodeIx> = tree
                .children(node)
                .filter(|&c| tree.owned(c, self.tag))
                .collect();
            node = match owned.len() {
                1 => owned[0],
                2 => owned[self.rng.borrow_mut().gen_range(0..2)],
                _ => panic!("tree walk reached a subtree with no owned children"),
            };
        }
    }

    fn update(&mut self, _current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        let mut tree = self.tree.borrow_mut();
        for es in added {
            let leaf = es
                .ptree_node()
                .expect("added state has no process-tree node");
            tree.claim_upward(leaf, self.tag);
        }
        for es in removed {
            let leaf = es
                .ptree_node()
                .expect("removed state has no process-tree node");
            tree.release_upward(leaf, self.tag);
        }
    }

    fn is_empty(&self) -> bool {
        let tree = self.tree.borrow();
        !tree.owned(tree.root(), self.tag)
    }

    fn describe(&self) -> String {
        format!("RandomPathExplorer({})", self.tag)
    }
}

impl Drop for RandomPathExplorer {
    fn drop(&mut self) {
        self.tree.borrow_mut().release_walker(self.tag);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::explorer::seeded_rng;
    use crate::ptree::PTree;
    use crate::state::ExecutionState;

    #[test]
    fn walk_reaches_every_tracked_state() {
        let s0 = ExecutionState::new();
        let tree = PTree::shared(&s0);
        let rng = seeded_rng(21);
        let mut walker = RandomPathExplorer::new(tree.clone(), rng).unwrap();
        assert!(walker.is_empty());
        walker.update(None, &[s0.clone()], &[]);
        assert!(!walker.is_empty());

        // Branch twice: s0 -> {s1, s0'}, s1 -> {s2, s1'}.
        let s1 = s0.fork();
        tree.borrow_mut()
            .attach(s0.ptree_node().unwrap(), &s1, &s0);
        walker.update(Some(&s0), &[s1.clone()], &[]);

        let s2 = s1.fork();
        tree.borrow_mut()
            .attach(s1.ptree_node().unwrap(), &s2, &s1);
        walker.update(Some(&s1), &[s2.clone()], &[]);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..128 {
            seen.insert(walker.select().id());
        }
        assert!(seen.contains(&s0.id()));
        assert!(seen.contains(&s1.id()));
        assert!(seen.contains(&s2.id()));
    }

    #[test]
    fn walkers_see_disjoint_subsets() {
        let s0 = ExecutionState::new();
        let tree = PTree::shared(&s0);
        let rng = seeded_rng(22);
        let mut all = RandomPathExplorer::new(tree.clone(), rng.clone()).unwrap();
        let mut partial = RandomPathExplorer::new(tree.clone(), rng).unwrap();

        all.update(None, &[s0.clone()], &[]);
        partial.update(None, &[s0.clone()], &[]);

        let s1 = s0.fork();
        tree.borrow_mut()
            .attach(s0.ptree_node().unwrap(), &s1, &s0);
        // Only `all` learns about the branch.
        all.update(Some(&s0), &[s1.clone()], &[]);
        partial.update(Some(&s0), &[], &[]);

        for _ in 0..64 {
            assert_ne!(partial.select().id(), s1.id());
        }
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            seen.insert(all.select().id());
        }
        assert!(seen.contains(&s1.id()));
    }

    #[test]
    fn removal_releases_the_subtree() {
        let s0 = ExecutionState::new();
        let tree = PTree::shared(&s0);
        let mut walker = RandomPathExplorer::new(tree.clone(), seeded_rng(23)).unwrap();
        walker.update(None, &[s0.clone()], &[]);

        let s1 = s0.fork();
        tree.borrow_mut()
            .attach(s0.ptree_node().unwrap(), &s1, &s0);
        walker.update(Some(&s0), &[s1.clone()], &[]);

        walker.update(None, &[], &[s1.clone()]);
        for _ in 0..32 {
            assert_eq!(walker.select().id(), s0.id());
        }
        walker.update(None, &[], &[s0]);
        assert!(walker.is_empty());
    }

    #[test]
    fn pruning_the_last_leaf_leaves_the_walker_empty() {
        let s0 = ExecutionState::new();
        let tree = PTree::shared(&s0);
        let mut walker = RandomPathExplorer::new(tree.clone(), seeded_rng(25)).unwrap();
        walker.update(None, &[s0.clone()], &[]);

        // The last state dies and its node is pruned from the tree; the
        // walker must report empty, not trip over the vacated root.
        walker.update(None, &[], std::slice::from_ref(&s0));
        tree.borrow_mut().remove(s0.ptree_node().unwrap());
        assert!(walker.is_empty());
    }

    #[test]
    fn dropping_a_walker_frees_its_tag() {
        let s0 = ExecutionState::new();
        let tree = PTree::shared(&s0);
        let rng = seeded_rng(24);
        let tag = {
            let walker = RandomPathExplorer::new(tree.clone(), rng.clone()).unwrap();
            walker.tag()
        };
        let fresh = RandomPathExplorer::new(tree, rng).unwrap();
        assert_eq!(fresh.tag(), tag);
    }
}
