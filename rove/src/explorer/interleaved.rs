//! Decorator that cycles between several child explorers round-robin.

use crate::explorer::Explorer;
use crate::state::StateRef;

/// Round-robin over two or more fully independent children. Every child
/// receives every notification, so all populations stay in lock-step with
/// the true global population; each `select` consults exactly one child.
///
/// The rotation starts at the second child so the first is not always
/// favored on ties. Because of the lock-step populations, emptiness of the
/// first child implies emptiness of all — `is_empty` leans on that.
pub struct InterleavedExplorer {
    children: Vec<Box<dyn Explorer>>,
    index: usize,
}

impl InterleavedExplorer {
    pub fn new(children: Vec<Box<dyn Explorer>>) -> InterleavedExplorer {
        assert!(
            children.len() >= 2,
            "InterleavedExplorer needs at least two children"
        );
        InterleavedExplorer { children, index: 1 }
    }
}

impl Explorer for InterleavedExplorer {
    fn select(&mut self) -> StateRef {
        let ix = self.index;
        self.index = (self.index + 1) % self.children.len();
        self.children[ix].select()
    }

    fn update(&mut self, current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        for child in &mut self.children {
            child.update(current, added, removed);
        }
    }

    fn is_empty(&self) -> bool {
        self.children[0].is_empty()
    }

    fn describe(&self) -> String {
        let inner: Vec<String> = self.children.iter().map(|c| c.describe()).collect();
        format!(
            "<InterleavedExplorer> {} children:\n{}\n</InterleavedExplorer>",
            self.children.len(),
            inner.join("\n")
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::explorer::bfs::BfsExplorer;
    use crate::explorer::dfs::DfsExplorer;
    use crate::state::ExecutionState;

    #[test]
    fn rotation_starts_at_the_second_child() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        // Child 0 picks from the tail, child 1 from the front; which child
        // answered is visible in the returned state.
        let mut interleaved = InterleavedExplorer::new(vec![
            Box::new(DfsExplorer::new()),
            Box::new(BfsExplorer::new()),
        ]);
        interleaved.update(None, &[a.clone(), b.clone()], &[]);

        assert_eq!(interleaved.select().id(), a.id(), "BFS child goes first");
        assert_eq!(interleaved.select().id(), b.id(), "then the DFS child");
        assert_eq!(interleaved.select().id(), a.id(), "and around again");
    }

    #[test]
    fn all_children_hear_every_notification() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let mut interleaved = InterleavedExplorer::new(vec![
            Box::new(DfsExplorer::new()),
            Box::new(BfsExplorer::new()),
        ]);
        interleaved.update(None, &[a.clone(), b.clone()], &[]);
        interleaved.update(None, &[], &[a.clone()]);

        // Both rotations now land on `b`, from either child.
        assert_eq!(interleaved.select().id(), b.id());
        assert_eq!(interleaved.select().id(), b.id());

        interleaved.update(None, &[], &[b]);
        assert!(interleaved.is_empty());
    }

    #[test]
    #[should_panic(expected = "at least two children")]
    fn a_single_child_is_rejected() {
        InterleavedExplorer::new(vec![Box::new(DfsExplorer::new())]);
    }
}
