//! `Explorer` that advances states in non-decreasing branch depth.

use std::collections::VecDeque;

use crate::explorer::Explorer;
use crate::state::StateRef;

/// Breadth-first exploration: first in, first out. New states join the back
/// of the queue, selection happens at the front, trading peak memory for
/// uniform coverage depth. When the engine branches several times on one
/// instruction all children share a depth, so queue order and branch depth
/// agree.
#[derive(Default)]
pub struct BfsExplorer {
    states: VecDeque<StateRef>,
}

impl BfsExplorer {
    pub fn new() -> BfsExplorer {
        BfsExplorer {
            states: VecDeque::new(),
        }
    }
}

impl Explorer for BfsExplorer {
    fn select(&mut self) -> StateRef {
        self.states
            .front()
            .cloned()
            .expect("select on an empty BfsExplorer")
    }

    fn update(&mut self, current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        // A state that just branched is as deep as its new children; requeue
        // it behind them so selection stays in branch-depth order.
        if let Some(current) = current {
            if !added.is_empty() && !removed.contains(current) {
                let pos = self
                    .states
                    .iter()
                    .position(|s| s == current)
                    .expect("current state not tracked by BfsExplorer");
                self.states.remove(pos);
                self.states.push_back(current.clone());
            }
        }
        self.states.extend(added.iter().cloned());
        for es in removed {
            if self.states.front() == Some(es) {
                self.states.pop_front();
            } else {
                let pos = self
                    .states
                    .iter()
                    .position(|s| s == es)
                    .expect("removed state not tracked by BfsExplorer");
                self.states.remove(pos);
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn describe(&self) -> String {
        "BfsExplorer".to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::ExecutionState;

    #[test]
    fn first_in_first_out() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let mut bfs = BfsExplorer::new();
        bfs.update(None, &[a.clone(), b.clone()], &[]);

        assert_eq!(bfs.select().id(), a.id());
        bfs.update(None, &[], &[a]);
        assert_eq!(bfs.select().id(), b.id());
    }

    #[test]
    fn branching_state_moves_behind_its_children() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let mut bfs = BfsExplorer::new();
        bfs.update(None, &[a.clone(), b.clone()], &[]);

        // `a` steps and branches into `c`: both now sit behind `b`.
        let c = a.fork();
        bfs.update(Some(&a), &[c.clone()], &[]);
        assert_eq!(bfs.select().id(), b.id());

        bfs.update(None, &[], &[b]);
        assert_eq!(bfs.select().id(), a.id());
        bfs.update(None, &[], &[a]);
        assert_eq!(bfs.select().id(), c.id());
    }

    #[test]
    fn stepping_without_a_branch_keeps_order() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let mut bfs = BfsExplorer::new();
        bfs.update(None, &[a.clone(), b.clone()], &[]);

        bfs.update(Some(&a), &[], &[]);
        assert_eq!(bfs.select().id(), a.id());
    }
}
