//! `Explorer` that advances the most recently discovered state first.

use crate::explorer::Explorer;
use crate::state::StateRef;

/// Depth-first exploration: states are kept in arrival order and the last
/// one is selected until it branches or terminates. Matches call-stack-like
/// exploration and keeps the peak live-state count low on tree-shaped
/// search spaces.
#[derive(Default)]
pub struct DfsExplorer {
    states: Vec<StateRef>,
}

impl DfsExplorer {
    pub fn new() -> DfsExplorer {
        DfsExplorer { states: Vec::new() }
    }
}

impl Explorer for DfsExplorer {
    fn select(&mut self) -> StateRef {
        self.states
            .last()
            .cloned()
            .expect("select on an empty DfsExplorer")
    }

    fn update(&mut self, _current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        self.states.extend(added.iter().cloned());
        for es in removed {
            // The dying state is almost always the one being re-selected at
            // the tail, so check there before scanning.
            if self.states.last() == Some(es) {
                self.states.pop();
            } else {
                let pos = self
                    .states
                    .iter()
                    .position(|s| s == es)
                    .expect("removed state not tracked by DfsExplorer");
                self.states.remove(pos);
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn describe(&self) -> String {
        "DfsExplorer".to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::state::ExecutionState;

    #[test]
    fn last_in_first_out() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let c = ExecutionState::new();
        let mut dfs = DfsExplorer::new();
        assert!(dfs.is_empty());

        dfs.update(None, &[a.clone(), b.clone(), c.clone()], &[]);
        let first = dfs.select();
        assert_eq!(first.id(), c.id());

        dfs.update(None, &[], &[c]);
        let second = dfs.select();
        assert_eq!(second.id(), b.id());

        dfs.update(None, &[], &[b]);
        let third = dfs.select();
        assert_eq!(third.id(), a.id());
    }

    #[test]
    fn removal_away_from_the_tail() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let c = ExecutionState::new();
        let mut dfs = DfsExplorer::new();
        dfs.update(None, &[a.clone(), b.clone(), c.clone()], &[]);

        dfs.update(None, &[], &[a.clone()]);
        assert_eq!(dfs.select().id(), c.id());
        dfs.update(None, &[], &[c, b]);
        assert!(dfs.is_empty());
    }

    #[test]
    #[should_panic(expected = "select on an empty DfsExplorer")]
    fn empty_select_is_fatal() {
        DfsExplorer::new().select();
    }
}
