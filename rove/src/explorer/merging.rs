//! Decorator providing the pause/resume primitive for state merging.
//!
//! When a state reaches a program point that waits for siblings from the
//! same fork to converge, the external merge coordinator parks it here until
//! the rest of its merge group catches up. Deciding *when* states merge and
//! performing the merge are the coordinator's job; this decorator only keeps
//! paused states out of scheduling and tracks which siblings each group is
//! still waiting for.
//!
//! The coordinator talks to the scheduler through a cloneable
//! [`MergingHandle`] rather than reaching into the decorator, so the same
//! object can sit inside a decorator chain (as a boxed [`Explorer`]) and on
//! the coordinator's desk at once.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::explorer::Explorer;
use crate::rove_trace;
use crate::state::StateRef;

/// Identifier of one ongoing merge: the set of states that forked from a
/// common ancestor at an open-merge point and have not all reached the
/// matching close-merge point yet.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MergeGroupId(u64);

impl fmt::Display for MergeGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mg{}", self.0)
    }
}

/// The pause/resume decorator itself. Usually driven through a
/// [`MergingHandle`].
pub struct MergingExplorer {
    base: Box<dyn Explorer>,
    paused: Vec<StateRef>,
    groups: HashMap<MergeGroupId, HashSet<StateRef>>,
    next_group: u64,
}

impl MergingExplorer {
    pub fn new(base: Box<dyn Explorer>) -> MergingExplorer {
        MergingExplorer {
            base,
            paused: Vec::new(),
            groups: HashMap::new(),
            next_group: 0,
        }
    }

    /// Removes a state from scheduling while it waits at a merge point. The
    /// engine keeps the state alive; only the scheduler forgets it for now.
    pub fn pause(&mut self, es: &StateRef) {
        assert!(
            !self.paused.contains(es),
            "pause on already-paused state {}",
            es.id()
        );
        rove_trace!("sched_pause|{}", es.id());
        self.paused.push(es.clone());
        self.base.update(None, &[], std::slice::from_ref(es));
    }

    /// Puts a paused state back into scheduling.
    pub fn resume(&mut self, es: &StateRef) {
        let pos = self
            .paused
            .iter()
            .position(|s| s == es)
            .expect("resume on a state that is not paused");
        rove_trace!("sched_resume|{}", es.id());
        self.paused.remove(pos);
        self.base.update(None, std::slice::from_ref(es), &[]);
    }

    pub fn is_paused(&self, es: &StateRef) -> bool {
        self.paused.contains(es)
    }

    /// Opens a new merge group and returns its id.
    pub fn open_group(&mut self) -> MergeGroupId {
        let id = MergeGroupId(self.next_group);
        self.next_group += 1;
        self.groups.insert(id, HashSet::new());
        id
    }

    /// Registers a sibling the group still waits for.
    pub fn join_group(&mut self, id: MergeGroupId, es: &StateRef) {
        self.groups
            .get_mut(&id)
            .expect("join on an unknown merge group")
            .insert(es.clone());
    }

    /// Drops a sibling from the group (it reached the close-merge point or
    /// terminated). Returns true when the group drained and was closed.
    pub fn leave_group(&mut self, id: MergeGroupId, es: &StateRef) -> bool {
        let group = self
            .groups
            .get_mut(&id)
            .expect("leave on an unknown merge group");
        group.remove(es);
        if group.is_empty() {
            self.groups.remove(&id);
            true
        } else {
            false
        }
    }

    /// Number of siblings the group is still waiting for.
    pub fn group_waiting(&self, id: MergeGroupId) -> usize {
        self.groups
            .get(&id)
            .map(|group| group.len())
            .unwrap_or_default()
    }
}

impl Explorer for MergingExplorer {
    fn select(&mut self) -> StateRef {
        self.base.select()
    }

    fn update(&mut self, current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        // A notification about a paused state would make heuristic inner
        // explorers account for a state they no longer track; drop it.
        if let Some(current) = current {
            if self.paused.contains(current) {
                return;
            }
        }
        if self.paused.is_empty() {
            self.base.update(current, added, removed);
        } else {
            // States terminated while paused were already withdrawn from the
            // inner explorer.
            let live: Vec<StateRef> = removed
                .iter()
                .filter(|es| match self.paused.iter().position(|s| s == *es) {
                    Some(pos) => {
                        self.paused.remove(pos);
                        false
                    }
                    None => true,
                })
                .cloned()
                .collect();
            self.base.update(current, added, &live);
        }
    }

    fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    fn describe(&self) -> String {
        "MergingExplorer".to_string()
    }
}

/// Cloneable handle shared between the decorator chain and the merge
/// coordinator.
pub struct MergingHandle {
    inner: Rc<RefCell<MergingExplorer>>,
}

impl Clone for MergingHandle {
    fn clone(&self) -> MergingHandle {
        MergingHandle {
            inner: self.inner.clone(),
        }
    }
}

impl MergingHandle {
    pub fn new(base: Box<dyn Explorer>) -> MergingHandle {
        MergingHandle {
            inner: Rc::new(RefCell::new(MergingExplorer::new(base))),
        }
    }

    pub fn pause(&self, es: &StateRef) {
        self.inner.borrow_mut().pause(es);
    }

    pub fn resume(&self, es: &StateRef) {
        self.inner.borrow_mut().resume(es);
    }

    pub fn is_paused(&self, es: &StateRef) -> bool {
        self.inner.borrow().is_paused(es)
    }

    pub fn open_group(&self) -> MergeGroupId {
        self.inner.borrow_mut().open_group()
    }

    pub fn join_group(&self, id: MergeGroupId, es: &StateRef) {
        self.inner.borrow_mut().join_group(id, es);
    }

    pub fn leave_group(&self, id: MergeGroupId, es: &StateRef) -> bool {
        self.inner.borrow_mut().leave_group(id, es)
    }

    pub fn group_waiting(&self, id: MergeGroupId) -> usize {
        self.inner.borrow().group_waiting(id)
    }
}

impl Explorer for MergingHandle {
    fn select(&mut self) -> StateRef {
        self.inner.borrow_mut().select()
    }

    fn update(&mut self, current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        self.inner.borrow_mut().update(current, added, removed);
    }

    fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    fn describe(&self) -> String {
        self.inner.borrow().describe()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::explorer::dfs::DfsExplorer;
    use crate::state::ExecutionState;

    fn over_dfs() -> MergingExplorer {
        MergingExplorer::new(Box::new(DfsExplorer::new()))
    }

    #[test]
    fn paused_states_are_not_scheduled() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let mut merging = over_dfs();
        merging.update(None, &[a.clone(), b.clone()], &[]);

        merging.pause(&b);
        assert_eq!(merging.select().id(), a.id());
        assert!(merging.is_paused(&b));

        merging.resume(&b);
        assert_eq!(merging.select().id(), b.id());
    }

    #[test]
    fn notification_for_a_paused_state_is_dropped() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let mut merging = over_dfs();
        merging.update(None, &[a.clone(), b.clone()], &[]);
        merging.pause(&b);

        // A stale notification names the paused state as current; were it
        // forwarded, the DFS would receive a child it must track.
        let stray = b.fork();
        merging.update(Some(&b), &[stray.clone()], &[]);
        assert_eq!(merging.select().id(), a.id());
        merging.update(None, &[], &[a]);
        assert!(merging.is_empty());
    }

    #[test]
    fn paused_state_can_terminate() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let mut merging = over_dfs();
        merging.update(None, &[a.clone(), b.clone()], &[]);
        merging.pause(&b);

        merging.update(None, &[], std::slice::from_ref(&b));
        assert!(!merging.is_paused(&b));
        assert_eq!(merging.select().id(), a.id());
    }

    #[test]
    #[should_panic(expected = "already-paused")]
    fn double_pause_is_fatal() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let mut merging = over_dfs();
        merging.update(None, &[a, b.clone()], &[]);
        merging.pause(&b);
        merging.pause(&b);
    }

    #[test]
    #[should_panic(expected = "not paused")]
    fn resume_of_unpaused_state_is_fatal() {
        let a = ExecutionState::new();
        let mut merging = over_dfs();
        merging.update(None, std::slice::from_ref(&a), &[]);
        merging.resume(&a);
    }

    #[test]
    fn group_bookkeeping_tracks_waiting_siblings() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let mut merging = over_dfs();
        merging.update(None, &[a.clone(), b.clone()], &[]);

        let group = merging.open_group();
        merging.join_group(group, &a);
        merging.join_group(group, &b);
        assert_eq!(merging.group_waiting(group), 2);

        assert!(!merging.leave_group(group, &a));
        assert_eq!(merging.group_waiting(group), 1);
        assert!(merging.leave_group(group, &b));
        assert_eq!(merging.group_waiting(group), 0);
    }

    #[test]
    fn handle_is_shared_between_chain_and_coordinator() {
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let coordinator = MergingHandle::new(Box::new(DfsExplorer::new()));
        let mut chain: Box<dyn Explorer> = Box::new(coordinator.clone());

        chain.update(None, &[a.clone(), b.clone()], &[]);
        coordinator.pause(&b);
        assert_eq!(chain.select().id(), a.id());
        coordinator.resume(&b);
        assert_eq!(chain.select().id(), b.id());
    }
}
