//! Decorator implementing time-based iterative deepening.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::explorer::Explorer;
use crate::rove_trace;
use crate::state::StateRef;

/// Bounds how long any single path runs before broadening the search.
///
/// States whose last burst of execution overran the global time budget are
/// paused: removed from the inner explorer and parked in a side set, not
/// terminated. Once the inner explorer runs dry, the budget doubles and
/// every paused state is revived in one notification, so given enough
/// budget increments everything is eventually explored and one deep path
/// cannot starve its shallow alternatives.
pub struct IterativeDeepeningTimeExplorer {
    base: Box<dyn Explorer>,
    start_time: Instant,
    time_budget: Duration,
    paused: HashSet<StateRef>,
}

impl IterativeDeepeningTimeExplorer {
    pub fn new(base: Box<dyn Explorer>) -> IterativeDeepeningTimeExplorer {
        IterativeDeepeningTimeExplorer::with_budget(base, Duration::from_secs(1))
    }

    /// Starts from a caller-chosen initial budget instead of one second.
    pub fn with_budget(
        base: Box<dyn Explorer>,
        time_budget: Duration,
    ) -> IterativeDeepeningTimeExplorer {
        assert!(!time_budget.is_zero(), "time budget must be positive");
        IterativeDeepeningTimeExplorer {
            base,
            start_time: Instant::now(),
            time_budget,
            paused: HashSet::new(),
        }
    }

    /// The current global time budget.
    pub fn time_budget(&self) -> Duration {
        self.time_budget
    }
}

impl Explorer for IterativeDeepeningTimeExplorer {
    fn select(&mut self) -> StateRef {
        let es = self.base.select();
        self.start_time = Instant::now();
        es
    }

    fn update(&mut self, current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        let elapsed = self.start_time.elapsed();

        if self.paused.is_empty() {
            self.base.update(current, added, removed);
        } else {
            // A state that dies while paused never made it back into the
            // inner explorer; drop it here instead of forwarding.
            let live: Vec<StateRef> = removed
                .iter()
                .filter(|es| !self.paused.remove(*es))
                .cloned()
                .collect();
            self.base.update(current, added, &live);
        }

        if let Some(current) = current {
            if elapsed > self.time_budget && !removed.contains(current) {
                rove_trace!("sched_pause|{}", current.id());
                self.paused.insert(current.clone());
                self.base.update(None, &[], std::slice::from_ref(current));
            }
        }

        if self.base.is_empty() && !self.paused.is_empty() {
            self.time_budget *= 2;
            rove_trace!(
                "sched_revive|{}|budget {:?}",
                self.paused.len(),
                self.time_budget
            );
            let revived: Vec<StateRef> = self.paused.drain().collect();
            self.base.update(None, &revived, &[]);
        }
    }

    fn is_empty(&self) -> bool {
        self.base.is_empty() && self.paused.is_empty()
    }

    fn describe(&self) -> String {
        "IterativeDeepeningTimeExplorer".to_string()
    }
}
