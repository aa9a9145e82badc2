//! Decorator guaranteeing pairwise-distinct picks across a selection window.

use crate::explorer::Explorer;
use crate::state::StateRef;

struct Member {
    state: StateRef,
    selected: bool,
}

/// Fixed-window fairness over an inner explorer: across any `capacity`
/// consecutive selections, while at least that many distinct states are
/// live, no state is returned twice.
///
/// A working set of up to `capacity` states is drawn from the inner
/// explorer. Drawing *withdraws* the state from the inner explorer (a plain
/// repeated `select` would keep offering the same favorite), so members are
/// tracked here until the round ends and they are handed back in one
/// notification for the inner explorer to re-rank. Members that die
/// mid-round simply leave the working set; survivors keep their
/// selected-this-round marks and the set refills from whatever the inner
/// explorer currently offers.
pub struct SelectNExplorer {
    base: Box<dyn Explorer>,
    capacity: usize,
    working: Vec<Member>,
}

impl SelectNExplorer {
    pub fn new(base: Box<dyn Explorer>, capacity: usize) -> SelectNExplorer {
        assert!(capacity > 0, "capacity must be positive");
        SelectNExplorer {
            base,
            capacity,
            working: Vec::new(),
        }
    }

    fn refill(&mut self) {
        while self.working.len() < self.capacity && !self.base.is_empty() {
            let es = self.base.select();
            self.base.update(None, &[], std::slice::from_ref(&es));
            self.working.push(Member {
                state: es,
                selected: false,
            });
        }
    }

    fn member(&self, es: &StateRef) -> Option<usize> {
        self.working.iter().position(|m| &m.state == es)
    }
}

impl Explorer for SelectNExplorer {
    fn select(&mut self) -> StateRef {
        assert!(!self.is_empty(), "select on an empty SelectNExplorer");
        self.refill();
        if self.working.iter().all(|m| m.selected) {
            // Round over: hand everyone back so the inner explorer decides
            // the next window's order.
            let back: Vec<StateRef> = self.working.drain(..).map(|m| m.state).collect();
            self.base.update(None, &back, &[]);
            self.refill();
        }
        let member = self
            .working
            .iter_mut()
            .find(|m| !m.selected)
            .expect("no selectable member after refill");
        member.selected = true;
        member.state.clone()
    }

    fn update(&mut self, current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        // Working-set members were withdrawn from the inner explorer; their
        // removals (and `current` role) must not be forwarded.
        let mut forwarded: Vec<StateRef> = Vec::new();
        for es in removed {
            match self.member(es) {
                Some(pos) => {
                    self.working.remove(pos);
                }
                None => forwarded.push(es.clone()),
            }
        }
        let current = current.filter(|es| self.member(es).is_none());
        self.base.update(current, added, &forwarded);
    }

    fn is_empty(&self) -> bool {
        self.working.is_empty() && self.base.is_empty()
    }

    fn describe(&self) -> String {
        format!(
            "<SelectNExplorer> capacity: {}, base:\n{}\n</SelectNExplorer>",
            self.capacity,
            self.base.describe()
        )
    }
}
