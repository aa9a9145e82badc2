//! `Explorer` that picks uniformly at random among the live states.

use rand::Rng;

use crate::explorer::{Explorer, SharedRng};
use crate::state::StateRef;

/// Uniform random selection from an unordered collection. No ordering
/// guarantee between calls beyond statistical uniformity.
pub struct RandomExplorer {
    states: Vec<StateRef>,
    rng: SharedRng,
}

impl RandomExplorer {
    pub fn new(rng: SharedRng) -> RandomExplorer {
        RandomExplorer {
            states: Vec::new(),
            rng,
        }
    }
}

impl Explorer for RandomExplorer {
    fn select(&mut self) -> StateRef {
        assert!(!self.states.is_empty(), "select on an empty RandomExplorer");
        let ix = self.rng.borrow_mut().gen_range(0..self.states.len());
        self.states[ix].clone()
    }

    fn update(&mut self, _current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        self.states.extend(added.iter().cloned());
        for es in removed {
            let pos = self
                .states
                .iter()
                .position(|s| s == es)
                .expect("removed state not tracked by RandomExplorer");
            self.states.swap_remove(pos);
        }
    }

    fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn describe(&self) -> String {
        "RandomExplorer".to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::explorer::seeded_rng;
    use crate::state::ExecutionState;

    #[test]
    fn only_live_states_are_selected() {
        let states: Vec<StateRef> = (0..8).map(|_| ExecutionState::new()).collect();
        let mut random = RandomExplorer::new(seeded_rng(7));
        random.update(None, &states, &[]);
        random.update(None, &[], &states[0..4]);

        let live: Vec<_> = states[4..].iter().map(|s| s.id()).collect();
        for _ in 0..64 {
            let picked = random.select();
            assert!(live.contains(&picked.id()));
        }
    }

    #[test]
    fn every_state_is_eventually_selected() {
        let states: Vec<StateRef> = (0..4).map(|_| ExecutionState::new()).collect();
        let mut random = RandomExplorer::new(seeded_rng(11));
        random.update(None, &states, &[]);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..256 {
            seen.insert(random.select().id());
        }
        assert_eq!(seen.len(), states.len());
    }
}
