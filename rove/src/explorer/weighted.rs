//! `Explorer` drawing states with probability proportional to a heuristic
//! weight computed from externally maintained state metadata.

use rand::Rng;

use crate::explorer::{Explorer, SharedRng};
use crate::pdf::DiscretePdf;
use crate::state::StateRef;

/// The heuristic a [`WeightedRandomExplorer`] ranks states by.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WeightKind {
    /// Branch depth of the state.
    Depth,
    /// 2^-depth, approximating each state's random-path probability.
    RandomPath,
    /// Inverse cumulative solver cost.
    QueryCost,
    /// Inverse-squared instruction count at the current location.
    InstCount,
    /// Inverse-squared call-path instruction count.
    CallPathInstCount,
    /// Inverse-squared estimated distance to uncovered code.
    MinDistToUncovered,
    /// Favors states that recently covered new code, with a distance tiebreak.
    CoveringNew,
}

impl WeightKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Depth => "Depth",
            Self::RandomPath => "RandomPath",
            Self::QueryCost => "QueryCost",
            Self::InstCount => "InstCount",
            Self::CallPathInstCount => "CallPathInstCount",
            Self::MinDistToUncovered => "MinDistToUncovered",
            Self::CoveringNew => "CoveringNew",
        }
    }

    /// Whether the weight can change without an add/remove event. Depth and
    /// random-path probability only move on a branch, which always comes
    /// with an `added` set; everything else drifts as the state executes.
    const fn dynamic(&self) -> bool {
        !matches!(self, Self::Depth | Self::RandomPath)
    }
}

/// Weighted random selection over a [`DiscretePdf`].
pub struct WeightedRandomExplorer {
    states: DiscretePdf<StateRef>,
    rng: SharedRng,
    kind: WeightKind,
    update_weights: bool,
}

impl WeightedRandomExplorer {
    pub fn new(kind: WeightKind, rng: SharedRng) -> WeightedRandomExplorer {
        WeightedRandomExplorer {
            states: DiscretePdf::new(),
            rng,
            kind,
            update_weights: kind.dynamic(),
        }
    }

    fn weight(&self, es: &StateRef) -> f64 {
        match self.kind {
            WeightKind::Depth => f64::from(es.depth()),
            WeightKind::RandomPath => 0.5f64.powi(es.depth() as i32),
            WeightKind::QueryCost => {
                let cost = es.query_cost();
                if cost < 0.1 {
                    1.0
                } else {
                    1.0 / cost
                }
            }
            WeightKind::InstCount => {
                let inv = 1.0 / es.instr_count().max(1) as f64;
                inv * inv
            }
            WeightKind::CallPathInstCount => {
                let inv = 1.0 / es.call_path_instr_count().max(1) as f64;
                inv * inv
            }
            WeightKind::MinDistToUncovered => {
                let inv = Self::inv_md2u(es);
                inv * inv
            }
            WeightKind::CoveringNew => {
                let inv_md2u = Self::inv_md2u(es);
                let inv_cov_new = if es.covered_new() {
                    1.0 / es.insts_since_cov_new().saturating_sub(1000).max(1) as f64
                } else {
                    0.0
                };
                inv_cov_new * inv_cov_new + inv_md2u * inv_md2u
            }
        }
    }

    /// Inverse distance-to-uncovered; an estimator with no target reads as
    /// "far away" rather than "on top of it".
    fn inv_md2u(es: &StateRef) -> f64 {
        let md2u = es.min_dist_to_uncovered();
        if md2u == 0 {
            1.0 / 10_000.0
        } else {
            1.0 / md2u as f64
        }
    }
}

impl Explorer for WeightedRandomExplorer {
    fn select(&mut self) -> StateRef {
        assert!(
            !self.states.is_empty(),
            "select on an empty WeightedRandomExplorer"
        );
        let p = self.rng.borrow_mut().gen::<f64>();
        self.states.choose(p).clone()
    }

    fn update(&mut self, current: Option<&StateRef>, added: &[StateRef], removed: &[StateRef]) {
        // Dynamic metrics are only known to have moved for the state that
        // just executed; refresh it before the next draw.
        if let Some(current) = current {
            if self.update_weights && !removed.contains(current) {
                self.states.update(current, self.weight(current));
            }
        }
        for es in added {
            self.states.insert(es.clone(), self.weight(es));
        }
        for es in removed {
            self.states.remove(es);
        }
    }

    fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn describe(&self) -> String {
        format!("WeightedRandomExplorer::{}", self.kind.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::explorer::seeded_rng;
    use crate::state::ExecutionState;

    #[test]
    fn zero_weights_fall_back_to_uniform() {
        // Fresh states all sit at depth 0, so every Depth weight is zero.
        let a = ExecutionState::new();
        let b = ExecutionState::new();
        let mut weighted = WeightedRandomExplorer::new(WeightKind::Depth, seeded_rng(3));
        weighted.update(None, &[a.clone(), b.clone()], &[]);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            seen.insert(weighted.select().id());
        }
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn positive_weight_shadows_zero_weight() {
        let shallow = ExecutionState::new();
        let deep = ExecutionState::new();
        deep.set_depth(5);
        let mut weighted = WeightedRandomExplorer::new(WeightKind::Depth, seeded_rng(5));
        weighted.update(None, &[shallow.clone(), deep.clone()], &[]);

        for _ in 0..64 {
            assert_eq!(weighted.select().id(), deep.id());
        }
    }

    #[test]
    fn current_is_reweighted_for_dynamic_kinds() {
        let cheap = ExecutionState::new();
        let pricey = ExecutionState::new();
        let mut weighted = WeightedRandomExplorer::new(WeightKind::QueryCost, seeded_rng(9));
        weighted.update(None, &[cheap.clone(), pricey.clone()], &[]);

        // `pricey` executes and racks up solver cost; its weight collapses
        // relative to `cheap` (1.0 vs 1/1000).
        pricey.set_query_cost(1000.0);
        weighted.update(Some(&pricey), &[], &[]);

        let picks = (0..200)
            .filter(|_| weighted.select().id() == cheap.id())
            .count();
        assert!(picks > 180, "cheap state picked only {} times", picks);
    }

    #[test]
    fn removed_states_are_never_drawn() {
        let states: Vec<StateRef> = (0..6)
            .map(|i| {
                let es = ExecutionState::new();
                es.set_depth(i + 1);
                es
            })
            .collect();
        let mut weighted = WeightedRandomExplorer::new(WeightKind::Depth, seeded_rng(13));
        weighted.update(None, &states, &[]);
        weighted.update(None, &[], &states[3..]);

        let live: Vec<_> = states[..3].iter().map(|s| s.id()).collect();
        for _ in 0..64 {
            assert!(live.contains(&weighted.select().id()));
        }
    }
}
