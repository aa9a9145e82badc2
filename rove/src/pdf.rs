//! Discrete probability distribution over dynamically churning keys.
//!
//! Backed by a Fenwick tree over weight slots, so insert, remove, reweight
//! and a weighted draw are all O(log n) while states come and go on every
//! branch. Freed slots are recycled through a free list instead of
//! compacting, which keeps slot indices stable for the key map.

use std::collections::HashMap;
use std::hash::Hash;

/// Mapping from key to a non-negative weight supporting weighted random
/// draws.
#[derive(Debug)]
pub struct DiscretePdf<K: Clone + Eq + Hash> {
    /// 1-based Fenwick array over `weights`.
    fenwick: Vec<f64>,
    /// Weight per slot, 0.0 for free slots.
    weights: Vec<f64>,
    /// Key per slot, `None` for free slots.
    keys: Vec<Option<K>>,
    slots: HashMap<K, usize>,
    free: Vec<usize>,
    total: f64,
}

impl<K: Clone + Eq + Hash> Default for DiscretePdf<K> {
    fn default() -> DiscretePdf<K> {
        DiscretePdf::new()
    }
}

impl<K: Clone + Eq + Hash> DiscretePdf<K> {
    pub fn new() -> DiscretePdf<K> {
        DiscretePdf {
            fenwick: vec![0.0],
            weights: Vec::new(),
            keys: Vec::new(),
            slots: HashMap::new(),
            free: Vec::new(),
            total: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Sum of the weights of all tracked keys.
    pub fn total(&self) -> f64 {
        debug_assert!({
            let sum: f64 = self.weights.iter().sum();
            (sum - self.total).abs() <= 1e-9 * (1.0 + sum.abs())
        });
        self.total
    }

    /// Weight last assigned to `key`, if tracked.
    pub fn get(&self, key: &K) -> Option<f64> {
        self.slots.get(key).map(|&slot| self.weights[slot])
    }

    /// Tracks `key` with `weight`. The key must not already be present.
    pub fn insert(&mut self, key: K, weight: f64) {
        assert!(weight >= 0.0 && weight.is_finite(), "weight must be finite and non-negative");
        assert!(!self.contains(&key), "duplicate key inserted into DiscretePdf");
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => self.grow(),
        };
        self.weights[slot] = weight;
        self.keys[slot] = Some(key.clone());
        self.slots.insert(key, slot);
        self.add(slot, weight);
        self.total += weight;
    }

    /// Stops tracking `key`, returning its last weight.
    pub fn remove(&mut self, key: &K) -> f64 {
        let slot = self
            .slots
            .remove(key)
            .expect("remove of a key not tracked by DiscretePdf");
        let weight = self.weights[slot];
        self.add(slot, -weight);
        self.total -= weight;
        self.weights[slot] = 0.0;
        self.keys[slot] = None;
        self.free.push(slot);
        weight
    }

    /// Re-weights an already tracked key.
    pub fn update(&mut self, key: &K, weight: f64) {
        assert!(weight >= 0.0 && weight.is_finite(), "weight must be finite and non-negative");
        let slot = *self
            .slots
            .get(key)
            .expect("update of a key not tracked by DiscretePdf");
        let delta = weight - self.weights[slot];
        self.add(slot, delta);
        self.total += delta;
        self.weights[slot] = weight;
    }

    /// Draws a key for `p` in `[0, 1)`: probability proportional to weight.
    ///
    /// Zero-weight keys are never drawn while any positive weight exists.
    /// When every tracked weight is zero the draw falls back to a uniform
    /// pick, so a population of (say) all-unreachable targets still makes
    /// progress.
    pub fn choose(&self, p: f64) -> &K {
        assert!(!self.is_empty(), "choose on an empty DiscretePdf");
        assert!((0.0..1.0).contains(&p), "p must lie in [0, 1)");
        if self.total <= 0.0 {
            let nth = (p * self.len() as f64) as usize;
            let nth = nth.min(self.len() - 1);
            return self
                .keys
                .iter()
                .flatten()
                .nth(nth)
                .expect("slot bookkeeping out of sync");
        }
        let slot = self.lower_bound(p * self.total);
        match self.keys.get(slot).and_then(|k| k.as_ref()) {
            Some(key) => key,
            // Floating-point round-off at the top end can push the descent
            // one past the last live slot; fall back to the heaviest key.
            None => self
                .keys
                .iter()
                .enumerate()
                .filter(|(i, k)| k.is_some() && self.weights[*i] > 0.0)
                .max_by(|a, b| self.weights[a.0].partial_cmp(&self.weights[b.0]).unwrap())
                .and_then(|(_, k)| k.as_ref())
                .expect("no weighted slot despite positive total"),
        }
    }

    /// Largest slot index whose prefix sum is `<= target`; with
    /// `target < total` that is exactly the slot covering `target`.
    fn lower_bound(&self, target: f64) -> usize {
        let mut pos = 0usize;
        let mut rem = target;
        let mut step = self.weights.len().next_power_of_two();
        while step > 0 {
            let next = pos + step;
            if next < self.fenwick.len() && self.fenwick[next] <= rem {
                pos = next;
                rem -= self.fenwick[next];
            }
            step >>= 1;
        }
        pos
    }

    /// Point-update on the Fenwick array (0-based slot).
    fn add(&mut self, slot: usize, delta: f64) {
        let mut ix = slot + 1;
        while ix < self.fenwick.len() {
            self.fenwick[ix] += delta;
            ix += ix & ix.wrapping_neg();
        }
    }

    /// Appends a fresh slot, doubling the Fenwick array when it fills up.
    fn grow(&mut self) -> usize {
        let slot = self.weights.len();
        self.weights.push(0.0);
        self.keys.push(None);
        if self.weights.len() + 1 > self.fenwick.len() {
            self.rebuild();
        }
        slot
    }

    fn rebuild(&mut self) {
        let cap = (self.weights.len() + 1).next_power_of_two();
        self.fenwick = vec![0.0; cap.max(2)];
        let weights = self.weights.clone();
        for (slot, &w) in weights.iter().enumerate() {
            if w != 0.0 {
                self.add(slot, w);
            }
        }
    }
}
