use std::collections::HashSet;

use rand::RngCore;

use crate::neighborhood::NeighborhoodGraph;
use crate::rng::get_rng;
use crate::sampler::Sampler;

/// Draws a minimal sample by picking a random seed point and preferring its
/// spatial neighbors (per the [`NeighborhoodGraph`]) for the remaining
/// slots, falling back to uniform draws from the whole pool when a seed's
/// neighborhood is too small.
pub struct NeighborhoodGuidedSampler<'a> {
    graph: &'a NeighborhoodGraph<'a>,
    rng: Box<dyn RngCore>,
    seen: HashSet<usize>,
}

impl<'a> NeighborhoodGuidedSampler<'a> {
    pub fn new(graph: &'a NeighborhoodGraph<'a>, seed: Option<u64>) -> Self {
        Self {
            graph,
            rng: get_rng(seed),
            seen: HashSet::new(),
        }
    }
}

impl<'a> Sampler for NeighborhoodGuidedSampler<'a> {
    fn initialize(&mut self, _pool_size: usize) {
        self.seen.clear();
    }

    fn sample(&mut self, pool_size: usize, k: usize, out: &mut Vec<usize>) -> bool {
        if k > pool_size {
            return false;
        }
        out.clear();
        self.seen.clear();

        let seed_idx = (self.rng.next_u64() % pool_size as u64) as usize;
        self.seen.insert(seed_idx);
        out.push(seed_idx);

        let mut neighbors = self.graph.neighbors(seed_idx);
        // Fisher-Yates-by-swap-remove keeps neighbor order unbiased without
        // a second allocation.
        while out.len() < k && !neighbors.is_empty() {
            let pick = (self.rng.next_u64() % neighbors.len() as u64) as usize;
            let candidate = neighbors.swap_remove(pick);
            if self.seen.insert(candidate) {
                out.push(candidate);
            }
        }

        while out.len() < k {
            let idx = (self.rng.next_u64() % pool_size as u64) as usize;
            if self.seen.insert(idx) {
                out.push(idx);
            }
        }

        true
    }

    /// No spatial quality signal applies to destination selection, so this
    /// falls back to a uniform pick among the row's candidates.
    fn pick_candidate(&mut self, candidates: &[(usize, f64)]) -> usize {
        let pick = (self.rng.next_u64() % candidates.len() as u64) as usize;
        candidates[pick].0
    }
}
