use std::collections::HashSet;

use rand::RngCore;

use crate::rng::get_rng;
use crate::sampler::Sampler;

/// Sample-without-replacement from `[0, pool_size)` using a fast,
/// deterministically seeded RNG.
pub struct UniformSampler {
    rng: Box<dyn RngCore>,
    seen: HashSet<usize>,
}

impl UniformSampler {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: get_rng(seed),
            seen: HashSet::new(),
        }
    }
}

impl Sampler for UniformSampler {
    fn initialize(&mut self, _pool_size: usize) {
        self.seen.clear();
    }

    fn sample(&mut self, pool_size: usize, k: usize, out: &mut Vec<usize>) -> bool {
        if k > pool_size {
            return false;
        }
        out.clear();
        self.seen.clear();
        while out.len() < k {
            let idx = (self.rng.next_u64() % pool_size as u64) as usize;
            if self.seen.insert(idx) {
                out.push(idx);
            }
        }
        true
    }

    /// Uniform pick among the row's candidates, per the sampler's policy.
    fn pick_candidate(&mut self, candidates: &[(usize, f64)]) -> usize {
        let pick = (self.rng.next_u64() % candidates.len() as u64) as usize;
        candidates[pick].0
    }
}
