use std::collections::HashSet;

use rand::RngCore;

use crate::rng::get_rng;
use crate::sampler::Sampler;

/// Progressive sampling biased toward higher-quality matches early,
/// relaxing to uniform sampling as more draws are made.
///
/// `quality_rank[r]` gives the original point index with rank `r` (rank 0 is
/// the best-quality match). When `None`, ranks default to the identity
/// permutation — the sampler still grows its active pool progressively, it
/// just has no quality signal to prioritize within it.
pub struct ProsacSampler {
    rng: Box<dyn RngCore>,
    quality_rank: Option<Vec<usize>>,
    draws: usize,
    seen: HashSet<usize>,
}

impl ProsacSampler {
    pub fn new(seed: Option<u64>, quality_rank: Option<Vec<usize>>) -> Self {
        Self {
            rng: get_rng(seed),
            quality_rank,
            draws: 0,
            seen: HashSet::new(),
        }
    }

    fn rank_to_index(&self, rank: usize) -> usize {
        match &self.quality_rank {
            Some(ranks) => ranks[rank],
            None => rank,
        }
    }

    /// Growth function: the size of the active prefix of the ranked pool
    /// considered at draw number `n`, growing linearly from `k` toward
    /// `pool_size` over the first `pool_size` draws.
    fn active_pool_size(&self, pool_size: usize, k: usize) -> usize {
        if pool_size <= k {
            return pool_size;
        }
        let t = self.draws.min(pool_size);
        let growth = k + (t * (pool_size - k)) / pool_size.max(1);
        growth.clamp(k, pool_size)
    }
}

impl Sampler for ProsacSampler {
    fn initialize(&mut self, _pool_size: usize) {
        self.draws = 0;
        self.seen.clear();
    }

    fn sample(&mut self, pool_size: usize, k: usize, out: &mut Vec<usize>) -> bool {
        if k > pool_size {
            return false;
        }
        out.clear();
        let active = self.active_pool_size(pool_size, k);
        self.seen.clear();

        // Classic PROSAC forces the newest-admitted (lowest-quality) point
        // of the active prefix into every sample once the prefix has grown
        // past the minimal sample size, so that growth actually matters.
        if active > k {
            let forced_rank = active - 1;
            let forced_idx = self.rank_to_index(forced_rank);
            self.seen.insert(forced_idx);
            out.push(forced_idx);
        }

        while out.len() < k {
            let rank = (self.rng.next_u64() % active as u64) as usize;
            let idx = self.rank_to_index(rank);
            if self.seen.insert(idx) {
                out.push(idx);
            }
        }

        self.draws += 1;
        true
    }

    /// PROSAC already drives the minimal-sample draw by match quality, so it
    /// carries that bias into destination selection too: the candidate with
    /// the lowest (best) `match_score` wins, ties broken toward the lower
    /// destination index for determinism.
    fn pick_candidate(&mut self, candidates: &[(usize, f64)]) -> usize {
        candidates
            .iter()
            .copied()
            .reduce(|best, next| {
                if next.1 < best.1 || (next.1 == best.1 && next.0 < best.0) {
                    next
                } else {
                    best
                }
            })
            .expect("candidates must be non-empty")
            .0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emitted_indices_are_distinct() {
        let mut sampler = ProsacSampler::new(Some(3), None);
        sampler.initialize(20);
        let mut out = Vec::new();
        for _ in 0..10 {
            assert!(sampler.sample(20, 4, &mut out));
            let unique: HashSet<_> = out.iter().collect();
            assert_eq!(unique.len(), out.len());
        }
    }

    #[test]
    fn active_pool_grows_with_draws() {
        let mut sampler = ProsacSampler::new(Some(3), None);
        sampler.initialize(100);
        let early = sampler.active_pool_size(100, 4);
        sampler.draws = 99;
        let late = sampler.active_pool_size(100, 4);
        assert!(late >= early);
    }

    #[test]
    fn fails_when_k_exceeds_pool() {
        let mut sampler = ProsacSampler::new(Some(1), None);
        sampler.initialize(2);
        let mut out = Vec::new();
        assert!(!sampler.sample(2, 3, &mut out));
    }

    #[test]
    fn pick_candidate_prefers_lowest_match_score() {
        let mut sampler = ProsacSampler::new(Some(1), None);
        let candidates = vec![(10, 0.9), (20, 0.1), (30, 0.5)];
        assert_eq!(sampler.pick_candidate(&candidates), 20);
    }

    #[test]
    fn pick_candidate_ties_break_on_lower_destination_index() {
        let mut sampler = ProsacSampler::new(Some(1), None);
        let candidates = vec![(20, 0.2), (10, 0.2)];
        assert_eq!(sampler.pick_candidate(&candidates), 10);
    }

    #[test]
    fn respects_quality_rank_ordering() {
        // rank 0 is original index 9, rank 1 is original index 8, etc.
        let ranks: Vec<usize> = (0..10).rev().collect();
        let mut sampler = ProsacSampler::new(Some(1), Some(ranks));
        sampler.initialize(10);
        let mut out = Vec::new();
        assert!(sampler.sample(10, 4, &mut out));
        assert!(out.iter().all(|&i| i < 10));
    }
}
