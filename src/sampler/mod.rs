pub use neighborhood_guided::NeighborhoodGuidedSampler;
pub use prosac::ProsacSampler;
pub use uniform::UniformSampler;

mod neighborhood_guided;
mod prosac;
mod uniform;

/// Draws minimal index sets from `[0, pool_size)`.
///
/// Implementations own their random state; seeding is deterministic given a
/// fixed seed at construction, so the same seed always yields the same
/// sequence of draws.
pub trait Sampler {
    /// (Re-)initialize internal state for a pool of the given size. Called
    /// once before the first [`Sampler::sample`] call.
    fn initialize(&mut self, pool_size: usize);

    /// Draw `k` pairwise-distinct indices from `[0, pool_size)` into `out`
    /// (which is cleared first). Returns `false` without touching `out` when
    /// `k > pool_size`.
    fn sample(&mut self, pool_size: usize, k: usize, out: &mut Vec<usize>) -> bool;

    /// Pick one destination candidate for a source row per this sampler's
    /// policy, from a non-empty, column-ordered `(dst_idx, match_score)`
    /// list. `match_score` is lower-is-better.
    fn pick_candidate(&mut self, candidates: &[(usize, f64)]) -> usize;
}

/// The closed set of sampler variants selectable via
/// [`crate::settings::SamplerMethod`], unified behind [`Sampler`] by
/// delegation rather than dynamic dispatch, since the full variant list is
/// fixed.
pub enum SamplerKind<'a> {
    Uniform(UniformSampler),
    Prosac(ProsacSampler),
    NeighborhoodGuided(NeighborhoodGuidedSampler<'a>),
}

impl<'a> Sampler for SamplerKind<'a> {
    fn initialize(&mut self, pool_size: usize) {
        match self {
            SamplerKind::Uniform(s) => s.initialize(pool_size),
            SamplerKind::Prosac(s) => s.initialize(pool_size),
            SamplerKind::NeighborhoodGuided(s) => s.initialize(pool_size),
        }
    }

    fn sample(&mut self, pool_size: usize, k: usize, out: &mut Vec<usize>) -> bool {
        match self {
            SamplerKind::Uniform(s) => s.sample(pool_size, k, out),
            SamplerKind::Prosac(s) => s.sample(pool_size, k, out),
            SamplerKind::NeighborhoodGuided(s) => s.sample(pool_size, k, out),
        }
    }

    fn pick_candidate(&mut self, candidates: &[(usize, f64)]) -> usize {
        match self {
            SamplerKind::Uniform(s) => s.pick_candidate(candidates),
            SamplerKind::Prosac(s) => s.pick_candidate(candidates),
            SamplerKind::NeighborhoodGuided(s) => s.pick_candidate(candidates),
        }
    }
}
