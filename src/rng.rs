use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Build the estimator's random number generator. Given the same seed this
/// always produces the same sequence; with no seed it still seeds from a
/// fixed default so that a single process's unseeded runs stay reproducible.
pub(crate) fn get_rng(seed: Option<u64>) -> Box<dyn RngCore> {
    let rng = match seed {
        None => ChaCha8Rng::from_seed(Default::default()),
        Some(s) => ChaCha8Rng::seed_from_u64(s),
    };
    Box::new(rng)
}
