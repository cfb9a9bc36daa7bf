//! Random baseline: long or short with equal probability, independently per bar.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{LONG, SHORT, Signal};

pub fn signals(bars: usize, seed: Option<u64>, salt: u64) -> Vec<Signal> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(salt)),
        None => StdRng::from_entropy(),
    };

    (0..bars)
        .map(|_| {
            if rng.gen_bool(0.5) {
                Signal::Position(LONG)
            } else {
                Signal::Position(SHORT)
            }
        })
        .collect()
}
