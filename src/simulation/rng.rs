use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// Source of the uniform and normal deviates used by stochastic growth.
pub trait RandomSource {
    /// Uniform deviate in [0, 1).
    fn uniform(&mut self) -> f64;

    /// Standard normal deviate.
    fn standard_normal(&mut self) -> f64;
}

impl<R: Rng> RandomSource for R {
    fn uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn standard_normal(&mut self) -> f64 {
        StandardNormal.sample(self)
    }
}

/// Reproducible generator for a given seed.
#[derive(Debug, Clone)]
pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn uniform(&mut self) -> f64 {
        self.0.uniform()
    }

    fn standard_normal(&mut self) -> f64 {
        self.0.standard_normal()
    }
}
