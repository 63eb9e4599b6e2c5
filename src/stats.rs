use num_traits::Float;

/// Streaming mean / variance accumulator (Welford's algorithm).
#[derive(Debug, Clone, PartialEq)]
pub struct RunningStats<F> {
    count: usize,
    mean: F,
    m2: F,
    min: F,
    max: F,
}

impl<F: Float> Default for RunningStats<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> RunningStats<F> {
    /// Empty accumulator.
    pub fn new() -> Self {
        RunningStats {
            count: 0,
            mean: F::zero(),
            m2: F::zero(),
            min: F::infinity(),
            max: F::neg_infinity(),
        }
    }

    /// Add one observation.
    pub fn add(&mut self, value: F) {
        self.count += 1;
        let n = F::from(self.count).unwrap_or_else(F::max_value);
        let delta = value - self.mean;
        self.mean = self.mean + delta / n;
        self.m2 = self.m2 + delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Number of observations.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Sample mean (zero when empty).
    pub fn mean(&self) -> F {
        self.mean
    }

    /// Population variance (zero with fewer than two observations).
    pub fn variance(&self) -> F {
        if self.count < 2 {
            return F::zero();
        }
        self.m2 / F::from(self.count).unwrap_or_else(F::max_value)
    }

    /// Population standard deviation.
    pub fn stdev(&self) -> F {
        self.variance().sqrt()
    }

    /// Smallest observation (`+inf` when empty).
    pub fn min(&self) -> F {
        self.min
    }

    /// Largest observation (`-inf` when empty).
    pub fn max(&self) -> F {
        self.max
    }
}
