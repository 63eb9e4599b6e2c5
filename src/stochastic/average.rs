use num_traits::Float;

/// Weighted running mean of a sequence of vectors.
///
/// After pushing `x_1..x_k` with weights `w_1..w_k` the value is
/// `Σ w_i·x_i / Σ w_i`, updated in place without storing the sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageVector<F> {
    value: Vec<F>,
    total_weight: F,
}

impl<F: Float> AverageVector<F> {
    /// Empty average of `dim`-dimensional vectors (value is all zeros).
    pub fn new(dim: usize) -> Self {
        AverageVector {
            value: vec![F::zero(); dim],
            total_weight: F::zero(),
        }
    }

    /// Fold `x` into the average with weight `weight > 0`.
    pub fn update(&mut self, x: &[F], weight: F) {
        debug_assert_eq!(x.len(), self.value.len());
        let total = self.total_weight + weight;
        let keep = self.total_weight / total;
        let take = weight / total;
        for (v, &xi) in self.value.iter_mut().zip(x) {
            *v = keep * *v + take * xi;
        }
        self.total_weight = total;
    }

    /// Current average.
    pub fn value(&self) -> &[F] {
        &self.value
    }

    /// Sum of the weights pushed so far.
    pub fn total_weight(&self) -> F {
        self.total_weight
    }
}
