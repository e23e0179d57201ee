use rand::Rng;

/// Source of the bounded random picks used to break ties between top
/// candidates. Any `rand::Rng` works; tests can seed one or supply their own.
pub trait RandomSource {
    /// Uniform index in `0..upper`. `upper` is always at least 1.
    fn next_index(&mut self, upper: usize) -> usize;
}

impl<R: Rng> RandomSource for R {
    fn next_index(&mut self, upper: usize) -> usize {
        self.gen_range(0..upper)
    }
}
