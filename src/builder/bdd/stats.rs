use std::fmt;

/// Counters for tuning the BDD builder; reported through `tracing` by the
/// engines that own a builder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BddBuilderStats {
    /// number of ITEs that reached the recursive case
    pub num_recursive_calls: usize,
    /// number of ITEs answered by the apply table
    pub num_cache_hits: usize,
}

impl BddBuilderStats {
    pub fn new() -> BddBuilderStats {
        BddBuilderStats::default()
    }
}

impl fmt::Display for BddBuilderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} recursive ite calls, {} apply table hits",
            self.num_recursive_calls, self.num_cache_hits
        )
    }
}
