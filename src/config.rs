//! Engine configuration
//!
//! All tunables live in one explicit struct passed by reference to the
//! components that consult it. There is no module-level mutable state: a
//! component either receives an [`EngineConfig`] or it has no knobs.

/// Configuration for plan construction and verification.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Enables extra invariant verification in hot paths (conservation
    /// re-checks after planning, range re-checks after rebinning). Off by
    /// default; plans are identical either way.
    pub careful: bool,

    /// Number of threads available to parallel passes.
    pub n_threads: usize,

    /// Minimum work-item count before a pass goes parallel. Below this the
    /// serial path runs, so tiny inputs do not pay thread-pool overhead.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            careful: false,
            n_threads: num_cpus::get(),
            parallel_threshold: 4096,
        }
    }
}

impl EngineConfig {
    /// Config with every verification pass enabled, for tests and debugging.
    pub fn careful() -> Self {
        Self {
            careful: true,
            ..Self::default()
        }
    }

    /// Whether a pass over `n_items` work items should run in parallel.
    pub fn should_parallelize(&self, n_items: usize) -> bool {
        self.n_threads > 1 && n_items >= self.parallel_threshold
    }
}
