use std::sync::{LazyLock, RwLock};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

pub struct Configuration {
    /// Tolerance used when comparing rate products and flux values in the
    /// balance predicates
    pub tolerance: f64,
    /// Singular value cutoff used for numeric rank computations
    pub rank_tolerance: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            tolerance: 1e-07,
            rank_tolerance: 1e-09,
        }
    }
}
