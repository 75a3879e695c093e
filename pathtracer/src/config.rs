//! Process/render-wide configuration.
//!
//! Passed by reference into the renderer and integrator rather than read
//! from a hidden global, per the design notes' preference for explicit
//! services over singletons.

use crate::error::Error;

/// Tessellation and scheduling knobs that drive lazy dicing and bucketing.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Target number of samples per bucket; drives bucket sizing.
    pub samples_per_bucket: usize,
    /// Tessellation aggressiveness: larger means coarser grids.
    pub dice_rate: f64,
    /// Upper bound on a single grid's dice rate before a patch must split.
    pub max_grid_size: u32,
    /// When set, skip film accumulation and file writes entirely.
    pub no_output: bool,
    /// Maximum number of diced grids the grid cache retains at once.
    pub grid_cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            samples_per_bucket: 2048,
            dice_rate: 0.25,
            max_grid_size: 64,
            no_output: false,
            grid_cache_capacity: 4096,
        }
    }
}

impl Config {
    /// Validates the configuration, returning [`Error::BadConfig`] for values
    /// that would make the renderer misbehave rather than merely render
    /// slowly or coarsely.
    pub fn validate(&self) -> Result<(), Error> {
        if self.samples_per_bucket == 0 {
            return Err(Error::BadConfig {
                reason: "samples_per_bucket must be nonzero".into(),
            });
        }
        if self.dice_rate <= 0.0 {
            return Err(Error::BadConfig {
                reason: "dice_rate must be positive".into(),
            });
        }
        if self.max_grid_size < 2 {
            return Err(Error::BadConfig {
                reason: "max_grid_size must be at least 2".into(),
            });
        }
        if self.grid_cache_capacity == 0 {
            return Err(Error::BadConfig {
                reason: "grid_cache_capacity must be nonzero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_spp_bucket_is_rejected() {
        let mut c = Config::default();
        c.samples_per_bucket = 0;
        assert!(c.validate().is_err());
    }
}
