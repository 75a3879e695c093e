//! Process-wide diagnostic counters.
//!
//! Modeled as an explicit service (an `Arc<Stats>` threaded through the
//! integrator and primitive array) rather than a global static, per the
//! design notes. The counted events happen on otherwise lock-free paths, so
//! plain atomics are used rather than sharing a mutex with the structure
//! they describe.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Stats {
    primitive_ray_tests: AtomicU64,
    split_count: AtomicU64,
    upoly_gen_count: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_ray_test(&self) {
        self.primitive_ray_tests.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_split(&self) {
        self.split_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_upoly_gen(&self, count: u64) {
        self.upoly_gen_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn primitive_ray_tests(&self) -> u64 {
        self.primitive_ray_tests.load(Ordering::Relaxed)
    }

    pub fn split_count(&self) -> u64 {
        self.split_count.load(Ordering::Relaxed)
    }

    pub fn upoly_gen_count(&self) -> u64 {
        self.upoly_gen_count.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = Stats::new();
        stats.record_ray_test();
        stats.record_ray_test();
        stats.record_split();
        stats.record_upoly_gen(9);
        assert_eq!(stats.primitive_ray_tests(), 2);
        assert_eq!(stats.split_count(), 1);
        assert_eq!(stats.upoly_gen_count(), 9);
    }
}
