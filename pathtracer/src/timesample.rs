//! Time-sampled container query: given a monotone sequence of sample times
//! in `[0, 1]` and a query time, find the bracketing pair and blend factor.
//!
//! Grounded on the original renderer's `query_time` contract used by
//! `Sphere`/`Bilinear` for motion blur; here it is split out as its own
//! reusable helper rather than duplicated per-primitive.

/// Result of bracketing a query time against a time-sample sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeQuery {
    pub ia: usize,
    pub ib: usize,
    pub alpha: f64,
}

/// Brackets `t` against `sample_count` uniformly-spaced samples over `[0, 1]`.
///
/// With a single sample, returns that sample with `alpha = 0`. Otherwise
/// samples are assumed evenly spaced (the layout every primitive in this
/// crate uses for its time axis), so the bracketing pair is found directly
/// rather than via a search.
pub fn query_time(sample_count: usize, t: f64) -> TimeQuery {
    assert!(sample_count > 0, "time-sampled container must be non-empty");
    if sample_count == 1 {
        return TimeQuery {
            ia: 0,
            ib: 0,
            alpha: 0.0,
        };
    }

    let t = t.clamp(0.0, 1.0);
    let segments = (sample_count - 1) as f64;
    let scaled = t * segments;
    let ia = (scaled.floor() as usize).min(sample_count - 2);
    let ib = ia + 1;
    let alpha = (scaled - ia as f64).clamp(0.0, 1.0);
    TimeQuery { ia, ib, alpha }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sample_has_zero_alpha() {
        let q = query_time(1, 0.73);
        assert_eq!(q, TimeQuery { ia: 0, ib: 0, alpha: 0.0 });
    }

    #[test]
    fn brackets_are_monotone_and_alpha_in_range() {
        for n in 2..8usize {
            for i in 0..=100 {
                let t = i as f64 / 100.0;
                let q = query_time(n, t);
                assert!(q.ia < n && q.ib < n);
                assert!(q.ia <= q.ib);
                assert!((0.0..=1.0).contains(&q.alpha));
            }
        }
    }

    #[test]
    fn endpoints_bracket_correctly() {
        let q0 = query_time(4, 0.0);
        assert_eq!(q0.ia, 0);
        assert!(q0.alpha.abs() < 1e-9);

        let q1 = query_time(4, 1.0);
        assert_eq!(q1.ib, 3);
        assert!((q1.alpha - 1.0).abs() < 1e-9);
    }
}
