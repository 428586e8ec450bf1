//! Jittered publish pacing.

use rand::Rng;
use std::time::Duration;

/// Computes the wait between publish cycles.
///
/// Each delay is the base interval moved up or down by a random offset below
/// the jitter bound. Moving down never crosses zero: an offset at least as large
/// as the base interval leaves the base interval unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayScheduler {
    base: Duration,
    jitter: Duration,
}

impl DelayScheduler {
    /// Create a scheduler.
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// Base interval.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Jitter bound.
    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    /// Draw the next delay.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let jitter_nanos = saturating_nanos(self.jitter);
        if jitter_nanos == 0 {
            return self.base;
        }

        let offset = Duration::from_nanos(rng.gen_range(0..jitter_nanos));
        if rng.gen_bool(0.5) {
            if offset < self.base {
                self.base - offset
            } else {
                self.base
            }
        } else {
            self.base.saturating_add(offset)
        }
    }

    /// Draw a one-off startup offset, uniform below one [`next_delay`](Self::next_delay) draw.
    ///
    /// Used to spread carriages out so they do not publish in lockstep.
    pub fn startup_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let bound = saturating_nanos(self.next_delay(rng));
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rng.gen_range(0..bound))
    }
}

fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_zero_jitter_returns_base() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let scheduler = DelayScheduler::new(Duration::from_secs(1), Duration::ZERO);

        for _ in 0..100 {
            assert_eq!(scheduler.next_delay(&mut rng), Duration::from_secs(1));
        }
    }

    #[test]
    fn test_delay_within_jitter_band() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let base = Duration::from_secs(2);
        let jitter = Duration::from_millis(500);
        let scheduler = DelayScheduler::new(base, jitter);

        let mut below = 0;
        let mut above = 0;
        for _ in 0..1_000 {
            let delay = scheduler.next_delay(&mut rng);
            assert!(delay > base - jitter && delay < base + jitter, "{:?}", delay);
            if delay < base {
                below += 1;
            } else if delay > base {
                above += 1;
            }
        }

        // Both directions are taken roughly equally often.
        assert!(below > 400 && above > 400, "below={} above={}", below, above);
    }

    #[test]
    fn test_subtraction_never_undershoots_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let base = Duration::from_millis(10);
        let scheduler = DelayScheduler::new(base, Duration::from_secs(1));

        let mut unchanged = 0;
        for _ in 0..1_000 {
            let delay = scheduler.next_delay(&mut rng);
            assert!(delay > Duration::ZERO);
            if delay == base {
                unchanged += 1;
            }
        }

        // Nearly every downward draw exceeds the base and falls back to it.
        assert!(unchanged > 400, "unchanged={}", unchanged);
    }

    #[test]
    fn test_zero_base_with_jitter() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let scheduler = DelayScheduler::new(Duration::ZERO, Duration::from_millis(100));

        for _ in 0..200 {
            let delay = scheduler.next_delay(&mut rng);
            assert!(delay < Duration::from_millis(100));
        }
    }

    #[test]
    fn test_startup_offset_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let scheduler = DelayScheduler::new(Duration::from_secs(2), Duration::from_millis(500));

        for _ in 0..500 {
            assert!(scheduler.startup_offset(&mut rng) < Duration::from_millis(2_500));
        }
    }

    #[test]
    fn test_startup_offset_zero_interval() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let scheduler = DelayScheduler::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(scheduler.startup_offset(&mut rng), Duration::ZERO);
    }

    #[test]
    fn test_same_seed_same_delays() {
        let scheduler = DelayScheduler::new(Duration::from_secs(1), Duration::from_millis(300));
        let draw = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..20)
                .map(|_| scheduler.next_delay(&mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(3), draw(3));
    }
}
