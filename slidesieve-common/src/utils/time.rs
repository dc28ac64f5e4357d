use std::time::{Duration, Instant};

/// Runs a closure at most once per interval, for things like progress logs in
/// tight loops.
pub struct Every {
    every: Duration,
    last: Instant,
}

impl Every {
    pub fn new(every: Duration) -> Self {
        Self {
            every,
            last: Instant::now(),
        }
    }

    pub fn perform(&mut self, f: impl FnOnce()) {
        let now = Instant::now();
        if now - self.last >= self.every {
            self.last = now;
            f()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_interval_always_fires() {
        let mut every = Every::new(Duration::ZERO);
        let mut count = 0;
        for _ in 0..3 {
            every.perform(|| count += 1);
        }
        assert_eq!(3, count);
    }

    #[test]
    fn long_interval_does_not_fire() {
        let mut every = Every::new(Duration::from_secs(3600));
        let mut fired = false;
        every.perform(|| fired = true);
        assert!(!fired);
    }
}
