use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use signal_hook::{consts::TERM_SIGNALS, flag};

/// Remembers whether a termination signal has arrived. Loops are expected to
/// poll this and wind down in an orderly fashion, keeping whatever they have
/// already produced.
#[derive(Clone, Debug)]
pub struct Cookie {
    stop: Arc<AtomicBool>,
}

impl Cookie {
    pub fn new() -> Result<Self, std::io::Error> {
        let stop = Arc::new(AtomicBool::new(false));

        for sig in TERM_SIGNALS {
            // A second signal skips the graceful path and kills the process.
            // The shutdown must be registered first, otherwise it would
            // already fire on the signal that sets the flag.
            flag::register_conditional_shutdown(*sig, 1, Arc::clone(&stop))?;
            flag::register(*sig, Arc::clone(&stop))?;
        }

        Ok(Self { stop })
    }

    pub fn is_terminating(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use signal_hook::{consts::SIGTERM, low_level};

    // Only one test here may raise: with the flag already up, the next
    // signal takes the whole test process down.
    #[test]
    fn the_first_signal_flips_the_flag_without_killing_the_process() {
        let cookie = Cookie::new().unwrap();
        let clone = cookie.clone();
        assert!(!cookie.is_terminating());
        assert!(!clone.is_terminating());

        low_level::raise(SIGTERM).unwrap();

        assert!(cookie.is_terminating());
        assert!(clone.is_terminating());
    }
}
