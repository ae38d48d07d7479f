use std::time::Duration;

use rand::Rng;

/// Artificial latency inserted while a transition holds its lease.
///
/// The delay has no business purpose. It widens the window between lease expiry and the status write so that the
/// expiry race can be reproduced. Tests use [`ProcessingDelay::Fixed`] to make races deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProcessingDelay {
    #[default]
    Disabled,
    /// Uniformly random in `[0, max)`
    UpTo(Duration),
    Fixed(Duration),
}

impl ProcessingDelay {
    /// A uniformly random delay below `max`. A zero ceiling disables the delay.
    pub fn up_to(max: Duration) -> Self {
        if max.is_zero() {
            ProcessingDelay::Disabled
        } else {
            ProcessingDelay::UpTo(max)
        }
    }

    pub fn sample(&self) -> Duration {
        match self {
            ProcessingDelay::Disabled => Duration::ZERO,
            ProcessingDelay::Fixed(d) => *d,
            ProcessingDelay::UpTo(max) => {
                let nanos = u64::try_from(max.as_nanos()).unwrap_or(u64::MAX);
                if nanos == 0 {
                    return Duration::ZERO;
                }
                Duration::from_nanos(rand::thread_rng().gen_range(0..nanos))
            },
        }
    }
}
