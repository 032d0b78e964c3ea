//! Periodic tick source driving display refreshes.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::{Stream, StreamExt};

/// Default refresh period for the display loop.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(5);

/// Boxed tick stream returned by [`Ticker::into_stream`].
pub type TickStream = Pin<Box<dyn Stream<Item = ()> + Send>>;

/// First tick after `initial_delay`, then one every `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticker {
    pub period: Duration,
    pub initial_delay: Duration,
    /// `None` ticks forever.
    pub max_ticks: Option<usize>,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_PERIOD)
    }
}

impl Ticker {
    /// Unbounded ticker whose first tick is one `period` away.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            initial_delay: period,
            max_ticks: None,
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_ticks(mut self, max: usize) -> Self {
        self.max_ticks = Some(max);
        self
    }

    /// Start the clock. Must be called inside a tokio runtime.
    pub fn into_stream(self) -> TickStream {
        // tokio panics on a zero-length interval
        let period = self.period.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval_at(Instant::now() + self.initial_delay, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let ticks = IntervalStream::new(interval).map(|_| ());
        match self.max_ticks {
            Some(max) => Box::pin(ticks.take(max)),
            None => Box::pin(ticks),
        }
    }
}
