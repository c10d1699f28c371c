//! Single-use delay used to pace the reset sequence and the poll loop.

/// A delay of a fixed duration over a borrowed [`DelayNs`](embedded_hal::delay::DelayNs)
/// implementation. Waiting consumes it, so it resolves exactly once.
pub struct TimedDelay<'d, D> {
    delay: &'d mut D,
    duration_ms: u32,
}

impl<'d, D> TimedDelay<'d, D> {
    pub fn new(delay: &'d mut D, duration_ms: u32) -> Self {
        Self { delay, duration_ms }
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }
}

impl<D: embedded_hal::delay::DelayNs> TimedDelay<'_, D> {
    /// Block for the full duration.
    pub fn wait_blocking(self) {
        self.delay.delay_ms(self.duration_ms);
    }
}

#[cfg(feature = "async")]
impl<D: embedded_hal_async::delay::DelayNs> TimedDelay<'_, D> {
    /// Resolve once the duration has elapsed.
    pub async fn wait(self) {
        self.delay.delay_ms(self.duration_ms).await;
    }
}
