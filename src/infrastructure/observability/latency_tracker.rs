use prometheus::Gauge;
use std::time::{Duration, Instant};

/// RAII guard that writes the elapsed time of a publish call into a gauge
pub struct PublishTimer {
    start: Instant,
    gauge: Gauge,
}

impl PublishTimer {
    pub fn new(gauge: Gauge) -> Self {
        Self {
            start: Instant::now(),
            gauge,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PublishTimer {
    fn drop(&mut self) {
        self.gauge.set(self.start.elapsed().as_secs_f64());
    }
}
