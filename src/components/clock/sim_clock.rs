use std::time::Duration;

pub const DEFAULT_PERIOD_NS: u64 = 20; // 50 MHz

/// Simulated clock. Time only advances when `tick` is called; nothing sleeps.
#[derive(Debug, Clone)]
pub struct SimClock {
    period_ns: u64,
    cycle: u64,
}

impl SimClock {
    pub fn new(period_ns: u64) -> Self {
        SimClock {
            period_ns: period_ns.max(1),
            cycle: 0,
        }
    }

    pub fn from_frequency(frequency: f64) -> Self {
        Self::new(Self::frequency_to_duration(frequency).as_nanos() as u64)
    }

    fn frequency_to_duration(frequency: f64) -> Duration {
        if frequency <= 0.0 {
            Duration::from_secs(0)
        } else {
            Duration::from_nanos((1.0e9 / frequency).round() as u64)
        }
    }

    /// One full period. Returns the new cycle count.
    pub fn tick(&mut self) -> u64 {
        self.cycle += 1;
        self.cycle
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn period_ns(&self) -> u64 {
        self.period_ns
    }

    pub fn frequency_hz(&self) -> f64 {
        1.0e9 / self.period_ns as f64
    }

    /// Simulated time since cycle 0.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.cycle.saturating_mul(self.period_ns))
    }
}

impl Default for SimClock {
    fn default() -> Self {
        SimClock::new(DEFAULT_PERIOD_NS)
    }
}
