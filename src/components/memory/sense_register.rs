use tracing::debug;

use crate::component::{BaseComponent, Component};
use crate::types::Nibble;

/// Output latch for read data.
///
/// A value presented with `capture` during a read cycle is latched on the following
/// clock edge; without a capture the register holds. Reset clears it to zero.
pub struct SenseRegister {
    base: BaseComponent,
    value: Nibble,
    pending: Option<Nibble>,
    capture_count: u64,
}

impl SenseRegister {
    pub fn new(name: impl Into<String>) -> Self {
        SenseRegister {
            base: BaseComponent::new(name),
            value: Nibble::ZERO,
            pending: None,
            capture_count: 0,
        }
    }

    pub fn value(&self) -> Nibble {
        self.value
    }

    /// Present the sensed word for this cycle. Only the last call before an edge counts.
    pub fn capture(&mut self, sensed: Nibble) {
        self.pending = Some(sensed);
    }

    pub fn capture_count(&self) -> u64 {
        self.capture_count
    }
}

impl Component for SenseRegister {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn clock_edge(&mut self) {
        if let Some(sensed) = self.pending.take() {
            debug!(component = self.base.name(), value = %sensed, "read data latched");
            self.value = sensed;
            self.capture_count += 1;
        }
    }

    fn reset(&mut self) {
        self.value = Nibble::ZERO;
        self.pending = None;
    }
}
