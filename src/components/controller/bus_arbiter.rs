//! Bitline bus arbitration.
//!
//! Each lane is a true/complement pair (`BL<n>` / `BLB<n>`). The arbiter is the only
//! component that drives these pins; during writes it asserts `b` and `!b`, otherwise it
//! releases both so the storage side can be sensed.

use std::fmt;

use crate::component::BaseComponent;
use crate::pin::{Pin, PinValue};
use crate::types::{Nibble, WORD_BITS};

/// One lane of the bus as seen between clock edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitlinePair {
    pub bl: PinValue,
    pub blb: PinValue,
}

impl BitlinePair {
    pub fn released() -> Self {
        Self {
            bl: PinValue::HighZ,
            blb: PinValue::HighZ,
        }
    }

    pub fn driven(bit: bool) -> Self {
        let bl = PinValue::from_bool(bit);
        Self {
            bl,
            blb: bl.inverted(),
        }
    }

    pub fn is_released(&self) -> bool {
        !self.bl.is_driven() && !self.blb.is_driven()
    }

    /// The bit carried by the pair, if both lines are driven and complementary.
    pub fn resolve(&self) -> Option<bool> {
        match (self.bl.to_bool(), self.blb.to_bool()) {
            (Some(t), Some(c)) if t != c => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for BitlinePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.bl.to_char(), self.blb.to_char())
    }
}

/// Snapshot of all lanes. Recomputed every cycle, never stored as state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusLines {
    lanes: [BitlinePair; WORD_BITS],
}

impl BusLines {
    pub fn released() -> Self {
        Self {
            lanes: [BitlinePair::released(); WORD_BITS],
        }
    }

    pub fn from_lanes(lanes: [BitlinePair; WORD_BITS]) -> Self {
        Self { lanes }
    }

    pub fn lane(&self, index: usize) -> Option<BitlinePair> {
        self.lanes.get(index).copied()
    }

    pub fn lanes(&self) -> &[BitlinePair; WORD_BITS] {
        &self.lanes
    }

    pub fn is_released(&self) -> bool {
        self.lanes.iter().all(BitlinePair::is_released)
    }

    /// The full word on the bus, only when every lane resolves.
    pub fn driven_value(&self) -> Option<Nibble> {
        let mut bits = [false; WORD_BITS];
        for (bit, lane) in bits.iter_mut().zip(self.lanes.iter()) {
            *bit = lane.resolve()?;
        }
        Some(Nibble::from_bits(bits))
    }

    /// True-lines, most significant lane first, e.g. `1010` or `ZZZZ`.
    pub fn bl_string(&self) -> String {
        self.lanes.iter().rev().map(|l| l.bl.to_char()).collect()
    }

    pub fn blb_string(&self) -> String {
        self.lanes.iter().rev().map(|l| l.blb.to_char()).collect()
    }
}

impl fmt::Display for BusLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BL={} BLB={}", self.bl_string(), self.blb_string())
    }
}

/// The arbiter's drive decision for one cycle, independent of any pin state.
pub fn drive_lines(write_enable: bool, data: Nibble) -> BusLines {
    if !write_enable {
        return BusLines::released();
    }
    let mut lanes = [BitlinePair::released(); WORD_BITS];
    for (i, lane) in lanes.iter_mut().enumerate() {
        *lane = BitlinePair::driven(data.bit(i));
    }
    BusLines::from_lanes(lanes)
}

pub struct BusArbiter {
    base: BaseComponent,
    driver_name: String,
    bitlines: Vec<Pin>,
    bitlines_bar: Vec<Pin>,
}

impl BusArbiter {
    pub fn new(name: impl Into<String>) -> Self {
        let base = BaseComponent::new(name);
        let driver_name = base.driver_name("WRITE");

        BusArbiter {
            base,
            driver_name,
            bitlines: (0..WORD_BITS).map(|i| Pin::new(format!("BL{}", i))).collect(),
            bitlines_bar: (0..WORD_BITS).map(|i| Pin::new(format!("BLB{}", i))).collect(),
        }
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    /// Apply this cycle's drive decision to the bitline pins.
    pub fn update(&mut self, write_enable: bool, data: Nibble) {
        let decision = drive_lines(write_enable, data);

        for (i, lane) in decision.lanes().iter().enumerate() {
            self.bitlines[i].set_driver(&self.driver_name, lane.bl);
            self.bitlines_bar[i].set_driver(&self.driver_name, lane.blb);
        }
    }

    pub fn release(&mut self) {
        self.update(false, Nibble::ZERO);
    }

    /// Resolved pin levels, including any foreign drivers.
    pub fn lines(&self) -> BusLines {
        let mut lanes = [BitlinePair::released(); WORD_BITS];
        for (i, lane) in lanes.iter_mut().enumerate() {
            *lane = BitlinePair {
                bl: self.bitlines[i].read(),
                blb: self.bitlines_bar[i].read(),
            };
        }
        BusLines::from_lanes(lanes)
    }

    pub fn has_contention(&self) -> bool {
        self.contended_pins().next().is_some()
    }

    pub fn contended_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins().filter(|p| p.is_contended())
    }

    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.bitlines.iter().chain(self.bitlines_bar.iter())
    }

    pub fn get_pin(&self, name: &str) -> Option<&Pin> {
        self.pins().find(|p| p.name() == name)
    }

    /// Mutable access for attaching another driver to a bus pin.
    pub fn get_pin_mut(&mut self, name: &str) -> Option<&mut Pin> {
        self.bitlines
            .iter_mut()
            .chain(self.bitlines_bar.iter_mut())
            .find(|p| p.name() == name)
    }
}
