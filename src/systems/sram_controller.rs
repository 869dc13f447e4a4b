//! Top-level model of the 4-bit SRAM test controller.
//!
//! Per clock period the order is fixed: the sampled `ui_in` is presented to the
//! sequencer, the storage side acts on the bus driven during the cycle, then the sense
//! register and the sequencer update on the edge. Afterwards the bus is re-evaluated for
//! the new state and any authorized write reaches the cells within the same cycle.
//!
//! `rst_n` is asynchronous: pulling it low clears the registers immediately and the
//! edge function does nothing while it stays low.

use tracing::{info, trace};

use crate::component::{BaseComponent, Component};
use crate::components::controller::{
    AccessRequest, BusArbiter, BusLines, ControlSignals, ControllerState, Sequencer,
};
use crate::components::memory::{BitcellArray, SenseRegister, StorageAdapter};
use crate::io_map;
use crate::pin::PinValue;
use crate::types::{Nibble, WORD_BITS};

/// What happened across one clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub cycle: u64,
    pub ui_in: u8,
    pub in_reset: bool,
    /// State and bus during the cycle that the edge ended.
    pub state: ControllerState,
    pub signals: ControlSignals,
    pub bus: BusLines,
    /// `enable` was sampled while `ready` was low; the request was dropped.
    pub busy_request: bool,
    /// Bus pins had disagreeing drivers during the cycle.
    pub contention: bool,
    /// Output vector after the edge.
    pub uo_out: u8,
}

pub struct SramController<S: StorageAdapter = BitcellArray> {
    base: BaseComponent,
    sequencer: Sequencer,
    arbiter: BusArbiter,
    storage: S,
    sense_register: SenseRegister,
    ui_in: u8,
    uio_in: u8,
    rst_n: bool,
    cycle: u64,
}

impl SramController<BitcellArray> {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let storage = BitcellArray::new(format!("{}_CELLS", name));
        Self::with_storage(name, storage)
    }
}

impl<S: StorageAdapter> SramController<S> {
    pub fn with_storage(name: impl Into<String>, storage: S) -> Self {
        let base = BaseComponent::new(name);
        let mut controller = SramController {
            sequencer: Sequencer::new(format!("{}_SEQ", base.name())),
            arbiter: BusArbiter::new(format!("{}_ARB", base.name())),
            sense_register: SenseRegister::new(format!("{}_SENSE", base.name())),
            base,
            storage,
            ui_in: 0,
            uio_in: 0,
            rst_n: true,
            cycle: 0,
        };
        controller.settle();
        controller
    }

    /// Drive the 8-bit input vector. Takes effect at the next edge.
    pub fn set_inputs(&mut self, ui_in: u8) {
        self.ui_in = ui_in;
        self.sequencer.sample(io_map::decode_inputs(ui_in));
    }

    pub fn set_request(&mut self, request: AccessRequest) {
        self.set_inputs(io_map::encode_inputs(&request));
    }

    /// Auxiliary bidirectional input. Has no effect on the design.
    pub fn set_uio_in(&mut self, uio_in: u8) {
        self.uio_in = uio_in;
    }

    /// Drive the active-low reset line.
    pub fn set_reset_n(&mut self, level: bool) {
        if !level && self.rst_n {
            info!(component = self.base.name(), cycle = self.cycle, "reset asserted");
        } else if level && !self.rst_n {
            info!(component = self.base.name(), cycle = self.cycle, "reset released");
        }
        self.rst_n = level;
        if !level {
            self.apply_reset();
        }
    }

    pub fn in_reset(&self) -> bool {
        !self.rst_n
    }

    /// One rising clock edge.
    pub fn tick(&mut self) -> TickReport {
        self.cycle += 1;

        let state = self.sequencer.state();
        let signals = self.sequencer.signals();
        let bus = self.arbiter.lines();
        let contention = self.arbiter.has_contention();

        if !self.rst_n {
            let report = self.report(state, signals, bus, false, contention);
            trace!(cycle = self.cycle, "held in reset");
            return report;
        }

        let busy_request = self.sequencer.request_is_busy();

        if signals.wordline && signals.read_enable {
            self.sense_register.capture(self.sense_word());
        }

        self.sense_register.clock_edge();
        self.sequencer.clock_edge();
        self.settle();

        let report = self.report(state, signals, bus, busy_request, contention);
        trace!(
            cycle = report.cycle,
            ui_in = format_args!("{:08b}", report.ui_in),
            state = report.state.to_str(),
            bus = %report.bus,
            uo_out = format_args!("{:08b}", report.uo_out),
            "tick"
        );
        report
    }

    pub fn run_cycles(&mut self, cycles: u64) -> Vec<TickReport> {
        (0..cycles).map(|_| self.tick()).collect()
    }

    pub fn uo_out(&self) -> u8 {
        io_map::encode_outputs(self.sense_register.value(), self.ready())
    }

    pub fn uio_out(&self) -> u8 {
        io_map::UIO_OUT
    }

    pub fn uio_oe(&self) -> u8 {
        io_map::UIO_OE
    }

    pub fn uio_pins(&self) -> [PinValue; 8] {
        io_map::uio_pins()
    }

    pub fn ready(&self) -> bool {
        self.sequencer.is_ready()
    }

    pub fn data_out(&self) -> Nibble {
        self.sense_register.value()
    }

    pub fn state(&self) -> ControllerState {
        self.sequencer.state()
    }

    pub fn signals(&self) -> ControlSignals {
        self.sequencer.signals()
    }

    pub fn bus_lines(&self) -> BusLines {
        self.arbiter.lines()
    }

    pub fn bus_contention(&self) -> bool {
        self.arbiter.has_contention()
    }

    pub fn arbiter_mut(&mut self) -> &mut BusArbiter {
        &mut self.arbiter
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn ui_in(&self) -> u8 {
        self.ui_in
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn accepted_requests(&self) -> u64 {
        self.sequencer.accepted_count()
    }

    pub fn dropped_requests(&self) -> u64 {
        self.sequencer.dropped_count()
    }

    pub fn completed_reads(&self) -> u64 {
        self.sense_register.capture_count()
    }

    fn apply_reset(&mut self) {
        self.sequencer.reset();
        self.sense_register.reset();
        self.settle();
    }

    /// Re-evaluate combinational outputs for the current state and let an authorized
    /// write reach the cells.
    fn settle(&mut self) {
        let signals = self.sequencer.signals();
        let data = self.sequencer.captured().write_data;
        self.arbiter.update(signals.write_enable, data);

        if signals.wordline && signals.write_enable {
            let bus = self.arbiter.lines();
            let width = self.storage.width().min(WORD_BITS);
            for (bit, lane) in bus.lanes().iter().enumerate().take(width) {
                // Released or contended lanes carry no information
                if let Some(value) = lane.resolve() {
                    self.storage.write(bit, value);
                }
            }
        }
    }

    fn sense_word(&self) -> Nibble {
        let width = self.storage.width().min(WORD_BITS);
        (0..width).fold(Nibble::ZERO, |acc, bit| {
            acc.with_bit(bit, self.storage.sense(bit))
        })
    }

    fn report(
        &self,
        state: ControllerState,
        signals: ControlSignals,
        bus: BusLines,
        busy_request: bool,
        contention: bool,
    ) -> TickReport {
        TickReport {
            cycle: self.cycle,
            ui_in: self.ui_in,
            in_reset: !self.rst_n,
            state,
            signals,
            bus,
            busy_request,
            contention,
            uo_out: self.uo_out(),
        }
    }
}

impl<S: StorageAdapter> Component for SramController<S> {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn clock_edge(&mut self) {
        self.tick();
    }

    fn reset(&mut self) {
        self.apply_reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_map::pack_inputs;

    fn reset(ctrl: &mut SramController) {
        ctrl.set_reset_n(false);
        ctrl.tick();
        ctrl.set_reset_n(true);
    }

    #[test]
    fn test_controller_creation() {
        let ctrl = SramController::new("SRAM");
        assert_eq!(ctrl.name(), "SRAM");
        assert!(ctrl.ready());
        assert_eq!(ctrl.data_out(), Nibble::ZERO);
        assert!(ctrl.bus_lines().is_released());
        assert_eq!(ctrl.uio_oe(), 0);
        assert_eq!(ctrl.uio_out(), 0);
    }

    #[test]
    fn test_concrete_scenario() {
        let mut ctrl = SramController::new("SRAM");
        reset(&mut ctrl);
        ctrl.tick();
        assert!(ctrl.ready());

        ctrl.set_inputs(pack_inputs(true, false, 0b1010));
        ctrl.tick();
        assert!(!ctrl.ready());
        assert_eq!(ctrl.bus_lines().driven_value(), Some(Nibble::new(0b1010)));
        assert_eq!(ctrl.storage().contents(), Nibble::new(0b1010));

        ctrl.tick();
        assert!(ctrl.ready());

        ctrl.set_inputs(pack_inputs(true, true, 0));
        ctrl.tick();
        assert!(!ctrl.ready());
        assert!(ctrl.bus_lines().is_released());
        assert_eq!(ctrl.data_out(), Nibble::ZERO);

        ctrl.tick();
        assert!(ctrl.ready());
        assert_eq!(ctrl.data_out(), Nibble::new(0b1010));
        assert_eq!(ctrl.uo_out(), 0x1A);
    }

    #[test]
    fn test_reset_is_asynchronous() {
        let mut ctrl = SramController::new("SRAM");
        ctrl.storage_mut().load(Nibble::new(0x6));
        ctrl.set_inputs(pack_inputs(true, true, 0));
        ctrl.tick();
        ctrl.tick();
        assert_eq!(ctrl.data_out(), Nibble::new(0x6));

        // Start another read, then reset mid-access without a clock edge
        ctrl.tick();
        assert!(!ctrl.ready());
        ctrl.set_reset_n(false);
        assert!(ctrl.ready());
        assert_eq!(ctrl.data_out(), Nibble::ZERO);
        assert_eq!(ctrl.uo_out(), 0x10);

        // Edges while held in reset change nothing
        let report = ctrl.tick();
        assert!(report.in_reset);
        assert!(ctrl.ready());
        assert_eq!(ctrl.data_out(), Nibble::ZERO);
        // Storage is external and keeps its contents
        assert_eq!(ctrl.storage().contents(), Nibble::new(0x6));
    }

    #[test]
    fn test_busy_request_reported_and_dropped() {
        let mut ctrl = SramController::new("SRAM");
        ctrl.set_inputs(pack_inputs(true, false, 0x3));
        let first = ctrl.tick();
        assert!(!first.busy_request);

        ctrl.set_inputs(pack_inputs(true, false, 0xC));
        let second = ctrl.tick();
        assert!(second.busy_request);
        assert_eq!(ctrl.dropped_requests(), 1);
        assert_eq!(ctrl.storage().contents(), Nibble::new(0x3));
    }

    #[test]
    fn test_write_reaches_cells_once_per_lane() {
        let mut ctrl = SramController::new("SRAM");
        ctrl.set_inputs(pack_inputs(true, false, 0xF));
        ctrl.tick();
        ctrl.set_inputs(0);
        ctrl.tick();
        ctrl.tick();
        assert_eq!(ctrl.storage().write_count(), 4);
    }

    #[test]
    fn test_unused_bits_have_no_effect() {
        let mut plain = SramController::new("A");
        let mut noisy = SramController::new("B");
        for (ui, extra) in [(0x2A, 0xC0), (0x00, 0x40), (0x30, 0x80), (0x00, 0xC0)] {
            plain.set_inputs(ui);
            noisy.set_inputs(ui | extra);
            noisy.set_uio_in(0xFF);
            assert_eq!(plain.tick().uo_out, noisy.tick().uo_out);
        }
        assert_eq!(plain.data_out(), noisy.data_out());
    }

    #[test]
    fn test_component_trait_drives_edges() {
        let mut ctrl = SramController::new("SRAM");
        ctrl.set_request(AccessRequest::read());
        Component::clock_edge(&mut ctrl);
        assert_eq!(ctrl.state(), ControllerState::Active);
        Component::reset(&mut ctrl);
        assert_eq!(ctrl.state(), ControllerState::Idle);
    }
}
