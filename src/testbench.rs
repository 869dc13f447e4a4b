//! # Test bench
//!
//! Drives an `SramController` the way the silicon bring-up bench did: pack `ui_in`,
//! advance the clock, sample `uo_out`. A protocol monitor watches every edge so that
//! behavior the hardware silently tolerates (a request while busy, a fight on the
//! bitlines) becomes visible to tests.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::components::clock::SimClock;
use crate::components::controller::{BusLines, ControllerState};
use crate::components::memory::BitcellArray;
use crate::error::{SimError, SimResult, ViolationKind};
use crate::io_map;
use crate::system_config::{SimConfig, Step};
use crate::systems::{SramController, TickReport};
use crate::types::Nibble;

/// Patterns exercised by the silicon bring-up test.
pub const DEFAULT_PATTERNS: [u8; 5] = [0xA, 0x5, 0xF, 0x0, 0x9];

pub const DEFAULT_TRACE_DEPTH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub cycle: u64,
    pub ui_in: u8,
    pub kind: ViolationKind,
}

impl From<Violation> for SimError {
    fn from(v: Violation) -> Self {
        SimError::ProtocolViolation {
            cycle: v.cycle,
            ui_in: v.ui_in,
            kind: v.kind,
        }
    }
}

/// Records protocol violations seen in tick reports.
#[derive(Debug, Clone, Default)]
pub struct ProtocolMonitor {
    strict: bool,
    violations: Vec<Violation>,
}

impl ProtocolMonitor {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            violations: Vec::new(),
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// In strict mode the first violation in this report is returned as an error.
    pub fn observe(&mut self, report: &TickReport) -> SimResult<()> {
        let mut found = Vec::new();
        if report.busy_request {
            found.push(ViolationKind::RequestWhileBusy);
        }
        if report.contention {
            found.push(ViolationKind::BusContention);
        }

        for kind in found {
            let violation = Violation {
                cycle: report.cycle,
                ui_in: report.ui_in,
                kind,
            };
            warn!(cycle = violation.cycle, kind = %kind, "protocol violation");
            self.violations.push(violation);
            if self.strict {
                return Err(violation.into());
            }
        }
        Ok(())
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }

    pub fn clear(&mut self) {
        self.violations.clear();
    }
}

/// One row of the per-tick trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    pub cycle: u64,
    pub time_ns: u64,
    pub ui_in: u8,
    pub in_reset: bool,
    pub state: ControllerState,
    pub bus: BusLines,
    pub uo_out: u8,
}

impl TraceEntry {
    pub fn header() -> &'static str {
        "cycle |   time ns | ui_in    | rst | state  | BL   | BLB  | uo_out"
    }

    pub fn to_row(&self) -> String {
        format!(
            "{:5} | {:9} | {:08b} | {:3} | {:6} | {} | {} | {:08b}",
            self.cycle,
            self.time_ns,
            self.ui_in,
            if self.in_reset { "0" } else { "1" },
            self.state.to_str(),
            self.bus.bl_string(),
            self.bus.blb_string(),
            self.uo_out
        )
    }
}

/// Outcome of a bench run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BenchReport {
    pub checks_passed: usize,
    pub cycles: u64,
    pub elapsed_ns: u64,
    pub violations: Vec<Violation>,
}

pub struct Testbench {
    dut: SramController,
    clock: SimClock,
    monitor: ProtocolMonitor,
    trace: VecDeque<TraceEntry>,
    trace_depth: usize,
}

impl Testbench {
    pub fn new() -> Self {
        Self::with_parts(SramController::new("SRAM4"), SimClock::default(), false)
    }

    pub fn strict() -> Self {
        Self::with_parts(SramController::new("SRAM4"), SimClock::default(), true)
    }

    pub fn with_parts(dut: SramController, clock: SimClock, strict: bool) -> Self {
        Testbench {
            dut,
            clock,
            monitor: ProtocolMonitor::new(strict),
            trace: VecDeque::new(),
            trace_depth: DEFAULT_TRACE_DEPTH,
        }
    }

    pub fn from_config(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        let cells = BitcellArray::with_contents(
            format!("{}_CELLS", config.name),
            Nibble::new(config.initial_contents),
        );
        let dut = SramController::with_storage(config.name.clone(), cells);
        Ok(Self::with_parts(dut, config.clock.build(), config.strict_protocol))
    }

    pub fn set_trace_depth(&mut self, depth: usize) {
        self.trace_depth = depth;
        while self.trace.len() > depth {
            self.trace.pop_front();
        }
    }

    /// Pack and drive `ui_in` as `(enable << 5) | (read_not_write << 4) | data_in`.
    pub fn set_inputs(&mut self, enable: bool, read_not_write: bool, data_in: u8) {
        self.dut
            .set_inputs(io_map::pack_inputs(enable, read_not_write, data_in));
    }

    pub fn set_raw_inputs(&mut self, ui_in: u8) {
        self.dut.set_inputs(ui_in);
    }

    /// Returns `(data_out, ready)` decoded from `uo_out`.
    pub fn get_outputs(&self) -> (Nibble, bool) {
        io_map::decode_outputs(self.dut.uo_out())
    }

    pub fn clock_cycles(&mut self, cycles: u64) -> SimResult<()> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }

    /// Single edge; the report is traced and checked by the monitor.
    pub fn step(&mut self) -> SimResult<TickReport> {
        let report = self.dut.tick();
        self.clock.tick();
        self.record(&report);
        self.monitor.observe(&report)?;
        Ok(report)
    }

    /// Hold `rst_n` low with idle inputs for `cycles` edges, then release it.
    pub fn apply_reset(&mut self, cycles: u64) -> SimResult<()> {
        info!(cycles, "applying reset");
        self.dut.set_reset_n(false);
        self.set_inputs(false, false, 0);
        self.clock_cycles(cycles)?;
        self.dut.set_reset_n(true);
        Ok(())
    }

    pub fn idle(&mut self, cycles: u64) -> SimResult<()> {
        self.set_inputs(false, false, 0);
        self.clock_cycles(cycles)
    }

    /// Clock until `ready` is high, giving up after `max_cycles` edges.
    pub fn wait_ready(&mut self, max_cycles: u64) -> SimResult<u64> {
        let mut waited = 0;
        while !self.dut.ready() {
            if waited == max_cycles {
                return Err(SimError::ExpectationFailed {
                    cycle: self.clock.cycle(),
                    message: format!("ready still low after {} cycles", max_cycles),
                });
            }
            self.step()?;
            waited += 1;
        }
        Ok(waited)
    }

    /// Assert a write request for `hold` edges, release it and let the access finish.
    pub fn write(&mut self, data: u8, hold: u64) -> SimResult<()> {
        debug!(data = format_args!("{:X}", data & 0xF), hold, "write");
        self.set_inputs(true, false, data);
        self.clock_cycles(hold)?;
        self.set_inputs(false, false, 0);
        self.wait_ready(1)?;
        Ok(())
    }

    /// Assert a read request for `hold` edges, release it and return `data_out` once
    /// the access has finished.
    pub fn read(&mut self, hold: u64) -> SimResult<Nibble> {
        self.set_inputs(true, true, 0);
        self.clock_cycles(hold)?;
        self.set_inputs(false, false, 0);
        self.wait_ready(1)?;
        let (data_out, _) = self.get_outputs();
        debug!(data = %data_out, hold, "read");
        Ok(data_out)
    }

    /// Write then read back one value using single-cycle requests.
    pub fn round_trip(&mut self, data: u8) -> SimResult<Nibble> {
        self.write(data, 1)?;
        self.read(1)
    }

    /// The silicon bring-up sequence: reset for 5 cycles, settle for 2, then for each
    /// pattern write (enable held 2 cycles), idle 1, read (enable held 3 cycles),
    /// compare, idle 1. Both holds overlap a busy cycle, so every pattern records two
    /// violations unless the bench is strict.
    pub fn run_pattern_test(&mut self, patterns: &[u8]) -> SimResult<BenchReport> {
        self.run_pattern_test_with(patterns, 5, 2)
    }

    pub fn run_pattern_test_with(
        &mut self,
        patterns: &[u8],
        reset_cycles: u64,
        settle_cycles: u64,
    ) -> SimResult<BenchReport> {
        let start_cycle = self.clock.cycle();
        self.dut.set_uio_in(0);
        self.apply_reset(reset_cycles)?;
        self.clock_cycles(settle_cycles)?;
        info!("reset complete");

        let mut checks_passed = 0;
        for &pattern in patterns {
            let expected = Nibble::new(pattern);
            info!(pattern = %expected, "writing");
            self.set_inputs(true, false, expected.value());
            self.clock_cycles(2)?;
            self.set_inputs(false, false, 0);
            self.clock_cycles(1)?;

            self.set_inputs(true, true, 0);
            self.clock_cycles(3)?;
            let (data_out, ready) = self.get_outputs();
            info!(data = %data_out, ready, "read back");

            if data_out != expected {
                return Err(SimError::DataMismatch {
                    cycle: self.clock.cycle(),
                    expected,
                    actual: data_out,
                });
            }
            checks_passed += 1;

            self.set_inputs(false, false, 0);
            self.clock_cycles(1)?;
        }

        Ok(self.report(start_cycle, checks_passed))
    }

    /// Execute a stimulus script.
    pub fn run_steps(&mut self, steps: &[Step]) -> SimResult<BenchReport> {
        let start_cycle = self.clock.cycle();
        let mut checks_passed = 0;
        for step in steps {
            if self.run_step(step)? {
                checks_passed += 1;
            }
        }
        Ok(self.report(start_cycle, checks_passed))
    }

    /// Returns whether the step carried a check that passed.
    pub fn run_step(&mut self, step: &Step) -> SimResult<bool> {
        match *step {
            Step::Write { data, hold } => {
                self.write(data, hold)?;
                Ok(false)
            }
            Step::Read { expect, hold } => {
                let data_out = self.read(hold)?;
                match expect {
                    Some(expected) => {
                        let expected = Nibble::new(expected);
                        if data_out != expected {
                            return Err(SimError::DataMismatch {
                                cycle: self.clock.cycle(),
                                expected,
                                actual: data_out,
                            });
                        }
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            Step::Idle { cycles } => {
                self.idle(cycles)?;
                Ok(false)
            }
            Step::Reset { cycles } => {
                self.apply_reset(cycles)?;
                Ok(false)
            }
            Step::Raw { ui_in, cycles } => {
                self.set_raw_inputs(ui_in);
                self.clock_cycles(cycles)?;
                Ok(false)
            }
            Step::Expect { data_out, ready } => {
                self.check_outputs(data_out, ready)?;
                Ok(data_out.is_some() || ready.is_some())
            }
        }
    }

    fn check_outputs(&self, data_out: Option<u8>, ready: Option<bool>) -> SimResult<()> {
        let (actual_data, actual_ready) = self.get_outputs();
        if let Some(expected) = data_out {
            let expected = Nibble::new(expected);
            if actual_data != expected {
                return Err(SimError::DataMismatch {
                    cycle: self.clock.cycle(),
                    expected,
                    actual: actual_data,
                });
            }
        }
        if let Some(expected) = ready {
            if actual_ready != expected {
                return Err(SimError::ExpectationFailed {
                    cycle: self.clock.cycle(),
                    message: format!("ready is {}, expected {}", actual_ready, expected),
                });
            }
        }
        Ok(())
    }

    fn record(&mut self, report: &TickReport) {
        if self.trace_depth == 0 {
            return;
        }
        if self.trace.len() == self.trace_depth {
            self.trace.pop_front();
        }
        self.trace.push_back(TraceEntry {
            cycle: self.clock.cycle(),
            time_ns: self.clock.elapsed().as_nanos() as u64,
            ui_in: report.ui_in,
            in_reset: report.in_reset,
            state: report.state,
            bus: report.bus,
            uo_out: report.uo_out,
        });
    }

    fn report(&self, start_cycle: u64, checks_passed: usize) -> BenchReport {
        BenchReport {
            checks_passed,
            cycles: self.clock.cycle() - start_cycle,
            elapsed_ns: self.clock.elapsed().as_nanos() as u64,
            violations: self.monitor.violations().to_vec(),
        }
    }

    pub fn dut(&self) -> &SramController {
        &self.dut
    }

    pub fn dut_mut(&mut self) -> &mut SramController {
        &mut self.dut
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn monitor(&self) -> &ProtocolMonitor {
        &self.monitor
    }

    pub fn violations(&self) -> &[Violation] {
        self.monitor.violations()
    }

    pub fn trace(&self) -> impl Iterator<Item = &TraceEntry> {
        self.trace.iter()
    }
}

impl Default for Testbench {
    fn default() -> Self {
        Self::new()
    }
}
