//! # JSON Configuration System
//!
//! Bench runs are described in JSON: clock period, reset timing, protocol strictness,
//! initial cell contents, a list of write/read-back patterns and an optional stimulus
//! script.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sram4_sim::system_config::SimConfig;
//! use sram4_sim::testbench::Testbench;
//!
//! let config = SimConfig::from_json_file("configs/sram4_basic.json").expect("bad config");
//! let mut bench = Testbench::from_config(&config).expect("invalid config");
//! let report = bench.run_pattern_test(&config.patterns).expect("pattern test failed");
//! println!("{} patterns checked in {} cycles", report.checks_passed, report.cycles);
//! ```
//!
//! ## Configuration File Format
//!
//! ```json
//! {
//!   "name": "sram4_basic",
//!   "description": "Bring-up patterns",
//!   "clock": { "period_ns": 20 },
//!   "console": { "run_step_ms": 100 },
//!   "reset_cycles": 5,
//!   "settle_cycles": 2,
//!   "strict_protocol": false,
//!   "initial_contents": 0,
//!   "patterns": [10, 5, 15, 0, 9],
//!   "steps": [
//!     { "op": "write", "data": 6 },
//!     { "op": "read", "expect": 6 },
//!     { "op": "idle", "cycles": 2 }
//!   ]
//! }
//! ```
//!
//! `clock.frequency_hz`, when present, takes precedence over `clock.period_ns`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::clock::sim_clock::DEFAULT_PERIOD_NS;
use crate::components::clock::SimClock;
use crate::console::ConsoleConfig;
use crate::error::{SimError, SimResult};
use crate::testbench::{BenchReport, Testbench, DEFAULT_PATTERNS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_period_ns")]
    pub period_ns: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_hz: Option<u64>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            period_ns: DEFAULT_PERIOD_NS,
            frequency_hz: None,
        }
    }
}

impl ClockConfig {
    pub fn build(&self) -> SimClock {
        match self.frequency_hz {
            Some(hz) => SimClock::from_frequency(hz as f64),
            None => SimClock::new(self.period_ns),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default = "default_reset_cycles")]
    pub reset_cycles: u64,
    #[serde(default = "default_settle_cycles")]
    pub settle_cycles: u64,
    #[serde(default)]
    pub strict_protocol: bool,
    #[serde(default)]
    pub initial_contents: u8,
    #[serde(default = "default_patterns")]
    pub patterns: Vec<u8>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One stimulus script entry, tagged by `op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Request a write, holding `enable` for `hold` edges.
    Write {
        data: u8,
        #[serde(default = "default_hold")]
        hold: u64,
    },
    /// Request a read and optionally compare `data_out` once it completes.
    Read {
        #[serde(default)]
        expect: Option<u8>,
        #[serde(default = "default_hold")]
        hold: u64,
    },
    Idle {
        cycles: u64,
    },
    Reset {
        cycles: u64,
    },
    /// Drive an arbitrary `ui_in`, unused bits included.
    Raw {
        ui_in: u8,
        #[serde(default = "default_hold")]
        cycles: u64,
    },
    Expect {
        #[serde(default)]
        data_out: Option<u8>,
        #[serde(default)]
        ready: Option<bool>,
    },
}

fn default_period_ns() -> u64 {
    DEFAULT_PERIOD_NS
}

fn default_reset_cycles() -> u64 {
    5
}

fn default_settle_cycles() -> u64 {
    2
}

fn default_patterns() -> Vec<u8> {
    DEFAULT_PATTERNS.to_vec()
}

fn default_hold() -> u64 {
    1
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "sram4".to_string(),
            description: String::new(),
            clock: ClockConfig::default(),
            console: ConsoleConfig::default(),
            reset_cycles: default_reset_cycles(),
            settle_cycles: default_settle_cycles(),
            strict_protocol: false,
            initial_contents: 0,
            patterns: default_patterns(),
            steps: Vec::new(),
        }
    }
}

impl SimConfig {
    pub fn from_json_file(path: &str) -> SimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_json_str_at(&content, path)?;
        debug!(path, name = %config.name, "loaded config");
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> SimResult<Self> {
        Self::from_json_str_at(content, "<inline>")
    }

    fn from_json_str_at(content: &str, path: &str) -> SimResult<Self> {
        let config: SimConfig = serde_json::from_str(content).map_err(|source| SimError::Json {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> SimResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| SimError::Json {
            path: "<serialize>".to_string(),
            source,
        })
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.clock.period_ns == 0 {
            return Err(invalid("clock.period_ns must be greater than zero"));
        }
        match self.clock.frequency_hz {
            Some(0) => return Err(invalid("clock.frequency_hz must be greater than zero")),
            Some(hz) if hz > 1_000_000_000 => {
                return Err(invalid(format!(
                    "clock.frequency_hz {} is above the 1 ns resolution",
                    hz
                )))
            }
            _ => {}
        }
        if self.console.trace_rows == 0 {
            return Err(invalid("console.trace_rows must be at least one"));
        }
        if self.initial_contents > 0xF {
            return Err(invalid(format!(
                "initial_contents {:#x} does not fit in 4 bits",
                self.initial_contents
            )));
        }
        if let Some(p) = self.patterns.iter().find(|p| **p > 0xF) {
            return Err(invalid(format!("pattern {:#x} does not fit in 4 bits", p)));
        }
        for (i, step) in self.steps.iter().enumerate() {
            step.validate()
                .map_err(|msg| invalid(format!("step {}: {}", i, msg)))?;
        }
        Ok(())
    }

    /// Pattern test first (if any patterns), then the stimulus script on the same bench.
    pub fn run(&self) -> SimResult<BenchReport> {
        let mut bench = Testbench::from_config(self)?;
        self.run_on(&mut bench)
    }

    pub fn run_on(&self, bench: &mut Testbench) -> SimResult<BenchReport> {
        let mut checks_passed = 0;
        if !self.patterns.is_empty() {
            let report =
                bench.run_pattern_test_with(&self.patterns, self.reset_cycles, self.settle_cycles)?;
            checks_passed += report.checks_passed;
        } else {
            bench.apply_reset(self.reset_cycles)?;
            bench.clock_cycles(self.settle_cycles)?;
        }
        let report = bench.run_steps(&self.steps)?;
        checks_passed += report.checks_passed;

        Ok(BenchReport {
            checks_passed,
            cycles: bench.clock().cycle(),
            elapsed_ns: report.elapsed_ns,
            violations: report.violations,
        })
    }
}

impl Step {
    fn validate(&self) -> Result<(), String> {
        match *self {
            Step::Write { data, hold } => {
                check_nibble("data", data)?;
                check_hold(hold)
            }
            Step::Read { expect, hold } => {
                if let Some(e) = expect {
                    check_nibble("expect", e)?;
                }
                check_hold(hold)
            }
            Step::Expect { data_out, .. } => match data_out {
                Some(d) => check_nibble("data_out", d),
                None => Ok(()),
            },
            Step::Idle { .. } | Step::Reset { .. } | Step::Raw { .. } => Ok(()),
        }
    }
}

fn check_nibble(field: &str, value: u8) -> Result<(), String> {
    if value > 0xF {
        Err(format!("{} {:#x} does not fit in 4 bits", field, value))
    } else {
        Ok(())
    }
}

fn check_hold(hold: u64) -> Result<(), String> {
    if hold == 0 {
        Err("hold must be at least one cycle".to_string())
    } else {
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> SimError {
    SimError::InvalidConfig(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = SimConfig::from_json_str(r#"{ "name": "mini" }"#).unwrap();
        assert_eq!(config.clock.period_ns, 20);
        assert_eq!(config.reset_cycles, 5);
        assert_eq!(config.settle_cycles, 2);
        assert_eq!(config.patterns, DEFAULT_PATTERNS.to_vec());
        assert!(config.steps.is_empty());
        assert!(!config.strict_protocol);
    }

    #[test]
    fn test_step_parsing() {
        let config = SimConfig::from_json_str(
            r#"{
                "name": "steps",
                "steps": [
                    { "op": "write", "data": 6 },
                    { "op": "read", "expect": 6, "hold": 2 },
                    { "op": "raw", "ui_in": 192 },
                    { "op": "expect", "ready": true }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.steps[0], Step::Write { data: 6, hold: 1 });
        assert_eq!(
            config.steps[1],
            Step::Read {
                expect: Some(6),
                hold: 2
            }
        );
        assert_eq!(config.steps[2], Step::Raw { ui_in: 192, cycles: 1 });
        assert_eq!(
            config.steps[3],
            Step::Expect {
                data_out: None,
                ready: Some(true)
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            r#"{ "name": "x", "clock": { "period_ns": 0 } }"#,
            r#"{ "name": "x", "patterns": [16] }"#,
            r#"{ "name": "x", "initial_contents": 31 }"#,
            r#"{ "name": "x", "steps": [{ "op": "write", "data": 17 }] }"#,
            r#"{ "name": "x", "steps": [{ "op": "read", "hold": 0 }] }"#,
            r#"{ "name": " " }"#,
            r#"{ "name": "x", "clock": { "frequency_hz": 0 } }"#,
            r#"{ "name": "x", "clock": { "frequency_hz": 2000000000 } }"#,
            r#"{ "name": "x", "console": { "trace_rows": 0 } }"#,
        ];
        for case in cases {
            let err = SimConfig::from_json_str(case).unwrap_err();
            assert!(matches!(err, SimError::InvalidConfig(_)), "{}: {}", case, err);
        }
    }

    #[test]
    fn test_unknown_op_is_a_parse_error() {
        let err = SimConfig::from_json_str(r#"{ "name": "x", "steps": [{ "op": "erase" }] }"#)
            .unwrap_err();
        assert!(matches!(err, SimError::Json { .. }));
    }

    #[test]
    fn test_clock_from_frequency() {
        let config = SimConfig::from_json_str(
            r#"{ "name": "fast", "clock": { "period_ns": 20, "frequency_hz": 100000000 } }"#,
        )
        .unwrap();
        let clock = config.clock.build();
        assert_eq!(clock.period_ns(), 10);

        let config = SimConfig::from_json_str(r#"{ "name": "slow", "clock": { "period_ns": 40 } }"#)
            .unwrap();
        assert_eq!(config.clock.build().period_ns(), 40);
    }

    #[test]
    fn test_console_section() {
        let config =
            SimConfig::from_json_str(r#"{ "name": "ui", "console": { "run_step_ms": 100 } }"#)
                .unwrap();
        assert_eq!(config.console.run_step_ms, 100);
        assert_eq!(config.console.refresh_rate_ms, 50);
        assert_eq!(config.console.trace_rows, 12);
    }

    #[test]
    fn test_json_roundtrip_of_default() {
        let config = SimConfig::default();
        let text = config.to_json().unwrap();
        assert_eq!(SimConfig::from_json_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        let err = SimConfig::from_json_file("configs/does_not_exist.json").unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
    }

    #[test]
    fn test_run_patterns_and_steps() {
        let config = SimConfig::from_json_str(
            r#"{
                "name": "run",
                "patterns": [3],
                "steps": [
                    { "op": "write", "data": 12 },
                    { "op": "read", "expect": 12 },
                    { "op": "expect", "data_out": 12, "ready": true }
                ]
            }"#,
        )
        .unwrap();
        let report = config.run().unwrap();
        assert_eq!(report.checks_passed, 3);
        // Two from the pattern; the script itself is clean
        assert_eq!(report.violations.len(), 2);
    }
}
