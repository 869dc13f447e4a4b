//! # SRAM4 Simulator Library
//!
//! Cycle-level model of a small synchronous SRAM test controller: a two-state access
//! sequencer, a true/complement bitline bus with explicit tri-state lines, a 4-bit
//! storage array behind an adapter trait and a sense register feeding `data_out`.
//!
//! This library provides:
//! - The controller model with an asynchronous active-low reset
//! - A test bench with a protocol monitor and per-tick trace
//! - JSON-configured bench runs and stimulus scripts
//! - An interactive terminal monitor

pub mod component;
pub mod components;
pub mod console;
pub mod error;
pub mod io_map;
pub mod pin;
pub mod system_config;
pub mod systems;
pub mod testbench;
pub mod types;

// Re-export commonly used items for easier importing
pub use component::{BaseComponent, Component};
pub use components::controller::{AccessRequest, BitlinePair, BusLines, ControllerState};
pub use components::memory::{BitcellArray, StorageAdapter};
pub use error::{SimError, SimResult, ViolationKind};
pub use pin::{Pin, PinValue};
pub use systems::{SramController, TickReport};
pub use testbench::Testbench;
pub use types::Nibble;
