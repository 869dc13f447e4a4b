// Controller components module
pub mod bus_arbiter;
pub mod sequencer;

// Re-export the controller types
pub use bus_arbiter::{drive_lines, BitlinePair, BusArbiter, BusLines};
pub use sequencer::{
    control_signals, next_state, AccessRequest, ControlSignals, ControllerState, Sequencer,
};
