// Complete systems built from the components
pub mod sram_controller;

pub use sram_controller::{SramController, TickReport};
