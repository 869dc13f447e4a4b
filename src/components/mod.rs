pub mod clock;
pub mod controller;
pub mod memory;
