// Clock components module
pub mod sim_clock;

pub use sim_clock::SimClock;
