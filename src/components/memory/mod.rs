// Memory components module
pub mod bitcell_array;
pub mod sense_register;

pub use bitcell_array::{BitcellArray, StorageAdapter};
pub use sense_register::SenseRegister;
