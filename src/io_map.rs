//! Mapping between the 8-bit I/O vectors and the controller's semantic signals.
//!
//! ```text
//! ui_in  [3:0] write data   [4] is_read   [5] enable   [7:6] unused
//! uo_out [3:0] data_out     [4] ready     [7:5] constant 0
//! uio    unused: never driven (uio_oe = 0), input ignored
//! ```

use crate::components::controller::AccessRequest;
use crate::pin::PinValue;
use crate::types::Nibble;

pub const DATA_MASK: u8 = 0x0F;
pub const READ_BIT: u8 = 4;
pub const ENABLE_BIT: u8 = 5;
pub const READY_BIT: u8 = 4;

/// Value held on `uo_out[7:5]`.
pub const UNUSED_OUTPUT_BITS: u8 = 0b000;

pub const UIO_OUT: u8 = 0x00;
pub const UIO_OE: u8 = 0x00;

pub fn decode_inputs(ui_in: u8) -> AccessRequest {
    AccessRequest {
        enable: (ui_in >> ENABLE_BIT) & 1 == 1,
        is_read: (ui_in >> READ_BIT) & 1 == 1,
        write_data: Nibble::new(ui_in & DATA_MASK),
    }
}

/// Inverse of `decode_inputs`, with the unused bits left at zero.
pub fn encode_inputs(request: &AccessRequest) -> u8 {
    pack_inputs(request.enable, request.is_read, request.write_data.value())
}

/// `(enable << 5) | (read_not_write << 4) | (data_in & 0xF)`
pub fn pack_inputs(enable: bool, read_not_write: bool, data_in: u8) -> u8 {
    ((enable as u8) << ENABLE_BIT) | ((read_not_write as u8) << READ_BIT) | (data_in & DATA_MASK)
}

pub fn encode_outputs(data_out: Nibble, ready: bool) -> u8 {
    (UNUSED_OUTPUT_BITS << 5) | ((ready as u8) << READY_BIT) | data_out.value()
}

/// Returns `(data_out, ready)`.
pub fn decode_outputs(uo_out: u8) -> (Nibble, bool) {
    (Nibble::new(uo_out & DATA_MASK), (uo_out >> READY_BIT) & 1 == 1)
}

/// Levels seen on the auxiliary bidirectional pins: none are ever driven.
pub fn uio_pins() -> [PinValue; 8] {
    let mut pins = [PinValue::HighZ; 8];
    for (i, pin) in pins.iter_mut().enumerate() {
        if (UIO_OE >> i) & 1 == 1 {
            *pin = PinValue::from_bool((UIO_OUT >> i) & 1 == 1);
        }
    }
    pins
}
