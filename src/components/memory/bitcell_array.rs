use crate::component::BaseComponent;
use crate::types::{Nibble, WORD_BITS};

/// Interface to the storage cells behind the bitline bus.
///
/// The controller only calls `write` while both the wordline and write enable are
/// asserted, and `sense` while the wordline is asserted. Implementations must make a
/// write visible to any later `sense` of the same bit.
pub trait StorageAdapter {
    fn width(&self) -> usize;
    fn write(&mut self, bit_index: usize, value: bool);
    fn sense(&self, bit_index: usize) -> bool;
}

/// Idealized one-row array of bit cells: instantaneous, lossless, no retention faults.
pub struct BitcellArray {
    base: BaseComponent,
    cells: [bool; WORD_BITS],
    write_count: u64,
}

impl BitcellArray {
    pub fn new(name: impl Into<String>) -> Self {
        BitcellArray {
            base: BaseComponent::new(name),
            cells: [false; WORD_BITS],
            write_count: 0,
        }
    }

    pub fn with_contents(name: impl Into<String>, contents: Nibble) -> Self {
        let mut array = Self::new(name);
        array.load(contents);
        array
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    /// Back-door load that bypasses the bus, for initial contents.
    pub fn load(&mut self, contents: Nibble) {
        self.cells = contents.bits();
    }

    pub fn contents(&self) -> Nibble {
        Nibble::from_bits(self.cells)
    }

    pub fn write_count(&self) -> u64 {
        self.write_count
    }
}

impl StorageAdapter for BitcellArray {
    fn width(&self) -> usize {
        WORD_BITS
    }

    fn write(&mut self, bit_index: usize, value: bool) {
        if let Some(cell) = self.cells.get_mut(bit_index) {
            *cell = value;
            self.write_count += 1;
        }
    }

    fn sense(&self, bit_index: usize) -> bool {
        self.cells.get(bit_index).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_creation() {
        let array = BitcellArray::new("CELLS");
        assert_eq!(array.name(), "CELLS");
        assert_eq!(array.width(), 4);
        assert_eq!(array.contents(), Nibble::ZERO);
    }

    #[test]
    fn test_write_then_sense() {
        let mut array = BitcellArray::new("CELLS");
        array.write(1, true);
        array.write(3, true);
        assert!(array.sense(1));
        assert!(!array.sense(2));
        assert_eq!(array.contents(), Nibble::new(0b1010));
        assert_eq!(array.write_count(), 2);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut array = BitcellArray::new("CELLS");
        array.write(4, true);
        assert_eq!(array.write_count(), 0);
        assert!(!array.sense(9));
    }

    #[test]
    fn test_load_bypasses_write_count() {
        let mut array = BitcellArray::with_contents("CELLS", Nibble::new(0x9));
        assert_eq!(array.contents(), Nibble::new(0x9));
        array.load(Nibble::ZERO);
        assert_eq!(array.contents(), Nibble::ZERO);
        assert_eq!(array.write_count(), 0);
    }
}
