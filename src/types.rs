use std::fmt;

/// Width of the storage word and of every data path in the controller.
pub const WORD_BITS: usize = 4;

/// 4-bit unsigned value carried on the data lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Nibble(u8);

impl Nibble {
    pub const ZERO: Nibble = Nibble(0);
    pub const MAX: Nibble = Nibble(0xF);

    pub fn new(value: u8) -> Self {
        Nibble(value & 0xF)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn bit(&self, index: usize) -> bool {
        index < WORD_BITS && (self.0 >> index) & 1 == 1
    }

    pub fn with_bit(&self, index: usize, value: bool) -> Self {
        if index >= WORD_BITS {
            return *self;
        }
        if value {
            Nibble(self.0 | (1 << index))
        } else {
            Nibble(self.0 & !(1 << index))
        }
    }

    pub fn from_bits(bits: [bool; WORD_BITS]) -> Self {
        bits.iter()
            .enumerate()
            .fold(Nibble::ZERO, |acc, (i, &b)| acc.with_bit(i, b))
    }

    pub fn bits(&self) -> [bool; WORD_BITS] {
        [self.bit(0), self.bit(1), self.bit(2), self.bit(3)]
    }

    /// Every representable value, in ascending order.
    pub fn all() -> impl Iterator<Item = Nibble> {
        (0..=0xF).map(Nibble)
    }
}

impl fmt::Display for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

impl fmt::UpperHex for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl fmt::Binary for Nibble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.0)
    }
}

impl From<u8> for Nibble {
    fn from(value: u8) -> Self {
        Nibble::new(value)
    }
}

impl From<Nibble> for u8 {
    fn from(value: Nibble) -> Self {
        value.value()
    }
}
