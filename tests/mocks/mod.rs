//! Mock storage and proptest strategies shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;

use sram4_sim::{Nibble, StorageAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageCall {
    Write { bit: usize, value: bool },
    Sense { bit: usize },
}

/// Storage adapter that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingStorage {
    cells: [bool; 4],
    calls: RefCell<Vec<StorageCall>>,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: Nibble) -> Self {
        Self {
            cells: contents.bits(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.borrow().clone()
    }

    pub fn writes(&self) -> Vec<(usize, bool)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                StorageCall::Write { bit, value } => Some((*bit, *value)),
                StorageCall::Sense { .. } => None,
            })
            .collect()
    }

    pub fn sense_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, StorageCall::Sense { .. }))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn contents(&self) -> Nibble {
        Nibble::from_bits(self.cells)
    }
}

impl StorageAdapter for RecordingStorage {
    fn width(&self) -> usize {
        4
    }

    fn write(&mut self, bit_index: usize, value: bool) {
        self.calls.borrow_mut().push(StorageCall::Write {
            bit: bit_index,
            value,
        });
        self.cells[bit_index] = value;
    }

    fn sense(&self, bit_index: usize) -> bool {
        self.calls
            .borrow_mut()
            .push(StorageCall::Sense { bit: bit_index });
        self.cells[bit_index]
    }
}

pub mod proptest_helpers {
    use proptest::prelude::*;
    use sram4_sim::{AccessRequest, Nibble};

    pub fn arb_nibble() -> impl Strategy<Value = Nibble> {
        (0u8..16).prop_map(Nibble::new)
    }

    pub fn arb_request() -> impl Strategy<Value = AccessRequest> {
        prop_oneof![
            Just(AccessRequest::none()),
            Just(AccessRequest::read()),
            arb_nibble().prop_map(AccessRequest::write),
        ]
    }

    /// One step of stimulus: the raw input vector and whether reset is asserted.
    pub fn arb_stimulus() -> impl Strategy<Value = (u8, bool)> {
        (any::<u8>(), prop::bool::weighted(0.05))
    }
}
