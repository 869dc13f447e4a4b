//! Two-state access sequencer.
//!
//! The sequencer owns `ControllerState` and the request captured when an access is
//! accepted. All control outputs are pure functions of those two registers.

use tracing::{debug, warn};

use crate::component::{BaseComponent, Component};
use crate::types::Nibble;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle, // No access in progress, ready for a request
    Active, // Exactly one cycle of read or write
}

impl ControllerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ControllerState::Idle)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ControllerState::Active)
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            ControllerState::Idle => "IDLE",
            ControllerState::Active => "ACTIVE",
        }
    }
}

/// Per-cycle input snapshot. Never persisted except as the captured request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessRequest {
    pub enable: bool,
    pub is_read: bool,
    pub write_data: Nibble,
}

impl AccessRequest {
    pub fn write(data: Nibble) -> Self {
        Self {
            enable: true,
            is_read: false,
            write_data: data,
        }
    }

    pub fn read() -> Self {
        Self {
            enable: true,
            is_read: true,
            write_data: Nibble::ZERO,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Combinational control outputs for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSignals {
    pub ready: bool,
    pub wordline: bool,
    pub write_enable: bool,
    pub read_enable: bool,
}

/// Control outputs for a given state and captured request.
pub fn control_signals(state: ControllerState, captured: &AccessRequest) -> ControlSignals {
    let active = state.is_active();
    ControlSignals {
        ready: state.is_idle(),
        wordline: active,
        write_enable: active && !captured.is_read,
        read_enable: active && captured.is_read,
    }
}

/// Transition function evaluated once per clock edge.
pub fn next_state(state: ControllerState, request: &AccessRequest) -> ControllerState {
    match state {
        ControllerState::Idle if request.enable => ControllerState::Active,
        ControllerState::Idle => ControllerState::Idle,
        ControllerState::Active => ControllerState::Idle,
    }
}

pub struct Sequencer {
    base: BaseComponent,
    state: ControllerState,
    captured: AccessRequest,
    sampled: AccessRequest,
    accepted_count: u64,
    dropped_count: u64,
}

impl Sequencer {
    pub fn new(name: impl Into<String>) -> Self {
        Sequencer {
            base: BaseComponent::new(name),
            state: ControllerState::Idle,
            captured: AccessRequest::default(),
            sampled: AccessRequest::default(),
            accepted_count: 0,
            dropped_count: 0,
        }
    }

    /// Present the request that the next clock edge will see.
    pub fn sample(&mut self, request: AccessRequest) {
        self.sampled = request;
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn captured(&self) -> &AccessRequest {
        &self.captured
    }

    pub fn signals(&self) -> ControlSignals {
        control_signals(self.state, &self.captured)
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_idle()
    }

    /// True when the sampled request will be dropped at the next edge.
    pub fn request_is_busy(&self) -> bool {
        self.sampled.enable && !self.is_ready()
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted_count
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }
}

impl Component for Sequencer {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn clock_edge(&mut self) {
        let request = self.sampled;
        let next = next_state(self.state, &request);

        match (self.state, next) {
            (ControllerState::Idle, ControllerState::Active) => {
                self.captured = request;
                self.accepted_count += 1;
                debug!(
                    component = self.base.name(),
                    is_read = request.is_read,
                    data = %request.write_data,
                    "access accepted"
                );
            }
            (ControllerState::Active, _) if request.enable => {
                // No queue and no backpressure: the request is simply lost.
                self.dropped_count += 1;
                warn!(
                    component = self.base.name(),
                    is_read = request.is_read,
                    data = %request.write_data,
                    "request ignored while busy"
                );
            }
            _ => {}
        }

        self.state = next;
    }

    fn reset(&mut self) {
        self.state = ControllerState::Idle;
        self.captured = AccessRequest::default();
    }
}
