/// A clocked part of the simulated circuit.
///
/// Registered state may only change inside `clock_edge` or `reset`; everything a
/// component exposes between edges is combinational and derived from that state.
pub trait Component {
    fn name(&self) -> &str;

    /// Advance registered state across one rising clock edge.
    fn clock_edge(&mut self);

    /// Asynchronous reset. Takes effect immediately, independent of the clock.
    fn reset(&mut self);
}

/// Name holder shared by the concrete components.
#[derive(Debug, Clone)]
pub struct BaseComponent {
    name: String,
}

impl BaseComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Driver id used when this component asserts a shared pin.
    pub fn driver_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.name, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_component_names() {
        let base = BaseComponent::new("ARBITER");
        assert_eq!(base.name(), "ARBITER");
        assert_eq!(base.driver_name("WRITE"), "ARBITER_WRITE");
    }
}
