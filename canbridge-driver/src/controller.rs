//! CAN controller lifecycle

/// Controller operating state as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerState {
    /// Participates in bus traffic
    Running,
    /// Stopped or held in reset mode
    Stopped,
    /// Disconnected from the bus after exceeding the error limit
    BusOff,
    /// Bus-off recovery sequence in progress
    Recovering,
}

impl ControllerState {
    pub const fn is_running(self) -> bool {
        matches!(self, ControllerState::Running)
    }
}

/// Lifecycle operations of a CAN controller
///
/// Frame I/O goes through `embedded_can::nb::Can` on the same object. The bridge calls these
/// operations only from the recovery path and from filter backends.
pub trait Controller {
    type Error: core::fmt::Debug;

    /// Polls the controller state. Must not block.
    fn state(&mut self) -> ControllerState;

    /// Stops the controller. Pending transmissions may be dropped.
    fn stop(&mut self);

    /// Restarts the controller with its current configuration.
    fn start(&mut self) -> Result<(), Self::Error>;
}
