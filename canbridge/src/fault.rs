/// Failure class of a bridge task
///
/// None of them stops the loop. The supervisor logs the fault and keeps the latest one for the
/// diagnostics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// CAN frame could not be sent or received
    Transport,
    /// Controller could not be restarted
    Controller,
    /// Acceptance filter programming failed
    Filter,
    /// Radio advertising or notification failed
    Link,
    /// Outbound message did not fit its buffer
    Protocol,
    /// Persistent store rejected a read or write
    Store,
    /// Temperature sensor read failed
    Sensor,
}
