//! Wireless serial radio

/// Driver-assigned connection handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerHandle(pub u16);

/// Radio link with a notify-capable endpoint
///
/// Connection events and inbound writes are delivered by the driver through the bridge link
/// handle. This trait covers the device-initiated direction only.
pub trait Radio {
    type Error: core::fmt::Debug;

    /// Starts or resumes advertising under `name`.
    fn advertise(&mut self, name: &str) -> Result<(), Self::Error>;

    /// Sends `data` to a single peer through the notify endpoint. Must not block.
    fn notify(&mut self, peer: PeerHandle, data: &[u8]) -> Result<(), Self::Error>;
}
