//! CAN transport
//!
//! All frame I/O is non-blocking. A transmission that cannot be queued right away counts as a
//! failure.

use embedded_can::{Frame, Id, nb::Can};

use crate::cache::SlotCache;
use crate::core::{ControllerHealth, GroupIds, OUTPUT_LEN, SlotDecodeModes, StandardId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Payload does not fit a classic frame
    Frame,
    /// No free transmit mailbox
    MailboxFull,
    /// Controller reported a transmit error
    Transmit,
    /// Controller reported a receive error
    Receive,
}

/// Sticky fault tracking wrapper around a CAN controller
pub struct Transport<C> {
    can: C,
    health: ControllerHealth,
    rx_drain_limit: usize,
}

impl<C: Can> Transport<C> {
    pub fn new(can: C, rx_drain_limit: usize) -> Self {
        Self {
            can,
            health: ControllerHealth::Running,
            rx_drain_limit,
        }
    }

    pub fn health(&self) -> ControllerHealth {
        self.health
    }

    pub fn set_faulted(&mut self) {
        self.health = ControllerHealth::Faulted;
    }

    pub fn clear_fault(&mut self) {
        self.health = ControllerHealth::Running;
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.can
    }

    /// Sends a standard data frame without waiting.
    ///
    /// Success clears the fault flag, any failure sets it.
    pub fn send(&mut self, id: StandardId, data: &[u8]) -> Result<(), TransportError> {
        let frame = C::Frame::new(id, data).ok_or(TransportError::Frame)?;
        let result = match self.can.transmit(&frame) {
            Ok(_) => Ok(()),
            Err(nb::Error::WouldBlock) => Err(TransportError::MailboxFull),
            Err(nb::Error::Other(_)) => Err(TransportError::Transmit),
        };
        match result {
            Ok(()) => self.clear_fault(),
            Err(_) => {
                trace!("transport: send to {} failed", id.as_raw());
                self.set_faulted();
            }
        }
        result
    }

    /// Consumes up to the drain limit of pending frames and decodes group frames into `cache`.
    ///
    /// Frames outside the allow-list, extended and remote frames are discarded. A received frame
    /// clears the fault flag, a receive error sets it and ends the drain.
    /// Returns the number of consumed frames.
    pub fn drain(
        &mut self,
        groups: &GroupIds,
        modes: &SlotDecodeModes,
        cache: &mut SlotCache,
    ) -> Result<usize, TransportError> {
        let mut consumed = 0;
        while consumed < self.rx_drain_limit {
            let frame = match self.can.receive() {
                Ok(frame) => frame,
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    self.set_faulted();
                    return Err(TransportError::Receive);
                }
            };
            consumed += 1;
            self.clear_fault();
            if frame.is_remote_frame() {
                continue;
            }
            let Id::Standard(id) = frame.id() else {
                continue;
            };
            if let Some(group) = groups.group_of(id) {
                cache.absorb(group, frame.data(), modes);
            }
        }
        Ok(consumed)
    }
}

/// Converts a centi-degree reading to whole degrees, truncating toward zero.
pub fn whole_degrees(centi_celsius: i32) -> i32 {
    centi_celsius / 100
}

/// Temperature relay payload: marker, sign flag (1 for non-negative) and big-endian magnitude
pub fn temperature_payload(degrees: i32) -> [u8; OUTPUT_LEN] {
    let magnitude = degrees.unsigned_abs();
    [
        0x01,
        u8::from(degrees >= 0),
        (magnitude >> 8) as u8,
        magnitude as u8,
        0,
        0,
        0,
        0,
    ]
}
