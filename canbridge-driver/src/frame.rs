//! Classic CAN frame object

use embedded_can::{Id, StandardId};

use crate::core::OUTPUT_LEN;

/// Classic CAN frame with up to 8 data bytes
///
/// Boards whose HAL lacks an `embedded_can::Frame` implementation can use this type directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    id: Id,
    remote: bool,
    dlc: u8,
    bytes: [u8; OUTPUT_LEN],
}

impl CanFrame {
    /// Creates a standard data frame.
    pub fn new_standard(id: StandardId, data: &[u8]) -> Option<Self> {
        <Self as embedded_can::Frame>::new(id, data)
    }

    pub fn standard_id(&self) -> Option<StandardId> {
        match self.id {
            Id::Standard(id) => Some(id),
            Id::Extended(_) => None,
        }
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > OUTPUT_LEN {
            return None;
        }
        let mut bytes = [0; OUTPUT_LEN];
        bytes[..data.len()].copy_from_slice(data);
        Some(Self {
            id: id.into(),
            remote: false,
            dlc: data.len() as u8,
            bytes,
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > OUTPUT_LEN {
            return None;
        }
        Some(Self {
            id: id.into(),
            remote: true,
            dlc: dlc as u8,
            bytes: [0; OUTPUT_LEN],
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc.into()
    }

    fn data(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.bytes[..usize::from(self.dlc)]
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CanFrame {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        use embedded_can::Frame;

        match self.id {
            Id::Standard(id) => defmt::write!(fmt, "CanFrame {{ id: {=u16:#x}", id.as_raw()),
            Id::Extended(id) => defmt::write!(fmt, "CanFrame {{ id: {=u32:#x}x", id.as_raw()),
        }
        if self.remote {
            defmt::write!(fmt, ", remote, dlc: {=u8} }}", self.dlc)
        } else {
            defmt::write!(fmt, ", data: {=[u8]:x} }}", self.data())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_can::{ExtendedId, Frame};

    #[test]
    fn test_data_length() {
        let id = StandardId::new(0x4E0).unwrap();
        for len in 0..=OUTPUT_LEN {
            let data = [0xA5; OUTPUT_LEN];
            let frame = CanFrame::new_standard(id, &data[..len]).unwrap();
            assert_eq!(frame.dlc(), len);
            assert_eq!(frame.data(), &data[..len]);
        }
        assert!(CanFrame::new_standard(id, &[0; 9]).is_none());
    }

    #[test]
    fn test_remote_frame_has_no_payload() {
        let frame = CanFrame::new_remote(StandardId::ZERO, 4).unwrap();
        assert!(frame.is_remote_frame());
        assert_eq!(frame.dlc(), 4);
        assert!(frame.data().is_empty());
    }

    #[test]
    fn test_standard_id() {
        let id = StandardId::new(0x123).unwrap();
        assert_eq!(
            CanFrame::new_standard(id, &[]).unwrap().standard_id(),
            Some(id)
        );
        let extended = CanFrame::new(ExtendedId::new(0x123).unwrap(), &[]).unwrap();
        assert!(extended.is_extended());
        assert_eq!(extended.standard_id(), None);
    }
}
