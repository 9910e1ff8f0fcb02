//! Outbound text messages
//!
//! Every message is a single ASCII line in `KEY=VALUE` form. Identifiers render as lowercase hex
//! with a `0x` prefix, byte vectors and slot values as comma-separated decimals.

use core::fmt::{self, Write};

use crate::core::{
    ControllerHealth, DecodeMode, DeviceIdentity, GroupIds, OutputState, SLOT_COUNT, StandardId,
};
use crate::settings::Settings;

/// Longest encoded message
pub const MESSAGE_CAPACITY: usize = 64;

pub type MessageText = heapless::String<MESSAGE_CAPACITY>;

/// Messages in a configuration push
pub const SNAPSHOT_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// `STATE=` output vector
    State(OutputState),
    /// `GRP1=` group A identifier
    Group1(StandardId),
    /// `GRP2=` group B identifier
    Group2(StandardId),
    /// `ID=` output identifier
    DeviceId(StandardId),
    /// `KID=` sensor relay identifier
    SensorId(StandardId),
    /// `VALS=` consolidated slot telemetry
    Values([Option<u16>; SLOT_COUNT]),
    /// `TEMP=` whole degrees
    Temperature(i32),
    /// `STATUS=` controller health
    Status(ControllerHealth),
    /// `SLOT_MODE_OK=` acknowledgement
    SlotModeOk { slot: u8, mode: DecodeMode },
}

/// Full configuration push
///
/// Goes out as `STATE=`, `GRP1=`, `GRP2=`, `ID=`, `KID=` in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub output: OutputState,
    pub groups: GroupIds,
    pub identity: DeviceIdentity,
}

impl Snapshot {
    pub fn new(settings: &Settings, output: &OutputState) -> Self {
        Self {
            output: *output,
            groups: settings.groups,
            identity: settings.identity,
        }
    }

    /// Message at wire position `index`, `None` past the end.
    pub fn message(&self, index: usize) -> Option<Message> {
        let message = match index {
            0 => Message::State(self.output),
            1 => Message::Group1(self.groups.a),
            2 => Message::Group2(self.groups.b),
            3 => Message::DeviceId(self.identity.output),
            4 => Message::SensorId(self.identity.sensor),
            _ => return None,
        };
        Some(message)
    }

    pub fn messages(&self) -> impl Iterator<Item = Message> + '_ {
        (0..SNAPSHOT_LEN).filter_map(|i| self.message(i))
    }
}

impl Message {
    /// Reports produced on a timer. A newer report makes an older one obsolete.
    pub fn is_periodic(&self) -> bool {
        matches!(
            self,
            Message::Values(_) | Message::Temperature(_) | Message::Status(_)
        )
    }

    pub fn encode(&self) -> Result<MessageText, fmt::Error> {
        let mut text = MessageText::new();
        write!(text, "{self}")?;
        Ok(text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::State(state) => {
                f.write_str("STATE=")?;
                write_joined(f, state.as_bytes().iter().map(|&b| Some(u16::from(b))))
            }
            Message::Group1(id) => write!(f, "GRP1={:#x}", id.as_raw()),
            Message::Group2(id) => write!(f, "GRP2={:#x}", id.as_raw()),
            Message::DeviceId(id) => write!(f, "ID={:#x}", id.as_raw()),
            Message::SensorId(id) => write!(f, "KID={:#x}", id.as_raw()),
            Message::Values(values) => {
                let len = values.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
                f.write_str("VALS=")?;
                write_joined(f, values[..len].iter().copied())
            }
            Message::Temperature(t) => write!(f, "TEMP={t}"),
            Message::Status(ControllerHealth::Running) => f.write_str("STATUS=CAN_OK"),
            Message::Status(ControllerHealth::Faulted) => f.write_str("STATUS=ERR"),
            Message::SlotModeOk { slot, mode } => {
                write!(f, "SLOT_MODE_OK={},{}", slot, mode.into_u8())
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Message {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::write!(fmt, "{}", defmt::Display2Format(self))
    }
}

/// Writes values separated by commas, absent values as empty fields.
fn write_joined(
    f: &mut fmt::Formatter<'_>,
    values: impl Iterator<Item = Option<u16>>,
) -> fmt::Result {
    for (i, value) in values.enumerate() {
        if i > 0 {
            f.write_char(',')?;
        }
        if let Some(value) = value {
            write!(f, "{value}")?;
        }
    }
    Ok(())
}
