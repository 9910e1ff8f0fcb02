//! Inbound command grammar
//!
//! ```text
//! REQUEST_STATE
//! SET_GROUPS=<hex>,<hex>
//! ID=<hex>
//! KID=<hex>
//! SET_SLOT_MODE=<slot>,<mode>
//! <N>=<V>
//! ```
//! Hex arguments take an optional `0x`/`0X` prefix and must fit a standard identifier.
//! `N` is the 1-based output byte index, `V` its decimal value.

use core::str::FromStr;

use crate::core::{DecodeMode, GroupIds, OUTPUT_LEN, SLOT_COUNT, StandardId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    RequestState,
    SetGroups(GroupIds),
    SetDeviceId(StandardId),
    SetSensorId(StandardId),
    SetSlotMode { slot: u8, mode: DecodeMode },
    /// Zero-based output byte index
    SetOutput { index: u8, value: u8 },
}

#[cfg(feature = "defmt")]
impl defmt::Format for Command {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        match *self {
            Command::RequestState => defmt::write!(fmt, "RequestState"),
            Command::SetGroups(groups) => defmt::write!(fmt, "SetGroups({})", groups),
            Command::SetDeviceId(id) => defmt::write!(fmt, "SetDeviceId({=u16:#x})", id.as_raw()),
            Command::SetSensorId(id) => defmt::write!(fmt, "SetSensorId({=u16:#x})", id.as_raw()),
            Command::SetSlotMode { slot, mode } => {
                defmt::write!(fmt, "SetSlotMode {{ slot: {=u8}, mode: {} }}", slot, mode)
            }
            Command::SetOutput { index, value } => {
                defmt::write!(fmt, "SetOutput {{ index: {=u8}, value: {=u8} }}", index, value)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError;

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "REQUEST_STATE" {
            return Ok(Command::RequestState);
        }
        if let Some(args) = s.strip_prefix("SET_GROUPS=") {
            let (a, b) = args.split_once(',').ok_or(ParseError)?;
            return Ok(Command::SetGroups(GroupIds::new(parse_id(a)?, parse_id(b)?)));
        }
        if let Some(arg) = s.strip_prefix("ID=") {
            return Ok(Command::SetDeviceId(parse_id(arg)?));
        }
        if let Some(arg) = s.strip_prefix("KID=") {
            return Ok(Command::SetSensorId(parse_id(arg)?));
        }
        if let Some(args) = s.strip_prefix("SET_SLOT_MODE=") {
            let (slot, mode) = args.split_once(',').ok_or(ParseError)?;
            let slot = parse_decimal(slot)?;
            if usize::from(slot) >= SLOT_COUNT {
                return Err(ParseError);
            }
            let mode = DecodeMode::try_from_u8(parse_decimal(mode)?).ok_or(ParseError)?;
            return Ok(Command::SetSlotMode { slot, mode });
        }
        let (index, value) = s.split_once('=').ok_or(ParseError)?;
        let index = parse_decimal(index)?;
        if index == 0 || usize::from(index) > OUTPUT_LEN {
            return Err(ParseError);
        }
        Ok(Command::SetOutput {
            index: index - 1,
            value: parse_decimal(value)?,
        })
    }
}

/// Parses a standard identifier in hex with an optional `0x` prefix.
fn parse_id(s: &str) -> Result<StandardId, ParseError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ParseError);
    }
    let raw = u16::from_str_radix(digits, 16).map_err(|_| ParseError)?;
    StandardId::new(raw).ok_or(ParseError)
}

/// Parses an unsigned decimal without sign or whitespace.
fn parse_decimal(s: &str) -> Result<u8, ParseError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError);
    }
    s.parse().map_err(|_| ParseError)
}
