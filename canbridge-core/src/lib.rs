//! CAN bridge core data types
//!
//! This crate provides the data model shared by the other bridge crates.
//! Bridge users should not depend on this crate directly. Use the `canbridge::core` reexport
//! instead.
#![no_std]

pub use embedded_can::StandardId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidValue;

/// Number of telemetry slots multiplexed across the two group frames
pub const SLOT_COUNT: usize = 7;

/// Length of the device output vector and of every frame the bridge transmits
pub const OUTPUT_LEN: usize = 8;

pub const DEFAULT_GROUP_A: StandardId = StandardId::new(0x4E0).unwrap();
pub const DEFAULT_GROUP_B: StandardId = StandardId::new(0x4E1).unwrap();
pub const DEFAULT_OUTPUT_ID: StandardId = StandardId::new(0x5A0).unwrap();
pub const DEFAULT_SENSOR_ID: StandardId = StandardId::new(0x661).unwrap();

/// One of the two relayed telemetry frames
///
/// Group A carries slots 0..4 at byte offsets 0, 2, 4, 6.
/// Group B carries slots 4..7 at byte offsets 0, 2, 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Group {
    A,
    B,
}

impl Group {
    pub const fn first_slot(self) -> usize {
        match self {
            Group::A => 0,
            Group::B => 4,
        }
    }

    pub const fn slot_count(self) -> usize {
        match self {
            Group::A => 4,
            Group::B => 3,
        }
    }

    /// Yields `(slot, byte offset)` pairs carried by the group frame.
    pub fn slots(self) -> impl Iterator<Item = (usize, usize)> {
        let first = self.first_slot();
        (0..self.slot_count()).map(move |i| (first + i, i * 2))
    }
}

/// Group identifiers relayed from the bus
///
/// Drives both the hardware acceptance filter and the software allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupIds {
    pub a: StandardId,
    pub b: StandardId,
}

impl GroupIds {
    pub const fn new(a: StandardId, b: StandardId) -> Self {
        Self { a, b }
    }

    /// Software allow-list check. Group A wins if both identifiers are equal.
    pub fn group_of(&self, id: StandardId) -> Option<Group> {
        if id == self.a {
            Some(Group::A)
        } else if id == self.b {
            Some(Group::B)
        } else {
            None
        }
    }
}

impl Default for GroupIds {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_A, DEFAULT_GROUP_B)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for GroupIds {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::write!(
            fmt,
            "GroupIds {{ a: {=u16:#x}, b: {=u16:#x} }}",
            self.a.as_raw(),
            self.b.as_raw()
        )
    }
}

/// Identifiers owned by the device itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Carries the output vector
    pub output: StandardId,
    /// Carries the relayed temperature reading
    pub sensor: StandardId,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            output: DEFAULT_OUTPUT_ID,
            sensor: DEFAULT_SENSOR_ID,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceIdentity {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::write!(
            fmt,
            "DeviceIdentity {{ output: {=u16:#x}, sensor: {=u16:#x} }}",
            self.output.as_raw(),
            self.sensor.as_raw()
        )
    }
}

/// Slot value encoding inside a group frame
///
/// The numeric encoding is the one exchanged with the application and persisted in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DecodeMode {
    /// A single raw byte
    Byte = 0,
    /// Two bytes, low byte first
    #[default]
    LittleEndian16 = 1,
    /// Two bytes, high byte first
    BigEndian16 = 2,
}

impl DecodeMode {
    pub const fn try_from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(DecodeMode::Byte),
            1 => Some(DecodeMode::LittleEndian16),
            2 => Some(DecodeMode::BigEndian16),
            _ => None,
        }
    }

    pub const fn into_u8(self) -> u8 {
        self as u8
    }

    /// Width of an encoded value in bytes
    pub const fn width(self) -> usize {
        match self {
            DecodeMode::Byte => 1,
            DecodeMode::LittleEndian16 | DecodeMode::BigEndian16 => 2,
        }
    }

    /// Decodes the value at `offset`. Returns `None` if `data` is too short.
    pub fn extract(self, data: &[u8], offset: usize) -> Option<u16> {
        let bytes = data.get(offset..offset.checked_add(self.width())?)?;
        match self {
            DecodeMode::Byte => Some(u16::from(bytes[0])),
            DecodeMode::LittleEndian16 => Some(u16::from_le_bytes([bytes[0], bytes[1]])),
            DecodeMode::BigEndian16 => Some(u16::from_be_bytes([bytes[0], bytes[1]])),
        }
    }
}

impl From<DecodeMode> for u8 {
    fn from(value: DecodeMode) -> Self {
        value.into_u8()
    }
}

impl TryFrom<u8> for DecodeMode {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_from_u8(value).ok_or(InvalidValue)
    }
}

/// Per-slot decode modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotDecodeModes([DecodeMode; SLOT_COUNT]);

impl SlotDecodeModes {
    pub const fn new(modes: [DecodeMode; SLOT_COUNT]) -> Self {
        Self(modes)
    }

    pub fn get(&self, slot: usize) -> Option<DecodeMode> {
        self.0.get(slot).copied()
    }

    pub fn set(&mut self, slot: usize, mode: DecodeMode) -> Result<(), InvalidValue> {
        let entry = self.0.get_mut(slot).ok_or(InvalidValue)?;
        *entry = mode;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = DecodeMode> + '_ {
        self.0.iter().copied()
    }
}

/// Device-controlled output vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputState([u8; OUTPUT_LEN]);

impl OutputState {
    pub const fn new(bytes: [u8; OUTPUT_LEN]) -> Self {
        Self(bytes)
    }

    /// Sets a single byte. Other bytes keep their values.
    pub fn set(&mut self, index: usize, value: u8) -> Result<(), InvalidValue> {
        let entry = self.0.get_mut(index).ok_or(InvalidValue)?;
        *entry = value;
        Ok(())
    }

    pub const fn as_bytes(&self) -> &[u8; OUTPUT_LEN] {
        &self.0
    }
}

/// Bridge-level view of the CAN controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerHealth {
    #[default]
    Running,
    Faulted,
}

impl ControllerHealth {
    pub const fn is_faulted(self) -> bool {
        matches!(self, ControllerHealth::Faulted)
    }
}
