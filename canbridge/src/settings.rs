//! Persistent device configuration

use crate::core::{DecodeMode, DeviceIdentity, GroupIds, SLOT_COUNT, SlotDecodeModes, StandardId};
use crate::driver::store::ConfigStore;

/// Store keys of the persisted fields
pub mod keys {
    use crate::core::SLOT_COUNT;

    pub const GROUP_A: &str = "grp1_id";
    pub const GROUP_B: &str = "grp2_id";
    pub const DEVICE_ID: &str = "my_id";
    pub const SENSOR_ID: &str = "k_meter_id";
    pub const SLOT_MODE: [&str; SLOT_COUNT] = [
        "slot0_mode",
        "slot1_mode",
        "slot2_mode",
        "slot3_mode",
        "slot4_mode",
        "slot5_mode",
        "slot6_mode",
    ];
}

/// Configuration persisted across resets
///
/// Loaded once at startup. Every field falls back to its default independently when the key is
/// absent, unreadable or out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub groups: GroupIds,
    pub identity: DeviceIdentity,
    pub slot_modes: SlotDecodeModes,
}

impl Settings {
    pub fn load<S: ConfigStore>(store: &mut S) -> Self {
        let mut settings = Self::default();
        let groups = &mut settings.groups;
        load_id(store, keys::GROUP_A, &mut groups.a);
        load_id(store, keys::GROUP_B, &mut groups.b);
        let identity = &mut settings.identity;
        load_id(store, keys::DEVICE_ID, &mut identity.output);
        load_id(store, keys::SENSOR_ID, &mut identity.sensor);
        let mut modes = [DecodeMode::default(); SLOT_COUNT];
        for (mode, key) in modes.iter_mut().zip(keys::SLOT_MODE) {
            if let Some(stored) = read(store, key)
                .and_then(|raw| u8::try_from(raw).ok())
                .and_then(DecodeMode::try_from_u8)
            {
                *mode = stored;
            }
        }
        settings.slot_modes = SlotDecodeModes::new(modes);
        debug!(
            "settings: groups {} {}, id {}, kid {}",
            settings.groups.a.as_raw(),
            settings.groups.b.as_raw(),
            settings.identity.output.as_raw(),
            settings.identity.sensor.as_raw()
        );
        settings
    }

    pub fn store_groups<S: ConfigStore>(&self, store: &mut S) -> Result<(), S::Error> {
        store.set_i32(keys::GROUP_A, self.groups.a.as_raw().into())?;
        store.set_i32(keys::GROUP_B, self.groups.b.as_raw().into())?;
        store.commit()
    }

    pub fn store_device_id<S: ConfigStore>(&self, store: &mut S) -> Result<(), S::Error> {
        store.set_i32(keys::DEVICE_ID, self.identity.output.as_raw().into())?;
        store.commit()
    }

    pub fn store_sensor_id<S: ConfigStore>(&self, store: &mut S) -> Result<(), S::Error> {
        store.set_i32(keys::SENSOR_ID, self.identity.sensor.as_raw().into())?;
        store.commit()
    }

    /// Persists the mode of a single slot. Out of range slots are ignored.
    pub fn store_slot_mode<S: ConfigStore>(
        &self,
        store: &mut S,
        slot: usize,
    ) -> Result<(), S::Error> {
        let (Some(key), Some(mode)) = (keys::SLOT_MODE.get(slot), self.slot_modes.get(slot)) else {
            return Ok(());
        };
        store.set_i32(key, mode.into_u8().into())?;
        store.commit()
    }
}

fn read<S: ConfigStore>(store: &mut S, key: &str) -> Option<i32> {
    match store.get_i32(key) {
        Ok(value) => value,
        Err(_) => {
            warn!("store: cannot read {}", key);
            None
        }
    }
}

fn load_id<S: ConfigStore>(store: &mut S, key: &str, id: &mut StandardId) {
    let Some(raw) = read(store, key) else {
        return;
    };
    match u16::try_from(raw).ok().and_then(StandardId::new) {
        Some(value) => *id = value,
        None => warn!("store: {} out of range", key),
    }
}
