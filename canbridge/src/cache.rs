use crate::core::{Group, SLOT_COUNT, SlotDecodeModes};

/// Last decoded value per telemetry slot
///
/// Values are sticky: they change only when a new group frame decodes them and are never
/// cleared by telemetry emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotCache([Option<u16>; SLOT_COUNT]);

impl SlotCache {
    pub const fn new() -> Self {
        Self([None; SLOT_COUNT])
    }

    pub fn get(&self, slot: usize) -> Option<u16> {
        self.0.get(slot).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    pub fn values(&self) -> [Option<u16>; SLOT_COUNT] {
        self.0
    }

    /// Decodes the slots carried by a `group` frame payload.
    ///
    /// Slots without enough payload bytes keep their previous value.
    /// Returns the number of updated slots.
    pub fn absorb(&mut self, group: Group, data: &[u8], modes: &SlotDecodeModes) -> usize {
        let mut updated = 0;
        for (slot, offset) in group.slots() {
            let Some(mode) = modes.get(slot) else {
                continue;
            };
            if let Some(value) = mode.extract(data, offset) {
                self.0[slot] = Some(value);
                updated += 1;
            }
        }
        updated
    }
}
