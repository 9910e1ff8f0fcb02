//! Single filter layouts
//!
//! In single filter mode a standard frame is matched as four bytes:
//! `ID[10:3]`, `ID[2:0] RTR x x x x`, data byte 0, data byte 1.

use canbridge_driver::filter::AcceptanceFilter;

/// Identifier bits below the 11-bit standard identifier in the 32-bit layout
const ID_OFFSET_32: u32 = 21;
const LOW_ID_BITS: u16 = 0b111;
const LOW_ID_OFFSET: u32 = 5;
/// RTR and unused bits of the second byte
const BYTE1_DONT_CARE: u8 = 0x1F;

/// Acceptance code registers ACR0..ACR3
pub fn acceptance_code(filter: &AcceptanceFilter) -> [u8; 4] {
    let code = filter.code();
    [
        (code >> 3) as u8,
        ((code & LOW_ID_BITS) << LOW_ID_OFFSET) as u8,
        0,
        0,
    ]
}

/// Acceptance mask registers AMR0..AMR3. Everything but the identifier is ignored.
pub fn acceptance_mask(filter: &AcceptanceFilter) -> [u8; 4] {
    let mask = filter.mask();
    [
        (mask >> 3) as u8,
        ((mask & LOW_ID_BITS) << LOW_ID_OFFSET) as u8 | BYTE1_DONT_CARE,
        0xFF,
        0xFF,
    ]
}

/// Acceptance code in the 32-bit driver layout
pub fn single_filter_code(filter: &AcceptanceFilter) -> u32 {
    u32::from(filter.code()) << ID_OFFSET_32
}

/// Acceptance mask in the 32-bit driver layout
pub fn single_filter_mask(filter: &AcceptanceFilter) -> u32 {
    (u32::from(filter.mask()) << ID_OFFSET_32) | ((1 << ID_OFFSET_32) - 1)
}
