//! Hardware acceptance filter

use embedded_can::StandardId;
use embedded_hal::delay::DelayNs;

/// Identifier bits of a standard frame
pub const STANDARD_ID_MASK: u16 = lsb_mask(11);

/// Delay between leaving reset mode and filter verification
pub const SETTLE_DELAY_MS: u32 = 10;

/// Single code/mask acceptance filter over standard identifiers
///
/// Mask polarity: 1 ignores the bit, 0 requires a match with the code. Backends must keep this
/// polarity whatever their register layout is, and must treat every non-identifier bit
/// (RTR, reserved, data bytes) as ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcceptanceFilter {
    code: u16,
    mask: u16,
}

impl AcceptanceFilter {
    /// Narrowest single filter accepting both identifiers
    ///
    /// Bits where `a` and `b` differ are ignored, the rest must match. The filter is exact only
    /// when the identifiers differ in at most one bit. Otherwise it passes every identifier that
    /// agrees on the common bits and software has to reject the surplus.
    pub fn for_pair(a: StandardId, b: StandardId) -> Self {
        let diff = (a.as_raw() ^ b.as_raw()) & STANDARD_ID_MASK;
        Self {
            code: a.as_raw() & !diff & STANDARD_ID_MASK,
            mask: diff,
        }
    }

    pub const fn code(&self) -> u16 {
        self.code
    }

    /// Identifier bits to ignore
    pub const fn mask(&self) -> u16 {
        self.mask
    }

    pub fn accepts(&self, id: StandardId) -> bool {
        (id.as_raw() ^ self.code) & !self.mask & STANDARD_ID_MASK == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterError {
    /// Controller refused to stop or restart
    Controller,
    /// Filter registers or driver call failed
    Access,
}

/// Programs the acceptance filter of controller `C`
pub trait FilterProgrammer<C> {
    /// Writes `filter`, cycles the controller through reset, configuration and run, waits
    /// [`SETTLE_DELAY_MS`] and reads the filter back.
    ///
    /// Returns `Ok(false)` if the read-back differs from the expected code. The controller must be
    /// left running in both cases.
    fn program(
        &mut self,
        controller: &mut C,
        filter: &AcceptanceFilter,
        delay: &mut impl DelayNs,
    ) -> Result<bool, FilterError>;
}

const fn lsb_mask(n: u32) -> u16 {
    ((1u32 << n) - 1) as u16
}
