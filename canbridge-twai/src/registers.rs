//! Filter programming through the memory mapped register block
//!
//! The backend never touches the controller lifecycle: it holds the peripheral in reset mode
//! itself while ACR/AMR are written and releases it afterwards.

use canbridge_driver::filter::{AcceptanceFilter, FilterError, FilterProgrammer, SETTLE_DELAY_MS};
use embedded_hal::delay::DelayNs;

use crate::format;

/// TWAI register block base on ESP32-S3
pub const TWAI_BASE: usize = 0x6002_B000;

pub const MODE: usize = 0x000;
/// First acceptance code register. ACR0..ACR3 and AMR0..AMR3 are spaced by one word.
pub const ACR0: usize = 0x040;
pub const AMR0: usize = 0x050;
const REGISTER_STRIDE: usize = 4;

pub const MODE_RESET: u32 = 1 << 0;
pub const MODE_SINGLE_FILTER: u32 = 1 << 3;
/// Only the low byte of the filter registers is implemented
const BYTE_MASK: u32 = 0xFF;

/// Word access to the TWAI register block
pub trait RegisterAccess {
    fn read(&mut self, offset: usize) -> u32;
    fn write(&mut self, offset: usize, value: u32);

    fn modify(&mut self, offset: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }
}

/// Volatile access to a peripheral mapped at `base`
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// # Safety
    ///
    /// `base` must point to a TWAI register block and nothing else may reconfigure its filter or
    /// mode registers for the lifetime of the object.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    fn ptr(&self, offset: usize) -> *mut u32 {
        (self.base + offset) as *mut u32
    }
}

impl RegisterAccess for Mmio {
    fn read(&mut self, offset: usize) -> u32 {
        // Safety: the address is inside the block the constructor was given
        unsafe { self.ptr(offset).read_volatile() }
    }

    fn write(&mut self, offset: usize, value: u32) {
        // Safety: the address is inside the block the constructor was given
        unsafe { self.ptr(offset).write_volatile(value) }
    }
}

pub struct RegisterFilter<R> {
    regs: R,
}

impl<R: RegisterAccess> RegisterFilter<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn registers(&mut self) -> &mut R {
        &mut self.regs
    }

    fn write_filter(&mut self, code: [u8; 4], mask: [u8; 4]) {
        for (i, (code, mask)) in code.into_iter().zip(mask).enumerate() {
            self.regs.write(ACR0 + i * REGISTER_STRIDE, u32::from(code));
            self.regs.write(AMR0 + i * REGISTER_STRIDE, u32::from(mask));
        }
    }
}

impl<R: RegisterAccess, C> FilterProgrammer<C> for RegisterFilter<R> {
    fn program(
        &mut self,
        _controller: &mut C,
        filter: &AcceptanceFilter,
        delay: &mut impl DelayNs,
    ) -> Result<bool, FilterError> {
        let code = format::acceptance_code(filter);
        let mask = format::acceptance_mask(filter);

        // Filter registers are writable in reset mode only
        self.regs.modify(MODE, |w| w | MODE_RESET);
        self.regs.modify(MODE, |w| w | MODE_RESET | MODE_SINGLE_FILTER);
        self.write_filter(code, mask);
        self.regs.modify(MODE, |w| w & !MODE_RESET);

        delay.delay_ms(SETTLE_DELAY_MS);

        let read_back = self.regs.read(ACR0) & BYTE_MASK;
        let verified = read_back == u32::from(code[0]);
        if verified {
            debug!("twai: filter code {} mask {} written", filter.code(), filter.mask());
        } else {
            warn!("twai: ACR0 read back {}, expected {}", read_back, code[0]);
        }
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_can::StandardId;

    const WORDS: usize = 0x60 / REGISTER_STRIDE;

    /// Register file with an optional stuck ACR0
    struct FakeRegisters {
        words: [u32; WORDS],
        mode_writes: [u32; 4],
        mode_count: usize,
        stuck_acr0: bool,
    }

    impl FakeRegisters {
        fn new() -> Self {
            Self {
                words: [0; WORDS],
                mode_writes: [0; 4],
                mode_count: 0,
                stuck_acr0: false,
            }
        }

        fn byte(&self, offset: usize) -> u8 {
            self.words[offset / REGISTER_STRIDE] as u8
        }
    }

    impl RegisterAccess for FakeRegisters {
        fn read(&mut self, offset: usize) -> u32 {
            self.words[offset / REGISTER_STRIDE]
        }

        fn write(&mut self, offset: usize, value: u32) {
            if offset == MODE {
                self.mode_writes[self.mode_count] = value;
                self.mode_count += 1;
            }
            if offset == ACR0 && self.stuck_acr0 {
                return;
            }
            self.words[offset / REGISTER_STRIDE] = value;
        }
    }

    struct NoDelay {
        total_ms: u32,
    }

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ms += ns / 1_000_000;
        }

        fn delay_ms(&mut self, ms: u32) {
            self.total_ms += ms;
        }
    }

    fn default_filter() -> AcceptanceFilter {
        AcceptanceFilter::for_pair(
            StandardId::new(0x4E0).unwrap(),
            StandardId::new(0x4E1).unwrap(),
        )
    }

    #[test]
    fn test_program_writes_registers() {
        let mut filter = RegisterFilter::new(FakeRegisters::new());
        let mut delay = NoDelay { total_ms: 0 };
        let verified = filter.program(&mut (), &default_filter(), &mut delay);
        assert_eq!(verified, Ok(true));
        assert_eq!(delay.total_ms, SETTLE_DELAY_MS);

        let regs = filter.registers();
        let acr: [u8; 4] = core::array::from_fn(|i| regs.byte(ACR0 + i * REGISTER_STRIDE));
        let amr: [u8; 4] = core::array::from_fn(|i| regs.byte(AMR0 + i * REGISTER_STRIDE));
        assert_eq!(acr, [0x9C, 0x00, 0x00, 0x00]);
        assert_eq!(amr, [0x00, 0x3F, 0xFF, 0xFF]);
    }

    #[test]
    fn test_program_cycles_reset_mode() {
        let mut filter = RegisterFilter::new(FakeRegisters::new());
        filter
            .program(&mut (), &default_filter(), &mut NoDelay { total_ms: 0 })
            .unwrap();
        let regs = filter.registers();
        assert_eq!(regs.mode_count, 3);
        assert_eq!(
            regs.mode_writes[..3],
            [MODE_RESET, MODE_RESET | MODE_SINGLE_FILTER, MODE_SINGLE_FILTER]
        );
        assert_eq!(regs.read(MODE) & MODE_RESET, 0);
    }

    #[test]
    fn test_stuck_register_fails_verification() {
        let mut regs = FakeRegisters::new();
        regs.words[ACR0 / REGISTER_STRIDE] = 0x12;
        regs.stuck_acr0 = true;
        let mut filter = RegisterFilter::new(regs);
        let verified = filter.program(&mut (), &default_filter(), &mut NoDelay { total_ms: 0 });
        assert_eq!(verified, Ok(false));
        assert_eq!(filter.registers().read(MODE) & MODE_RESET, 0);
    }
}
