//! Filter programming through a TWAI driver API
//!
//! Such drivers take the single filter as 32-bit code and mask words and reject updates while the
//! controller runs, so the controller is stopped around the write.

use canbridge_driver::controller::Controller;
use canbridge_driver::filter::{AcceptanceFilter, FilterError, FilterProgrammer, SETTLE_DELAY_MS};
use embedded_hal::delay::DelayNs;

use crate::format;

/// Single filter access of a TWAI driver
pub trait TwaiFilterDriver {
    type Error: core::fmt::Debug;

    /// Installs a single filter. Only valid while the controller is stopped.
    fn set_single_filter(&mut self, code: u32, mask: u32) -> Result<(), Self::Error>;

    /// Reads the active acceptance code back from the hardware
    fn single_filter_code(&mut self) -> Result<u32, Self::Error>;
}

pub struct DriverFilter<D> {
    driver: D,
}

impl<D: TwaiFilterDriver> DriverFilter<D> {
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&mut self) -> &mut D {
        &mut self.driver
    }
}

impl<D: TwaiFilterDriver, C: Controller> FilterProgrammer<C> for DriverFilter<D> {
    fn program(
        &mut self,
        controller: &mut C,
        filter: &AcceptanceFilter,
        delay: &mut impl DelayNs,
    ) -> Result<bool, FilterError> {
        let code = format::single_filter_code(filter);
        let mask = format::single_filter_mask(filter);

        controller.stop();
        let installed = self.driver.set_single_filter(code, mask);
        // Restart even if the update failed
        if controller.start().is_err() {
            error!("twai: controller restart failed");
            return Err(FilterError::Controller);
        }
        if installed.is_err() {
            warn!("twai: driver rejected filter");
            return Err(FilterError::Access);
        }

        delay.delay_ms(SETTLE_DELAY_MS);

        let read_back = self.driver.single_filter_code().map_err(|_| FilterError::Access)?;
        let verified = read_back == code;
        if verified {
            debug!("twai: filter code {} mask {} installed", filter.code(), filter.mask());
        } else {
            warn!("twai: filter code read back {}, expected {}", read_back, code);
        }
        Ok(verified)
    }
}
