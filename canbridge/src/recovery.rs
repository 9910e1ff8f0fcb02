use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;

use crate::driver::controller::Controller;
use crate::utils::{Interval, block_for};

/// Rate-limited controller health supervisor
pub struct Recovery {
    check: Interval,
    stop_settle: Duration,
    start_settle: Duration,
}

impl Recovery {
    pub const fn new(interval: Duration, stop_settle: Duration, start_settle: Duration) -> Self {
        Self {
            check: Interval::new(interval),
            stop_settle,
            start_settle,
        }
    }

    /// Returns true if the controller needs a restart.
    ///
    /// The controller is polled at most once per interval. Calls inside the window return false
    /// without touching the controller.
    pub fn needs_restart<C: Controller>(&mut self, now: Instant, controller: &mut C) -> bool {
        if !self.check.poll(now) {
            return false;
        }
        let state = controller.state();
        if state.is_running() {
            return false;
        }
        warn!("recovery: controller not running");
        true
    }

    /// Stops and restarts the controller with the configured settle delays.
    ///
    /// The acceptance filter must be programmed again afterwards.
    pub fn restart<C: Controller>(
        &self,
        controller: &mut C,
        delay: &mut impl DelayNs,
    ) -> Result<(), C::Error> {
        controller.stop();
        block_for(delay, self.stop_settle);
        controller.start()?;
        block_for(delay, self.start_settle);
        info!("recovery: controller restarted");
        Ok(())
    }
}
