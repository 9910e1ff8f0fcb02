use embassy_time::Duration;

/// Advertised radio name of the shipping device
pub const DEFAULT_NAME: &str = "M5AtomS3_CAN_Base";

/// Bridge loop config struct
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Friendly name used for radio advertising
    pub name: &'static str,
    /// Maximum number of CAN frames consumed per tick
    pub rx_drain_limit: usize,
    /// Period of the output state frame
    pub output_interval: Duration,
    /// Period of the temperature relay. Ignored without a sensor.
    pub temperature_interval: Duration,
    /// Period of the status pass that drives the recovery check and `STATUS=` reports
    pub status_interval: Duration,
    /// Minimum spacing of `VALS=` telemetry frames
    pub telemetry_interval: Duration,
    /// Minimum spacing of controller health checks
    pub recovery_interval: Duration,
    /// Wait after stopping a faulted controller
    pub recovery_stop_settle: Duration,
    /// Wait after restarting a controller, before filter programming
    pub recovery_start_settle: Duration,
    /// Wait between a peer connect and the configuration push
    pub sync_delay: Duration,
    /// Idle wait between ticks of [`crate::bridge::Bridge::run`]
    pub idle_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME,
            rx_drain_limit: 10,
            output_interval: Duration::from_millis(100),
            temperature_interval: Duration::from_millis(200),
            status_interval: Duration::from_millis(250),
            telemetry_interval: Duration::from_millis(20),
            recovery_interval: Duration::from_millis(5000),
            recovery_stop_settle: Duration::from_millis(50),
            recovery_start_settle: Duration::from_millis(100),
            sync_delay: Duration::from_millis(300),
            idle_delay: Duration::from_millis(1),
        }
    }
}
