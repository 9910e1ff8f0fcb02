//! Bridge loop

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;
use embedded_can::nb::Can;
use embedded_hal::delay::DelayNs;

use crate::cache::SlotCache;
use crate::command::Command;
use crate::config::Config;
use crate::core::{ControllerHealth, OutputState};
use crate::driver::controller::Controller;
use crate::driver::filter::{AcceptanceFilter, FilterProgrammer};
use crate::driver::radio::Radio;
use crate::driver::sensor::TemperatureSensor;
use crate::driver::store::ConfigStore;
use crate::fault::Fault;
use crate::link::{Link, LinkChannels};
use crate::message::{Message, Snapshot};
use crate::recovery::Recovery;
use crate::scheduler::{Dispatch, Scheduler};
use crate::settings::Settings;
use crate::transport::{Transport, temperature_payload, whole_degrees};
use crate::utils::{Interval, block_for};

/// Peripheral types of a board
pub trait Board {
    type Can: Can + Controller;
    type Filter: FilterProgrammer<Self::Can>;
    type Radio: Radio;
    type Store: ConfigStore;
    type Sensor: TemperatureSensor;
    type Delay: DelayNs;
}

/// Peripherals consumed by the bridge
pub struct Peripherals<B: Board> {
    /// Running CAN controller
    pub can: B::Can,
    pub filter: B::Filter,
    pub radio: B::Radio,
    pub store: B::Store,
    /// `None` if no sensor was detected during bring-up
    pub sensor: Option<B::Sensor>,
    pub delay: B::Delay,
}

/// Bridge state snapshot for a status display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    pub health: ControllerHealth,
    /// Hardware acceptance filter verified after the last programming
    pub hardware_filter: bool,
    /// Last relayed temperature in whole degrees
    pub last_temperature: Option<i32>,
    pub queue_len: usize,
    pub peers: usize,
    pub last_fault: Option<Fault>,
}

/// Bridge context
///
/// Owns every piece of shared state. All work happens in [`Bridge::tick`], which never waits
/// except for the configured settle delays.
pub struct Bridge<'a, M: RawMutex, B: Board> {
    config: Config,
    settings: Settings,
    output: OutputState,
    cache: SlotCache,
    transport: Transport<B::Can>,
    filter: B::Filter,
    hardware_filter: bool,
    link: Link<B::Radio>,
    channels: &'a LinkChannels<M>,
    store: B::Store,
    sensor: Option<B::Sensor>,
    delay: B::Delay,
    scheduler: Scheduler,
    recovery: Recovery,
    output_timer: Interval,
    temperature_timer: Interval,
    status_timer: Interval,
    last_temperature: Option<i32>,
    last_fault: Option<Fault>,
}

impl<'a, M: RawMutex, B: Board> Bridge<'a, M, B> {
    /// Loads the persisted settings, programs the acceptance filter and starts advertising.
    pub fn new(config: Config, peripherals: Peripherals<B>, channels: &'a LinkChannels<M>) -> Self {
        let Peripherals {
            can,
            filter,
            radio,
            mut store,
            sensor,
            delay,
        } = peripherals;
        let settings = Settings::load(&mut store);
        let mut bridge = Self {
            config,
            settings,
            output: OutputState::default(),
            cache: SlotCache::new(),
            transport: Transport::new(can, config.rx_drain_limit),
            filter,
            hardware_filter: false,
            link: Link::new(radio, config.name),
            channels,
            store,
            sensor,
            delay,
            scheduler: Scheduler::new(config.telemetry_interval),
            recovery: Recovery::new(
                config.recovery_interval,
                config.recovery_stop_settle,
                config.recovery_start_settle,
            ),
            output_timer: Interval::new(config.output_interval),
            temperature_timer: Interval::new(config.temperature_interval),
            status_timer: Interval::new(config.status_interval),
            last_temperature: None,
            last_fault: None,
        };
        let result = bridge.apply_filter();
        bridge.supervise(result);
        let result = bridge.link.advertise().map_err(|_| Fault::Link);
        bridge.supervise(result);
        info!("bridge: started as {}", config.name);
        bridge
    }

    /// Runs one loop iteration at `now`.
    pub fn tick(&mut self, now: Instant) {
        let result = self.process_link_events();
        self.supervise(result);

        let result = self.process_command();
        self.supervise(result);

        if self.link.take_pending_sync() && !self.scheduler.push_sync() {
            self.link.request_sync();
        }

        let result = self.receive();
        self.supervise(result);

        if self.output_timer.poll(now) {
            let result = self.send_output();
            self.supervise(result);
        }

        if self.temperature_timer.poll(now) {
            let result = self.relay_temperature();
            self.supervise(result);
        }

        if self.status_timer.poll(now) {
            let result = self.status_pass(now);
            self.supervise(result);
        }

        let result = self.flush(now);
        self.supervise(result);
    }

    /// Ticks forever on the system clock.
    pub fn run(&mut self) -> ! {
        loop {
            self.tick(Instant::now());
            block_for(&mut self.delay, self.config.idle_delay);
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            health: self.transport.health(),
            hardware_filter: self.hardware_filter,
            last_temperature: self.last_temperature,
            queue_len: self.scheduler.len(),
            peers: self.link.peers().len(),
            last_fault: self.last_fault,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn output(&self) -> &OutputState {
        &self.output
    }

    pub fn slot_cache(&self) -> &SlotCache {
        &self.cache
    }

    fn supervise(&mut self, result: Result<(), Fault>) {
        let Err(fault) = result else {
            return;
        };
        if self.last_fault == Some(fault) {
            trace!("bridge: {:?} fault", fault);
        } else {
            warn!("bridge: {:?} fault", fault);
        }
        self.last_fault = Some(fault);
    }

    fn process_link_events(&mut self) -> Result<(), Fault> {
        let events = self.channels.events();
        let mut result = Ok(());
        while let Ok(event) = events.try_receive() {
            if self.link.apply(event).is_err() {
                result = Err(Fault::Link);
            }
        }
        result
    }

    fn process_command(&mut self) -> Result<(), Fault> {
        let Ok(text) = self.channels.commands().try_receive() else {
            return Ok(());
        };
        match text.parse::<Command>() {
            Ok(command) => self.execute(command),
            Err(_) => {
                debug!("command: ignored {}", text.as_str());
                Ok(())
            }
        }
    }

    fn execute(&mut self, command: Command) -> Result<(), Fault> {
        debug!("command: {:?}", command);
        match command {
            Command::RequestState => {
                self.push_snapshot();
                Ok(())
            }
            Command::SetGroups(groups) => {
                self.settings.groups = groups;
                let stored = self.settings.store_groups(&mut self.store);
                let programmed = self.apply_filter();
                self.push_snapshot();
                stored.map_err(|_| Fault::Store).and(programmed)
            }
            Command::SetDeviceId(id) => {
                self.settings.identity.output = id;
                self.scheduler.push_message(Message::DeviceId(id));
                self.settings
                    .store_device_id(&mut self.store)
                    .map_err(|_| Fault::Store)
            }
            Command::SetSensorId(id) => {
                self.settings.identity.sensor = id;
                self.scheduler.push_message(Message::SensorId(id));
                self.settings
                    .store_sensor_id(&mut self.store)
                    .map_err(|_| Fault::Store)
            }
            Command::SetSlotMode { slot, mode } => {
                let slot_index = usize::from(slot);
                self.settings
                    .slot_modes
                    .set(slot_index, mode)
                    .map_err(|_| Fault::Protocol)?;
                self.scheduler
                    .push_message(Message::SlotModeOk { slot, mode });
                self.settings
                    .store_slot_mode(&mut self.store, slot_index)
                    .map_err(|_| Fault::Store)
            }
            Command::SetOutput { index, value } => {
                self.output
                    .set(usize::from(index), value)
                    .map_err(|_| Fault::Protocol)?;
                let sent = self.send_output();
                self.scheduler.push_message(Message::State(self.output));
                sent
            }
        }
    }

    fn push_snapshot(&mut self) -> bool {
        self.scheduler
            .push_snapshot(Snapshot::new(&self.settings, &self.output))
    }

    /// Programs the acceptance filter for the current groups.
    ///
    /// A failed verification leaves the software allow-list as the only filter.
    fn apply_filter(&mut self) -> Result<(), Fault> {
        let groups = self.settings.groups;
        let filter = AcceptanceFilter::for_pair(groups.a, groups.b);
        let result = self
            .filter
            .program(self.transport.controller_mut(), &filter, &mut self.delay);
        match result {
            Ok(verified) => {
                // Sends failing in reset mode are not bus faults
                self.transport.clear_fault();
                self.hardware_filter = verified;
                if verified {
                    info!("filter: code {} mask {} active", filter.code(), filter.mask());
                } else {
                    warn!("filter: read-back mismatch, software filtering only");
                }
                Ok(())
            }
            Err(_) => {
                self.hardware_filter = false;
                Err(Fault::Filter)
            }
        }
    }

    fn receive(&mut self) -> Result<(), Fault> {
        self.transport
            .drain(
                &self.settings.groups,
                &self.settings.slot_modes,
                &mut self.cache,
            )
            .map(|_| ())
            .map_err(|_| Fault::Transport)
    }

    fn send_output(&mut self) -> Result<(), Fault> {
        self.transport
            .send(self.settings.identity.output, self.output.as_bytes())
            .map_err(|_| Fault::Transport)
    }

    fn relay_temperature(&mut self) -> Result<(), Fault> {
        let Some(sensor) = self.sensor.as_mut() else {
            return Ok(());
        };
        let raw = sensor.read_centi_celsius().map_err(|_| Fault::Sensor)?;
        let degrees = whole_degrees(raw);
        self.last_temperature = Some(degrees);
        let sent = self
            .transport
            .send(self.settings.identity.sensor, &temperature_payload(degrees))
            .map_err(|_| Fault::Transport);
        self.scheduler.push_message(Message::Temperature(degrees));
        sent
    }

    fn status_pass(&mut self, now: Instant) -> Result<(), Fault> {
        let result = self.recover(now);
        self.scheduler
            .push_message(Message::Status(self.transport.health()));
        result
    }

    fn recover(&mut self, now: Instant) -> Result<(), Fault> {
        if !self
            .recovery
            .needs_restart(now, self.transport.controller_mut())
        {
            return Ok(());
        }
        self.transport.set_faulted();
        self.recovery
            .restart(self.transport.controller_mut(), &mut self.delay)
            .map_err(|_| Fault::Controller)?;
        self.apply_filter()
    }

    fn flush(&mut self, now: Instant) -> Result<(), Fault> {
        match self.scheduler.next(now, &self.cache) {
            None => Ok(()),
            Some(Dispatch::Sync) => {
                block_for(&mut self.delay, self.config.sync_delay);
                if !self.push_snapshot() {
                    self.link.request_sync();
                }
                Ok(())
            }
            Some(Dispatch::Send(message)) => {
                let text = message.encode().map_err(|_| Fault::Protocol)?;
                self.link
                    .broadcast(text.as_bytes())
                    .map_err(|_| Fault::Link)
            }
        }
    }
}
