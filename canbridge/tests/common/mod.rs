#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use canbridge::bridge::{Board, Bridge, Peripherals};
use canbridge::config::Config;
use canbridge::core::StandardId;
use canbridge::driver::controller::{Controller, ControllerState};
use canbridge::driver::filter::{AcceptanceFilter, FilterError, FilterProgrammer};
use canbridge::driver::frame::CanFrame;
use canbridge::driver::radio::{PeerHandle, Radio};
use canbridge::driver::sensor::TemperatureSensor;
use canbridge::driver::store::ConfigStore;
use canbridge::link::LinkChannels;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Instant;
use embedded_can::{ErrorKind, Frame};
use embedded_hal::delay::DelayNs;

pub fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

pub fn id(raw: u16) -> StandardId {
    StandardId::new(raw).unwrap()
}

pub fn frame(raw_id: u16, data: &[u8]) -> CanFrame {
    CanFrame::new_standard(id(raw_id), data).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError;

impl embedded_can::Error for FakeError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    Accept,
    Full,
    Fail,
}

#[derive(Debug)]
pub struct CanState {
    pub rx: VecDeque<Result<CanFrame, FakeError>>,
    pub sent: Vec<CanFrame>,
    pub tx_mode: TxMode,
    pub state: ControllerState,
    /// State entered by `start`
    pub restart_state: ControllerState,
    pub start_fails: bool,
    pub stops: usize,
    pub starts: usize,
}

impl CanState {
    pub fn sent_to(&self, raw_id: u16) -> Vec<Vec<u8>> {
        self.sent
            .iter()
            .filter(|f| f.standard_id() == Some(id(raw_id)))
            .map(|f| f.data().to_vec())
            .collect()
    }
}

pub struct FakeCan(pub Rc<RefCell<CanState>>);

impl embedded_can::nb::Can for FakeCan {
    type Frame = CanFrame;
    type Error = FakeError;

    fn transmit(&mut self, frame: &CanFrame) -> nb::Result<Option<CanFrame>, FakeError> {
        let mut can = self.0.borrow_mut();
        match can.tx_mode {
            TxMode::Accept => {
                can.sent.push(*frame);
                Ok(None)
            }
            TxMode::Full => Err(nb::Error::WouldBlock),
            TxMode::Fail => Err(nb::Error::Other(FakeError)),
        }
    }

    fn receive(&mut self) -> nb::Result<CanFrame, FakeError> {
        match self.0.borrow_mut().rx.pop_front() {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(err)) => Err(nb::Error::Other(err)),
            None => Err(nb::Error::WouldBlock),
        }
    }
}

impl Controller for FakeCan {
    type Error = FakeError;

    fn state(&mut self) -> ControllerState {
        self.0.borrow().state
    }

    fn stop(&mut self) {
        let mut can = self.0.borrow_mut();
        can.stops += 1;
        can.state = ControllerState::Stopped;
    }

    fn start(&mut self) -> Result<(), FakeError> {
        let mut can = self.0.borrow_mut();
        can.starts += 1;
        if can.start_fails {
            return Err(FakeError);
        }
        can.state = can.restart_state;
        Ok(())
    }
}

#[derive(Debug)]
pub struct FilterState {
    pub programmed: Vec<AcceptanceFilter>,
    pub result: Result<bool, FilterError>,
}

pub struct FakeFilter(pub Rc<RefCell<FilterState>>);

impl FilterProgrammer<FakeCan> for FakeFilter {
    fn program(
        &mut self,
        _controller: &mut FakeCan,
        filter: &AcceptanceFilter,
        _delay: &mut impl DelayNs,
    ) -> Result<bool, FilterError> {
        let mut state = self.0.borrow_mut();
        state.programmed.push(*filter);
        state.result
    }
}

#[derive(Debug, Default)]
pub struct RadioState {
    pub advertised: Vec<String>,
    pub notified: Vec<(PeerHandle, String)>,
    pub failing: BTreeSet<PeerHandle>,
}

impl RadioState {
    pub fn received_by(&self, peer: u16) -> Vec<String> {
        self.notified
            .iter()
            .filter(|(p, _)| *p == PeerHandle(peer))
            .map(|(_, text)| text.clone())
            .collect()
    }
}

pub struct FakeRadio(pub Rc<RefCell<RadioState>>);

impl Radio for FakeRadio {
    type Error = FakeError;

    fn advertise(&mut self, name: &str) -> Result<(), FakeError> {
        self.0.borrow_mut().advertised.push(name.into());
        Ok(())
    }

    fn notify(&mut self, peer: PeerHandle, data: &[u8]) -> Result<(), FakeError> {
        let mut radio = self.0.borrow_mut();
        if radio.failing.contains(&peer) {
            return Err(FakeError);
        }
        let text = String::from_utf8(data.to_vec()).unwrap();
        radio.notified.push((peer, text));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct StoreState {
    pub committed: BTreeMap<String, i32>,
    pub staged: BTreeMap<String, i32>,
    pub commits: usize,
    pub fail: bool,
}

pub struct FakeStore(pub Rc<RefCell<StoreState>>);

impl ConfigStore for FakeStore {
    type Error = FakeError;

    fn get_i32(&mut self, key: &str) -> Result<Option<i32>, FakeError> {
        let store = self.0.borrow();
        if store.fail {
            return Err(FakeError);
        }
        Ok(store.committed.get(key).copied())
    }

    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), FakeError> {
        let mut store = self.0.borrow_mut();
        if store.fail {
            return Err(FakeError);
        }
        store.staged.insert(key.into(), value);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), FakeError> {
        let mut store = self.0.borrow_mut();
        if store.fail {
            return Err(FakeError);
        }
        let staged = core::mem::take(&mut store.staged);
        store.committed.extend(staged);
        store.commits += 1;
        Ok(())
    }
}

pub struct FakeSensor(pub Rc<RefCell<Result<i32, FakeError>>>);

impl TemperatureSensor for FakeSensor {
    type Error = FakeError;

    fn read_centi_celsius(&mut self) -> Result<i32, FakeError> {
        *self.0.borrow()
    }
}

/// Records requested waits in milliseconds
pub struct FakeDelay(pub Rc<RefCell<Vec<u32>>>);

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().push(ms);
    }
}

pub struct TestBoard;

impl Board for TestBoard {
    type Can = FakeCan;
    type Filter = FakeFilter;
    type Radio = FakeRadio;
    type Store = FakeStore;
    type Sensor = FakeSensor;
    type Delay = FakeDelay;
}

/// Shared views into the fake peripherals
pub struct Fakes {
    pub can: Rc<RefCell<CanState>>,
    pub filter: Rc<RefCell<FilterState>>,
    pub radio: Rc<RefCell<RadioState>>,
    pub store: Rc<RefCell<StoreState>>,
    pub sensor: Option<Rc<RefCell<Result<i32, FakeError>>>>,
    pub delays: Rc<RefCell<Vec<u32>>>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            can: Rc::new(RefCell::new(CanState {
                rx: VecDeque::new(),
                sent: Vec::new(),
                tx_mode: TxMode::Accept,
                state: ControllerState::Running,
                restart_state: ControllerState::Running,
                start_fails: false,
                stops: 0,
                starts: 0,
            })),
            filter: Rc::new(RefCell::new(FilterState {
                programmed: Vec::new(),
                result: Ok(true),
            })),
            radio: Default::default(),
            store: Default::default(),
            sensor: None,
            delays: Default::default(),
        }
    }

    pub fn with_sensor(mut self, centi_celsius: i32) -> Self {
        self.sensor = Some(Rc::new(RefCell::new(Ok(centi_celsius))));
        self
    }

    pub fn peripherals(&self) -> Peripherals<TestBoard> {
        Peripherals {
            can: FakeCan(self.can.clone()),
            filter: FakeFilter(self.filter.clone()),
            radio: FakeRadio(self.radio.clone()),
            store: FakeStore(self.store.clone()),
            sensor: self.sensor.clone().map(FakeSensor),
            delay: FakeDelay(self.delays.clone()),
        }
    }

    pub fn store(&self) -> FakeStore {
        FakeStore(self.store.clone())
    }

    pub fn push_rx(&self, frame: CanFrame) {
        self.can.borrow_mut().rx.push_back(Ok(frame));
    }

    pub fn received_by(&self, peer: u16) -> Vec<String> {
        self.radio.borrow().received_by(peer)
    }

    pub fn committed(&self, key: &str) -> Option<i32> {
        self.store.borrow().committed.get(key).copied()
    }
}

pub type TestBridge<'a> = Bridge<'a, NoopRawMutex, TestBoard>;

pub fn start<'a>(fakes: &Fakes, channels: &'a LinkChannels<NoopRawMutex>) -> TestBridge<'a> {
    Bridge::new(Config::default(), fakes.peripherals(), channels)
}

/// Starts a bridge with peer 1 connected and the post-connect sync delivered.
///
/// Returns the first free timestamp. Radio and CAN logs are cleared.
pub fn start_connected<'a>(
    fakes: &Fakes,
    channels: &'a LinkChannels<NoopRawMutex>,
) -> (TestBridge<'a>, u64) {
    let mut bridge = start(fakes, channels);
    assert!(channels.handle().on_connect(PeerHandle(1)));
    let mut t = 0;
    loop {
        bridge.tick(at(t));
        t += 1;
        if bridge.diagnostics().queue_len == 0 {
            break;
        }
    }
    fakes.radio.borrow_mut().notified.clear();
    fakes.can.borrow_mut().sent.clear();
    fakes.delays.borrow_mut().clear();
    (bridge, t)
}
