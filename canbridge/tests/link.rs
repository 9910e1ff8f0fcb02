mod common;

use canbridge::driver::radio::PeerHandle;
use canbridge::fault::Fault;
use canbridge::link::{COMMAND_CAPACITY, EVENT_CAPACITY, LinkChannels, MAX_COMMAND_LEN, MAX_PEERS};
use common::*;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;

#[test]
fn test_write_rejects_invalid_input() {
    let channels = LinkChannels::<NoopRawMutex>::new();
    let link = channels.handle();
    assert!(!link.on_write(&[0xFF, 0xFE, 0x3D]));
    assert!(!link.on_write(b""));
    assert!(!link.on_write(b" \r\n\t"));
    assert!(!link.on_write(&[b'1'; MAX_COMMAND_LEN + 1]));
    assert!(link.on_write(&[b'1'; MAX_COMMAND_LEN]));
    assert!(link.on_write(format!("  {}  \r\n", "x".repeat(MAX_COMMAND_LEN)).as_bytes()));
}

#[test]
fn test_write_queue_full() {
    let channels = LinkChannels::<NoopRawMutex>::new();
    let link = channels.handle();
    for _ in 0..COMMAND_CAPACITY {
        assert!(link.on_write(b"REQUEST_STATE"));
    }
    assert!(!link.on_write(b"REQUEST_STATE"));
}

#[test]
fn test_event_queue_full() {
    let channels = LinkChannels::<NoopRawMutex>::new();
    let link = channels.handle();
    for peer in 0..EVENT_CAPACITY as u16 {
        assert!(link.on_connect(PeerHandle(peer)));
    }
    assert!(!link.on_disconnect(PeerHandle(0)));
}

#[test]
fn test_trimmed_command_is_processed() {
    let fakes = Fakes::new();
    let channels = LinkChannels::<NoopRawMutex>::new();
    let (mut bridge, t0) = start_connected(&fakes, &channels);
    assert!(channels.handle().on_write(b"  1=42\r\n"));
    bridge.tick(at(t0));
    assert_eq!(bridge.output().as_bytes()[0], 42);
}

#[test]
fn test_fan_out_to_all_peers() {
    let fakes = Fakes::new();
    let channels = LinkChannels::<NoopRawMutex>::new();
    let (mut bridge, t0) = start_connected(&fakes, &channels);
    let link = channels.handle();
    assert!(link.on_connect(PeerHandle(2)));
    assert!(link.on_write(b"1=5"));
    bridge.tick(at(t0));
    assert_eq!(bridge.diagnostics().peers, 2);
    assert_eq!(fakes.received_by(1), ["STATE=5,0,0,0,0,0,0,0"]);
    assert_eq!(fakes.received_by(2), ["STATE=5,0,0,0,0,0,0,0"]);
}

#[test]
fn test_peer_failure_is_isolated() {
    let fakes = Fakes::new();
    let channels = LinkChannels::<NoopRawMutex>::new();
    let (mut bridge, t0) = start_connected(&fakes, &channels);
    let link = channels.handle();
    assert!(link.on_connect(PeerHandle(2)));
    assert!(link.on_connect(PeerHandle(3)));
    fakes.radio.borrow_mut().failing.insert(PeerHandle(2));

    assert!(link.on_write(b"KID=100"));
    bridge.tick(at(t0));
    assert_eq!(fakes.received_by(1), ["KID=0x100"]);
    assert!(fakes.received_by(2).is_empty());
    assert_eq!(fakes.received_by(3), ["KID=0x100"]);
    assert_eq!(bridge.diagnostics().last_fault, Some(Fault::Link));
}

#[test]
fn test_new_peer_gets_configuration() {
    let fakes = Fakes::new();
    let channels = LinkChannels::<NoopRawMutex>::new();
    let (mut bridge, t0) = start_connected(&fakes, &channels);
    assert!(channels.handle().on_connect(PeerHandle(7)));
    for t in 0..6 {
        bridge.tick(at(t0 + t));
    }
    assert_eq!(
        fakes.received_by(7),
        [
            "STATE=0,0,0,0,0,0,0,0",
            "GRP1=0x4e0",
            "GRP2=0x4e1",
            "ID=0x5a0",
            "KID=0x661"
        ]
    );
    assert_eq!(fakes.received_by(7), fakes.received_by(1));
    assert_eq!(*fakes.delays.borrow(), [300]);
}

#[test]
fn test_peer_capacity() {
    let fakes = Fakes::new();
    let channels = LinkChannels::<NoopRawMutex>::new();
    let mut bridge = start(&fakes, &channels);
    let link = channels.handle();
    for peer in 0..=MAX_PEERS as u16 {
        assert!(link.on_connect(PeerHandle(peer)));
    }
    assert!(link.on_connect(PeerHandle(0)));
    bridge.tick(at(0));
    assert_eq!(bridge.diagnostics().peers, MAX_PEERS);

    assert!(link.on_write(b"2=2"));
    bridge.tick(at(1));
    let last = MAX_PEERS as u16;
    assert!(fakes.received_by(last).is_empty());
    assert!(!fakes.received_by(0).is_empty());
}

#[test]
fn test_disconnect_resumes_advertising() {
    let fakes = Fakes::new();
    let channels = LinkChannels::<NoopRawMutex>::new();
    let (mut bridge, t0) = start_connected(&fakes, &channels);
    assert_eq!(fakes.radio.borrow().advertised.len(), 1);

    assert!(channels.handle().on_disconnect(PeerHandle(1)));
    assert!(channels.handle().on_write(b"1=1"));
    bridge.tick(at(t0));
    assert_eq!(bridge.diagnostics().peers, 0);
    assert_eq!(fakes.radio.borrow().advertised.len(), 2);
    assert!(fakes.received_by(1).is_empty());
}
