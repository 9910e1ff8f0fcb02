//! Wireless serial link
//!
//! The radio driver reports connection changes and inbound writes through a [`LinkHandle`].
//! The handle only queues: decoding, state changes and replies happen in the bridge loop.
//! Pick `NoopRawMutex` if the radio callbacks run in the loop context and
//! `CriticalSectionRawMutex` if they run in interrupt context.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use heapless::Vec;

use crate::driver::radio::{PeerHandle, Radio};

/// Longest accepted command in bytes, after trimming
pub const MAX_COMMAND_LEN: usize = 64;

/// Capacity of the inbound command queue
pub const COMMAND_CAPACITY: usize = 8;

/// Capacity of the connection event queue
pub const EVENT_CAPACITY: usize = 8;

/// Maximum number of simultaneously connected peers
pub const MAX_PEERS: usize = 4;

pub type CommandText = heapless::String<MAX_COMMAND_LEN>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeerEvent {
    Connected(PeerHandle),
    Disconnected(PeerHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Radio refused to advertise
    Advertise,
    /// Notification failed for at least one peer
    Notify,
}

/// Inbound queues between the radio driver and the bridge loop
pub struct LinkChannels<M: RawMutex> {
    commands: Channel<M, CommandText, COMMAND_CAPACITY>,
    events: Channel<M, PeerEvent, EVENT_CAPACITY>,
}

impl<M: RawMutex> LinkChannels<M> {
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
            events: Channel::new(),
        }
    }

    /// Producer side for the radio driver
    pub fn handle(&self) -> LinkHandle<'_, M> {
        LinkHandle {
            commands: self.commands.sender(),
            events: self.events.sender(),
        }
    }

    pub(crate) fn commands(&self) -> Receiver<'_, M, CommandText, COMMAND_CAPACITY> {
        self.commands.receiver()
    }

    pub(crate) fn events(&self) -> Receiver<'_, M, PeerEvent, EVENT_CAPACITY> {
        self.events.receiver()
    }
}

impl<M: RawMutex> Default for LinkChannels<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle for radio callbacks
///
/// Every method returns immediately and reports whether the input was queued.
pub struct LinkHandle<'a, M: RawMutex> {
    commands: Sender<'a, M, CommandText, COMMAND_CAPACITY>,
    events: Sender<'a, M, PeerEvent, EVENT_CAPACITY>,
}

impl<M: RawMutex> Clone for LinkHandle<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex> Copy for LinkHandle<'_, M> {}

impl<M: RawMutex> LinkHandle<'_, M> {
    /// Queues a peer write as a command.
    ///
    /// The bytes must form valid UTF-8. Surrounding whitespace is trimmed. Empty or over-long
    /// commands and writes arriving at a full queue are dropped.
    pub fn on_write(&self, bytes: &[u8]) -> bool {
        let Ok(text) = core::str::from_utf8(bytes) else {
            debug!("link: dropped non UTF-8 write");
            return false;
        };
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let Ok(command) = CommandText::try_from(text) else {
            debug!("link: dropped {} byte write", text.len());
            return false;
        };
        if self.commands.try_send(command).is_err() {
            warn!("link: command queue full");
            return false;
        }
        true
    }

    pub fn on_connect(&self, peer: PeerHandle) -> bool {
        self.push_event(PeerEvent::Connected(peer))
    }

    pub fn on_disconnect(&self, peer: PeerHandle) -> bool {
        self.push_event(PeerEvent::Disconnected(peer))
    }

    fn push_event(&self, event: PeerEvent) -> bool {
        if self.events.try_send(event).is_err() {
            warn!("link: event queue full");
            return false;
        }
        true
    }
}

/// Loop side of the link: peer set and outbound fan-out
pub struct Link<R: Radio> {
    radio: R,
    name: &'static str,
    peers: Vec<PeerHandle, MAX_PEERS>,
    pending_sync: bool,
}

impl<R: Radio> Link<R> {
    pub fn new(radio: R, name: &'static str) -> Self {
        Self {
            radio,
            name,
            peers: Vec::new(),
            pending_sync: false,
        }
    }

    pub fn advertise(&mut self) -> Result<(), LinkError> {
        self.radio.advertise(self.name).map_err(|_| LinkError::Advertise)
    }

    /// Applies a connection change.
    ///
    /// A connect marks a pending configuration sync. A connect beyond capacity is ignored.
    /// A disconnect resumes advertising.
    pub fn apply(&mut self, event: PeerEvent) -> Result<(), LinkError> {
        match event {
            PeerEvent::Connected(peer) => {
                if !self.peers.contains(&peer) && self.peers.push(peer).is_err() {
                    warn!("link: peer {} over capacity, ignored", peer.0);
                    return Ok(());
                }
                info!("link: peer {} connected", peer.0);
                self.request_sync();
                Ok(())
            }
            PeerEvent::Disconnected(peer) => {
                self.peers.retain(|p| *p != peer);
                info!("link: peer {} disconnected", peer.0);
                self.advertise()
            }
        }
    }

    /// Marks a configuration sync as pending.
    pub fn request_sync(&mut self) {
        self.pending_sync = true;
    }

    /// Returns and clears the pending sync mark.
    pub fn take_pending_sync(&mut self) -> bool {
        core::mem::take(&mut self.pending_sync)
    }

    /// Sends `data` to every connected peer.
    ///
    /// A failing peer does not stop delivery to the others.
    pub fn broadcast(&mut self, data: &[u8]) -> Result<(), LinkError> {
        let mut failed = 0;
        for &peer in self.peers.iter() {
            if self.radio.notify(peer, data).is_err() {
                debug!("link: notify to peer {} failed", peer.0);
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(LinkError::Notify);
        }
        Ok(())
    }

    pub fn peers(&self) -> &[PeerHandle] {
        &self.peers
    }
}
