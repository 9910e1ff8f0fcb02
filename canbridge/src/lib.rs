//! # CAN bridge
//!
//! Firmware core of a battery-powered device that relays a CAN bus to a mobile application over
//! a wireless serial link and relays the application's control commands back onto the bus.
//! The crate is `no_std` and allocation free.
//!
//! ## Architecture
//!
//! ```text
//!              ┌──────────────┐  commands   ┌──────────────────────────────┐
//!  radio ─────►│  LinkHandle  ├────────────►│            Bridge            │
//!  callbacks   └──────────────┘  peer events│                              │
//!                                           │ Command ─► Settings ─► Store │
//!  CAN ◄──────── Transport ◄───────────────►│ SlotCache      Recovery      │
//!                    ▲                      │ Scheduler ─► Link ─► radio   │
//!                    └── FilterProgrammer ◄─┤                              │
//!                                           └──────────────────────────────┘
//! ```
//! Components:
//! * _LinkHandle_ is the producer side of two bounded channels. Radio callbacks push inbound
//!   writes and connection changes there and return at once.
//! * _Bridge_ owns all shared state and runs one cooperative loop iteration per
//!   [`bridge::Bridge::tick`].
//! * _Transport_ wraps the CAN controller, keeps the sticky fault flag and decodes group frames
//!   into the _SlotCache_.
//! * _Recovery_ restarts a controller that left the running state, at most once per window.
//! * _FilterProgrammer_ programs the hardware acceptance filter. The two group identifiers are
//!   also checked in software, so a failed programming degrades filtering but never stops the
//!   bridge.
//! * _Scheduler_ emits at most one outbound message per tick, queued replies first and
//!   `VALS=` telemetry only from an empty queue.
//!
//! ## Tick
//!
//! Every tick runs, in order: connection events, one inbound command, the post-connect sync
//! request, CAN reception, periodic output and temperature frames, the status pass with the
//! recovery check, and finally the scheduler. Each step returns a [`fault::Fault`] on failure.
//! A supervisor logs it and keeps the latest one for [`bridge::Bridge::diagnostics`].
//!
//! ## Features
//!
//! * `defmt`: log through `defmt`
//! * `log`: log through `log`

#![no_std]

pub use canbridge_core as core;
pub use canbridge_driver as driver;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bridge;
pub mod cache;
pub mod command;
pub mod config;
pub mod fault;
pub mod link;
pub mod message;
pub mod recovery;
pub mod scheduler;
pub mod settings;
pub mod transport;
mod utils;
