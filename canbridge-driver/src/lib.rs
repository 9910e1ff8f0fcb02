//! CAN bridge driver interface
//!
//! The crate provides the interface between peripheral drivers and the bridge loop.
//! Limited scope facilitates compatibility across board support crates.
//! Driver crates should depend on this crate. Bridge users should depend on the `canbridge`
//! crate instead.
//!
//! The bridge talks to five peripherals:
//! * a CAN controller: non-blocking frame I/O through `embedded_can::nb::Can` plus the
//!   lifecycle operations in [`controller::Controller`]
//! * an acceptance filter, programmed through [`filter::FilterProgrammer`]
//! * a wireless serial radio with a notify endpoint, see [`radio::Radio`]
//! * a non-volatile key/value store, see [`store::ConfigStore`]
//! * an optional temperature sensor, see [`sensor::TemperatureSensor`]
//!
//! Every operation is expected to return immediately. The only sanctioned blocking waits are
//! the settle delays the bridge requests explicitly through an `embedded_hal` delay.

#![no_std]

pub mod controller;
pub mod filter;
pub mod frame;
pub mod radio;
pub mod sensor;
pub mod store;

pub use canbridge_core as core;
