//! TWAI acceptance filter backends for the CAN bridge
//!
//! TWAI is the SJA1000 compatible CAN controller found on ESP32 chips. Both backends program a
//! single acceptance filter from an [`AcceptanceFilter`](canbridge_driver::filter::AcceptanceFilter)
//! and keep its polarity: a set mask bit ignores the identifier bit.
//!
//! # Feature flags
//!
//! * `raw-registers` (default): [`registers::RegisterFilter`] writes the ACR/AMR registers
//!   directly and toggles reset mode itself.
//! * `driver-api`: [`driver::DriverFilter`] goes through a driver exposing a 32-bit single filter
//!   API and stops the controller around the update.
//! * `defmt`, `log`: logging backend
#![no_std]

#[cfg(not(any(feature = "raw-registers", feature = "driver-api")))]
compile_error!("At least one filter backend should be chosen");

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

#[cfg(feature = "driver-api")]
pub mod driver;
pub mod format;
#[cfg(feature = "raw-registers")]
pub mod registers;
