// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Peripheral Drivers
//!
//! Device drivers written against the `embedded_hal` trait seams so the same code runs on
//! target hardware and under host tests.
//!
//! ## Modules
//!
//! - [`rylr998`] - REYAX RYLR998 LoRa transceiver over AT commands.

pub mod rylr998;

pub use rylr998::{
    Bandwidth, CodingRate, Error, Power, RadioConfig, Rylr998, SpreadingFactor,
    BROADCAST_ADDRESS, COMMAND_TIMEOUT_MS,
};
