// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # LoRaStep Firmware Core
//!
//! This crate contains the hardware-independent core of a wireless stepper-motor controller: a
//! RYLR998 LoRa transceiver receives ON/OFF commands over its AT-command UART protocol and a
//! dispatch layer drives four 4-phase stepper motors accordingly.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hw`] | Interrupt-fed byte ring buffer and the monotonic clock seam |
//! | [`drivers`] | Device-level drivers (RYLR998 AT-command transceiver) |
//! | [`protocol`] | Line reassembly, response grammar, command aliases |
//! | [`motors`] | 4-phase half-step motor abstraction over `OutputPin` |
//! | [`control`] | Cancellable multi-motor stepping engine and command dispatch |
//!
//! The platform layer (out of scope here) wires the UART RX interrupt to
//! [`hw::RingProducer::push`], implements [`hw::Clock`] over a monotonic timer, and provides an
//! [`embedded_hal::delay::DelayNs`] for step timing. Everything in this crate runs unmodified on
//! the host, which is how the unit tests exercise it.
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod control;
pub mod drivers;
pub mod hw;
pub mod motors;
pub mod protocol;

#[cfg(test)]
pub(crate) mod testutil;
