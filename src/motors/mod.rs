// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Actuator Abstractions
//!
//! Motor-level wrappers that sit below the coordinated motion engine in `control`.
//!
//! ## Modules
//!
//! - [`stepper`] - 4-phase half-step motor over `embedded_hal` output pins.

pub mod stepper;

pub use stepper::{Direction, Stepper, HALF_STEP_SEQUENCE, STEPS_PER_REVOLUTION};
