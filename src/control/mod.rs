// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Motion Control
//!
//! Coordinated, cancellable motion on top of the `motors` layer, and the mapping from inbound
//! radio commands onto it.
//!
//! ## Modules
//!
//! - [`motion`] - multi-motor stepping engine with chunked-delay cancellation.
//! - [`dispatch`] - inbound command handling and acknowledgment.

pub mod dispatch;
pub mod motion;

pub use dispatch::{dispatch, DispatchOutcome, ACTIVATION_NUDGE_DEGREES};
pub use motion::{
    emergency_stop_all, move_steps, rotate_all, rotate_degrees, steps_for_degrees, StopFlag,
    DELAY_CHUNK_MS,
};
