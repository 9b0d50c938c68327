// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Monotonic millisecond clock seam.
//!
//! The protocol layer only needs "has the deadline passed yet", so the seam is a single
//! `now_ms` method the platform implements over SysTick, a hardware timer, or (in tests) a
//! scripted counter. Wrapping arithmetic keeps deadlines correct across the u32 rollover.

/// Monotonic clock in milliseconds since some arbitrary epoch.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<C: Clock> Clock for &C {
    fn now_ms(&self) -> u32 {
        (*self).now_ms()
    }
}

/// A wall-clock deadline derived from a [`Clock`].
#[derive(Copy, Clone, Debug)]
pub struct Deadline {
    expires_at: u32,
}

impl Deadline {
    /// Deadline `timeout_ms` from now.
    pub fn after<C: Clock>(clock: &C, timeout_ms: u32) -> Self {
        Self {
            expires_at: clock.now_ms().wrapping_add(timeout_ms),
        }
    }

    /// True once the clock has passed the deadline. Wrap-safe for timeouts under ~24 days.
    pub fn expired<C: Clock>(&self, clock: &C) -> bool {
        (self.expires_at.wrapping_sub(clock.now_ms()) as i32) <= 0
    }
}
