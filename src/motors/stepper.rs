// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! 4-phase unipolar stepper motor (28BYJ-48 class) driven through four GPIO lines.
//!
//! Half-stepping walks an 8-state drive table for twice the angular resolution of full
//! stepping. This module owns the per-motor state machine; coordinated multi-motor motion and
//! cancellation live in [`crate::control::motion`].

use embedded_hal::digital::OutputPin;

/// Half-steps per output-shaft revolution (28BYJ-48 with its 1:64 gearbox).
pub const STEPS_PER_REVOLUTION: u32 = 4096;

/// 8-state half-step drive table. Bit `i` of an entry drives line `i`.
pub const HALF_STEP_SEQUENCE: [u8; 8] = [
    0b0001, // line 1
    0b0011, // lines 1+2
    0b0010, // line 2
    0b0110, // lines 2+3
    0b0100, // line 3
    0b1100, // lines 3+4
    0b1000, // line 4
    0b1001, // lines 4+1
];

/// Rotation direction through the half-step table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

/// One 4-phase stepper bound to its four drive lines.
///
/// The stepping engine is the only writer of the phase index and the `enabled` flag apart from
/// [`enable`](Self::enable) / [`disable`](Self::disable) and the emergency stop.
pub struct Stepper<P: OutputPin> {
    pins: [P; 4],
    step_delay_ms: u32,
    phase: u8,
    enabled: bool,
}

impl<P: OutputPin> Stepper<P> {
    /// Wrap four drive lines, park the motor on phase 0 and leave it enabled.
    pub fn new(pins: [P; 4], step_delay_ms: u32) -> Self {
        let mut motor = Self {
            pins,
            step_delay_ms,
            phase: 0,
            enabled: true,
        };
        motor.apply_phase();
        motor
    }

    /// Write the current phase pattern to the drive lines. Gated on `enabled`.
    fn apply_phase(&mut self) {
        if !self.enabled {
            return;
        }
        let pattern = HALF_STEP_SEQUENCE[self.phase as usize];
        for (i, pin) in self.pins.iter_mut().enumerate() {
            if pattern & (1 << i) != 0 {
                pin.set_high().ok();
            } else {
                pin.set_low().ok();
            }
        }
    }

    /// Advance one half-step in `direction`.
    ///
    /// The phase index always moves (bookkeeping); the pins only change while enabled.
    pub fn advance(&mut self, direction: Direction) {
        self.phase = match direction {
            Direction::Clockwise => (self.phase + 1) % 8,
            Direction::CounterClockwise => (self.phase + 7) % 8,
        };
        self.apply_phase();
    }

    /// Drop all four drive lines and suppress further output writes.
    pub fn disable(&mut self) {
        self.enabled = false;
        for pin in self.pins.iter_mut() {
            pin.set_low().ok();
        }
    }

    /// Re-enable output writes and re-assert the current phase pattern.
    ///
    /// Never called implicitly: resuming after an emergency stop is an explicit decision.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.apply_phase();
    }

    /// Per-step delay in milliseconds.
    #[inline]
    pub fn step_delay_ms(&self) -> u32 {
        self.step_delay_ms
    }

    pub fn set_step_delay_ms(&mut self, step_delay_ms: u32) {
        self.step_delay_ms = step_delay_ms;
    }

    /// Current phase index (0–7).
    #[inline]
    pub fn phase(&self) -> u8 {
        self.phase
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Release the drive lines.
    pub fn free(self) -> [P; 4] {
        self.pins
    }
}
