// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Cancellable stepping engine.
//!
//! Rotations run for thousands of 1 ms ticks, so an OFF command must be able to interrupt one
//! mid-flight. The engine checks a shared [`StopFlag`] before every step and between every
//! delay chunk; the chunk size bounds worst-case stop latency regardless of the configured
//! per-step delay.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use micromath::F32Ext;

use crate::motors::{Direction, Stepper, STEPS_PER_REVOLUTION};

/// Granularity of the interruptible delay. One chunk is the worst-case stop latency.
pub const DELAY_CHUNK_MS: u32 = 1;

/// Level-triggered cancellation signal shared between the dispatch path and the engine.
///
/// Once set it stays set until [`clear`](Self::clear) is called; a rotation started while the
/// flag is still set from a previous stop returns immediately without moving.
#[derive(Debug)]
pub struct StopFlag(AtomicBool);

impl StopFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Request that any in-flight stepping operation abort.
    #[inline]
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Re-arm for a fresh run. Must happen before stepping can resume after a stop.
    #[inline]
    pub fn clear(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Half-steps corresponding to an angular distance, rounded to the nearest step.
pub fn steps_for_degrees(degrees: f32) -> u32 {
    let steps = degrees / 360.0 * STEPS_PER_REVOLUTION as f32;
    F32Ext::round(steps.max(0.0)) as u32
}

/// Wait `total_ms`, re-checking `stop` every [`DELAY_CHUNK_MS`].
///
/// Returns `false` as soon as the flag is observed set.
fn interruptible_delay<D: DelayNs>(delay: &mut D, total_ms: u32, stop: &StopFlag) -> bool {
    let mut remaining = total_ms;
    while remaining > 0 {
        if stop.is_set() {
            return false;
        }
        let chunk = remaining.min(DELAY_CHUNK_MS);
        delay.delay_ms(chunk);
        remaining -= chunk;
    }
    !stop.is_set()
}

/// Rotate every enabled motor in `motors` through `degrees` in lock-step.
///
/// The step count is computed once and shared: one global step counter, not per-motor. Each
/// tick first checks the stop flag (abort leaves motors at whatever phase they reached, no
/// rollback), then advances all enabled motors, then runs the chunked inter-step delay using
/// the first enabled motor's delay setting.
///
/// Returns the number of completed steps.
pub fn rotate_all<P: OutputPin, D: DelayNs>(
    motors: &mut [Stepper<P>],
    degrees: f32,
    direction: Direction,
    stop: &StopFlag,
    delay: &mut D,
) -> u32 {
    if motors.is_empty() {
        return 0;
    }

    let steps = steps_for_degrees(degrees);
    for step in 0..steps {
        if stop.is_set() {
            return step;
        }

        for motor in motors.iter_mut().filter(|m| m.is_enabled()) {
            motor.advance(direction);
        }

        let step_delay = motors
            .iter()
            .find(|m| m.is_enabled())
            .map(Stepper::step_delay_ms)
            .unwrap_or(0);
        if !interruptible_delay(delay, step_delay, stop) {
            return step + 1;
        }
    }
    steps
}

/// Step a single motor `steps` times with the same chunked-delay cancellation as
/// [`rotate_all`]. Disabled motors are a silent no-op, not an error.
pub fn move_steps<P: OutputPin, D: DelayNs>(
    motor: &mut Stepper<P>,
    steps: u32,
    direction: Direction,
    stop: &StopFlag,
    delay: &mut D,
) -> u32 {
    if !motor.is_enabled() {
        return 0;
    }

    for step in 0..steps {
        if stop.is_set() {
            return step;
        }
        motor.advance(direction);
        if !interruptible_delay(delay, motor.step_delay_ms(), stop) {
            return step + 1;
        }
    }
    steps
}

/// Angular single-motor variant of [`move_steps`].
pub fn rotate_degrees<P: OutputPin, D: DelayNs>(
    motor: &mut Stepper<P>,
    degrees: f32,
    direction: Direction,
    stop: &StopFlag,
    delay: &mut D,
) -> u32 {
    move_steps(motor, steps_for_degrees(degrees), direction, stop, delay)
}

/// Drop every motor's drive lines and mark it disabled, immediately.
///
/// This is the cancellation fast path: no delay, no flag check, never routed through the
/// chunked-delay logic. Resuming motion afterwards requires explicitly re-enabling each motor.
pub fn emergency_stop_all<P: OutputPin>(motors: &mut [Stepper<P>]) {
    for motor in motors.iter_mut() {
        motor.disable();
    }
}
