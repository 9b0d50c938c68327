// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Host-side test doubles for the hardware seams.

use core::convert::Infallible;

use crate::control::motion::StopFlag;

/// Recording GPIO pin.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestPin {
    high: bool,
}

impl TestPin {
    pub fn new() -> Self {
        Self { high: false }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl embedded_hal::digital::ErrorType for TestPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for TestPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

/// Delay that only counts, and can raise a [`StopFlag`] on its n-th call to simulate an OFF
/// command landing mid-wait.
pub struct TestDelay<'a> {
    calls: u32,
    total_ns: u64,
    trip: Option<(&'a StopFlag, u32)>,
}

impl<'a> TestDelay<'a> {
    pub fn new() -> Self {
        Self {
            calls: 0,
            total_ns: 0,
            trip: None,
        }
    }

    /// Set `flag` during the `on_call`-th delay call (1-based).
    pub fn tripping(flag: &'a StopFlag, on_call: u32) -> Self {
        Self {
            calls: 0,
            total_ns: 0,
            trip: Some((flag, on_call)),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl embedded_hal::delay::DelayNs for TestDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ns);
        if let Some((flag, on_call)) = self.trip {
            if self.calls >= on_call {
                flag.set();
            }
        }
    }
}

/// Serial sink recording every byte the driver transmits.
#[derive(Debug, Default)]
pub struct TestTx {
    pub written: Vec<u8>,
}

impl TestTx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_text(&self) -> &str {
        core::str::from_utf8(&self.written).expect("driver wrote non-UTF8")
    }
}

impl embedded_hal_nb::serial::ErrorType for TestTx {
    type Error = Infallible;
}

impl embedded_hal_nb::serial::Write<u8> for TestTx {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.written.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}
