// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! REYAX RYLR998 LoRa transceiver driver.
//!
//! The module speaks newline-terminated AT commands over UART. Transmit goes straight out the
//! serial writer; receive arrives through the interrupt-fed ring buffer, so the driver owns the
//! [`RingConsumer`] half and the platform interrupt owns the producer half.
//!
//! Command/response discipline: the receive buffer is cleared before every command so the next
//! reassembled line is that command's response, then the driver busy-waits on the reassembler
//! until the line arrives or the deadline passes. The module is assumed to reply exactly once
//! per command; an unsolicited `+RCV=` landing between the clear and the real reply would be
//! misread as the response. The protocol has no sequence numbers to defend against that, so the
//! race is accepted and documented here rather than papered over.

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use embedded_hal_nb::serial::Write;
use heapless::String;
use nb::block;

use crate::hw::{Clock, Deadline, RingConsumer};
use crate::protocol::messages::{
    InboundMessage, ERROR_MARKERS, MAX_PAYLOAD_LEN, MAX_RESPONSE_LEN, NOTIFICATION_PREFIX,
    SUCCESS_MARKER,
};
use crate::protocol::parser::{parse_notification, read_line};

/// Deadline for one command/response exchange.
pub const COMMAND_TIMEOUT_MS: u32 = 2000;

/// `AT+SEND` address reaching every node on the network.
pub const BROADCAST_ADDRESS: u16 = 65535;

/// Factory UART baud rate of the RYLR998.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

// Module settle times around power-up and soft reset.
const STARTUP_SETTLE_MS: u32 = 1000;
const RESET_SETTLE_MS: u32 = 2000;

// Fixed preamble length for AT+PARAMETER.
const PREAMBLE_LENGTH: u8 = 8;

/// Driver failure taxonomy.
///
/// Ring-buffer overflow is deliberately absent: it is sticky diagnostic state on the consumer
/// ([`RingConsumer::overflowed`]), never a call failure. "No message available" on the receive
/// path is expressed as [`nb::Error::WouldBlock`], not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Argument rejected before any I/O (empty command, oversized payload, bad network id).
    InvalidParam,
    /// No complete response line within the deadline.
    Timeout,
    /// The module answered with an error echo during a configuration exchange.
    Protocol,
    /// Operation attempted before a successful [`Rylr998::init`].
    NotInitialized,
}

/// Transmit power in dBm-coded steps (0–15).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Power {
    Min = 0,
    Low = 5,
    Medium = 10,
    Max = 15,
}

/// LoRa spreading factor. Higher is slower but longer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpreadingFactor {
    Sf7 = 7,
    Sf8 = 8,
    Sf9 = 9,
    Sf10 = 10,
    Sf11 = 11,
}

/// Channel bandwidth, RYLR998 wire coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Bandwidth {
    Bw7_8kHz = 0,
    Bw10_4kHz = 1,
    Bw15_6kHz = 2,
    Bw20_8kHz = 3,
    Bw31_25kHz = 4,
    Bw41_7kHz = 5,
    Bw62_5kHz = 6,
    Bw125kHz = 7,
    Bw250kHz = 8,
    Bw500kHz = 9,
}

/// Forward error correction coding rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CodingRate {
    Cr4_5 = 1,
    Cr4_6 = 2,
    Cr4_7 = 3,
    Cr4_8 = 4,
}

/// Radio parameters applied during [`Rylr998::init`].
///
/// A zero network id or device address means "leave the module's stored value alone".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfig {
    pub baud_rate: u32,
    pub network_id: u16,
    pub device_address: u16,
    pub frequency_hz: u32,
    pub power: Power,
    pub spreading_factor: SpreadingFactor,
    pub bandwidth: Bandwidth,
    pub coding_rate: CodingRate,
}

impl Default for RadioConfig {
    /// 915 MHz US ISM band, SF9 / 125 kHz / CR 4/5, medium power.
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            network_id: 0,
            device_address: 0,
            frequency_hz: 915_000_000,
            power: Power::Medium,
            spreading_factor: SpreadingFactor::Sf9,
            bandwidth: Bandwidth::Bw125kHz,
            coding_rate: CodingRate::Cr4_5,
        }
    }
}

/// RYLR998 driver bound to a serial writer, the RX ring consumer, and a monotonic clock.
pub struct Rylr998<'a, W, C, const N: usize>
where
    W: Write<u8>,
    C: Clock,
{
    tx: W,
    rx: RingConsumer<'a, N>,
    clock: C,
    config: RadioConfig,
    initialized: bool,
}

impl<'a, W, C, const N: usize> Rylr998<'a, W, C, N>
where
    W: Write<u8>,
    C: Clock,
{
    /// Bind the driver to its transport. No I/O happens until [`init`](Self::init).
    pub fn new(tx: W, rx: RingConsumer<'a, N>, clock: C, config: RadioConfig) -> Self {
        Self {
            tx,
            rx,
            clock,
            config,
            initialized: false,
        }
    }

    #[inline]
    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Borrow the serial writer (diagnostics, tests).
    #[inline]
    pub fn transport(&self) -> &W {
        &self.tx
    }

    /// Release the transport halves.
    pub fn free(self) -> (W, RingConsumer<'a, N>) {
        (self.tx, self.rx)
    }

    fn write_line(&mut self, text: &str) {
        for &b in text.as_bytes() {
            block!(self.tx.write(b)).ok();
        }
        block!(self.tx.write(b'\r')).ok();
        block!(self.tx.write(b'\n')).ok();
        block!(self.tx.flush()).ok();
    }

    /// Send one AT command and return the first response line.
    ///
    /// Stale buffered data is cleared before transmitting so the returned line belongs to this
    /// command, assuming the module replies exactly once per command (see module docs for the
    /// notification-interleaving caveat). The wait is a busy poll against the wall clock:
    /// minimum latency beats CPU yield on this single-task core.
    pub fn send_command(
        &mut self,
        command: &str,
        timeout_ms: u32,
    ) -> Result<String<MAX_RESPONSE_LEN>, Error> {
        if command.is_empty() {
            return Err(Error::InvalidParam);
        }

        self.rx.clear();
        self.write_line(command);

        let deadline = Deadline::after(&self.clock, timeout_ms);
        loop {
            if let Some(line) = read_line::<MAX_RESPONSE_LEN, N>(&mut self.rx) {
                return Ok(line);
            }
            if deadline.expired(&self.clock) {
                #[cfg(feature = "defmt")]
                defmt::warn!("command timed out: {}", command);
                return Err(Error::Timeout);
            }
        }
    }

    /// Classify a response line. Error markers win over success markers, defending against
    /// modules that echo the failed command text alongside an error code.
    pub fn is_ok(response: &str) -> bool {
        if ERROR_MARKERS.iter().any(|m| response.contains(m)) {
            return false;
        }
        response.contains(SUCCESS_MARKER)
    }

    fn command_expect_ok(&mut self, command: &str) -> Result<(), Error> {
        let response = self.send_command(command, COMMAND_TIMEOUT_MS)?;
        if Self::is_ok(&response) {
            Ok(())
        } else {
            Err(Error::Protocol)
        }
    }

    /// Bare `AT` liveness probe.
    pub fn probe(&mut self) -> Result<(), Error> {
        self.command_expect_ok("AT")
    }

    /// Bring the module up: settle wait, liveness probe, network id / address / RF parameters.
    ///
    /// Gates every higher-level operation; nothing else works until this succeeds.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        let cfg = self.config;

        // Datasheet range for NETWORKID is 3-15 plus the default 18. Checked before any I/O.
        if cfg.network_id != 0 && cfg.network_id != 18 && !(3..=15).contains(&cfg.network_id) {
            return Err(Error::InvalidParam);
        }

        delay.delay_ms(STARTUP_SETTLE_MS);
        self.probe()?;

        let mut cmd: String<32> = String::new();
        if cfg.network_id != 0 {
            let _ = write!(cmd, "AT+NETWORKID={}", cfg.network_id);
            self.command_expect_ok(&cmd)?;
        }
        if cfg.device_address != 0 {
            cmd.clear();
            let _ = write!(cmd, "AT+ADDRESS={}", cfg.device_address);
            self.command_expect_ok(&cmd)?;
        }

        self.configure(
            cfg.frequency_hz,
            cfg.power,
            cfg.spreading_factor,
            cfg.bandwidth,
            cfg.coding_rate,
        )?;

        self.initialized = true;
        Ok(())
    }

    /// Apply RF parameters (`AT+BAND`, `AT+CRFOP`, `AT+PARAMETER`) and record them in the
    /// stored configuration.
    pub fn configure(
        &mut self,
        frequency_hz: u32,
        power: Power,
        spreading_factor: SpreadingFactor,
        bandwidth: Bandwidth,
        coding_rate: CodingRate,
    ) -> Result<(), Error> {
        let mut cmd: String<48> = String::new();

        let _ = write!(cmd, "AT+BAND={}", frequency_hz);
        self.command_expect_ok(&cmd)?;

        cmd.clear();
        let _ = write!(cmd, "AT+CRFOP={}", power as u8);
        self.command_expect_ok(&cmd)?;

        cmd.clear();
        let _ = write!(
            cmd,
            "AT+PARAMETER={},{},{},{}",
            spreading_factor as u8, bandwidth as u8, coding_rate as u8, PREAMBLE_LENGTH
        );
        self.command_expect_ok(&cmd)?;

        self.config.frequency_hz = frequency_hz;
        self.config.power = power;
        self.config.spreading_factor = spreading_factor;
        self.config.bandwidth = bandwidth;
        self.config.coding_rate = coding_rate;
        Ok(())
    }

    /// Transmit `payload` to `address` via `AT+SEND=<addr>,<len>,<payload>`.
    pub fn send_message(&mut self, address: u16, payload: &str) -> Result<(), Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        if payload.is_empty() || payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::InvalidParam);
        }

        let mut cmd: String<{ MAX_PAYLOAD_LEN + 32 }> = String::new();
        let _ = write!(cmd, "AT+SEND={},{},{}", address, payload.len(), payload);
        self.command_expect_ok(&cmd)
    }

    /// Transmit `payload` to every node on the network.
    pub fn broadcast(&mut self, payload: &str) -> Result<(), Error> {
        self.send_message(BROADCAST_ADDRESS, payload)
    }

    /// Poll for one unsolicited incoming message.
    ///
    /// Pulls at most one reassembled line. Only a well-formed `+RCV=` notification yields a
    /// message; stray `+OK`/`+ERR` echoes, malformed notifications, and unknown lines are
    /// consumed and reported as [`nb::Error::WouldBlock`] so the caller's polling loop never
    /// wedges on them.
    pub fn try_receive(&mut self) -> nb::Result<InboundMessage, Error> {
        if !self.initialized {
            return Err(nb::Error::Other(Error::NotInitialized));
        }

        let line: String<MAX_RESPONSE_LEN> =
            read_line(&mut self.rx).ok_or(nb::Error::WouldBlock)?;

        if line.starts_with(NOTIFICATION_PREFIX) {
            if let Some(message) = parse_notification(&line) {
                return Ok(message);
            }
            #[cfg(feature = "defmt")]
            defmt::warn!("malformed notification dropped: {}", line.as_str());
            return Err(nb::Error::WouldBlock);
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("non-notification line skipped: {}", line.as_str());
        Err(nb::Error::WouldBlock)
    }

    /// Poll once and hand a successfully parsed message to `handler`.
    pub fn process_messages<F>(&mut self, mut handler: F) -> nb::Result<(), Error>
    where
        F: FnMut(&InboundMessage),
    {
        let message = self.try_receive()?;
        handler(&message);
        Ok(())
    }

    /// Soft-reset the module. Initialization state is lost; run [`init`](Self::init) again.
    pub fn reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        self.command_expect_ok("AT+RESET")?;
        delay.delay_ms(RESET_SETTLE_MS);
        self.initialized = false;
        Ok(())
    }

    /// Enter low-power sleep (`AT+MODE=1`).
    pub fn sleep(&mut self) -> Result<(), Error> {
        self.command_expect_ok("AT+MODE=1")
    }

    /// Leave sleep mode (`AT+MODE=0`).
    pub fn wake(&mut self) -> Result<(), Error> {
        self.command_expect_ok("AT+MODE=0")
    }

    /// Raw firmware version line from `AT+VER?`.
    pub fn firmware_version(&mut self) -> Result<String<MAX_RESPONSE_LEN>, Error> {
        self.send_command("AT+VER?", COMMAND_TIMEOUT_MS)
    }

    #[cfg(test)]
    pub(crate) fn force_initialized(&mut self) {
        self.initialized = true;
    }
}

/// Test harness shared with the dispatch tests: a scripted clock that plays module responses
/// into the ring producer while the driver busy-waits.
#[cfg(test)]
pub(crate) mod testsupport {
    use core::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::{RadioConfig, Rylr998};
    use crate::hw::{Clock, RingBuffer, RingConsumer, RingProducer};

    pub struct Feeder {
        now: Cell<u32>,
        script: RefCell<VecDeque<std::string::String>>,
        producer: RefCell<RingProducer<'static, 256>>,
    }

    impl Feeder {
        /// Queue a line the "module" will send the next time the driver checks the clock.
        pub fn script_line(&self, line: &str) {
            self.script.borrow_mut().push_back(format!("{line}\r\n"));
        }

        /// Push a line into the ring right now, as the RX interrupt would.
        pub fn inject(&self, line: &str) {
            let mut producer = self.producer.borrow_mut();
            for &b in line.as_bytes() {
                assert!(producer.push(b));
            }
            for &b in b"\r\n" {
                assert!(producer.push(b));
            }
        }

        fn tick(&self) -> u32 {
            let now = self.now.get().wrapping_add(1);
            self.now.set(now);
            if let Some(line) = self.script.borrow_mut().pop_front() {
                let mut producer = self.producer.borrow_mut();
                for &b in line.as_bytes() {
                    producer.push(b);
                }
            }
            now
        }
    }

    /// Clones share one feeder, so tests can keep scripting after the driver takes its copy.
    #[derive(Clone)]
    pub struct SharedFeeder(pub Rc<Feeder>);

    impl Clock for SharedFeeder {
        fn now_ms(&self) -> u32 {
            self.0.tick()
        }
    }

    pub struct Harness {
        feeder: SharedFeeder,
        consumer: Option<RingConsumer<'static, 256>>,
        pre_initialized: bool,
    }

    impl Harness {
        pub fn new() -> Self {
            // Leaking keeps the ring 'static so the harness is not self-referential.
            let ring: &'static mut RingBuffer<256> = Box::leak(Box::new(RingBuffer::new()));
            let (producer, consumer) = ring.split();
            Self {
                feeder: SharedFeeder(Rc::new(Feeder {
                    now: Cell::new(0),
                    script: RefCell::new(VecDeque::new()),
                    producer: RefCell::new(producer),
                })),
                consumer: Some(consumer),
                pre_initialized: false,
            }
        }

        /// Harness whose radio comes up already initialized (skips the init exchange).
        pub fn initialized() -> Self {
            let mut harness = Self::new();
            harness.pre_initialized = true;
            harness
        }

        pub fn radio<W>(&mut self, tx: W) -> Rylr998<'static, W, SharedFeeder, 256>
        where
            W: embedded_hal_nb::serial::Write<u8>,
        {
            self.radio_with(tx, RadioConfig::default())
        }

        pub fn radio_with<W>(
            &mut self,
            tx: W,
            config: RadioConfig,
        ) -> Rylr998<'static, W, SharedFeeder, 256>
        where
            W: embedded_hal_nb::serial::Write<u8>,
        {
            let rx = self.consumer.take().expect("harness radio already built");
            let mut radio = Rylr998::new(tx, rx, self.feeder.clone(), config);
            if self.pre_initialized {
                radio.force_initialized();
            }
            radio
        }

        pub fn expect_ok(&self) {
            self.feeder.0.script_line("+OK");
        }

        pub fn expect_line(&self, line: &str) {
            self.feeder.0.script_line(line);
        }

        pub fn inject(&self, line: &str) {
            self.feeder.0.inject(line);
        }
    }
}
