// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Response grammar and command vocabulary for the RYLR998 link.

use heapless::String;

/// Maximum payload the module accepts in one `AT+SEND` / `+RCV` exchange.
pub const MAX_PAYLOAD_LEN: usize = 240;

/// Maximum length of one reassembled response line.
pub const MAX_RESPONSE_LEN: usize = 256;

/// Prefix of an unsolicited incoming-message notification.
pub const NOTIFICATION_PREFIX: &str = "+RCV=";

/// Markers classifying a response line. Error markers take precedence over success markers.
pub const ERROR_MARKERS: [&str; 2] = ["+ERR", "ERROR"];
pub const SUCCESS_MARKER: &str = "OK";

/// A parsed `+RCV=` notification.
///
/// The payload length is always derived from the delimiter span of the notification, never from
/// the module's declared length field, which is noise-controlled.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InboundMessage {
    /// Address of the transmitting module.
    pub sender: u16,
    /// Signal strength, stored as the absolute value of the reported RSSI.
    pub rssi: u8,
    /// Message payload (comma-free ASCII text).
    pub payload: String<MAX_PAYLOAD_LEN>,
}

impl InboundMessage {
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// Semantic actions a remote payload can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Start / resume rotation.
    Activate,
    /// Halt rotation immediately.
    Deactivate,
}

/// Classify a payload as one of the known command aliases, case-insensitively.
///
/// Activation aliases: `ON`, `START`, `MOVE`, `1`.
/// Deactivation aliases: `OFF`, `STOP`, `HALT`, `0`.
pub fn classify_command(text: &str) -> Option<Command> {
    const ON_ALIASES: [&str; 4] = ["ON", "START", "MOVE", "1"];
    const OFF_ALIASES: [&str; 4] = ["OFF", "STOP", "HALT", "0"];

    if ON_ALIASES.iter().any(|a| text.eq_ignore_ascii_case(a)) {
        Some(Command::Activate)
    } else if OFF_ALIASES.iter().any(|a| text.eq_ignore_ascii_case(a)) {
        Some(Command::Deactivate)
    } else {
        None
    }
}
