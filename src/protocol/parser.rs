// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line reassembly and notification parsing.
//!
//! [`read_line`] turns the interrupt-fed byte stream back into discrete text lines;
//! [`parse_notification`] decodes the `+RCV=` grammar those lines may carry.

use heapless::String;

use crate::hw::RingConsumer;
use crate::protocol::messages::{InboundMessage, MAX_PAYLOAD_LEN, NOTIFICATION_PREFIX};

/// Pull one `\r`/`\n`-terminated line out of the ring buffer.
///
/// Terminators following other terminators (empty lines) are consumed silently. If the ring runs
/// dry or the destination fills before a terminator arrives, whatever was collected is returned
/// as a partial line; callers treat it identically to a complete one, which tolerates fragmented
/// arrival across polling calls. Returns `None` only when nothing was collected at all.
///
/// Never blocks; the only side effect is consuming bytes from `rx`.
pub fn read_line<const MAX: usize, const N: usize>(
    rx: &mut RingConsumer<'_, N>,
) -> Option<String<MAX>> {
    let mut line: String<MAX> = String::new();

    while line.len() < MAX {
        let Some(byte) = rx.pop() else {
            break;
        };

        if byte == b'\r' || byte == b'\n' {
            if line.is_empty() {
                // Separator between lines, not an empty result.
                continue;
            }
            return Some(line);
        }

        // Non-ASCII noise occupies its full UTF-8 width; a failed push ends the line early.
        if line.push(byte as char).is_err() {
            return Some(line);
        }
    }

    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

/// Parse an unsolicited `+RCV=<sender>,<declared_len>,<payload>,<rssi>` notification.
///
/// The declared length field is advisory and ignored: the payload span between the delimiters is
/// what gets stored, capped to [`MAX_PAYLOAD_LEN`]. RSSI is reported negative by the module and
/// stored as its absolute value. Returns `None` for anything that does not match the grammar.
pub fn parse_notification(line: &str) -> Option<InboundMessage> {
    let rest = line.strip_prefix(NOTIFICATION_PREFIX)?;

    let (sender_text, rest) = rest.split_once(',')?;
    let (_declared_len, rest) = rest.split_once(',')?;
    let (payload_text, rssi_text) = rest.split_once(',')?;

    let sender = sender_text.trim().parse::<u16>().ok()?;
    let rssi = rssi_text.trim().parse::<i16>().ok()?.unsigned_abs();

    let mut payload: String<MAX_PAYLOAD_LEN> = String::new();
    for ch in payload_text.chars() {
        if payload.push(ch).is_err() {
            break;
        }
    }

    Some(InboundMessage {
        sender,
        rssi: rssi.min(u8::MAX as u16) as u8,
        payload,
    })
}
