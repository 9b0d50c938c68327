// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

pub mod messages;
pub mod parser;

pub use messages::{classify_command, Command, InboundMessage};
pub use parser::{parse_notification, read_line};
