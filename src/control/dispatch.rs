// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Inbound command dispatch.
//!
//! Maps a parsed radio payload onto the stepping engine: activation clears the stop flag,
//! re-enables the bank and nudges it one small clockwise increment (the outer polling loop
//! repeats the nudge while its active latch holds, re-checking cancellation every cycle);
//! deactivation raises the flag and takes the emergency-stop fast path. Either way the sender
//! gets an acknowledgment, sent after the motor action rather than instead of it.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal_nb::serial::Write;

use crate::control::motion::{emergency_stop_all, rotate_all, StopFlag};
use crate::drivers::rylr998::{Error, Rylr998};
use crate::hw::Clock;
use crate::motors::{Direction, Stepper};
use crate::protocol::messages::{classify_command, Command, InboundMessage};

/// Angular increment of one activation nudge. Small on purpose: the stop flag gets re-checked
/// at least once per nudge even before the chunked delay does.
pub const ACTIVATION_NUDGE_DEGREES: f32 = 1.0;

/// Acknowledgment payloads sent back to the commanding node.
pub const ACK_ACTIVATED: &str = "STEPPERS_ON";
pub const ACK_STOPPED: &str = "STEPPERS_OFF";
pub const ACK_UNRECOGNIZED: &str = "UNKNOWN_COMMAND";

/// What the dispatcher did with a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchOutcome {
    /// Motors re-armed and nudged clockwise.
    Activated,
    /// Stop flag raised and all motors emergency-stopped.
    Stopped,
    /// Payload matched no known alias; no motor action taken.
    Unrecognized,
}

/// Act on one inbound message and acknowledge it to the sender.
///
/// The acknowledgment result is reported separately from the outcome: a failed ack must not
/// undo or mask the motor action that already happened.
pub fn dispatch<P, W, C, D, const N: usize>(
    msg: &InboundMessage,
    motors: &mut [Stepper<P>],
    stop: &StopFlag,
    radio: &mut Rylr998<'_, W, C, N>,
    delay: &mut D,
) -> (DispatchOutcome, Result<(), Error>)
where
    P: OutputPin,
    W: Write<u8>,
    C: Clock,
    D: DelayNs,
{
    match classify_command(&msg.payload) {
        Some(Command::Activate) => {
            // Re-arm first: a stale flag from the previous stop would no-op the rotation.
            stop.clear();
            for motor in motors.iter_mut() {
                motor.enable();
            }
            rotate_all(
                motors,
                ACTIVATION_NUDGE_DEGREES,
                Direction::Clockwise,
                stop,
                delay,
            );
            let ack = radio.send_message(msg.sender, ACK_ACTIVATED);
            (DispatchOutcome::Activated, ack)
        }
        Some(Command::Deactivate) => {
            stop.set();
            emergency_stop_all(motors);
            let ack = radio.send_message(msg.sender, ACK_STOPPED);
            (DispatchOutcome::Stopped, ack)
        }
        None => {
            #[cfg(feature = "defmt")]
            defmt::warn!("unrecognized command payload: {}", msg.payload.as_str());
            let ack = radio.send_message(msg.sender, ACK_UNRECOGNIZED);
            (DispatchOutcome::Unrecognized, ack)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{dispatch, DispatchOutcome, ACK_ACTIVATED, ACK_STOPPED, ACK_UNRECOGNIZED};
    use crate::control::motion::{steps_for_degrees, StopFlag};
    use crate::drivers::rylr998::testsupport::Harness;
    use crate::motors::Stepper;
    use crate::protocol::messages::InboundMessage;
    use crate::testutil::{TestDelay, TestPin, TestTx};

    fn message(payload: &str) -> InboundMessage {
        InboundMessage {
            sender: 200,
            rssi: 40,
            payload: payload.try_into().unwrap(),
        }
    }

    fn bank() -> std::vec::Vec<Stepper<TestPin>> {
        (0..4).map(|_| Stepper::new([TestPin::new(); 4], 1)).collect()
    }

    #[test]
    fn activation_rearms_and_nudges_clockwise() {
        let mut harness = Harness::initialized();
        let mut radio = harness.radio(TestTx::new());
        let mut motors = bank();
        motors.iter_mut().for_each(Stepper::disable);
        let stop = StopFlag::new();
        stop.set(); // stale flag from a previous OFF
        let mut delay = TestDelay::new();

        harness.expect_ok(); // ack send
        let (outcome, ack) = dispatch(&message("ON"), &mut motors, &stop, &mut radio, &mut delay);

        assert_eq!(outcome, DispatchOutcome::Activated);
        assert!(ack.is_ok());
        assert!(!stop.is_set());
        let expected = (steps_for_degrees(1.0) % 8) as u8;
        for motor in &motors {
            assert!(motor.is_enabled());
            assert_eq!(motor.phase(), expected);
        }
        assert!(radio.transport().as_text().contains(&format!(
            "AT+SEND=200,{},{}\r\n",
            ACK_ACTIVATED.len(),
            ACK_ACTIVATED
        )));
    }

    #[test]
    fn deactivation_stops_everything_before_acking() {
        let mut harness = Harness::initialized();
        let mut radio = harness.radio(TestTx::new());
        let mut motors = bank();
        let stop = StopFlag::new();
        let mut delay = TestDelay::new();

        harness.expect_ok();
        let (outcome, ack) =
            dispatch(&message("stop"), &mut motors, &stop, &mut radio, &mut delay);

        assert_eq!(outcome, DispatchOutcome::Stopped);
        assert!(ack.is_ok());
        assert!(stop.is_set());
        assert_eq!(delay.total_ms(), 0, "the stop path never waits");
        assert!(radio.transport().as_text().contains(ACK_STOPPED));
        for motor in motors {
            assert!(!motor.is_enabled());
            for pin in motor.free() {
                assert!(!pin.is_high());
            }
        }
    }

    #[test]
    fn unrecognized_payload_acks_an_error_and_moves_nothing() {
        let mut harness = Harness::initialized();
        let mut radio = harness.radio(TestTx::new());
        let mut motors = bank();
        let stop = StopFlag::new();
        let mut delay = TestDelay::new();

        harness.expect_ok();
        let (outcome, ack) =
            dispatch(&message("PING"), &mut motors, &stop, &mut radio, &mut delay);

        assert_eq!(outcome, DispatchOutcome::Unrecognized);
        assert!(ack.is_ok());
        assert!(!stop.is_set());
        for motor in &motors {
            assert_eq!(motor.phase(), 0);
        }
        assert!(radio.transport().as_text().contains(ACK_UNRECOGNIZED));
    }

    #[test]
    fn motor_action_survives_a_failed_ack() {
        let mut harness = Harness::initialized();
        let mut radio = harness.radio(TestTx::new());
        let mut motors = bank();
        let stop = StopFlag::new();
        let mut delay = TestDelay::new();

        // No response scripted: the ack send times out, the stop still happened.
        let (outcome, ack) =
            dispatch(&message("OFF"), &mut motors, &stop, &mut radio, &mut delay);

        assert_eq!(outcome, DispatchOutcome::Stopped);
        assert!(ack.is_err());
        assert!(stop.is_set());
        assert!(motors.iter().all(|m| !m.is_enabled()));
    }
}
