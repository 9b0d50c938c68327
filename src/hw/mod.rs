pub mod clock;
pub mod ring;

pub use clock::{Clock, Deadline};
pub use ring::{RingBuffer, RingConsumer, RingProducer};
