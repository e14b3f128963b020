//! Bounded Ring Buffer
//!
//! Provides a fixed-capacity FIFO buffer that evicts the oldest sample
//! when full. Used to hold calibration samples.

mod buffer;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};
