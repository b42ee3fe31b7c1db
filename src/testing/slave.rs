use std::collections::VecDeque;

/// Level MISO floats to when a slave has nothing to say.
pub const IDLE: u8 = 0xFF;

/// Device on the far end of the simulated bus.
pub trait Slave {
    /// Called once per byte, MSB-first framing. Returns the byte shifted out
    /// on MISO during the same clocks.
    fn exchange(&mut self, mosi: u8) -> u8;
}

/// MISO wired to MOSI.
pub struct Loopback;

impl Slave for Loopback {
    fn exchange(&mut self, mosi: u8) -> u8 {
        mosi
    }
}

/// Echoes each byte during the following transfer, like a one-byte shift
/// register in the slave.
pub struct DelayedEcho {
    last: u8,
}

impl DelayedEcho {
    pub fn new() -> Self {
        Self { last: IDLE }
    }
}

impl Default for DelayedEcho {
    fn default() -> Self {
        Self::new()
    }
}

impl Slave for DelayedEcho {
    fn exchange(&mut self, mosi: u8) -> u8 {
        core::mem::replace(&mut self.last, mosi)
    }
}

/// Replies with a fixed script regardless of input, then idles.
pub struct Scripted {
    replies: VecDeque<u8>,
}

impl Scripted {
    pub fn new(replies: &[u8]) -> Self {
        Self {
            replies: replies.iter().copied().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

impl Slave for Scripted {
    fn exchange(&mut self, _mosi: u8) -> u8 {
        self.replies.pop_front().unwrap_or(IDLE)
    }
}
