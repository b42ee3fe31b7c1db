//! Configuration constants for the SPI master firmware

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// UART baud rate used by the serial console
pub const UART_BAUD: u32 = 9600;

/// SCK frequency after initialization (f_osc / 2 with SPI2X set)
pub const SPI_CLOCK_HZ: u32 = CPU_FREQ_HZ / 2;

/// Status polls allowed per byte when a bounded wait is requested.
///
/// One byte at f_osc/2 takes 16 CPU cycles, so this leaves a wide margin
/// even with a slow status poll loop.
pub const SPI_TIMEOUT_SPINS: u32 = 1000;

/// How a transfer waits for the hardware to report completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// Spin on SPIF forever. A peripheral that never completes hangs the caller.
    Unbounded,
    /// Give up with [`Error::Timeout`](crate::hal::spi::Error::Timeout)
    /// after this many status polls.
    Spins(u32),
}

/// Runtime options for [`Spi::into_master`](crate::hal::spi::Spi::into_master).
///
/// Bus settings (mode 0, MSB first, f_osc/2) are fixed and not part of this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiConfig {
    pub wait: WaitPolicy,
}

impl SpiConfig {
    pub const fn new() -> Self {
        Self {
            wait: WaitPolicy::Unbounded,
        }
    }

    /// Bound every byte transfer to `spins` status polls.
    pub const fn with_timeout(mut self, spins: u32) -> Self {
        self.wait = WaitPolicy::Spins(spins);
        self
    }
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_waits_forever() {
        assert_eq!(SpiConfig::default().wait, WaitPolicy::Unbounded);
    }

    #[test]
    fn timeout_replaces_policy() {
        let config = SpiConfig::new().with_timeout(SPI_TIMEOUT_SPINS);
        assert_eq!(config.wait, WaitPolicy::Spins(1000));
    }

    #[test]
    fn spi_clock_is_half_cpu_clock() {
        assert_eq!(SPI_CLOCK_HZ, 8_000_000);
    }
}
