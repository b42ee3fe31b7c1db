pub mod regs;
pub mod spi;

#[cfg(target_arch = "avr")]
pub mod gpio;
#[cfg(target_arch = "avr")]
pub mod uart;

// Re-export commonly used types
pub use regs::{Register, SpiRegisters};
pub use spi::{BusSettings, ClockDivider, DataOrder, Error, Master, Selected, Spi, SpiMode, Unconfigured};

#[cfg(target_arch = "avr")]
pub use gpio::Output;
#[cfg(target_arch = "avr")]
pub use regs::Atmega128Spi;
#[cfg(target_arch = "avr")]
pub use uart::Usart0;
