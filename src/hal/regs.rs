//! Register access layer for the SPI peripheral and its port.
//!
//! The driver only ever talks to five 8-bit registers. Putting them behind
//! [`SpiRegisters`] lets the same transfer code run against the real
//! ATmega128 and against [`SimSpi`](crate::testing::SimSpi).

/// SPI pins on PORTB
pub const SS: u8 = 0;
pub const SCK: u8 = 1;
pub const MOSI: u8 = 2;
pub const MISO: u8 = 3;

/// SPCR bits
pub const SPIE: u8 = 7;
pub const SPE: u8 = 6;
pub const DORD: u8 = 5;
pub const MSTR: u8 = 4;
pub const CPOL: u8 = 3;
pub const CPHA: u8 = 2;
pub const SPR1: u8 = 1;
pub const SPR0: u8 = 0;

/// SPSR bits
pub const SPIF: u8 = 7;
pub const WCOL: u8 = 6;
pub const SPI2X: u8 = 0;

#[inline(always)]
pub const fn bv(bit: u8) -> u8 {
    1 << bit
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// DDRB
    Ddr,
    /// PORTB
    Port,
    /// SPCR
    Control,
    /// SPSR
    Status,
    /// SPDR
    Data,
}

pub trait SpiRegisters {
    fn read(&mut self, reg: Register) -> u8;

    fn write(&mut self, reg: Register, value: u8);

    #[inline]
    fn modify<F: FnOnce(u8) -> u8>(&mut self, reg: Register, f: F) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

impl<R: SpiRegisters + ?Sized> SpiRegisters for &mut R {
    #[inline]
    fn read(&mut self, reg: Register) -> u8 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&mut self, reg: Register, value: u8) {
        (**self).write(reg, value)
    }
}

#[cfg(target_arch = "avr")]
pub use self::atmega128a::Atmega128Spi;

#[cfg(target_arch = "avr")]
mod atmega128a {
    use super::{Register, SpiRegisters};
    use avr_device::atmega128a::{PORTB, SPI};

    /// Owns the SPI block and PORTB, so only one driver can exist.
    pub struct Atmega128Spi {
        spi: SPI,
        portb: PORTB,
    }

    impl Atmega128Spi {
        pub fn new(spi: SPI, portb: PORTB) -> Self {
            Self { spi, portb }
        }
    }

    impl SpiRegisters for Atmega128Spi {
        #[inline]
        fn read(&mut self, reg: Register) -> u8 {
            match reg {
                Register::Ddr => self.portb.ddrb.read().bits(),
                Register::Port => self.portb.portb.read().bits(),
                Register::Control => self.spi.spcr.read().bits(),
                Register::Status => self.spi.spsr.read().bits(),
                Register::Data => self.spi.spdr.read().bits(),
            }
        }

        #[inline]
        fn write(&mut self, reg: Register, value: u8) {
            unsafe {
                match reg {
                    Register::Ddr => self.portb.ddrb.write(|w| w.bits(value)),
                    Register::Port => self.portb.portb.write(|w| w.bits(value)),
                    Register::Control => self.spi.spcr.write(|w| w.bits(value)),
                    Register::Status => self.spi.spsr.write(|w| w.bits(value)),
                    Register::Data => self.spi.spdr.write(|w| w.bits(value)),
                }
            }
        }
    }
}
