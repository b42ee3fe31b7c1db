//! SPI (Serial Peripheral Interface) master driver
//!
//! The peripheral is brought up once with [`Spi::into_master`] and is then
//! fixed at mode 0 (CPOL=0, CPHA=0), MSB first, SCK = f_osc/2. Every
//! transfer is blocking: the byte goes into SPDR and the driver polls SPIF
//! until the hardware reports completion.
//!
//! The driver never touches a slave's chip select. Callers bracket each
//! transaction themselves, or use [`Spi::select`] to get a [`Selected`]
//! guard that deasserts the line when it goes out of scope.
//!
//! Nothing here masks interrupts. Calling into the same bus from an ISR
//! while a transfer is running in normal context corrupts both transfers;
//! wrap the outer transaction in `avr_device::interrupt::free` if an ISR
//! may touch the bus.

use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};

use embedded_hal::blocking;
use embedded_hal::digital::v2::OutputPin;
use ufmt::derive::uDebug;

use super::regs::{
    bv, Register, SpiRegisters, CPHA, CPOL, DORD, MISO, MOSI, MSTR, SCK, SPE, SPI2X, SPIF, SPR0,
    SPR1, SS,
};
use crate::config::{SpiConfig, WaitPolicy};

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// SPIF stayed clear for the whole wait budget
    Timeout,
}

/// SCK divider, combining SPR1:0 with SPI2X
#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum ClockDivider {
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
}

impl ClockDivider {
    fn decode(spcr: u8, spsr: u8) -> Self {
        let spr = spcr & (bv(SPR1) | bv(SPR0));
        let double = spsr & bv(SPI2X) != 0;
        match (spr, double) {
            (0, true) => ClockDivider::Div2,
            (0, false) => ClockDivider::Div4,
            (1, true) => ClockDivider::Div8,
            (1, false) => ClockDivider::Div16,
            (2, true) => ClockDivider::Div32,
            (2, false) | (3, true) => ClockDivider::Div64,
            _ => ClockDivider::Div128,
        }
    }

    pub fn ratio(self) -> u8 {
        match self {
            ClockDivider::Div2 => 2,
            ClockDivider::Div4 => 4,
            ClockDivider::Div8 => 8,
            ClockDivider::Div16 => 16,
            ClockDivider::Div32 => 32,
            ClockDivider::Div64 => 64,
            ClockDivider::Div128 => 128,
        }
    }
}

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrder {
    MsbFirst,
    LsbFirst,
}

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum SpiMode {
    Mode0, // CPOL=0, CPHA=0
    Mode1, // CPOL=0, CPHA=1
    Mode2, // CPOL=1, CPHA=0
    Mode3, // CPOL=1, CPHA=1
}

/// Bus settings as currently programmed into SPCR/SPSR.
#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub struct BusSettings {
    pub enabled: bool,
    pub master: bool,
    pub mode: SpiMode,
    pub order: DataOrder,
    pub divider: ClockDivider,
}

impl BusSettings {
    pub fn decode(spcr: u8, spsr: u8) -> Self {
        let mode = match (spcr & bv(CPOL) != 0, spcr & bv(CPHA) != 0) {
            (false, false) => SpiMode::Mode0,
            (false, true) => SpiMode::Mode1,
            (true, false) => SpiMode::Mode2,
            (true, true) => SpiMode::Mode3,
        };
        let order = if spcr & bv(DORD) != 0 {
            DataOrder::LsbFirst
        } else {
            DataOrder::MsbFirst
        };

        Self {
            enabled: spcr & bv(SPE) != 0,
            master: spcr & bv(MSTR) != 0,
            mode,
            order,
            divider: ClockDivider::decode(spcr, spsr),
        }
    }
}

/// Peripheral not yet configured; no transfers available.
pub struct Unconfigured;
/// Peripheral enabled as bus master.
pub struct Master;

/// SPI peripheral driver
pub struct Spi<R, STATE> {
    regs: R,
    wait: WaitPolicy,
    // A FullDuplex::send whose byte has not been read back yet
    sending: bool,
    _state: PhantomData<STATE>,
}

impl<R: SpiRegisters> Spi<R, Unconfigured> {
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            wait: WaitPolicy::Unbounded,
            sending: false,
            _state: PhantomData,
        }
    }

    /// Configure the pins and enable the peripheral as master.
    ///
    /// Whatever SPCR/SPSR held before is overwritten. DDRB/PORTB bits
    /// outside the four SPI pins are left alone.
    pub fn into_master(mut self, config: SpiConfig) -> Spi<R, Master> {
        let r = &mut self.regs;

        // MISO input; MOSI, SCK and the port's own SS output. SS has to be
        // an output or a low level on it would drop us back to slave mode.
        r.modify(Register::Ddr, |v| {
            v & !(bv(MOSI) | bv(MISO) | bv(SS) | bv(SCK))
        });
        r.modify(Register::Ddr, |v| v | bv(MOSI) | bv(SS) | bv(SCK));

        // SS high while SPCR changes
        r.modify(Register::Port, |v| v | bv(SS));

        // Enable, master, MSB first, mode 0, SPR1:0 = f_osc/4
        r.write(Register::Control, bv(SPE) | bv(MSTR));

        // Double SCK to f_osc/2
        r.write(Register::Status, bv(SPI2X));

        r.modify(Register::Port, |v| v & !bv(SS));

        Spi {
            regs: self.regs,
            wait: config.wait,
            sending: false,
            _state: PhantomData,
        }
    }
}

impl<R: SpiRegisters> Spi<R, Master> {
    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    pub fn set_wait_policy(&mut self, wait: WaitPolicy) {
        self.wait = wait;
    }

    pub fn bus_settings(&mut self) -> BusSettings {
        let spcr = self.regs.read(Register::Control);
        let spsr = self.regs.read(Register::Status);
        BusSettings::decode(spcr, spsr)
    }

    #[inline]
    fn is_complete(&mut self) -> bool {
        self.regs.read(Register::Status) & bv(SPIF) != 0
    }

    fn wait_complete(&mut self) -> Result<(), Error> {
        match self.wait {
            WaitPolicy::Unbounded => {
                while !self.is_complete() {}
                Ok(())
            }
            WaitPolicy::Spins(budget) => {
                for _ in 0..budget {
                    if self.is_complete() {
                        return Ok(());
                    }
                }
                Err(Error::Timeout)
            }
        }
    }

    // Let a non-blocking send finish so the next SPDR write is not dropped
    // as a collision. Its received byte is discarded.
    fn settle(&mut self) -> Result<(), Error> {
        if self.sending {
            self.wait_complete()?;
            self.sending = false;
        }
        Ok(())
    }

    /// Transfer a single byte, returning what the slave shifted in meanwhile.
    pub fn transfer(&mut self, byte: u8) -> Result<u8, Error> {
        self.settle()?;
        self.regs.write(Register::Data, byte);
        self.wait_complete()?;
        Ok(self.regs.read(Register::Data))
    }

    /// Send `data` in order, discarding whatever comes back.
    pub fn write_block(&mut self, data: &[u8]) -> Result<(), Error> {
        self.settle()?;
        for &byte in data {
            self.regs.write(Register::Data, byte);
            self.wait_complete()?;
        }
        Ok(())
    }

    /// Send `data`, storing the byte received during each transfer at the
    /// same index of `buffer`.
    ///
    /// `buffer` must be at least as long as `data`. Debug builds panic on a
    /// shorter buffer; release builds transfer only the common prefix.
    pub fn transfer_block(&mut self, data: &[u8], buffer: &mut [u8]) -> Result<(), Error> {
        debug_assert!(buffer.len() >= data.len());
        for (slot, &byte) in buffer.iter_mut().zip(data) {
            *slot = self.transfer(byte)?;
        }
        Ok(())
    }

    /// Like [`transfer_block`](Self::transfer_block) with source and
    /// destination being the same buffer.
    pub fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Error> {
        for word in words.iter_mut() {
            *word = self.transfer(*word)?;
        }
        Ok(())
    }

    /// Assert `cs` (active low) and hand out bus access until the guard drops.
    pub fn select<'a, CS: OutputPin>(
        &'a mut self,
        cs: &'a mut CS,
    ) -> Result<Selected<'a, R, CS>, CS::Error> {
        cs.set_low()?;
        Ok(Selected { spi: self, cs })
    }
}

impl<R: SpiRegisters> embedded_hal::spi::FullDuplex<u8> for Spi<R, Master> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        if self.is_complete() {
            self.sending = false;
            Ok(self.regs.read(Register::Data))
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    // SPDR writes during a transfer are dropped by the hardware (WCOL), so
    // a second send has to wait until the first byte has been read.
    fn send(&mut self, byte: u8) -> nb::Result<(), Error> {
        if self.sending {
            return Err(nb::Error::WouldBlock);
        }
        self.regs.write(Register::Data, byte);
        self.sending = true;
        Ok(())
    }
}

impl<R: SpiRegisters> blocking::spi::Transfer<u8> for Spi<R, Master> {
    type Error = Error;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], Error> {
        self.transfer_in_place(words)?;
        Ok(words)
    }
}

impl<R: SpiRegisters> blocking::spi::Write<u8> for Spi<R, Master> {
    type Error = Error;

    fn write(&mut self, words: &[u8]) -> Result<(), Error> {
        self.write_block(words)
    }
}

/// A slave held selected for the lifetime of the guard.
///
/// Derefs to the bus so any number of transfers can run inside one
/// transaction. The chip select goes high again on drop, including early
/// returns through `?`.
pub struct Selected<'a, R: SpiRegisters, CS: OutputPin> {
    spi: &'a mut Spi<R, Master>,
    cs: &'a mut CS,
}

impl<'a, R: SpiRegisters, CS: OutputPin> Selected<'a, R, CS> {
    /// End the transaction and report a chip-select failure, which `Drop`
    /// has to swallow.
    pub fn deselect(self) -> Result<(), CS::Error> {
        let result = self.cs.set_high();
        core::mem::forget(self);
        result
    }
}

impl<'a, R: SpiRegisters, CS: OutputPin> Deref for Selected<'a, R, CS> {
    type Target = Spi<R, Master>;

    fn deref(&self) -> &Self::Target {
        &*self.spi
    }
}

impl<'a, R: SpiRegisters, CS: OutputPin> DerefMut for Selected<'a, R, CS> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.spi
    }
}

impl<'a, R: SpiRegisters, CS: OutputPin> Drop for Selected<'a, R, CS> {
    fn drop(&mut self) {
        let _ = self.cs.set_high();
    }
}
