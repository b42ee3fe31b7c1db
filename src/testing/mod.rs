//! Simulated SPI peripheral for host-side tests.
//!
//! [`SimSpi`] keeps the five registers the driver uses and follows the AVR
//! contract closely enough to catch sequencing mistakes:
//!
//! * writing SPDR starts a transfer only when SPE and MSTR are both set,
//! * SPIF comes up after a configurable number of SPSR polls,
//! * any SPDR access clears SPIF,
//! * an SPDR write while a transfer is in flight is dropped and sets WCOL,
//! * only SPI2X is writable in SPSR,
//! * with DORD set, bytes cross the wire bit-reversed relative to an
//!   MSB-first slave.
//!
//! Every write and every access is recorded so tests can check what the
//! driver did, not only what it returned.

mod slave;

pub use slave::{DelayedEcho, Loopback, Scripted, Slave};

use crate::hal::regs::{bv, Register, SpiRegisters, DORD, MSTR, SPE, SPI2X, SPIF, WCOL};

struct Pending {
    polls_left: u32,
    miso: u8,
}

pub struct SimSpi<S> {
    ddr: u8,
    port: u8,
    spcr: u8,
    spsr: u8,
    spdr: u8,
    slave: S,
    // None: SPIF never rises
    latency: Option<u32>,
    pending: Option<Pending>,
    observed: Vec<u8>,
    writes: Vec<(Register, u8)>,
    accesses: usize,
    status_polls: usize,
}

impl<S: Slave> SimSpi<S> {
    /// Power-on reset state: every register zero, transfers complete on the
    /// first poll.
    pub fn new(slave: S) -> Self {
        Self {
            ddr: 0,
            port: 0,
            spcr: 0,
            spsr: 0,
            spdr: 0,
            slave,
            latency: Some(0),
            pending: None,
            observed: Vec::new(),
            writes: Vec::new(),
            accesses: 0,
            status_polls: 0,
        }
    }

    /// Preload DDRB, PORTB, SPCR and SPSR. SPIF/WCOL bits in `spsr` are
    /// ignored.
    pub fn with_registers(mut self, ddr: u8, port: u8, spcr: u8, spsr: u8) -> Self {
        self.ddr = ddr;
        self.port = port;
        self.spcr = spcr;
        self.spsr = spsr & bv(SPI2X);
        self
    }

    /// SPIF stays clear for `polls` status reads after each SPDR write.
    pub fn with_latency(mut self, polls: u32) -> Self {
        self.latency = Some(polls);
        self
    }

    /// A peripheral whose transfers never complete.
    pub fn stalled(mut self) -> Self {
        self.latency = None;
        self
    }

    /// Register value without the side effects of a driver read.
    pub fn peek(&self, reg: Register) -> u8 {
        match reg {
            Register::Ddr => self.ddr,
            Register::Port => self.port,
            Register::Control => self.spcr,
            Register::Status => self.spsr,
            Register::Data => self.spdr,
        }
    }

    pub fn slave(&self) -> &S {
        &self.slave
    }

    /// Bytes as the slave saw them on MOSI, in order.
    pub fn observed(&self) -> &[u8] {
        &self.observed
    }

    pub fn writes(&self) -> &[(Register, u8)] {
        &self.writes
    }

    /// Reads plus writes of any register.
    pub fn accesses(&self) -> usize {
        self.accesses
    }

    pub fn status_polls(&self) -> usize {
        self.status_polls
    }

    pub fn clear_log(&mut self) {
        self.observed.clear();
        self.writes.clear();
        self.accesses = 0;
        self.status_polls = 0;
    }

    fn lsb_first(&self) -> bool {
        self.spcr & bv(DORD) != 0
    }

    fn start_transfer(&mut self, mosi: u8) {
        if self.pending.is_some() {
            self.spsr |= bv(WCOL);
            return;
        }
        self.spsr &= !(bv(SPIF) | bv(WCOL));

        let enabled = bv(SPE) | bv(MSTR);
        if self.spcr & enabled != enabled {
            return;
        }
        let Some(latency) = self.latency else {
            return;
        };

        let lsb_first = self.lsb_first();
        let wire = if lsb_first { mosi.reverse_bits() } else { mosi };
        self.observed.push(wire);
        let reply = self.slave.exchange(wire);
        let miso = if lsb_first { reply.reverse_bits() } else { reply };

        self.pending = Some(Pending {
            polls_left: latency,
            miso,
        });
    }

    fn poll(&mut self) {
        self.status_polls += 1;
        if let Some(pending) = self.pending.as_mut() {
            if pending.polls_left == 0 {
                self.spdr = pending.miso;
                self.spsr |= bv(SPIF);
                self.pending = None;
            } else {
                pending.polls_left -= 1;
            }
        }
    }
}

impl<S: Slave> SpiRegisters for SimSpi<S> {
    fn read(&mut self, reg: Register) -> u8 {
        self.accesses += 1;
        match reg {
            Register::Status => {
                self.poll();
                self.spsr
            }
            Register::Data => {
                self.spsr &= !(bv(SPIF) | bv(WCOL));
                self.spdr
            }
            other => self.peek(other),
        }
    }

    fn write(&mut self, reg: Register, value: u8) {
        self.accesses += 1;
        self.writes.push((reg, value));
        match reg {
            Register::Ddr => self.ddr = value,
            Register::Port => self.port = value,
            Register::Control => self.spcr = value,
            Register::Status => self.spsr = (self.spsr & !bv(SPI2X)) | (value & bv(SPI2X)),
            Register::Data => self.start_transfer(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> SimSpi<Loopback> {
        SimSpi::new(Loopback).with_registers(0, 0, bv(SPE) | bv(MSTR), 0)
    }

    #[test]
    fn disabled_peripheral_never_completes() {
        let mut sim = SimSpi::new(Loopback);
        sim.write(Register::Data, 0x12);
        for _ in 0..10 {
            assert_eq!(sim.read(Register::Status) & bv(SPIF), 0);
        }
        assert!(sim.observed().is_empty());
    }

    #[test]
    fn slave_mode_never_completes() {
        let mut sim = SimSpi::new(Loopback).with_registers(0, 0, bv(SPE), 0);
        sim.write(Register::Data, 0x12);
        assert_eq!(sim.read(Register::Status) & bv(SPIF), 0);
    }

    #[test]
    fn spif_rises_after_latency_and_clears_on_data_read() {
        let mut sim = enabled().with_latency(2);
        sim.write(Register::Data, 0x5A);

        assert_eq!(sim.read(Register::Status) & bv(SPIF), 0);
        assert_eq!(sim.read(Register::Status) & bv(SPIF), 0);
        assert_ne!(sim.read(Register::Status) & bv(SPIF), 0);
        assert_eq!(sim.read(Register::Data), 0x5A);
        assert_eq!(sim.peek(Register::Status) & bv(SPIF), 0);
    }

    #[test]
    fn write_during_transfer_is_dropped() {
        let mut sim = enabled().with_latency(3);
        sim.write(Register::Data, 0x11);
        sim.write(Register::Data, 0x22);
        assert_ne!(sim.peek(Register::Status) & bv(WCOL), 0);

        while sim.read(Register::Status) & bv(SPIF) == 0 {}
        assert_eq!(sim.read(Register::Data), 0x11);
        assert_eq!(sim.observed(), &[0x11]);
        assert_eq!(sim.peek(Register::Status) & bv(WCOL), 0);
    }

    #[test]
    fn status_writes_only_touch_spi2x() {
        let mut sim = enabled();
        sim.write(Register::Data, 0x01);
        sim.read(Register::Status);

        sim.write(Register::Status, 0x00);
        assert_eq!(sim.peek(Register::Status), bv(SPIF));
        sim.write(Register::Status, 0xFF);
        assert_eq!(sim.peek(Register::Status), bv(SPIF) | bv(SPI2X));
    }

    #[test]
    fn lsb_first_reverses_bits_on_the_wire() {
        let mut sim = SimSpi::new(Scripted::new(&[0x80]))
            .with_registers(0, 0, bv(SPE) | bv(MSTR) | bv(DORD), 0);
        sim.write(Register::Data, 0x01);
        sim.read(Register::Status);

        assert_eq!(sim.observed(), &[0x80]);
        assert_eq!(sim.read(Register::Data), 0x01);
    }

    #[test]
    fn clear_log_resets_counters() {
        let mut sim = enabled();
        sim.write(Register::Data, 0x01);
        sim.read(Register::Status);
        sim.clear_log();

        assert_eq!(sim.accesses(), 0);
        assert_eq!(sim.status_polls(), 0);
        assert!(sim.writes().is_empty());
        assert!(sim.observed().is_empty());
    }
}
