//! Output pins for slave chip selects.
//!
//! PORTB belongs to the SPI driver, so chip selects live on PORTD/PORTE.

use avr_device::atmega128a::{PORTD, PORTE};
use core::convert::Infallible;
use core::marker::PhantomData;
use embedded_hal::digital::v2::OutputPin;

#[derive(Debug)]
pub struct Output<PORT, const P: u8> {
    _port: PhantomData<PORT>,
}

macro_rules! impl_output {
    ($PORT:ident, $ddr:ident, $port:ident) => {
        impl<const P: u8> Output<$PORT, P> {
            /// Drive pin `P` high, then make it an output, so a chip select
            /// never glitches low while being set up.
            pub fn new(_port: &$PORT) -> Self {
                unsafe {
                    let p = &*$PORT::ptr();
                    p.$port.modify(|r, w| w.bits(r.bits() | (1 << P)));
                    p.$ddr.modify(|r, w| w.bits(r.bits() | (1 << P)));
                }
                Self { _port: PhantomData }
            }
        }

        impl<const P: u8> OutputPin for Output<$PORT, P> {
            type Error = Infallible;

            #[inline]
            fn set_low(&mut self) -> Result<(), Infallible> {
                unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                }
                Ok(())
            }

            #[inline]
            fn set_high(&mut self) -> Result<(), Infallible> {
                unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() | (1 << P)));
                }
                Ok(())
            }
        }
    };
}

impl_output!(PORTD, ddrd, portd);
impl_output!(PORTE, ddre, porte);
