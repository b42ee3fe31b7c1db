//! Polled USART0 transmitter, used as the log sink.

use avr_device::atmega128a::USART0;
use core::convert::Infallible;
use ufmt::uWrite;

use crate::config::{CPU_FREQ_HZ, UART_BAUD};

// (16_000_000 / (16 * 9600)) - 1 = 103
const UBRR: u16 = (CPU_FREQ_HZ / (16 * UART_BAUD) - 1) as u16;

// UCSR0A
const UDRE0: u8 = 5;
// UCSR0B
const TXEN0: u8 = 3;
// UCSR0C: 8 data bits, no parity, 1 stop bit
const FRAME_8N1: u8 = 0x06;

pub struct Usart0 {
    usart: USART0,
}

impl Usart0 {
    pub fn new(usart: USART0) -> Self {
        unsafe {
            usart.ubrr0h.write(|w| w.bits((UBRR >> 8) as u8));
            usart.ubrr0l.write(|w| w.bits(UBRR as u8));
            usart.ucsr0c.write(|w| w.bits(FRAME_8N1));
            usart.ucsr0b.write(|w| w.bits(1 << TXEN0));
        }

        Self { usart }
    }

    pub fn write_byte(&mut self, byte: u8) {
        while self.usart.ucsr0a.read().bits() & (1 << UDRE0) == 0 {}
        unsafe {
            self.usart.udr0.write(|w| w.bits(byte));
        }
    }
}

impl uWrite for Usart0 {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}
