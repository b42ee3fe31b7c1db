#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]

#[cfg(target_arch = "avr")]
use panic_halt as _;

#[cfg(target_arch = "avr")]
use avr_device::atmega128a::PORTE;
#[cfg(target_arch = "avr")]
use avr_spi_master::{
    config::{SpiConfig, SPI_TIMEOUT_SPINS},
    drivers::{Level, SerialConsole},
    hal::{Atmega128Spi, Output, Spi, Usart0},
};

// nRF24L01 CSN on PE4; a NOP command clocks out the STATUS register
#[cfg(target_arch = "avr")]
const RADIO_CSN_PIN: u8 = 4;
#[cfg(target_arch = "avr")]
const RADIO_NOP: u8 = 0xFF;

#[cfg(target_arch = "avr")]
#[avr_device::entry]
fn main() -> ! {
    let dp = avr_device::atmega128a::Peripherals::take().unwrap();

    let mut console = SerialConsole::new(Usart0::new(dp.USART0));
    console.log(Level::Info, "SPI master v0.1.0").ok();

    let mut radio_csn = Output::<PORTE, RADIO_CSN_PIN>::new(&dp.PORTE);
    let mut spi = Spi::new(Atmega128Spi::new(dp.SPI, dp.PORTB))
        .into_master(SpiConfig::new().with_timeout(SPI_TIMEOUT_SPINS));

    let settings = spi.bus_settings();
    console.log_value(Level::Info, "bus", &settings).ok();

    // Enable interrupts globally
    unsafe { avr_device::interrupt::enable() };

    loop {
        // The radio ISR never touches the bus, so no critical section here
        let status = match spi.select(&mut radio_csn) {
            Ok(mut radio) => radio.transfer(RADIO_NOP),
            Err(never) => match never {},
        };

        match status {
            Ok(byte) => console.debug("radio status", byte).ok(),
            Err(err) => console.log_value(Level::Error, "spi", &err).ok(),
        };

        for _ in 0..50_000u32 {
            avr_device::asm::nop();
        }
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {}
