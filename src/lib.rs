//! Blocking SPI master driver for the ATmega128.
//!
//! Higher-level device drivers (radio transceivers, flash chips) sit on top
//! of [`hal::spi::Spi`] and own slave selection and framing.

#![cfg_attr(not(any(test, feature = "sim")), no_std)]

pub mod config;
pub mod drivers;
pub mod hal;

#[cfg(any(test, feature = "sim"))]
pub mod testing;
