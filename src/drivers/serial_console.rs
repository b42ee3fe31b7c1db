use ufmt::{uDebug, uWrite};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Debug,
    Error,
}

impl Level {
    fn prefix(self) -> &'static str {
        match self {
            Level::Info => "[INF] ",
            Level::Debug => "[DBG] ",
            Level::Error => "[ERR] ",
        }
    }
}

/// Line-oriented log output over any `ufmt` writer (USART0 on hardware).
pub struct SerialConsole<W> {
    out: W,
}

impl<W: uWrite> SerialConsole<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_str(&mut self, s: &str) -> Result<(), W::Error> {
        self.out.write_str(s)
    }

    pub fn write_line(&mut self, s: &str) -> Result<(), W::Error> {
        self.write_str(s)?;
        self.write_str("\r\n")
    }

    // Always two digits, ufmt has no width specifier
    pub fn write_hex(&mut self, val: u8) -> Result<(), W::Error> {
        const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";
        self.out.write_char(HEX_CHARS[(val >> 4) as usize] as char)?;
        self.out.write_char(HEX_CHARS[(val & 0xF) as usize] as char)
    }

    pub fn log(&mut self, level: Level, msg: &str) -> Result<(), W::Error> {
        self.write_str(level.prefix())?;
        self.write_line(msg)
    }

    pub fn log_value<T: uDebug + ?Sized>(
        &mut self,
        level: Level,
        msg: &str,
        value: &T,
    ) -> Result<(), W::Error> {
        ufmt::uwrite!(self.out, "{}{}: {:?}\r\n", level.prefix(), msg, value)
    }

    // Print a register or bus byte
    pub fn debug(&mut self, msg: &str, val: u8) -> Result<(), W::Error> {
        self.write_str(Level::Debug.prefix())?;
        self.write_str(msg)?;
        self.write_str(": 0x")?;
        self.write_hex(val)?;
        self.write_str("\r\n")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::spi::{BusSettings, Error};
    use core::convert::Infallible;

    struct Capture(String);

    impl uWrite for Capture {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
            self.0.push_str(s);
            Ok(())
        }
    }

    fn console() -> SerialConsole<Capture> {
        SerialConsole::new(Capture(String::new()))
    }

    #[test]
    fn debug_prints_two_hex_digits() {
        let mut c = console();
        c.debug("status", 0x0E).unwrap();
        assert_eq!(c.into_inner().0, "[DBG] status: 0x0E\r\n");
    }

    #[test]
    fn log_prefixes_level() {
        let mut c = console();
        c.log(Level::Info, "SPI ready").unwrap();
        c.log(Level::Error, "no radio").unwrap();
        assert_eq!(c.into_inner().0, "[INF] SPI ready\r\n[ERR] no radio\r\n");
    }

    #[test]
    fn log_value_formats_errors() {
        let mut c = console();
        c.log_value(Level::Error, "spi", &Error::Timeout).unwrap();
        assert_eq!(c.into_inner().0, "[ERR] spi: Timeout\r\n");
    }

    #[test]
    fn log_value_formats_bus_settings() {
        let mut c = console();
        let settings = BusSettings::decode(0x50, 0x01);
        c.log_value(Level::Info, "bus", &settings).unwrap();

        let out = c.into_inner().0;
        assert!(out.starts_with("[INF] bus: BusSettings {"));
        assert!(out.contains("Mode0"));
        assert!(out.contains("MsbFirst"));
        assert!(out.contains("Div2"));
        assert!(out.ends_with("\r\n"));
    }
}
