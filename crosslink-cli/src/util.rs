use std::num::ParseIntError;

fn strip_hex_prefix(value: &str) -> &str {
    if value.to_ascii_lowercase().starts_with("0x") {
        &value[2..]
    } else {
        value
    }
}

pub(crate) fn u16_from_hex(value: &str) -> Result<u16, ParseIntError> {
    u16::from_str_radix(strip_hex_prefix(value), 16)
}

pub(crate) fn u8_from_hex(value: &str) -> Result<u8, ParseIntError> {
    u8::from_str_radix(strip_hex_prefix(value), 16)
}

/// Blocking delay for the CrossLink settle times.
pub(crate) struct ThreadDelay;

impl embedded_hal::delay::DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(ns.into()));
    }
}

#[cfg(test)]
mod test {
    use super::{u8_from_hex, u16_from_hex};

    #[test]
    fn parses_with_or_without_prefix() {
        assert_eq!(u16_from_hex("0x4D8"), Ok(0x4D8));
        assert_eq!(u16_from_hex("0XDD"), Ok(0xDD));
        assert_eq!(u8_from_hex("40"), Ok(0x40));
        assert!(u8_from_hex("0x140").is_err());
    }
}
