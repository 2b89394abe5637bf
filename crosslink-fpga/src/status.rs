//! Configuration status register read after a bitstream burst.

use bit_field::BitField;

/// Raw 32-bit value of the CrossLink configuration status register.
///
/// Only three bits are decoded. The raw value is kept so that callers can log
/// or inspect the remaining bits when a load fails.
///
/// # Datasheet
///
/// The register is read with `LSC_READ_STATUS` and arrives least significant
/// byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusWord(u32);

impl StatusWord {
    /// Bit set once the device has entered user mode.
    pub const DONE_BIT: usize = 16;
    /// Bit set while the configuration engine is busy.
    pub const BUSY_BIT: usize = 20;
    /// Bit set when the configuration engine reports a failure.
    pub const FAIL_BIT: usize = 21;

    /// Wrap a raw register value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub(crate) fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }

    /// The raw register value.
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// The device has been configured and is running the loaded design.
    ///
    /// This is the only flag that decides whether a load succeeded; BUSY and
    /// FAIL are reported for diagnostics only.
    pub fn done(&self) -> bool {
        self.0.get_bit(Self::DONE_BIT)
    }

    /// The configuration engine is still busy.
    pub fn busy(&self) -> bool {
        self.0.get_bit(Self::BUSY_BIT)
    }

    /// The configuration engine flagged an error.
    pub fn fail(&self) -> bool {
        self.0.get_bit(Self::FAIL_BIT)
    }
}

impl From<u32> for StatusWord {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for StatusWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn yes_no(flag: bool) -> &'static str {
            if flag { "yes" } else { "no" }
        }
        write!(
            f,
            "{:#010x} (done: {}, busy: {}, fail: {})",
            self.0,
            yes_no(self.done()),
            yes_no(self.busy()),
            yes_no(self.fail())
        )
    }
}

#[cfg(test)]
mod test {
    use super::StatusWord;

    #[test]
    fn decodes_flags() {
        let status = StatusWord::new(1 << 16 | 1 << 21);
        assert!(status.done());
        assert!(!status.busy());
        assert!(status.fail());
    }

    #[test]
    fn wire_order_is_little_endian() {
        let status = StatusWord::from_le_bytes([0x00, 0x00, 0x01, 0x00]);
        assert_eq!(status.bits(), 0x0001_0000);
        assert!(status.done());
    }

    #[test]
    fn display_lists_flags() {
        let status = StatusWord::new(1 << 20);
        assert_eq!(
            status.to_string(),
            "0x00100000 (done: no, busy: yes, fail: no)"
        );
    }
}
