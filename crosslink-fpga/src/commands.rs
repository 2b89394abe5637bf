//! CrossLink configuration commands.
//!
//! Each command is a fixed frame written as-is to the device's I2C configuration
//! port. Operands are always zero for the commands used here, except for the
//! erase command which selects the SRAM.
//!
//! # Datasheet
//!
//! The opcodes are those of Lattice's sysCONFIG command set, see the CrossLink
//! programming and configuration usage guide (FPGA-TN-02014).

/// A sysCONFIG command understood by the CrossLink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Activation key sent while `CRESET_B` is held in reset.
    ///
    /// This switches the configuration port into I2C slave mode.
    Activate,
    /// Enable in-system configuration (ISC) mode.
    IscEnable,
    /// Erase the configuration SRAM.
    IscErase,
    /// Leave ISC mode and start the loaded design.
    IscDisable,
    /// Read the 32-bit device identifier.
    ReadIdcode,
    /// Read the 32-bit user code stored alongside the configuration.
    ReadUsercode,
    /// Prepare the configuration engine for a bitstream.
    LscInit,
    /// Prefix of the burst write carrying the bitstream.
    LscBitstreamBurst,
    /// Read the 32-bit configuration status register.
    LscReadStatus,
}

impl Command {
    /// Bytes written to the device for this command.
    pub const fn frame(&self) -> &'static [u8] {
        match self {
            Command::Activate => &[0xA4, 0xC6, 0xF4, 0x8A],
            // ISC_ENABLE is the only three-byte command.
            Command::IscEnable => &[0xC6, 0x00, 0x00],
            Command::IscErase => &[0x0E, 0x01, 0x00, 0x00],
            Command::IscDisable => &[0x26, 0x00, 0x00, 0x00],
            Command::ReadIdcode => &[0xE0, 0x00, 0x00, 0x00],
            Command::ReadUsercode => &[0xC0, 0x00, 0x00, 0x00],
            Command::LscInit => &[0x46, 0x00, 0x00, 0x00],
            Command::LscBitstreamBurst => &[0x7A, 0x00, 0x00, 0x00],
            Command::LscReadStatus => &[0x3C, 0x00, 0x00, 0x00],
        }
    }

    /// Name of the command as given in the Lattice documentation.
    pub const fn name(&self) -> &'static str {
        match self {
            Command::Activate => "ACTIVATE",
            Command::IscEnable => "ISC_ENABLE",
            Command::IscErase => "ISC_ERASE",
            Command::IscDisable => "ISC_DISABLE",
            Command::ReadIdcode => "IDCODE_PUB",
            Command::ReadUsercode => "USERCODE",
            Command::LscInit => "LSC_INIT",
            Command::LscBitstreamBurst => "LSC_BITSTREAM_BURST",
            Command::LscReadStatus => "LSC_READ_STATUS",
        }
    }

    /// Look up the command whose frame is exactly `bytes`.
    pub fn from_frame(bytes: &[u8]) -> Option<Self> {
        use Command::*;
        [
            Activate,
            IscEnable,
            IscErase,
            IscDisable,
            ReadIdcode,
            ReadUsercode,
            LscInit,
            LscBitstreamBurst,
            LscReadStatus,
        ]
        .into_iter()
        .find(|command| command.frame() == bytes)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use super::Command;

    #[test]
    fn burst_prefix_is_four_bytes() {
        assert_eq!(Command::LscBitstreamBurst.frame().len(), 4);
    }

    #[test]
    fn frames_map_back_to_commands() {
        assert_eq!(
            Command::from_frame(&[0xE0, 0, 0, 0]),
            Some(Command::ReadIdcode)
        );
        assert_eq!(Command::from_frame(&[0xC6, 0, 0]), Some(Command::IscEnable));
        assert_eq!(Command::from_frame(&[0xC6, 0, 0, 0]), None);
    }
}
