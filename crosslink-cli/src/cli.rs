use std::path::PathBuf;

use clap::Parser;
use crosslink_fpga::ResetPolicy;

use crate::bridge::GpPin;
use crate::util;

/// Load Lattice CrossLink bitstreams through an MCP2221
///
/// The CrossLink's I2C configuration port is reached through the MCP2221's I2C
/// bus, and its CRESET_B line is driven by one of the MCP2221's GP pins. That
/// pin must already be set for GPIO operation in the MCP2221 settings.
///
/// The MCP2221 cannot make an I2C transfer longer than 65,535 bytes, so the
/// bitstream (plus a 4-byte command) must fit within that.
#[derive(Debug, Parser)]
#[command(version, about)]
pub(crate) struct Cli {
    /// MCP2221 vendor ID in hexadecimal
    #[arg(long = "vid", default_value = "0x4D8", value_parser = util::u16_from_hex)]
    pub(crate) vid: u16,
    /// MCP2221 product ID in hexadecimal
    #[arg(long = "pid", default_value = "0xDD", value_parser = util::u16_from_hex)]
    pub(crate) pid: u16,
    /// 7-bit I2C address of the CrossLink in hexadecimal
    #[arg(short, long, default_value = "0x40", value_parser = util::u8_from_hex)]
    pub(crate) address: u8,
    /// GP pin wired to CRESET_B
    #[arg(short, long, value_enum, default_value_t = GpPin::Gp0)]
    pub(crate) reset_pin: GpPin,
    /// The reset line is active high (CRESET_B behind an inverter)
    #[arg(long)]
    pub(crate) reset_active_high: bool,
    /// Number of reset sequences to try before giving up
    #[arg(long, default_value_t = ResetPolicy::DEFAULT_ATTEMPTS)]
    pub(crate) reset_attempts: u8,
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Parser)]
pub(crate) enum Commands {
    /// Reset the CrossLink and read its IDCODE and USERCODE
    Probe,
    /// Load a bitstream into the CrossLink's SRAM
    Load {
        /// Bitstream file (.bit)
        bitstream: PathBuf,
    },
    /// Print the state reported to the FPGA manager
    State,
}
