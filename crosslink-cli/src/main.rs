use anyhow::Context;
use clap::Parser;
use crosslink_fpga::{Config, CrossLink, ResetPolarity, ResetPolicy};

use bridge::{I2cBus, Mcp2221, ResetPin};
use cli::Commands;
use util::ThreadDelay;

mod bridge;
mod cli;
mod load;
mod probe;
mod util;

/// A CrossLink reached through the MCP2221.
type Fpga<'a> = CrossLink<I2cBus<'a>, ResetPin<'a>, ThreadDelay>;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = Config::default()
        .with_address(cli.address)
        .with_reset_polarity(if cli.reset_active_high {
            ResetPolarity::ActiveHigh
        } else {
            ResetPolarity::ActiveLow
        })
        .with_reset_policy(ResetPolicy::attempts(cli.reset_attempts));

    let bridge = Mcp2221::connect_with_vid_and_pid(cli.vid, cli.pid)
        .with_context(|| format!("Failed to open MCP2221 {:04x}:{:04x}", cli.vid, cli.pid))?;
    let reset_pin = bridge
        .reset_pin(cli.reset_pin, !cli.reset_active_high)
        .with_context(|| format!("Failed to set up {} as the reset line", cli.reset_pin))?;
    let fpga: Fpga<'_> = CrossLink::new(bridge.i2c(), reset_pin, ThreadDelay, config);

    match cli.command {
        Commands::Probe => probe::action(fpga)?,
        Commands::Load { bitstream } => load::action(fpga, &bitstream)?,
        Commands::State => println!("{:?}", fpga.query_state()),
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::cli::Cli;

    use clap::CommandFactory;

    #[test]
    fn check_cli_debug_asserts() {
        Cli::command().debug_assert();
    }
}
