use anyhow::Context;
use crosslink_fpga::CROSSLINK_IDCODE;

use crate::Fpga;

/// Reset the CrossLink and report what answered.
pub(crate) fn action(mut fpga: Fpga<'_>) -> anyhow::Result<()> {
    let address = fpga.config().address;
    let policy = fpga.config().reset_policy;
    fpga.reset_with_policy(policy)
        .with_context(|| format!("No CrossLink found at address {address:#04x}"))?;
    let usercode = fpga.read_usercode().context("Failed to read USERCODE")?;

    println!("CrossLink at {address:#04x}");
    println!("  IDCODE:   {CROSSLINK_IDCODE:#010x}");
    println!("  USERCODE: {usercode:#010x}");
    Ok(())
}
