use std::path::Path;

use anyhow::{Context, bail};
use crosslink_fpga::{Command, FpgaManager};
use log::info;

use crate::Fpga;
use crate::bridge::MAX_I2C_TRANSFER;

/// Load the bitstream at `path` through the FPGA manager sequence.
pub(crate) fn action(fpga: Fpga<'_>, path: &Path) -> anyhow::Result<()> {
    let image = std::fs::read(path)
        .with_context(|| format!("Failed to read bitstream {}", path.display()))?;
    check_fits(image.len())?;
    info!("Loading {} ({} bytes)", path.display(), image.len());

    let mut manager = FpgaManager::new(fpga);
    manager
        .load(&image)
        .with_context(|| format!("Loading failed at step {:?}", manager.state()))?;
    println!("Loaded {}", path.display());
    Ok(())
}

/// The MCP2221 sends the whole burst as one I2C transfer.
fn check_fits(image_len: usize) -> anyhow::Result<()> {
    let burst_len = Command::LscBitstreamBurst.frame().len() + image_len;
    if burst_len > MAX_I2C_TRANSFER {
        bail!(
            "Bitstream of {image_len} bytes is too large: the MCP2221 can write at most \
             {MAX_I2C_TRANSFER} bytes in one I2C transfer, including the 4-byte burst command"
        );
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::check_fits;

    #[test]
    fn burst_must_fit_one_transfer() {
        assert!(check_fits(65_531).is_ok());
        assert!(check_fits(65_532).is_err());
    }
}
