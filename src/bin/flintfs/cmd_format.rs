use anyhow::{Context, Result};
use std::path::PathBuf;

use flintfs::{FileDevice, Fs, FsConfig};

pub fn exec(image: PathBuf, block_size: u32, block_count: u32, prog_size: u32) -> Result<()> {
    let mut dev = FileDevice::create(&image, block_size, block_count)
        .with_context(|| format!("create image {}", image.display()))?;
    dev.set_sync(true);

    let cfg = FsConfig::from_env()
        .with_block_size(block_size)
        .with_prog_block_size(prog_size);
    Fs::format(&mut dev, &cfg)?;

    println!(
        "formatted {} ({} blocks x {} bytes, prog {})",
        image.display(),
        block_count,
        block_size,
        prog_size
    );
    Ok(())
}
