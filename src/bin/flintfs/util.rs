use anyhow::{Context, Result};
use std::path::Path;

use flintfs::{FileDevice, Fs};

/// Смонтировать существующий образ.
pub fn mount(image: &Path, block_size: u32, prog_size: u32) -> Result<Fs<FileDevice>> {
    let dev = FileDevice::open(image, block_size, 0)
        .with_context(|| format!("open image {}", image.display()))?;
    let fs =
        Fs::connect(dev, prog_size, block_size).with_context(|| format!("mount image {}", image.display()))?;
    Ok(fs)
}
