use anyhow::Result;
use std::path::PathBuf;

use crate::util::mount;

pub fn exec(image: PathBuf, block_size: u32, prog_size: u32, path: String) -> Result<()> {
    let mut fs = mount(&image, block_size, prog_size)?;
    fs.delete(&path)?;
    println!("deleted {}", path);
    Ok(())
}
