use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

use crate::util::mount;

pub fn exec(
    image: PathBuf,
    block_size: u32,
    prog_size: u32,
    path: String,
    value: Option<String>,
    value_file: Option<PathBuf>,
) -> Result<()> {
    let data: Vec<u8> = match (value_file, value) {
        (Some(p), _) => std::fs::read(&p).with_context(|| format!("read {}", p.display()))?,
        (None, Some(s)) => s.into_bytes(),
        (None, None) => return Err(anyhow!("either --value or --value-file is required")),
    };

    let mut fs = mount(&image, block_size, prog_size)?;
    fs.set(&path, &data)?;
    println!("set {} ({} bytes)", path, data.len());
    Ok(())
}
