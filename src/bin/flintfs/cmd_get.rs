use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use crate::util::mount;

pub fn exec(
    image: PathBuf,
    block_size: u32,
    prog_size: u32,
    path: String,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut fs = mount(&image, block_size, prog_size)?;
    let value = fs.get(&path)?;

    match out {
        Some(p) => {
            std::fs::write(&p, &value).with_context(|| format!("write {}", p.display()))?;
            println!("{} bytes -> {}", value.len(), p.display());
        }
        None => {
            std::io::stdout().write_all(&value)?;
        }
    }
    Ok(())
}
