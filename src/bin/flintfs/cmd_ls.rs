use anyhow::Result;
use std::path::PathBuf;

use flintfs::EntryKind;

use crate::util::mount;

pub fn exec(image: PathBuf, block_size: u32, prog_size: u32, path: String) -> Result<()> {
    let mut fs = mount(&image, block_size, prog_size)?;
    for (name, kind) in fs.list(&path)? {
        let k = match kind {
            EntryKind::Dictionary => "dir",
            EntryKind::Value => "val",
        };
        println!("{}  {}", k, name);
    }
    Ok(())
}
