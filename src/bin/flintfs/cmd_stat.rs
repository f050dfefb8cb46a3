use anyhow::Result;
use std::path::PathBuf;

use crate::util::mount;

pub fn exec(image: PathBuf, block_size: u32, prog_size: u32) -> Result<()> {
    let mut fs = mount(&image, block_size, prog_size)?;
    let info = fs.info()?;
    let live = fs.live_blocks()?;

    println!("image:          {}", image.display());
    println!("disk version:   {:#010x}", info.version);
    println!("block size:     {}", info.block_size);
    println!("block count:    {}", info.block_count);
    println!("name max:       {}", info.name_length_max);
    println!("file max:       {}", info.file_size_max);
    println!("attr max:       {}", info.file_attr_size_max);
    println!("live blocks:    {}", live.len());
    println!(
        "free (approx):  {}",
        info.block_count.saturating_sub(live.len() as u32)
    );
    Ok(())
}
