use anyhow::Result;

use flintfs::{Fs, FsConfig, MemDevice};

#[test]
fn ctz_roundtrip_and_reachability() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 64);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;

    let big = build_pattern(2048);
    fs.set("/big", &big)?;
    assert_eq!(fs.get("/big")?, big);

    // Достижимы корневая пара и ровно блоки CTZ-цепочки.
    // 2048 байт при bs=512: ёмкости 512+508+504+508+500 => 5 блоков данных.
    let live = fs.live_blocks()?;
    assert!(live.contains(&0) && live.contains(&1));
    let ctz_blocks: Vec<u32> = live.iter().copied().filter(|b| *b > 1).collect();
    assert_eq!(ctz_blocks.len(), 5, "live = {:?}", live);

    Ok(())
}

#[test]
fn inline_ctz_threshold_boundary() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 64);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;
    fs.dev.clear_program_log();

    // Ровно bs/4 — inline: трогаются только блоки корневой пары.
    let exact = build_pattern(128);
    fs.set("/exact", &exact)?;
    assert_eq!(fs.get("/exact")?, exact);
    assert!(
        fs.dev.programmed_blocks().iter().all(|b| *b <= 1),
        "inline write must touch only the root pair, got {:?}",
        fs.dev.programmed_blocks()
    );

    // bs/4 + 1 — CTZ из одного блока данных.
    let over = build_pattern(129);
    fs.set("/over", &over)?;
    assert_eq!(fs.get("/over")?, over);
    let data_blocks: Vec<u32> = fs
        .dev
        .programmed_blocks()
        .iter()
        .copied()
        .filter(|b| *b > 1)
        .collect();
    assert_eq!(data_blocks.len(), 1, "one-block chain expected");

    Ok(())
}

#[test]
fn empty_and_tiny_values_are_inline() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 16);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;

    fs.set("/empty", b"")?;
    assert_eq!(fs.get("/empty")?, b"");

    fs.set("/one", b"x")?;
    assert_eq!(fs.get("/one")?, b"x");
    Ok(())
}

#[test]
fn large_multiblock_chain_roundtrip() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(256);
    let mut dev = MemDevice::new(256, 256);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;

    // Десятки блоков: проверяем скип-лист на глубокой цепочке.
    for (i, len) in [5000usize, 9000, 12000].iter().enumerate() {
        let path = format!("/chain{}", i);
        let data = build_pattern(*len);
        fs.set(&path, &data)?;
        assert_eq!(fs.get(&path)?, data, "roundtrip of {} bytes", len);
    }
    Ok(())
}

fn build_pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 253) as u8).collect()
}
