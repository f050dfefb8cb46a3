use anyhow::Result;

use flintfs::consts::ROOT_PAIR;
use flintfs::{pair, Fs, FsConfig, FsError, MemDevice};

#[test]
fn overwrite_keeps_one_logical_id() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 32);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;

    fs.set("/a", b"hi")?;
    fs.set("/a", b"bye")?;
    assert_eq!(fs.get("/a")?, b"bye");

    // После компактизации у "a" ровно один логический id.
    let root = pair::read(&mut fs.dev, &fs.cfg, ROOT_PAIR)?;
    let names: Vec<_> = root
        .compacted_entries()
        .into_iter()
        .filter(|e| e.tag.is_name() && e.data.as_slice() == b"a")
        .collect();
    assert_eq!(names.len(), 1, "exactly one NAME entry for the key");

    // Ревизия растёт с каждой записью, read видит записанный набор.
    let rev = root.revision_count();
    fs.set("/a", b"again")?;
    let root2 = pair::read(&mut fs.dev, &fs.cfg, ROOT_PAIR)?;
    assert_eq!(root2.revision_count(), rev.wrapping_add(1));
    assert_eq!(fs.get("/a")?, b"again");

    Ok(())
}

#[test]
fn set_delete_get_not_found() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 32);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;

    fs.set("/k", b"v")?;
    fs.delete("/k")?;
    assert!(matches!(fs.get("/k"), Err(FsError::NotFound(_))));

    // Повторная запись того же имени работает после удаления.
    fs.set("/k", b"v2")?;
    assert_eq!(fs.get("/k")?, b"v2");
    Ok(())
}

#[test]
fn overwrite_inline_with_ctz_and_back() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 64);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg)?;

    let big: Vec<u8> = (0..2000u32).map(|i| (i % 241) as u8).collect();

    fs.set("/f", b"small")?;
    fs.set("/f", &big)?;
    assert_eq!(fs.get("/f")?, big);

    fs.set("/f", b"small-again")?;
    assert_eq!(fs.get("/f")?, b"small-again");

    // Старая CTZ-цепочка стала недостижимой: живы только корневая пара.
    let live = fs.live_blocks()?;
    assert_eq!(live.iter().copied().collect::<Vec<u32>>(), vec![0, 1]);
    Ok(())
}
