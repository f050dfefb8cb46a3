use anyhow::Result;

use flintfs::block::Serialized;
use flintfs::consts::ROOT_PAIR;
use flintfs::device::BlockDevice;
use flintfs::entry::Entry;
use flintfs::{pair, Fs, FsConfig, MemDevice};

// Инвариант: program, оборванный на любой границе байта, оставляет пару
// читаемой либо в старом, либо в новом состоянии — никогда в смеси.
#[test]
fn torn_program_matrix() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 16);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg.clone())?;
    fs.set("/a", b"hello")?;

    // Старое состояние: компактный вид корня.
    let old_state = pair::read(&mut fs.dev, &fs.cfg, ROOT_PAIR)?;
    let old_entries = old_state.compacted_entries();
    let old_rev = old_state.revision_count();

    // Готовим следующий образ: добавление "/b" тем же путём, что и ядро.
    let appended = old_state.add_commit(vec![
        Entry::file_name(2, "b"),
        Entry::inline_struct(2, b"world"),
    ]);
    let img = match appended.into_cstruct(32, 512) {
        Serialized::Ok(v) | Serialized::Split(v) => v,
        Serialized::SplitEmergency => panic!("image must fit"),
    };
    let mut full = img.clone();
    full.resize(512, 0xff);

    // Цель записи — старшая половина (с меньшей ревизией).
    let b0 = read_rev(&mut fs.dev, 0)?;
    let b1 = read_rev(&mut fs.dev, 1)?;
    let target: u32 = if b0 <= b1 { 0 } else { 1 };

    let base = fs.dev.clone();
    for cut in 0..=full.len() {
        let mut torn = full[..cut].to_vec();
        torn.resize(512, 0xff);

        let mut dev = base.clone();
        dev.program(target, &torn)?;

        let got = pair::read(&mut dev, &cfg, ROOT_PAIR)?;
        let entries = got.compacted_entries();

        if got.revision_count() == old_rev {
            assert_eq!(entries, old_entries, "cut {}: must be the old state", cut);
        } else {
            // Новая ревизия видна только с полностью валидным префиксом
            // лога; допустимы старый набор записей (обрыв до нового
            // commit'а) или полный новый.
            assert_eq!(got.revision_count(), appended.revision_count());
            let new_entries = appended.compacted_entries();
            assert!(
                entries == old_entries || entries == new_entries,
                "cut {}: blended state: {:?}",
                cut,
                entries
            );
        }
    }

    Ok(())
}

// После «сбоя» в середине CTZ-записи (метаданные не дописаны) том
// монтируется, старые данные читаются, осиротевшие блоки возвращаются
// аллокатору при следующем refill.
#[test]
fn orphaned_ctz_blocks_are_reclaimed() -> Result<()> {
    let cfg = FsConfig::default().with_block_size(512);
    let mut dev = MemDevice::new(512, 16);
    Fs::format(&mut dev, &cfg)?;
    let mut fs = Fs::open(dev, cfg.clone())?;
    fs.set("/keep", b"data")?;

    // Вручную замусорим пару свободных блоков «данными цепочки»,
    // на которые никто не ссылается.
    let junk = vec![0x5a; 512];
    fs.dev.program(9, &junk)?;
    fs.dev.program(10, &junk)?;

    // Свежий mount: garbage недостижим.
    let dev2 = fs.dev.clone();
    let mut fs2 = Fs::open(dev2, cfg)?;
    let live = fs2.live_blocks()?;
    assert!(!live.contains(&9) && !live.contains(&10));
    assert_eq!(fs2.get("/keep")?, b"data");

    Ok(())
}

fn read_rev(dev: &mut MemDevice, addr: u32) -> Result<u32> {
    let mut buf = vec![0u8; 512];
    dev.read(addr, &mut buf)?;
    Ok(flintfs::block::Block::of_cstruct(32, &buf)?.revision_count())
}
