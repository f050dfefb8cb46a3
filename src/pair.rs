//! pair — метапара: два физических блока, поочерёдно хранящие ревизии
//! одного логического блока метаданных.
//!
//! Политика:
//! - read: разбираем оба блока; текущий — с большей ревизией (знаковая
//!   разность u32, wraparound-семантика; при равенстве — первый). Блок без
//!   единого живого commit'а кандидатом не считается: оборванный program
//!   свежего образа не должен затенить целую половину. Обе половины
//!   негодны — Corrupt.
//! - write: сериализуем и программируем СТАРШУЮ по возрасту половину
//!   (младшая остаётся читаемой до конца program'а — copy-on-write).
//!   SplitEmergency и отказ program'а трактуются как «требуется split».

use log::warn;

use crate::block::{Block, Serialized};
use crate::config::FsConfig;
use crate::device::BlockDevice;
use crate::errors::{FsError, Result};
use crate::metrics::{record_block_program, record_block_read};

/// Итог записи пары.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Done,
    /// Записано, но блок заполнен впритык — каталог пора делить.
    SplitAdvised,
    /// Не записано (или program отказал) — без split'а не обойтись.
    SplitRequired,
}

/// Прочитать и разобрать один физический блок.
pub fn read_block<D: BlockDevice>(dev: &mut D, cfg: &FsConfig, addr: u32) -> Result<Block> {
    let mut buf = vec![0u8; cfg.block_size as usize];
    record_block_read();
    dev.read(addr, &mut buf)?;
    Block::of_cstruct(cfg.prog_block_size as usize, &buf)
}

fn candidate<D: BlockDevice>(dev: &mut D, cfg: &FsConfig, addr: u32) -> Option<Block> {
    match read_block(dev, cfg, addr) {
        Ok(b) if b.has_commits() => Some(b),
        Ok(_) => None,
        Err(e) => {
            warn!("pair: block {} unreadable: {}", addr, e);
            None
        }
    }
}

/// Прочитать метапару: свежая из двух валидных половин.
pub fn read<D: BlockDevice>(dev: &mut D, cfg: &FsConfig, pair: (u32, u32)) -> Result<Block> {
    let a = candidate(dev, cfg, pair.0);
    let b = candidate(dev, cfg, pair.1);

    match (a, b) {
        (Some(a), Some(b)) => {
            // Знаковая разность: при wraparound новее та, у которой
            // положительная разница. При равенстве — первая.
            let diff = a.revision_count().wrapping_sub(b.revision_count()) as i32;
            Ok(if diff >= 0 { a } else { b })
        }
        (Some(a), None) => Ok(a),
        (None, Some(b)) => Ok(b),
        (None, None) => Err(FsError::Corrupt(format!(
            "metadata pair ({}, {}): both halves unusable",
            pair.0, pair.1
        ))),
    }
}

/// Выбрать половину для записи: та, что НЕ является текущей.
fn older_half<D: BlockDevice>(dev: &mut D, cfg: &FsConfig, pair: (u32, u32)) -> u32 {
    let a = candidate(dev, cfg, pair.0);
    let b = candidate(dev, cfg, pair.1);
    match (a, b) {
        (Some(a), Some(b)) => {
            let diff = a.revision_count().wrapping_sub(b.revision_count()) as i32;
            if diff >= 0 {
                pair.1
            } else {
                pair.0
            }
        }
        (Some(_), None) => pair.1,
        (None, Some(_)) => pair.0,
        (None, None) => pair.0,
    }
}

/// Инициализировать свежую пару новым логическим блоком: образ уходит в ОБЕ
/// половины (ревизии 1 и 2). Блоки могли быть переиспользованы после
/// reclamation — двойная запись затирает любой прежний контент, иначе
/// залежавшаяся высокая ревизия затенила бы новый образ.
pub fn init<D: BlockDevice>(
    dev: &mut D,
    cfg: &FsConfig,
    pair: (u32, u32),
    entries: Vec<crate::entry::Entry>,
) -> Result<()> {
    for (addr, rev) in [(pair.0, 1u32), (pair.1, 2u32)] {
        let block = Block::new(rev, entries.clone());
        let img = match block.into_cstruct(cfg.prog_block_size as usize, cfg.block_size as usize) {
            Serialized::Ok(v) | Serialized::Split(v) => v,
            Serialized::SplitEmergency => return Err(FsError::NoSpace),
        };
        let mut full = img;
        full.resize(cfg.block_size as usize, 0xff);
        record_block_program();
        dev.program(addr, &full)?;
    }
    Ok(())
}

/// Записать новый образ логического блока в старшую половину пары.
pub fn write<D: BlockDevice>(
    dev: &mut D,
    cfg: &FsConfig,
    pair: (u32, u32),
    block: &Block,
) -> Result<WriteOutcome> {
    let (img, advised) =
        match block.into_cstruct(cfg.prog_block_size as usize, cfg.block_size as usize) {
            Serialized::Ok(v) => (v, false),
            Serialized::Split(v) => (v, true),
            Serialized::SplitEmergency => return Ok(WriteOutcome::SplitRequired),
        };

    let target = older_half(dev, cfg, pair);

    // Дополняем образ до полного блока стёртым значением.
    let mut full = img;
    full.resize(cfg.block_size as usize, 0xff);

    record_block_program();
    if let Err(e) = dev.program(target, &full) {
        // Отказ program'а == требуется split на свежие блоки.
        warn!("pair: program of block {} failed: {}", target, e);
        return Ok(WriteOutcome::SplitRequired);
    }

    Ok(if advised {
        WriteOutcome::SplitAdvised
    } else {
        WriteOutcome::Done
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemDevice;
    use crate::entry::Entry;

    fn cfg() -> FsConfig {
        FsConfig::default().with_block_size(256)
    }

    fn entries(tagval: &str) -> Vec<Entry> {
        vec![Entry::file_name(1, "k"), Entry::inline_struct(1, tagval.as_bytes())]
    }

    #[test]
    fn alternating_writes_flip_halves() {
        let cfg = cfg();
        let mut dev = MemDevice::new(256, 8);

        // Первая запись уходит в блок 2 (обе половины пусты).
        let b1 = Block::new(1, entries("v1"));
        assert_eq!(write(&mut dev, &cfg, (2, 3), &b1).unwrap(), WriteOutcome::Done);
        assert!(dev.programmed_blocks().contains(&2));

        // Вторая — в блок 3; read видит ревизию 2.
        let b2 = b1.add_commit(vec![Entry::inline_struct(1, b"v2")]);
        assert_eq!(write(&mut dev, &cfg, (2, 3), &b2).unwrap(), WriteOutcome::Done);
        assert!(dev.programmed_blocks().contains(&3));

        let cur = read(&mut dev, &cfg, (2, 3)).unwrap();
        assert_eq!(cur.revision_count(), 2);

        // Третья — снова в блок 2.
        dev.clear_program_log();
        let b3 = b2.add_commit(vec![Entry::inline_struct(1, b"v3")]);
        write(&mut dev, &cfg, (2, 3), &b3).unwrap();
        assert_eq!(dev.programmed_blocks().iter().collect::<Vec<_>>(), vec![&2]);

        let cur = read(&mut dev, &cfg, (2, 3)).unwrap();
        assert_eq!(cur.revision_count(), 3);
    }

    #[test]
    fn erased_pair_is_corrupt() {
        let cfg = cfg();
        let mut dev = MemDevice::new(256, 8);
        assert!(matches!(
            read(&mut dev, &cfg, (0, 1)),
            Err(FsError::Corrupt(_))
        ));
    }

    #[test]
    fn wraparound_revision_comparison() {
        let cfg = cfg();
        let mut dev = MemDevice::new(256, 8);

        // Ревизия у границы wraparound: 0xffffffff в блоке 0, 0 в блоке 1.
        let old = Block::new(u32::MAX, entries("old"));
        let new = Block::new(0, entries("new"));
        write(&mut dev, &cfg, (0, 1), &old).unwrap();
        write(&mut dev, &cfg, (0, 1), &new).unwrap();

        let cur = read(&mut dev, &cfg, (0, 1)).unwrap();
        assert_eq!(cur.revision_count(), 0, "signed difference picks the wrapped side");
    }

    #[test]
    fn torn_half_falls_back_to_mate() {
        let cfg = cfg();
        let mut dev = MemDevice::new(256, 8);

        let b1 = Block::new(1, entries("v1"));
        write(&mut dev, &cfg, (0, 1), &b1).unwrap();

        // «Обрыв» program'а второй половины: только ревизия, без commit'ов.
        let mut torn = vec![0xffu8; 256];
        torn[0..4].copy_from_slice(&[9, 0, 0, 0]); // ревизия 9 LE
        dev.program(1, &torn).unwrap();

        let cur = read(&mut dev, &cfg, (0, 1)).unwrap();
        assert_eq!(cur.revision_count(), 1, "half without commits is not a candidate");
    }
}
