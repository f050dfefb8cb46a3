//! traverse — скан достижимости от корневой пары.
//!
//! Собирает множество живых блоков: обе половины каждой достижимой
//! метапары, hard-tail-цепочки, дочерние каталоги и CTZ-цепочки файлов.
//!
//! Ошибки чтения терпимы: испорченная ветка пропускается с warn'ом
//! (консервативно — блоки с известными адресами уже помечены живыми;
//! содержимое нечитаемой пары недостижимо и для операций).

use std::collections::BTreeSet;

use byteorder::{ByteOrder, LittleEndian};
use log::warn;

use crate::block::LinkedRef;
use crate::config::FsConfig;
use crate::consts::ROOT_PAIR;
use crate::ctz::{last_block_index, n_pointers};
use crate::device::BlockDevice;
use crate::errors::Result;
use crate::metrics::record_block_read;
use crate::pair;

/// Множество блоков, достижимых от корня.
pub fn live_blocks<D: BlockDevice>(dev: &mut D, cfg: &FsConfig) -> Result<BTreeSet<u32>> {
    let mut live: BTreeSet<u32> = BTreeSet::new();
    let mut queue: Vec<(u32, u32)> = vec![ROOT_PAIR];

    while let Some(p) = queue.pop() {
        let seen_a = !live.insert(p.0);
        let seen_b = !live.insert(p.1);
        if seen_a && seen_b {
            continue; // уже обойдена (или цикл в испорченных метаданных)
        }

        let block = match pair::read(dev, cfg, p) {
            Ok(b) => b,
            Err(e) => {
                warn!("traverse: skipping pair ({}, {}): {}", p.0, p.1, e);
                continue;
            }
        };

        for r in block.linked_blocks() {
            match r {
                LinkedRef::Pair(a, b) => queue.push((a, b)),
                LinkedRef::Ctz { head, size } => {
                    mark_ctz_chain(dev, cfg, &mut live, head, size as usize);
                }
            }
        }
    }

    Ok(live)
}

/// Пометить блоки CTZ-цепочки (head, size), идя по нулевым указателям.
fn mark_ctz_chain<D: BlockDevice>(
    dev: &mut D,
    cfg: &FsConfig,
    live: &mut BTreeSet<u32>,
    head: u32,
    size: usize,
) {
    if size == 0 {
        return;
    }
    let bs = cfg.block_size as usize;
    let mut index = last_block_index(size, bs);
    let mut addr = head;
    let mut buf = vec![0u8; bs];

    loop {
        if !live.insert(addr) {
            break; // уже видели — защита от испорченных указателей
        }
        if index == 0 {
            break;
        }
        record_block_read();
        if let Err(e) = dev.read(addr, &mut buf) {
            warn!("traverse: ctz block {} unreadable: {}", addr, e);
            break;
        }
        debug_assert!(n_pointers(index) >= 1);
        addr = LittleEndian::read_u32(&buf[0..4]);
        index -= 1;
    }
}
