//! fs/core — handle файловой системы: format/open, суперблок, аллокация,
//! машина записи метапары.
//!
//! Суперблок живёт под id 0 корневой пары: NAME-запись с magic "littlefs"
//! и inline-struct с шестью u32 BE: version, block_size, block_count,
//! name_length_max, file_size_max, file_attr_size_max.
//!
//! Машина записи (Fresh → Appended → Compacted → Split):
//! - Done после append — конец;
//! - SplitAdvised — компактизация и повтор; не помогло — настоящий split;
//! - SplitRequired — компактизация пропускается, сразу split;
//! - любой отказ внутри split'а — NoSpace.

use std::collections::BTreeSet;

use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};

use crate::alloc::Lookahead;
use crate::block::Block;
use crate::config::FsConfig;
use crate::consts::{DISK_VERSION, ROOT_PAIR, SUPERBLOCK_STRUCT_SIZE};
use crate::device::BlockDevice;
use crate::entry::Entry;
use crate::errors::{FsError, Result};
use crate::fs::traverse;
use crate::metrics::{record_commit, record_compaction, record_split};
use crate::pair::{self, WriteOutcome};

/// Поля суперблока (и отчёт для CLI stat).
#[derive(Debug, Clone)]
pub struct FsInfo {
    pub version: u32,
    pub block_size: u32,
    pub block_count: u32,
    pub name_length_max: u32,
    pub file_size_max: u32,
    pub file_attr_size_max: u32,
}

/// Handle файловой системы. Один владелец; все операции сериализованы.
pub struct Fs<D: BlockDevice> {
    pub dev: D,
    pub cfg: FsConfig,
    pub(crate) lookahead: Lookahead,
    // Блоки, выданные с последнего успешного commit'а метаданных: ещё не
    // достижимы от корня, но переиздавать их при refill нельзя.
    pub(crate) pending: BTreeSet<u32>,
}

impl<D: BlockDevice> Fs<D> {
    // ---------- суперблок ----------

    fn superblock_entries(cfg: &FsConfig, block_count: u32) -> Vec<Entry> {
        let mut payload = vec![0u8; SUPERBLOCK_STRUCT_SIZE];
        BigEndian::write_u32(&mut payload[0..4], DISK_VERSION);
        BigEndian::write_u32(&mut payload[4..8], cfg.block_size);
        BigEndian::write_u32(&mut payload[8..12], block_count);
        BigEndian::write_u32(&mut payload[12..16], cfg.name_length_max);
        BigEndian::write_u32(&mut payload[16..20], cfg.file_size_max);
        BigEndian::write_u32(&mut payload[20..24], cfg.file_attr_size_max);
        vec![Entry::superblock_name(), Entry::inline_struct(0, &payload)]
    }

    fn decode_superblock(root: &Block) -> Result<FsInfo> {
        let entries = root.compacted_entries();

        let name = entries
            .iter()
            .find(|e| e.tag.is_superblock_name())
            .ok_or_else(|| FsError::Corrupt("root pair has no superblock name".to_string()))?;
        if name.data.as_slice() != crate::consts::MAGIC {
            return Err(FsError::Corrupt(format!(
                "bad magic in superblock: {:?}",
                name.data
            )));
        }

        let sb = entries
            .iter()
            .find(|e| e.tag.is_struct() && e.tag.id == 0 && e.data.len() == SUPERBLOCK_STRUCT_SIZE)
            .ok_or_else(|| FsError::Corrupt("root pair has no superblock struct".to_string()))?;

        Ok(FsInfo {
            version: BigEndian::read_u32(&sb.data[0..4]),
            block_size: BigEndian::read_u32(&sb.data[4..8]),
            block_count: BigEndian::read_u32(&sb.data[8..12]),
            name_length_max: BigEndian::read_u32(&sb.data[12..16]),
            file_size_max: BigEndian::read_u32(&sb.data[16..20]),
            file_attr_size_max: BigEndian::read_u32(&sb.data[20..24]),
        })
    }

    // ---------- format / open ----------

    /// Отформатировать СТЁРТОЕ устройство: суперблок в обе половины корневой
    /// пары, ревизии 1 и 2 (блоки 0 и 1 соответственно).
    pub fn format(dev: &mut D, cfg: &FsConfig) -> Result<()> {
        cfg.validate()?;
        let block_count = dev.block_count();
        if block_count < 2 {
            return Err(FsError::Config(format!(
                "device too small: {} blocks",
                block_count
            )));
        }

        let entries = Self::superblock_entries(cfg, block_count);
        pair::init(dev, cfg, ROOT_PAIR, entries)?;
        debug!("formatted: {} blocks of {}", block_count, cfg.block_size);
        Ok(())
    }

    /// Смонтировать устройство: проверить magic/версию, принять геометрию и
    /// лимиты из суперблока.
    pub fn open(dev: D, cfg: FsConfig) -> Result<Self> {
        let mut fs = Self {
            dev,
            cfg,
            lookahead: Lookahead::new(),
            pending: BTreeSet::new(),
        };
        fs.cfg.validate()?;

        let root = pair::read(&mut fs.dev, &fs.cfg, ROOT_PAIR)?;
        let info = Self::decode_superblock(&root)?;

        if info.version >> 16 != DISK_VERSION >> 16 {
            return Err(FsError::Corrupt(format!(
                "unsupported disk version {:#010x}",
                info.version
            )));
        }
        if info.block_size != fs.cfg.block_size {
            return Err(FsError::Config(format!(
                "block_size mismatch: superblock says {}, config says {}",
                info.block_size, fs.cfg.block_size
            )));
        }
        if info.block_count > fs.dev.block_count() {
            return Err(FsError::Config(format!(
                "superblock claims {} blocks, device has {}",
                info.block_count,
                fs.dev.block_count()
            )));
        }

        fs.cfg.block_count = info.block_count;
        fs.cfg.name_length_max = info.name_length_max;
        fs.cfg.file_size_max = info.file_size_max;
        fs.cfg.file_attr_size_max = info.file_attr_size_max;
        Ok(fs)
    }

    /// Смонтировать с явной геометрией (остальное — из окружения).
    pub fn connect(dev: D, prog_block_size: u32, block_size: u32) -> Result<Self> {
        let cfg = FsConfig::from_env()
            .with_block_size(block_size)
            .with_prog_block_size(prog_block_size);
        Self::open(dev, cfg)
    }

    /// Поля суперблока (перечитываются с устройства).
    pub fn info(&mut self) -> Result<FsInfo> {
        let root = pair::read(&mut self.dev, &self.cfg, ROOT_PAIR)?;
        Self::decode_superblock(&root)
    }

    /// Множество живых блоков (скан достижимости).
    pub fn live_blocks(&mut self) -> Result<BTreeSet<u32>> {
        traverse::live_blocks(&mut self.dev, &self.cfg)
    }

    // ---------- аллокация ----------

    /// Выдать свободный блок; при пустом буфере — refill по достижимости.
    pub(crate) fn allocate_block(&mut self) -> Result<u32> {
        if let Some(b) = self.lookahead.next() {
            self.pending.insert(b);
            return Ok(b);
        }

        let mut live = traverse::live_blocks(&mut self.dev, &self.cfg)?;
        live.extend(self.pending.iter().copied());
        crate::metrics::record_lookahead_refill();
        self.lookahead.refill(&live, self.cfg.block_count);

        match self.lookahead.next() {
            Some(b) => {
                self.pending.insert(b);
                Ok(b)
            }
            None => Err(FsError::NoSpace),
        }
    }

    // ---------- машина записи метапары ----------

    /// Дозаписать батч записей в пару (copy-on-write, при необходимости —
    /// компактизация и split). Терминальные состояния: Ok или NoSpace.
    pub(crate) fn commit_to_pair(&mut self, p: (u32, u32), entries: Vec<Entry>) -> Result<()> {
        let block = pair::read(&mut self.dev, &self.cfg, p)?;
        let appended = block.add_commit(entries);

        match pair::write(&mut self.dev, &self.cfg, p, &appended)? {
            WriteOutcome::Done => {
                record_commit();
                self.pending.clear();
                Ok(())
            }
            WriteOutcome::SplitAdvised => {
                let compacted = appended.compact();
                record_compaction();
                match pair::write(&mut self.dev, &self.cfg, p, &compacted)? {
                    WriteOutcome::Done => {
                        record_commit();
                        self.pending.clear();
                        Ok(())
                    }
                    _ => self.split_pair(p, compacted),
                }
            }
            WriteOutcome::SplitRequired => {
                let compacted = appended.compact();
                record_compaction();
                self.split_pair(p, compacted)
            }
        }
    }

    /// Разделить переполненный логический блок на две пары.
    fn split_pair(&mut self, p: (u32, u32), block: Block) -> Result<()> {
        let new_pair = (
            self.allocate_block().map_err(|_| FsError::NoSpace)?,
            self.allocate_block().map_err(|_| FsError::NoSpace)?,
        );
        let (head, tail) = block.split(new_pair);
        record_split();

        // Сначала хвост в свежую пару (обе половины — блоки могли быть
        // переиспользованы), затем голова со ссылкой на неё: после сбоя
        // на полпути корень по-прежнему видит старое состояние.
        if let Err(e) = pair::init(&mut self.dev, &self.cfg, new_pair, tail.entries()) {
            warn!("split: tail pair init failed: {}", e);
            return Err(FsError::NoSpace);
        }
        match pair::write(&mut self.dev, &self.cfg, p, &head)? {
            WriteOutcome::Done | WriteOutcome::SplitAdvised => {}
            WriteOutcome::SplitRequired => {
                warn!("split: head does not fit after partition");
                return Err(FsError::NoSpace);
            }
        }

        record_commit();
        self.pending.clear();
        Ok(())
    }
}
