//! fs/dirops — каталоги: обход пути, mkdir, list.
//!
//! Каталог — цепочка метапар, связанных hard-tail'ами. Пространство id
//! одно на цепочку: split не перенумеровывает уехавшую половину, новые
//! записи получают max(id по цепочке) + 1 (с единицы; id 0 — суперблок
//! корня). Replay-компактизация применяется ПО-ПАРНО: delete сдвигает id
//! только внутри своей пары, поэтому id на диске остаются согласованными.

use log::debug;

use crate::block::Block;
use crate::consts::{
    CHUNK_NAME_DIR, CHUNK_NAME_FILE, CHUNK_STRUCT_CTZ, CHUNK_STRUCT_DIR, CHUNK_STRUCT_INLINE,
    NO_ID, ROOT_PAIR,
};
use crate::device::BlockDevice;
use crate::entry::{compact, Entry};
use crate::errors::{FsError, Result};
use crate::pair;

use super::core::Fs;

/// Вид записи каталога для list().
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Value,
    Dictionary,
}

/// Результат обхода пути по сегментам.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DirWalk {
    /// Все сегменты пройдены; вот пара конечного каталога.
    BasenameOn((u32, u32)),
    /// У очередного сегмента нет NAME-записи.
    NoEntry(String),
    /// NAME нашёлся, но без id (испорченные метаданные).
    NoId(String),
    /// У id сегмента нет ни одной STRUCT-записи.
    NoStructs(String),
}

/// Одна пара цепочки каталога: адреса + её собственный компактный вид.
#[derive(Debug, Clone)]
pub(crate) struct DirPairView {
    pub pair: (u32, u32),
    pub entries: Vec<Entry>,
}

/// Имя, найденное в цепочке каталога.
#[derive(Debug, Clone)]
pub(crate) struct NameHit {
    pub pair: (u32, u32),
    pub id: u16,
    pub entries: Vec<Entry>,
}

fn is_listable_name(e: &Entry) -> bool {
    e.tag.is_name() && (e.tag.chunk == CHUNK_NAME_FILE || e.tag.chunk == CHUNK_NAME_DIR)
}

fn is_dir_struct(e: &Entry) -> bool {
    e.tag.is_struct() && e.tag.chunk == CHUNK_STRUCT_DIR
}

fn is_file_struct(e: &Entry) -> bool {
    e.tag.is_struct()
        && (e.tag.chunk == CHUNK_STRUCT_INLINE || e.tag.chunk == CHUNK_STRUCT_CTZ)
}

impl<D: BlockDevice> Fs<D> {
    // ---------- цепочка каталога ----------

    /// Собрать цепочку пар каталога, начиная с `start`.
    pub(crate) fn dir_chain(&mut self, start: (u32, u32)) -> Result<Vec<DirPairView>> {
        let mut views: Vec<DirPairView> = Vec::new();
        let mut cur = start;
        loop {
            let block: Block = pair::read(&mut self.dev, &self.cfg, cur)?;
            let entries = compact(&block.entries());
            let tail = entries
                .iter()
                .find(|e| e.tag.is_hardtail())
                .and_then(|e| e.as_pair());
            views.push(DirPairView { pair: cur, entries });

            match tail {
                Some(next) if !views.iter().any(|v| v.pair == next) => cur = next,
                _ => break,
            }
        }
        Ok(views)
    }

    /// Последняя пара цепочки (туда дозаписываются новые имена).
    pub(crate) fn chain_last_pair(views: &[DirPairView]) -> (u32, u32) {
        views.last().map(|v| v.pair).unwrap_or(ROOT_PAIR)
    }

    /// Следующий свободный id цепочки: max + 1, начиная с 1.
    /// NoSpace при исчерпании 10-битного пространства id.
    pub(crate) fn chain_next_id(views: &[DirPairView]) -> Result<u16> {
        let next = views
            .iter()
            .flat_map(|v| v.entries.iter())
            .filter(|e| e.tag.id != NO_ID)
            .map(|e| e.tag.id)
            .max()
            .map(|m| m + 1)
            .unwrap_or(1)
            .max(1);
        if next > crate::consts::MAX_ID {
            return Err(FsError::NoSpace);
        }
        Ok(next)
    }

    /// Найти имя в цепочке каталога.
    pub(crate) fn entries_of_name(
        &mut self,
        start: (u32, u32),
        name: &str,
    ) -> Result<Option<NameHit>> {
        let views = self.dir_chain(start)?;
        Ok(Self::find_name_in(&views, name))
    }

    pub(crate) fn find_name_in(views: &[DirPairView], name: &str) -> Option<NameHit> {
        for v in views {
            if let Some(hit) = v
                .entries
                .iter()
                .find(|e| is_listable_name(e) && e.data.as_slice() == name.as_bytes())
            {
                let id = hit.tag.id;
                let entries: Vec<Entry> = v
                    .entries
                    .iter()
                    .filter(|e| e.tag.id == id)
                    .cloned()
                    .collect();
                return Some(NameHit {
                    pair: v.pair,
                    id,
                    entries,
                });
            }
        }
        None
    }

    // ---------- обход пути ----------

    /// Пройти сегменты пути от `start`. Сегмент-файл посреди пути — ошибка
    /// DictionaryExpected.
    pub(crate) fn find_directory(
        &mut self,
        start: (u32, u32),
        segments: &[&str],
    ) -> Result<DirWalk> {
        let mut cur = start;
        for seg in segments {
            let hit = match self.entries_of_name(cur, seg)? {
                None => return Ok(DirWalk::NoEntry(seg.to_string())),
                Some(h) => h,
            };
            if hit.id == NO_ID {
                return Ok(DirWalk::NoId(seg.to_string()));
            }
            if let Some(d) = hit.entries.iter().find(|e| is_dir_struct(e)) {
                cur = d
                    .as_pair()
                    .ok_or_else(|| FsError::Corrupt(format!("malformed dir struct for {:?}", seg)))?;
            } else if hit.entries.iter().any(is_file_struct) {
                return Err(FsError::DictionaryExpected(seg.to_string()));
            } else {
                return Ok(DirWalk::NoStructs(seg.to_string()));
            }
        }
        Ok(DirWalk::BasenameOn(cur))
    }

    /// Обход с маппингом исходов в ошибки (для get/set/delete/list).
    pub(crate) fn find_dir(&mut self, segments: &[&str], full_path: &str) -> Result<(u32, u32)> {
        match self.find_directory(ROOT_PAIR, segments)? {
            DirWalk::BasenameOn(p) => Ok(p),
            DirWalk::NoEntry(_) => Err(FsError::NotFound(full_path.to_string())),
            DirWalk::NoId(seg) => Err(FsError::Corrupt(format!("name {:?} carries no id", seg))),
            DirWalk::NoStructs(seg) => {
                Err(FsError::Corrupt(format!("id of {:?} has no struct", seg)))
            }
        }
    }

    // ---------- mkdir ----------

    /// Создать каталог, включая недостающие промежуточные.
    pub fn mkdir(&mut self, path: &str) -> Result<()> {
        let segments = crate::util::path_segments(path);
        let mut cur = ROOT_PAIR;

        for seg in segments {
            let name_cap = if self.cfg.enforce_limits {
                (self.cfg.name_length_max as usize).min(crate::consts::TAG_LEN_MAX)
            } else {
                crate::consts::TAG_LEN_MAX
            };
            if seg.len() > name_cap {
                return Err(FsError::NameTooLong(
                    seg.to_string(),
                    seg.len(),
                    self.cfg.name_length_max,
                ));
            }

            let views = self.dir_chain(cur)?;
            match Self::find_name_in(&views, seg) {
                Some(hit) => {
                    if let Some(d) = hit.entries.iter().find(|e| is_dir_struct(e)) {
                        cur = d.as_pair().ok_or_else(|| {
                            FsError::Corrupt(format!("malformed dir struct for {:?}", seg))
                        })?;
                    } else {
                        return Err(FsError::DictionaryExpected(seg.to_string()));
                    }
                }
                None => {
                    let child = (self.allocate_block()?, self.allocate_block()?);
                    // Свежий пустой каталог пишем ДО ссылки на него из
                    // родителя: после сбоя на полпути он просто недостижим.
                    pair::init(&mut self.dev, &self.cfg, child, Vec::new())?;

                    let id = Self::chain_next_id(&views)?;
                    let target = Self::chain_last_pair(&views);
                    debug!("mkdir {:?}: id {} pair ({}, {})", seg, id, child.0, child.1);
                    self.commit_to_pair(
                        target,
                        vec![Entry::dir_name(id, seg), Entry::dir_struct(id, child)],
                    )?;
                    cur = child;
                }
            }
        }
        Ok(())
    }

    // ---------- list ----------

    /// Перечислить записи каталога: (имя, вид).
    pub fn list(&mut self, path: &str) -> Result<Vec<(String, EntryKind)>> {
        let segments = crate::util::path_segments(path);
        let dir = self.find_dir(&segments, path)?;
        let views = self.dir_chain(dir)?;

        let mut out = Vec::new();
        for v in &views {
            for e in &v.entries {
                if !is_listable_name(e) {
                    continue;
                }
                let kind = if e.tag.chunk == CHUNK_NAME_DIR {
                    EntryKind::Dictionary
                } else {
                    EntryKind::Value
                };
                out.push((String::from_utf8_lossy(&e.data).into_owned(), kind));
            }
        }
        Ok(out)
    }
}
