//! fs/fileops — значения: get / set / delete.
//!
//! Что внутри:
//! - get: inline-payload как есть; CTZ — чтение цепочки по (head, size).
//! - set: замена = SPLICE-delete старого id + NAME + STRUCT одним батчем
//!   (одним commit'ом, в ту же пару). Порог inline/CTZ — block_size / 4.
//!   Блоки данных CTZ пишутся ДО метазаписи, которая на них ссылается.
//! - delete: идемпотентен; отсутствие имени — успех без записи.
//!
//! Блоки, освобождённые перезаписью/удалением, отдельно не учитываются:
//! их вернёт следующий refill аллокатора (скан достижимости).

use log::debug;

use crate::ctz;
use crate::device::BlockDevice;
use crate::entry::Entry;
use crate::errors::{FsError, Result};
use crate::metrics::{record_block_program, record_ctz_chain};
use crate::util::split_basename;

use super::core::Fs;
use super::dirops::NameHit;

fn is_dir_hit(hit: &NameHit) -> bool {
    hit.entries
        .iter()
        .any(|e| e.tag.is_struct() && e.tag.chunk == crate::consts::CHUNK_STRUCT_DIR)
}

impl<D: BlockDevice> Fs<D> {
    /// Прочитать значение по пути.
    pub fn get(&mut self, path: &str) -> Result<Vec<u8>> {
        let (parent_segs, base) =
            split_basename(path).ok_or_else(|| FsError::ValueExpected(path.to_string()))?;
        let parent = self.find_dir(&parent_segs, path)?;

        let hit = self
            .entries_of_name(parent, base)?
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;

        for e in &hit.entries {
            if !e.tag.is_struct() {
                continue;
            }
            match e.tag.chunk {
                crate::consts::CHUNK_STRUCT_INLINE => return Ok(e.data.clone()),
                crate::consts::CHUNK_STRUCT_CTZ => {
                    let (head, size) = e
                        .as_ctz()
                        .ok_or_else(|| FsError::Corrupt(format!("malformed ctz struct at {:?}", path)))?;
                    return ctz::read(
                        &mut self.dev,
                        self.cfg.block_size as usize,
                        head,
                        size as usize,
                    );
                }
                crate::consts::CHUNK_STRUCT_DIR => {
                    return Err(FsError::ValueExpected(path.to_string()))
                }
                _ => {}
            }
        }
        Err(FsError::Corrupt(format!("id of {:?} has no struct", path)))
    }

    /// Записать значение по пути (родительский каталог должен существовать).
    pub fn set(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let (parent_segs, base) =
            split_basename(path).ok_or_else(|| FsError::ValueExpected(path.to_string()))?;

        // Жёсткий потолок — 10-битное поле длины тега; настраиваемый лимит
        // суперблока проверяется поверх него.
        let name_cap = if self.cfg.enforce_limits {
            (self.cfg.name_length_max as usize).min(crate::consts::TAG_LEN_MAX)
        } else {
            crate::consts::TAG_LEN_MAX
        };
        if base.len() > name_cap {
            return Err(FsError::NameTooLong(
                base.to_string(),
                base.len(),
                self.cfg.name_length_max,
            ));
        }
        if self.cfg.enforce_limits && data.len() > self.cfg.file_size_max as usize {
            return Err(FsError::FileTooLarge(data.len(), self.cfg.file_size_max));
        }

        let parent = self.find_dir(&parent_segs, path)?;
        let views = self.dir_chain(parent)?;

        // Замена: delete старого id тем же батчем, в пару, где живёт имя.
        // Новое имя уходит в последнюю пару цепочки.
        let mut batch: Vec<Entry> = Vec::new();
        let target = match Self::find_name_in(&views, base) {
            Some(hit) => {
                if is_dir_hit(&hit) {
                    return Err(FsError::ValueExpected(path.to_string()));
                }
                batch.push(Entry::delete(hit.id));
                hit.pair
            }
            None => Self::chain_last_pair(&views),
        };
        let id = Self::chain_next_id(&views)?;

        if data.len() <= self.cfg.inline_threshold() {
            debug!("set {:?}: inline {} bytes, id {}", path, data.len(), id);
            batch.push(Entry::file_name(id, base));
            batch.push(Entry::inline_struct(id, data));
        } else {
            let (head, size) = self.ctz_write(data)?;
            debug!(
                "set {:?}: ctz {} bytes, head {}, id {}",
                path, size, head, id
            );
            batch.push(Entry::file_name(id, base));
            batch.push(Entry::ctz_struct(id, head, size));
        }

        self.commit_to_pair(target, batch)
    }

    /// Удалить значение. Отсутствие имени — успех (идемпотентность).
    pub fn delete(&mut self, path: &str) -> Result<()> {
        let (parent_segs, base) = match split_basename(path) {
            Some(x) => x,
            None => return Ok(()),
        };
        let parent = match self.find_dir(&parent_segs, path) {
            Ok(p) => p,
            Err(FsError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        match self.entries_of_name(parent, base)? {
            None => Ok(()),
            Some(hit) => {
                debug!("delete {:?}: id {} in pair ({}, {})", path, hit.id, hit.pair.0, hit.pair.1);
                self.commit_to_pair(hit.pair, vec![Entry::delete(hit.id)])
            }
        }
    }

    // ---------- CTZ-запись ----------

    /// Выложить данные CTZ-цепочкой. Возвращает (head, size).
    fn ctz_write(&mut self, data: &[u8]) -> Result<(u32, u32)> {
        let bs = self.cfg.block_size as usize;
        let mut addrs: Vec<u32> = Vec::new();
        let mut head = 0u32;
        let mut off = 0usize;
        let mut index = 0u32;

        loop {
            let cap = ctz::data_capacity(index, bs);
            let take = cap.min(data.len() - off);
            let addr = self.allocate_block()?;
            let img = ctz::build_block(index, &addrs, &data[off..off + take], bs);
            record_block_program();
            self.dev.program(addr, &img)?;
            addrs.push(addr);
            head = addr;

            off += take;
            if off >= data.len() {
                break;
            }
            index += 1;
        }

        record_ctz_chain(addrs.len() as u64);
        Ok((head, data.len() as u32))
    }
}
