//! block — один физический блок метаданных: ревизия + упорядоченные commit'ы.
//!
//! Инварианты:
//! - CRC commit'а k свёрнут по байтам ревизии и всех предыдущих commit'ов;
//! - разбор останавливается на первом несошедшемся CRC (конец живого лога);
//! - Corrupt возвращается только если нечитаема сама область ревизии.
//!
//! Сериализация трёхзначная: Ok (влезло, остался запас), Split (влезло
//! впритык — пора делить пару), SplitEmergency (не влезло, байты не
//! произведены — делить обязательно).

use std::collections::BTreeSet;

use byteorder::{ByteOrder, LittleEndian};
use log::debug;

use crate::commit::Commit;
use crate::consts::{CHUNK_STRUCT_CTZ, CHUNK_STRUCT_DIR, CRC_SEED, NO_ID, REVISION_SIZE};
use crate::crc::crc32;
use crate::entry::{compact, Entry};
use crate::errors::{FsError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    revision_count: u32,
    commits: Vec<Commit>,
}

/// Результат сериализации блока.
pub enum Serialized {
    Ok(Vec<u8>),
    Split(Vec<u8>),
    SplitEmergency,
}

/// Исходящая ссылка из блока метаданных (для обхода достижимости).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedRef {
    /// Метапара: hard-tail или дочерний каталог.
    Pair(u32, u32),
    /// CTZ-цепочка файла.
    Ctz { head: u32, size: u32 },
}

impl Block {
    /// Новый блок из одного commit'а.
    pub fn new(revision_count: u32, entries: Vec<Entry>) -> Self {
        Self {
            revision_count,
            commits: vec![Commit::new(entries)],
        }
    }

    pub fn revision_count(&self) -> u32 {
        self.revision_count
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    pub fn has_commits(&self) -> bool {
        !self.commits.is_empty()
    }

    // ---------- разбор / сериализация ----------

    /// Разобрать образ блока. `buf` — полный блок с устройства.
    pub fn of_cstruct(prog_size: usize, buf: &[u8]) -> Result<Self> {
        if buf.len() < REVISION_SIZE {
            return Err(FsError::Corrupt(
                "metadata block shorter than revision word".to_string(),
            ));
        }
        let revision_count = LittleEndian::read_u32(&buf[0..REVISION_SIZE]);

        let mut commits = Vec::new();
        let mut pos = REVISION_SIZE;
        let mut crc_seed = crc32(CRC_SEED, &buf[0..REVISION_SIZE]);
        while pos < buf.len() {
            match Commit::of_cstruct(prog_size, buf, pos, crc_seed) {
                Some((c, consumed, crc_after)) => {
                    commits.push(c);
                    pos += consumed;
                    crc_seed = crc_after;
                }
                None => break,
            }
        }

        Ok(Self {
            revision_count,
            commits,
        })
    }

    /// Сериализовать блок в образ размером `block_size`.
    pub fn into_cstruct(&self, prog_size: usize, block_size: usize) -> Serialized {
        let mut out = Vec::with_capacity(block_size);
        out.resize(REVISION_SIZE, 0);
        LittleEndian::write_u32(&mut out[0..REVISION_SIZE], self.revision_count);

        let mut crc_seed = crc32(CRC_SEED, &out[0..REVISION_SIZE]);
        for c in &self.commits {
            let (bytes, crc_after) = c.into_cstruct(prog_size, out.len(), crc_seed);
            out.extend_from_slice(&bytes);
            crc_seed = crc_after;
        }

        if out.len() > block_size {
            debug!(
                "block rev {} does not fit: {} > {}",
                self.revision_count,
                out.len(),
                block_size
            );
            return Serialized::SplitEmergency;
        }
        if out.len() == block_size {
            return Serialized::Split(out);
        }
        Serialized::Ok(out)
    }

    // ---------- логические операции ----------

    /// Новый логический блок: ревизия + 1, записи — новым commit'ом.
    ///
    /// История несётся ОДНИМ компактным commit'ом. Образ пишется целиком
    /// (copy-on-write в другую половину пары), поэтому любой валидный
    /// префикс оборванного program'а — это в точности состояние до записи,
    /// а не произвольный исторический срез.
    pub fn add_commit(&self, entries: Vec<Entry>) -> Self {
        let mut commits = vec![Commit::new(self.compacted_entries())];
        commits.push(Commit::new(entries));
        Self {
            revision_count: self.revision_count.wrapping_add(1),
            commits,
        }
    }

    /// Свернуть все commit'ы в один эквивалентный (ревизия не меняется).
    pub fn compact(&self) -> Self {
        Self {
            revision_count: self.revision_count,
            commits: vec![Commit::new(self.compacted_entries())],
        }
    }

    /// Разделить блок: нижняя половина id остаётся (с hard-tail на
    /// `new_pair`), верхняя — и прежний hard-tail — уезжают в новый образ
    /// (ревизия 1, свежая пара). Голова получает ревизию + 1: split —
    /// это следующая ревизия логического блока, она обязана перекрыть
    /// уже записанную в пару половину.
    pub fn split(&self, new_pair: (u32, u32)) -> (Self, Self) {
        let entries = self.compacted_entries();

        let old_tail = entries.iter().find(|e| e.tag.is_hardtail()).cloned();
        let body: Vec<Entry> = entries
            .into_iter()
            .filter(|e| !e.tag.is_hardtail())
            .collect();

        let ids: Vec<u16> = {
            let set: BTreeSet<u16> = body
                .iter()
                .filter(|e| e.tag.id != NO_ID)
                .map(|e| e.tag.id)
                .collect();
            set.into_iter().collect()
        };
        let pivot = ids.get(ids.len() / 2).copied().unwrap_or(NO_ID);

        let mut lower: Vec<Entry> = Vec::new();
        let mut upper: Vec<Entry> = Vec::new();
        for e in body {
            if e.tag.id != NO_ID && e.tag.id >= pivot {
                upper.push(e);
            } else {
                lower.push(e);
            }
        }

        lower.push(Entry::hard_tail(new_pair));
        if let Some(t) = old_tail {
            upper.push(t);
        }

        debug!(
            "split block rev {}: pivot id {}, {} entries stay, {} move to ({}, {})",
            self.revision_count,
            pivot,
            lower.len(),
            upper.len(),
            new_pair.0,
            new_pair.1
        );

        (
            Self::new(self.revision_count.wrapping_add(1), lower),
            Self::new(1, upper),
        )
    }

    // ---------- доступ к записям ----------

    /// Сырые записи всех commit'ов, по порядку.
    pub fn entries(&self) -> Vec<Entry> {
        self.commits
            .iter()
            .flat_map(|c| c.entries.iter().cloned())
            .collect()
    }

    /// Записи после replay-компактизации.
    pub fn compacted_entries(&self) -> Vec<Entry> {
        compact(&self.entries())
    }

    /// Множество занятых id.
    pub fn ids(&self) -> BTreeSet<u16> {
        self.compacted_entries()
            .iter()
            .filter(|e| e.tag.id != NO_ID)
            .map(|e| e.tag.id)
            .collect()
    }

    /// Hard-tail блока, если есть.
    pub fn hard_tail(&self) -> Option<(u32, u32)> {
        self.compacted_entries()
            .iter()
            .find(|e| e.tag.is_hardtail())
            .and_then(|e| e.as_pair())
    }

    /// Все исходящие ссылки на блоки: hard-tail, дочерние каталоги,
    /// головы CTZ-цепочек.
    pub fn linked_blocks(&self) -> Vec<LinkedRef> {
        let mut refs = Vec::new();
        for e in self.compacted_entries() {
            if e.tag.is_hardtail() {
                if let Some(p) = e.as_pair() {
                    refs.push(LinkedRef::Pair(p.0, p.1));
                }
            } else if e.tag.is_struct() && e.tag.chunk == CHUNK_STRUCT_DIR {
                if let Some(p) = e.as_pair() {
                    refs.push(LinkedRef::Pair(p.0, p.1));
                }
            } else if e.tag.is_struct() && e.tag.chunk == CHUNK_STRUCT_CTZ {
                if let Some((head, size)) = e.as_ctz() {
                    refs.push(LinkedRef::Ctz { head, size });
                }
            }
        }
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: u16, name: &str, v: &[u8]) -> Vec<Entry> {
        vec![Entry::file_name(id, name), Entry::inline_struct(id, v)]
    }

    #[test]
    fn serialize_parse_is_byte_exact() {
        let mut b = Block::new(7, file(1, "a", b"one"));
        b = b.add_commit(file(2, "b", b"two"));

        let img = match b.into_cstruct(32, 512) {
            Serialized::Ok(v) => v,
            _ => panic!("block must fit"),
        };
        let mut full = img.clone();
        full.resize(512, 0xff);

        let parsed = Block::of_cstruct(32, &full).unwrap();
        assert_eq!(parsed.revision_count(), 8);
        assert_eq!(parsed.commit_count(), 2);

        // Инвариант: serialize(parse(B)) == B побайтно, включая паддинг.
        let img2 = match parsed.into_cstruct(32, 512) {
            Serialized::Ok(v) => v,
            _ => panic!("block must fit"),
        };
        assert_eq!(img, img2);
    }

    #[test]
    fn parse_stops_at_broken_commit() {
        let b = Block::new(3, file(1, "a", b"one"));
        let b2 = b.add_commit(file(2, "b", b"two"));

        let img = match b2.into_cstruct(32, 512) {
            Serialized::Ok(v) => v,
            _ => panic!("must fit"),
        };
        // Ломаем байт во втором commit'е.
        let first_len = match b.into_cstruct(32, 512) {
            Serialized::Ok(v) => v.len(),
            _ => panic!("must fit"),
        };
        let mut full = img.clone();
        full.resize(512, 0xff);
        full[first_len + 2] ^= 0x40;

        let parsed = Block::of_cstruct(32, &full).unwrap();
        assert_eq!(parsed.commit_count(), 1, "live log ends before the tear");
        assert_eq!(parsed.compacted_entries().len(), 2);
    }

    #[test]
    fn too_small_buffer_is_corrupt() {
        assert!(Block::of_cstruct(32, &[0u8; 2]).is_err());
    }

    #[test]
    fn emergency_when_over_capacity() {
        let mut b = Block::new(1, file(1, "f1", &[0xaa; 100]));
        for i in 2..10u16 {
            b = b.add_commit(file(i, &format!("f{}", i), &[0xaa; 100]));
        }
        match b.into_cstruct(32, 256) {
            Serialized::SplitEmergency => {}
            _ => panic!("must be an emergency split"),
        }
    }

    #[test]
    fn compact_collapses_commits() {
        let mut b = Block::new(1, file(1, "a", b"one"));
        b = b.add_commit(vec![Entry::inline_struct(1, b"uno")]);
        b = b.add_commit(vec![Entry::delete(1)]);

        let c = b.compact();
        assert_eq!(c.revision_count(), b.revision_count());
        assert_eq!(c.commit_count(), 1);
        assert!(c.compacted_entries().is_empty());
    }

    #[test]
    fn split_partitions_by_id_and_moves_tail() {
        let mut b = Block::new(5, file(1, "a", b"1"));
        b = b.add_commit(file(2, "b", b"2"));
        b = b.add_commit(file(3, "c", b"3"));
        b = b.add_commit(file(4, "d", b"4"));
        b = b.add_commit(vec![Entry::hard_tail((20, 21))]);

        let (head, tail) = b.split((10, 11));

        assert_eq!(head.revision_count(), b.revision_count() + 1);
        assert_eq!(tail.revision_count(), 1);

        // Нижняя половина указывает на новую пару, верхняя сохранила
        // прежний hard-tail.
        assert_eq!(head.hard_tail(), Some((10, 11)));
        assert_eq!(tail.hard_tail(), Some((20, 21)));

        let head_ids = head.ids();
        let tail_ids = tail.ids();
        assert!(head_ids.iter().all(|i| tail_ids.iter().all(|j| i < j)));
        assert_eq!(head_ids.len() + tail_ids.len(), 4);
    }

    #[test]
    fn linked_blocks_enumerates_references() {
        let mut b = Block::new(1, vec![Entry::dir_name(1, "d"), Entry::dir_struct(1, (4, 5))]);
        b = b.add_commit(vec![Entry::file_name(2, "f"), Entry::ctz_struct(2, 9, 2048)]);
        b = b.add_commit(vec![Entry::hard_tail((6, 7))]);

        let refs = b.linked_blocks();
        assert!(refs.contains(&LinkedRef::Pair(4, 5)));
        assert!(refs.contains(&LinkedRef::Pair(6, 7)));
        assert!(refs.contains(&LinkedRef::Ctz { head: 9, size: 2048 }));
    }
}
