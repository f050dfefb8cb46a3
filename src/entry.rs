//! entry — (тег, payload): единица информации в метаданных.
//!
//! Правила компактизации (replay по порядку):
//! - более поздняя запись с тем же (id, abstract_type) замещает раннюю
//!   на её месте (стабильный порядок по первому вхождению);
//! - SPLICE-delete(id) убирает все записи этого id и уменьшает на единицу
//!   каждый больший id; сам delete в компактном виде не сохраняется
//!   (блок переписывается целиком, copy-on-write);
//! - записи без id (хвосты) замещаются по abstract_type.

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{
    CHUNK_NAME_DIR, CHUNK_NAME_FILE, CHUNK_NAME_SUPERBLOCK, CHUNK_STRUCT_CTZ, CHUNK_STRUCT_DIR,
    CHUNK_STRUCT_INLINE, CHUNK_TAIL_HARD, CTZ_STRUCT_SIZE, NO_ID, PAIR_STRUCT_SIZE, TAG_SIZE,
    TYPE_NAME, TYPE_STRUCT, TYPE_TAIL,
};
use crate::crc::crc32;
use crate::tag::Tag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub tag: Tag,
    pub data: Vec<u8>,
}

impl Entry {
    pub fn new(mut tag: Tag, data: Vec<u8>) -> Self {
        debug_assert!(data.len() < 0x3ff);
        tag.length = data.len() as u16;
        Self { tag, data }
    }

    /// Полная длина на диске: тег + payload.
    pub fn disk_len(&self) -> usize {
        TAG_SIZE + self.data.len()
    }

    // ---------- конструкторы записей ----------

    pub fn file_name(id: u16, name: &str) -> Self {
        Self::new(
            Tag::new(TYPE_NAME, CHUNK_NAME_FILE, id, 0),
            name.as_bytes().to_vec(),
        )
    }

    pub fn dir_name(id: u16, name: &str) -> Self {
        Self::new(
            Tag::new(TYPE_NAME, CHUNK_NAME_DIR, id, 0),
            name.as_bytes().to_vec(),
        )
    }

    pub fn superblock_name() -> Self {
        Self::new(
            Tag::new(TYPE_NAME, CHUNK_NAME_SUPERBLOCK, 0, 0),
            crate::consts::MAGIC.to_vec(),
        )
    }

    pub fn inline_struct(id: u16, data: &[u8]) -> Self {
        Self::new(Tag::new(TYPE_STRUCT, CHUNK_STRUCT_INLINE, id, 0), data.to_vec())
    }

    pub fn ctz_struct(id: u16, head: u32, size: u32) -> Self {
        let mut payload = vec![0u8; CTZ_STRUCT_SIZE];
        LittleEndian::write_u32(&mut payload[0..4], head);
        LittleEndian::write_u32(&mut payload[4..8], size);
        Self::new(Tag::new(TYPE_STRUCT, CHUNK_STRUCT_CTZ, id, 0), payload)
    }

    pub fn dir_struct(id: u16, pair: (u32, u32)) -> Self {
        Self::new(
            Tag::new(TYPE_STRUCT, CHUNK_STRUCT_DIR, id, 0),
            encode_pair(pair),
        )
    }

    pub fn hard_tail(pair: (u32, u32)) -> Self {
        Self::new(
            Tag::new(TYPE_TAIL, CHUNK_TAIL_HARD, NO_ID, 0),
            encode_pair(pair),
        )
    }

    pub fn delete(id: u16) -> Self {
        Self {
            tag: Tag::delete(id),
            data: Vec::new(),
        }
    }

    // ---------- разбор payload'ов ----------

    /// Пара адресов (dir-struct / hard-tail).
    pub fn as_pair(&self) -> Option<(u32, u32)> {
        if self.data.len() != PAIR_STRUCT_SIZE {
            return None;
        }
        Some((
            LittleEndian::read_u32(&self.data[0..4]),
            LittleEndian::read_u32(&self.data[4..8]),
        ))
    }

    /// (head, size) CTZ-файла.
    pub fn as_ctz(&self) -> Option<(u32, u32)> {
        if self.data.len() != CTZ_STRUCT_SIZE {
            return None;
        }
        Some((
            LittleEndian::read_u32(&self.data[0..4]),
            LittleEndian::read_u32(&self.data[4..8]),
        ))
    }

    /// Сложить запись в бегущий CRC: сначала провод тега, затем payload.
    pub fn fold_crc(&self, seed: u32, prev_word: u32) -> (u32, u32) {
        let wire = self.tag.wire(prev_word);
        let crc = crc32(crc32(seed, &wire), &self.data);
        (crc, self.tag.encode())
    }
}

fn encode_pair(pair: (u32, u32)) -> Vec<u8> {
    let mut payload = vec![0u8; PAIR_STRUCT_SIZE];
    LittleEndian::write_u32(&mut payload[0..4], pair.0);
    LittleEndian::write_u32(&mut payload[4..8], pair.1);
    payload
}

/// Компактизация: минимальный эквивалентный список записей.
pub fn compact(entries: &[Entry]) -> Vec<Entry> {
    let mut live: Vec<Entry> = Vec::new();

    for e in entries {
        if e.tag.is_delete() {
            let id = e.tag.id;
            live.retain(|x| x.tag.id != id);
            for x in live.iter_mut() {
                if x.tag.id != NO_ID && x.tag.id > id {
                    x.tag.id -= 1;
                }
            }
        } else if let Some(pos) = live
            .iter()
            .position(|x| x.tag.id == e.tag.id && x.tag.abstract_type == e.tag.abstract_type)
        {
            live[pos] = e.clone();
        } else {
            live.push(e.clone());
        }
    }

    live
}
