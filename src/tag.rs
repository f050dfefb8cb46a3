//! tag — кодек 32-битного тега метаданных.
//!
//! Раскладка слова (до XOR-кодирования):
//! [31]    valid    — 1 = тег отсутствует / терминатор (стёртая flash)
//! [30:20] type3    — (abstract_type: 3 бита) << 8 | (chunk: 8 бит)
//! [19:10] id       — 10 бит, 0x3ff = «без id»
//! [9:0]   length   — 10 бит, 0x3ff зарезервировано
//!
//! На проводе тег хранится BE и XOR-ится со словом предыдущего тега;
//! цепочка каждого commit начинается с 0xffffffff. Так стёртые ячейки
//! (0xff..) декодируются в valid-бит и обрывают разбор.

use byteorder::{BigEndian, ByteOrder};

use crate::consts::{
    CHUNK_CRC, CHUNK_NAME_SUPERBLOCK, CHUNK_SPLICE_DELETE, CHUNK_TAIL_HARD, CRC_WORD_SIZE, NO_ID,
    TYPE_CRC, TYPE_NAME, TYPE_SPLICE, TYPE_STRUCT, TYPE_TAIL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub valid: bool,
    pub abstract_type: u8,
    pub chunk: u8,
    pub id: u16,
    pub length: u16,
}

impl Tag {
    pub fn new(abstract_type: u8, chunk: u8, id: u16, length: u16) -> Self {
        debug_assert!(abstract_type < 8);
        debug_assert!(id <= NO_ID);
        debug_assert!(length < 0x3ff);
        Self {
            valid: false,
            abstract_type,
            chunk,
            id,
            length,
        }
    }

    /// SPLICE-тег удаления: убирает id и сдвигает старшие id вниз.
    pub fn delete(id: u16) -> Self {
        Self::new(TYPE_SPLICE, CHUNK_SPLICE_DELETE, id, 0)
    }

    /// Терминирующий CRC-тег commit'а (payload — слово CRC).
    pub fn crc_tag() -> Self {
        Self::new(TYPE_CRC, CHUNK_CRC, NO_ID, CRC_WORD_SIZE as u16)
    }

    // ---------- упаковка ----------

    pub fn encode(&self) -> u32 {
        let type3 = ((self.abstract_type as u32) << 8) | self.chunk as u32;
        ((self.valid as u32) << 31)
            | (type3 << 20)
            | ((self.id as u32) << 10)
            | self.length as u32
    }

    pub fn decode_word(word: u32) -> Self {
        Self {
            valid: word & 0x8000_0000 != 0,
            abstract_type: ((word >> 28) & 0x7) as u8,
            chunk: ((word >> 20) & 0xff) as u8,
            id: ((word >> 10) & 0x3ff) as u16,
            length: (word & 0x3ff) as u16,
        }
    }

    /// 4 байта провода: слово тега XOR слово предыдущего, BE.
    pub fn wire(&self, prev_word: u32) -> [u8; 4] {
        let mut out = [0u8; 4];
        BigEndian::write_u32(&mut out, self.encode() ^ prev_word);
        out
    }

    /// Обратная операция: (тег, его слово — prev для следующего).
    pub fn from_wire(prev_word: u32, bytes: &[u8]) -> (Self, u32) {
        let word = BigEndian::read_u32(bytes) ^ prev_word;
        (Self::decode_word(word), word)
    }

    // ---------- классификация ----------

    #[inline]
    pub fn is_crc(&self) -> bool {
        self.abstract_type == TYPE_CRC
    }

    #[inline]
    pub fn is_delete(&self) -> bool {
        self.abstract_type == TYPE_SPLICE && self.chunk == CHUNK_SPLICE_DELETE
    }

    #[inline]
    pub fn is_hardtail(&self) -> bool {
        self.abstract_type == TYPE_TAIL && self.chunk == CHUNK_TAIL_HARD
    }

    #[inline]
    pub fn is_name(&self) -> bool {
        self.abstract_type == TYPE_NAME
    }

    #[inline]
    pub fn is_struct(&self) -> bool {
        self.abstract_type == TYPE_STRUCT
    }

    #[inline]
    pub fn is_superblock_name(&self) -> bool {
        self.abstract_type == TYPE_NAME && self.chunk == CHUNK_NAME_SUPERBLOCK
    }
}
