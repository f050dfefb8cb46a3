//! commit — единица дозаписи в метаданные.
//!
//! Формат на диске:
//! [entry*]            — провода тегов (XOR-цепочка от 0xffffffff) + payload'ы
//! [CRC tag]           — терминатор, length = 4, участвует в цепочке
//! [crc u32 LE]        — бегущий CRC блока, свёрнутый по ревизии, всем
//!                       предыдущим commit'ам и байтам этого commit'а
//!                       вплоть до CRC-тега включительно
//! [zero padding]      — до АБСОЛЮТНОЙ границы prog-блока внутри блока
//!
//! Слово CRC и паддинг входят в бегущий CRC последующих commit'ов.
//! Разбор останавливается на первом несошедшемся CRC — это конец живого
//! лога (недописанный program после сбоя питания).

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{CRC_WORD_SIZE, TAG_SIZE, XOR_SEED};
use crate::crc::crc32;
use crate::entry::Entry;
use crate::metrics::record_crc_failure;
use crate::tag::Tag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub entries: Vec<Entry>,
}

impl Commit {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Длина сериализованного commit'а, начинающегося с абсолютного
    /// смещения `offset` внутри блока (с учётом паддинга).
    pub fn serialized_len(&self, prog_size: usize, offset: usize) -> usize {
        let raw: usize = self.entries.iter().map(|e| e.disk_len()).sum::<usize>()
            + TAG_SIZE
            + CRC_WORD_SIZE;
        let end = offset + raw;
        let rem = end % prog_size;
        let padded_end = if rem == 0 { end } else { end + prog_size - rem };
        padded_end - offset
    }

    /// Сериализация. `offset` — абсолютное смещение начала commit'а в блоке,
    /// `crc_seed` — бегущий CRC на этом смещении. Возвращает (байты,
    /// бегущий CRC после паддинга — seed следующего commit'а).
    pub fn into_cstruct(&self, prog_size: usize, offset: usize, crc_seed: u32) -> (Vec<u8>, u32) {
        let mut out = Vec::with_capacity(self.serialized_len(prog_size, offset));
        let mut prev = XOR_SEED;

        for e in &self.entries {
            out.extend_from_slice(&e.tag.wire(prev));
            out.extend_from_slice(&e.data);
            prev = e.tag.encode();
        }

        out.extend_from_slice(&Tag::crc_tag().wire(prev));
        let crc = crc32(crc_seed, &out);

        let crc_word_pos = out.len();
        let mut word = [0u8; CRC_WORD_SIZE];
        LittleEndian::write_u32(&mut word, crc);
        out.extend_from_slice(&word);

        let rem = (offset + out.len()) % prog_size;
        if rem != 0 {
            out.resize(out.len() + prog_size - rem, 0);
        }

        let crc_after = crc32(crc, &out[crc_word_pos..]);
        (out, crc_after)
    }

    /// Разобрать один commit в `buf[offset..]`.
    ///
    /// Возвращает (commit, потреблено байт, бегущий CRC после), либо None:
    /// обрыв буфера, стёртый хвост или несовпадение CRC — конец живого лога.
    pub fn of_cstruct(
        prog_size: usize,
        buf: &[u8],
        offset: usize,
        crc_seed: u32,
    ) -> Option<(Self, usize, u32)> {
        let mut pos = offset;
        let mut prev = XOR_SEED;
        let mut entries = Vec::new();

        loop {
            if pos + TAG_SIZE > buf.len() {
                return None;
            }
            let (tag, word) = Tag::from_wire(prev, &buf[pos..pos + TAG_SIZE]);
            if tag.valid {
                return None;
            }

            if tag.is_crc() {
                let tag_end = pos + TAG_SIZE;
                if tag_end + CRC_WORD_SIZE > buf.len() {
                    return None;
                }
                let calc = crc32(crc_seed, &buf[offset..tag_end]);
                let stored = LittleEndian::read_u32(&buf[tag_end..tag_end + CRC_WORD_SIZE]);
                if calc != stored {
                    record_crc_failure();
                    return None;
                }

                let mut end = tag_end + CRC_WORD_SIZE;
                let rem = end % prog_size;
                if rem != 0 {
                    end = (end + prog_size - rem).min(buf.len());
                }
                let crc_after = crc32(calc, &buf[tag_end..end]);
                return Some((Self { entries }, end - offset, crc_after));
            }

            let dlen = tag.length as usize;
            if dlen == 0x3ff || pos + TAG_SIZE + dlen > buf.len() {
                return None;
            }
            entries.push(Entry {
                tag,
                data: buf[pos + TAG_SIZE..pos + TAG_SIZE + dlen].to_vec(),
            });
            prev = word;
            pos += TAG_SIZE + dlen;
        }
    }
}
