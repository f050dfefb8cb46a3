//! Общие константы on-disk формата (теги, суперблок, геометрия).
//!
//! Формат метаданных совместим с littlefs: блок = [revision u32 LE][commit*],
//! commit = [entry*][CRC tag][crc u32 LE][zero padding до границы prog-блока].
//! Тег — u32 BE на проводе, XOR-цепочка от 0xffffffff в начале каждого commit.

// -------- Magic / версия --------
pub const MAGIC: &[u8; 8] = b"littlefs";
pub const DISK_VERSION: u32 = 0x0002_0000;

// -------- Корневая метапара --------
pub const ROOT_PAIR: (u32, u32) = (0, 1);

// -------- Tag: абстрактные типы (3 бита) --------
pub const TYPE_NAME: u8 = 0x0;
pub const TYPE_STRUCT: u8 = 0x2;
pub const TYPE_USERATTR: u8 = 0x3;
pub const TYPE_SPLICE: u8 = 0x4;
pub const TYPE_CRC: u8 = 0x5;
pub const TYPE_TAIL: u8 = 0x6;

// -------- Tag: chunk (младшие 8 бит type3) --------
pub const CHUNK_NAME_FILE: u8 = 0x01;
pub const CHUNK_NAME_DIR: u8 = 0x02;
pub const CHUNK_NAME_SUPERBLOCK: u8 = 0xff;
pub const CHUNK_STRUCT_DIR: u8 = 0x00;
pub const CHUNK_STRUCT_INLINE: u8 = 0x01;
pub const CHUNK_STRUCT_CTZ: u8 = 0x02;
pub const CHUNK_SPLICE_DELETE: u8 = 0xff;
pub const CHUNK_TAIL_HARD: u8 = 0x01;
pub const CHUNK_CRC: u8 = 0x00;

// -------- Tag: поля id / length (по 10 бит, 0x3ff зарезервировано) --------
pub const NO_ID: u16 = 0x3ff;
pub const MAX_ID: u16 = 0x3fe;
pub const TAG_LEN_MAX: usize = 0x3fe;

// -------- Размеры примитивов --------
pub const TAG_SIZE: usize = 4;
pub const REVISION_SIZE: usize = 4;
pub const CRC_WORD_SIZE: usize = 4;

/// Начальное значение XOR-цепочки тегов (и значение стёртой flash-ячейки).
pub const XOR_SEED: u32 = 0xffff_ffff;
/// Начальное значение бегущего CRC блока.
pub const CRC_SEED: u32 = 0xffff_ffff;

// -------- Суперблок (inline-struct у id 0 корневой пары) --------
// Шесть u32 BE: version, block_size, block_count, name_length_max,
// file_size_max, file_attr_size_max.
pub const SUPERBLOCK_STRUCT_SIZE: usize = 24;

// -------- Payload'ы структур --------
/// Пара адресов блока: 2 × u32 LE.
pub const PAIR_STRUCT_SIZE: usize = 8;
/// CTZ-файл: [head u32 LE][size u32 LE].
pub const CTZ_STRUCT_SIZE: usize = 8;

// -------- Значения по умолчанию --------
pub const DEFAULT_PROG_BLOCK_SIZE: u32 = 32;
pub const DEFAULT_NAME_MAX: u32 = 255;
pub const DEFAULT_FILE_MAX: u32 = 0x7fff_ffff;
pub const DEFAULT_ATTR_MAX: u32 = 1022;
