//! flintfs — log-structured, copy-on-write файловая система, совместимая
//! с on-disk форматом littlefs, поверх блочного устройства с примитивами
//! «прочитать блок» / «запрограммировать блок».

// Базовые модули
pub mod config;
pub mod consts;
pub mod crc;
pub mod errors;
pub mod metrics;
pub mod util;

// On-disk кодек (снизу вверх: тег → запись → commit → блок → пара)
pub mod block;
pub mod commit;
pub mod ctz;
pub mod entry;
pub mod pair;
pub mod tag;

// Устройство и аллокатор
pub mod alloc;
pub mod device;

// Ядро ФС
pub mod fs; // src/fs/{mod,core,dirops,fileops,traverse}.rs

// Удобные реэкспорты
pub use config::FsConfig;
pub use device::{BlockDevice, FileDevice, MemDevice};
pub use errors::{FsError, Result};
pub use fs::{EntryKind, Fs, FsInfo};
