//! device — блочное устройство: trait + реализации.
//!
//! Контракт:
//! - read/program работают целыми блоками; буфер ровно block_size байт.
//! - program предполагает предварительно стёртый блок (erase — забота
//!   драйвера/носителя); стёртая область читается как 0xff.
//! - Ядро не ретраит I/O: ошибки устройства поднимаются наверх как есть.

mod file;
mod mem;

pub use file::FileDevice;
pub use mem::MemDevice;

use std::io;

/// Интерфейс носителя с фиксированным размером блока.
pub trait BlockDevice {
    /// Прочитать блок `block` целиком в `buf` (len == block_size).
    fn read(&mut self, block: u32, buf: &mut [u8]) -> io::Result<()>;

    /// Запрограммировать блок `block` содержимым `buf` (len == block_size).
    fn program(&mut self, block: u32, buf: &[u8]) -> io::Result<()>;

    /// Количество блоков на устройстве.
    fn block_count(&self) -> u32;
}
