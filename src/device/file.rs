//! Файловый образ как блочное устройство.
//!
//! Политика:
//! - Эксклюзивная advisory-блокировка (fs2) на сам файл образа: один
//!   владелец на образ, вторая попытка открытия завершается ошибкой.
//! - Область за EOF читается как стёртая (0xff) — образ может быть
//!   «дырявым», как свежая flash.
//! - fsync на каждую запись управляется флагом sync (по умолчанию выключен;
//!   CLI включает его для format).

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::BlockDevice;

pub struct FileDevice {
    file: File,
    path: PathBuf,
    block_size: u32,
    block_count: u32,
    sync: bool,
}

impl FileDevice {
    /// Создать новый образ на block_count блоков. Ошибка, если файл уже есть.
    pub fn create(path: &Path, block_size: u32, block_count: u32) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.try_lock_exclusive()?;

        // Заполняем образ стёртым состоянием (0xff): полная длина нужна и
        // open()'у, который выводит block_count из длины файла.
        let mut dev = Self {
            file,
            path: path.to_path_buf(),
            block_size,
            block_count,
            sync: false,
        };
        let erased = vec![0xffu8; block_size as usize];
        for b in 0..block_count {
            dev.program(b, &erased)?;
        }
        Ok(dev)
    }

    /// Открыть существующий образ. block_count берётся из длины файла,
    /// округлённой вверх до блока, либо из `expect_count`, если он больше.
    pub fn open(path: &Path, block_size: u32, expect_count: u32) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        file.try_lock_exclusive()?;
        let len = file.metadata()?.len();
        let from_len = ((len + block_size as u64 - 1) / block_size as u64) as u32;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            block_size,
            block_count: from_len.max(expect_count),
            sync: false,
        })
    }

    pub fn set_sync(&mut self, on: bool) {
        self.sync = on;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    fn check(&self, block: u32, len: usize) -> io::Result<u64> {
        if block >= self.block_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("block {} out of range 0..{}", block, self.block_count),
            ));
        }
        if len != self.block_size as usize {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("buffer size {} != block_size {}", len, self.block_size),
            ));
        }
        Ok((self.block_size as u64) * (block as u64))
    }
}

impl BlockDevice for FileDevice {
    fn read(&mut self, block: u32, buf: &mut [u8]) -> io::Result<()> {
        let off = self.check(block, buf.len())?;
        let len = self.file.metadata()?.len();

        if off >= len {
            buf.fill(0xff);
            return Ok(());
        }

        self.file.seek(SeekFrom::Start(off))?;
        let avail = ((len - off) as usize).min(buf.len());
        self.file.read_exact(&mut buf[..avail])?;
        buf[avail..].fill(0xff);
        Ok(())
    }

    fn program(&mut self, block: u32, buf: &[u8]) -> io::Result<()> {
        let off = self.check(block, buf.len())?;
        self.file.seek(SeekFrom::Start(off))?;
        self.file.write_all(buf)?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    fn block_count(&self) -> u32 {
        self.block_count
    }
}

impl Drop for FileDevice {
    fn drop(&mut self) {
        // Ошибки unlock при Drop игнорируются осознанно.
        let _ = self.file.unlock();
    }
}
