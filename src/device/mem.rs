//! RAM-устройство для тестов: сплошной буфер, инициализированный стёртым
//! состоянием (0xff). Дополнительно ведёт журнал запрограммированных блоков,
//! чтобы тесты могли проверять «какие блоки были затронуты».

use std::collections::BTreeSet;
use std::io;

use super::BlockDevice;

#[derive(Clone)]
pub struct MemDevice {
    block_size: u32,
    block_count: u32,
    storage: Vec<u8>,
    programmed: BTreeSet<u32>,
}

impl MemDevice {
    pub fn new(block_size: u32, block_count: u32) -> Self {
        Self {
            block_size,
            block_count,
            storage: vec![0xff; (block_size as usize) * (block_count as usize)],
            programmed: BTreeSet::new(),
        }
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Множество блоков, в которые когда-либо писали.
    pub fn programmed_blocks(&self) -> &BTreeSet<u32> {
        &self.programmed
    }

    pub fn clear_program_log(&mut self) {
        self.programmed.clear();
    }

    /// Стереть блок обратно в 0xff (для краш-тестов).
    pub fn erase(&mut self, block: u32) {
        let bs = self.block_size as usize;
        let off = bs * block as usize;
        self.storage[off..off + bs].fill(0xff);
    }

    fn check(&self, block: u32, len: usize) -> io::Result<usize> {
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
        Ok((self.block_size as usize) * (block as usize))
    }
}

impl BlockDevice for MemDevice {
    fn read(&mut self, block: u32, buf: &mut [u8]) -> io::Result<()> {
        let off = self.check(block, buf.len())?;
        buf.copy_from_slice(&self.storage[off..off + buf.len()]);
        Ok(())
    }

    fn program(&mut self, block: u32, buf: &[u8]) -> io::Result<()> {
        let off = self.check(block, buf.len())?;
        self.storage[off..off + buf.len()].copy_from_slice(buf);
        self.programmed.insert(block);
        Ok(())
    }

    fn block_count(&self) -> u32 {
        self.block_count
    }
}
