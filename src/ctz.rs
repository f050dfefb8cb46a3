//! ctz — скип-лист больших файлов, индексированный count-trailing-zeros.
//!
//! Блок i начинается с n_pointers(i) указателей u32 LE; указатель k ведёт
//! на блок i − 2^k. n_pointers(i) = ctz(i) + 1 при i > 0, и 0 для блока 0.
//! Остаток блока — данные. Файл адресуется (head, size), где head — адрес
//! ПОСЛЕДНЕГО блока цепочки.
//!
//! Запись заполняет все указатели (полный скип-лист); последовательное
//! чтение идёт по нулевому указателю от head к блоку 0.

use byteorder::{ByteOrder, LittleEndian};

use crate::device::BlockDevice;
use crate::errors::Result;
use crate::metrics::record_block_read;

/// Число обратных указателей в заголовке блока i.
#[inline]
pub fn n_pointers(index: u32) -> u32 {
    if index == 0 {
        0
    } else {
        index.trailing_zeros() + 1
    }
}

/// Ёмкость области данных блока i.
#[inline]
pub fn data_capacity(index: u32, block_size: usize) -> usize {
    block_size - 4 * n_pointers(index) as usize
}

/// Индекс последнего блока файла размера `size` (итеративно: первая
/// позиция, на которой накопленная ёмкость покрывает файл).
pub fn last_block_index(size: usize, block_size: usize) -> u32 {
    if size == 0 {
        return 0;
    }
    let mut index = 0u32;
    let mut covered = 0usize;
    loop {
        covered += data_capacity(index, block_size);
        if covered >= size {
            return index;
        }
        index += 1;
    }
}

/// Разобрать заголовок блока i: адреса блоков i−2^0, i−2^1, …
pub fn parse_pointers(index: u32, buf: &[u8]) -> Vec<u32> {
    let np = n_pointers(index) as usize;
    let mut out = Vec::with_capacity(np);
    for k in 0..np {
        out.push(LittleEndian::read_u32(&buf[4 * k..4 * k + 4]));
    }
    out
}

/// Собрать образ блока i: указатели из адресов уже записанных блоков
/// (`prev_addrs[j]` — адрес блока j, j < i), затем данные, хвост — 0xff.
pub fn build_block(index: u32, prev_addrs: &[u32], data: &[u8], block_size: usize) -> Vec<u8> {
    debug_assert_eq!(prev_addrs.len(), index as usize);
    debug_assert!(data.len() <= data_capacity(index, block_size));

    let np = n_pointers(index) as usize;
    let mut out = vec![0xffu8; block_size];
    for k in 0..np {
        let target = index - (1u32 << k);
        LittleEndian::write_u32(&mut out[4 * k..4 * k + 4], prev_addrs[target as usize]);
    }
    out[4 * np..4 * np + data.len()].copy_from_slice(data);
    out
}

/// Прочитать файл (head, size): пройти по нулевым указателям от последнего
/// блока к нулевому, склеить области данных, обрезать до size.
pub fn read<D: BlockDevice>(dev: &mut D, block_size: usize, head: u32, size: usize) -> Result<Vec<u8>> {
    if size == 0 {
        return Ok(Vec::new());
    }

    let last = last_block_index(size, block_size);
    let mut chunks: Vec<Vec<u8>> = vec![Vec::new(); last as usize + 1];

    let mut buf = vec![0u8; block_size];
    let mut index = last;
    let mut addr = head;
    loop {
        record_block_read();
        dev.read(addr, &mut buf)?;
        let np = n_pointers(index) as usize;
        chunks[index as usize] = buf[4 * np..].to_vec();
        if index == 0 {
            break;
        }
        addr = LittleEndian::read_u32(&buf[0..4]);
        index -= 1;
    }

    let mut out = Vec::with_capacity(size);
    for c in chunks {
        out.extend_from_slice(&c);
    }
    out.truncate(size);
    Ok(out)
}
