//! crc — littlefs-вариант CRC-32 поверх crc32fast.
//!
//! littlefs считает CRC по отражённому полиному 0xEDB88320 БЕЗ финальной
//! инверсии: commit стартует с 0xffffffff, каждый следующий вызов продолжает
//! «сырое» значение регистра. crc32fast считает стандартный CRC-32/IEEE
//! (init 0xffffffff + финальный XOR), поэтому мост — через дополнение:
//!
//!   lfs_crc(seed, data) == !ieee_with_initial(!seed, data)
//!
//! Это ровно то, что делает crc32(): один и тот же табличный движок, другая
//! рамка вокруг регистра.

use crc32fast::Hasher;

/// Продолжить бегущий littlefs-CRC `seed` байтами `data`.
#[inline]
pub fn crc32(seed: u32, data: &[u8]) -> u32 {
    let mut h = Hasher::new_with_initial(!seed);
    h.update(data);
    !h.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_answer_check_string() {
        // CRC-32/IEEE("123456789") = 0xCBF43926; сырой регистр = его инверсия.
        assert_eq!(crc32(0xffff_ffff, b"123456789"), !0xCBF4_3926u32);
    }

    #[test]
    fn chaining_equals_single_fold() {
        let whole = crc32(0xffff_ffff, b"hello world");
        let half = crc32(0xffff_ffff, b"hello ");
        assert_eq!(crc32(half, b"world"), whole);
    }

    #[test]
    fn empty_fold_is_identity() {
        assert_eq!(crc32(0xdead_beef, &[]), 0xdead_beef);
    }
}
