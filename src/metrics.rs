//! Lightweight global metrics for flintfs.
//!
//! Потокобезопасные атомарные счётчики для подсистем:
//! - Block I/O (чтения/программы физических блоков)
//! - Metadata log (дозаписи, компактизации, сплиты пар)
//! - Allocator (refill'ы lookahead-буфера)
//! - CTZ (записанные цепочки и блоки данных)
//! - CRC (несошедшиеся commit'ы — обрывы лога)

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Block I/O -----
static BLOCK_READS: AtomicU64 = AtomicU64::new(0);
static BLOCK_PROGRAMS: AtomicU64 = AtomicU64::new(0);

// ----- Metadata log -----
static COMMITS_APPENDED: AtomicU64 = AtomicU64::new(0);
static BLOCK_COMPACTIONS: AtomicU64 = AtomicU64::new(0);
static PAIR_SPLITS: AtomicU64 = AtomicU64::new(0);

// ----- Allocator -----
static LOOKAHEAD_REFILLS: AtomicU64 = AtomicU64::new(0);

// ----- CTZ -----
static CTZ_CHAINS_WRITTEN: AtomicU64 = AtomicU64::new(0);
static CTZ_BLOCKS_WRITTEN: AtomicU64 = AtomicU64::new(0);

// ----- CRC -----
static CRC_FAILURES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub block_reads: u64,
    pub block_programs: u64,
    pub commits_appended: u64,
    pub block_compactions: u64,
    pub pair_splits: u64,
    pub lookahead_refills: u64,
    pub ctz_chains_written: u64,
    pub ctz_blocks_written: u64,
    pub crc_failures: u64,
}

#[inline]
pub fn record_block_read() {
    BLOCK_READS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_block_program() {
    BLOCK_PROGRAMS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_commit() {
    COMMITS_APPENDED.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_compaction() {
    BLOCK_COMPACTIONS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_split() {
    PAIR_SPLITS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_lookahead_refill() {
    LOOKAHEAD_REFILLS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn record_ctz_chain(blocks: u64) {
    CTZ_CHAINS_WRITTEN.fetch_add(1, Ordering::Relaxed);
    CTZ_BLOCKS_WRITTEN.fetch_add(blocks, Ordering::Relaxed);
}

#[inline]
pub fn record_crc_failure() {
    CRC_FAILURES.fetch_add(1, Ordering::Relaxed);
}

/// Снять текущее состояние счётчиков.
pub fn metrics_snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        block_reads: BLOCK_READS.load(Ordering::Relaxed),
        block_programs: BLOCK_PROGRAMS.load(Ordering::Relaxed),
        commits_appended: COMMITS_APPENDED.load(Ordering::Relaxed),
        block_compactions: BLOCK_COMPACTIONS.load(Ordering::Relaxed),
        pair_splits: PAIR_SPLITS.load(Ordering::Relaxed),
        lookahead_refills: LOOKAHEAD_REFILLS.load(Ordering::Relaxed),
        ctz_chains_written: CTZ_CHAINS_WRITTEN.load(Ordering::Relaxed),
        ctz_blocks_written: CTZ_BLOCKS_WRITTEN.load(Ordering::Relaxed),
        crc_failures: CRC_FAILURES.load(Ordering::Relaxed),
    }
}

/// Сбросить счётчики (тесты/бенчи).
pub fn metrics_reset() {
    BLOCK_READS.store(0, Ordering::Relaxed);
    BLOCK_PROGRAMS.store(0, Ordering::Relaxed);
    COMMITS_APPENDED.store(0, Ordering::Relaxed);
    BLOCK_COMPACTIONS.store(0, Ordering::Relaxed);
    PAIR_SPLITS.store(0, Ordering::Relaxed);
    LOOKAHEAD_REFILLS.store(0, Ordering::Relaxed);
    CTZ_CHAINS_WRITTEN.store(0, Ordering::Relaxed);
    CTZ_BLOCKS_WRITTEN.store(0, Ordering::Relaxed);
    CRC_FAILURES.store(0, Ordering::Relaxed);
}
