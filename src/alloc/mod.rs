//! alloc — lookahead-буфер свободных блоков.
//!
//! Аллокатор не ведёт персистентный free-лист: множество свободных блоков
//! каждый раз выводится заново из скана достижимости от корневой пары
//! (этим занимается fs::traverse). Здесь — только буфер и политика выбора.
//!
//! Политика refill:
//! - кандидаты = все блоки устройства минус живые;
//! - делим по адресной середине block_count / 2;
//! - берём нижнюю половину при bias = Before, верхнюю при After
//!   (если выбранная половина пуста — другую), сортировка по возрастанию;
//! - bias переключается на каждом refill.

use std::collections::{BTreeSet, VecDeque};

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Before,
    After,
}

#[derive(Debug)]
pub struct Lookahead {
    bias: Bias,
    free: VecDeque<u32>,
}

impl Default for Lookahead {
    fn default() -> Self {
        Self::new()
    }
}

impl Lookahead {
    pub fn new() -> Self {
        Self {
            bias: Bias::Before,
            free: VecDeque::new(),
        }
    }

    pub fn bias(&self) -> Bias {
        self.bias
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Выдать следующий свободный блок из буфера.
    pub fn next(&mut self) -> Option<u32> {
        self.free.pop_front()
    }

    /// Пересобрать буфер из множества живых блоков. Возвращает размер.
    pub fn refill(&mut self, live: &BTreeSet<u32>, block_count: u32) -> usize {
        let mid = block_count / 2;
        let mut before: Vec<u32> = Vec::new();
        let mut after: Vec<u32> = Vec::new();
        for b in 0..block_count {
            if !live.contains(&b) {
                if b < mid {
                    before.push(b);
                } else {
                    after.push(b);
                }
            }
        }

        let chosen = match self.bias {
            Bias::Before => {
                if before.is_empty() {
                    after
                } else {
                    before
                }
            }
            Bias::After => {
                if after.is_empty() {
                    before
                } else {
                    after
                }
            }
        };

        self.bias = match self.bias {
            Bias::Before => Bias::After,
            Bias::After => Bias::Before,
        };
        self.free = chosen.into();

        debug!(
            "lookahead refill: {} free of {} blocks, next bias {:?}",
            self.free.len(),
            block_count,
            self.bias
        );
        self.free.len()
    }
}
