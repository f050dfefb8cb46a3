//! fs — ядро файловой системы: handle, операции каталогов и файлов.

pub mod core;
pub mod dirops;
pub mod fileops;
pub mod traverse;

pub use self::core::{Fs, FsInfo};
pub use self::dirops::EntryKind;
