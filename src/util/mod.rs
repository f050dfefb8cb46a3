//! util — общие утилиты (работа с путями).
//!
//! Путь — последовательность сегментов, разделённых '/'. Пустые сегменты
//! (ведущий/замыкающий слэш, повторные слэши) игнорируются.

/// Разбить путь на сегменты.
#[inline]
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Разбить путь на (сегменты родителя, базовое имя).
/// None, если путь не содержит ни одного сегмента ("" или "/").
pub fn split_basename(path: &str) -> Option<(Vec<&str>, &str)> {
    let mut segs = path_segments(path);
    let base = segs.pop()?;
    Some((segs, base))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_ignore_empty() {
        assert_eq!(path_segments("/a//b/"), vec!["a", "b"]);
        assert!(path_segments("/").is_empty());
        assert!(path_segments("").is_empty());
    }

    #[test]
    fn basename_split() {
        let (parent, base) = split_basename("/x/y/z").unwrap();
        assert_eq!(parent, vec!["x", "y"]);
        assert_eq!(base, "z");

        let (parent, base) = split_basename("a").unwrap();
        assert!(parent.is_empty());
        assert_eq!(base, "a");

        assert!(split_basename("/").is_none());
    }
}
